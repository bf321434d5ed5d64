//! Key-value persistence collaborators for the configuration document.

use crate::Config;
use anyhow::{Error, anyhow};
use log::debug;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::fs;
use tokio::sync::broadcast;

/// Notification that stored configuration changed. Carries the full stored document.
#[derive(Debug, Clone, PartialEq)]
pub struct StorageChange {
    pub new_value: Value,
}

impl StorageChange {
    /// The configuration now stored, defaulted when invalid.
    pub fn config(&self) -> Config {
        Config::from_stored(&self.new_value)
    }
}

/// Where the configuration lives between page loads.
///
/// `load` returns the whole stored document (`None` when nothing was ever saved);
/// `save` writes the top-level keys of `value`, replacing each one wholesale.
pub trait ConfigStorage: Send + Sync {
    /// # Errors
    /// Returns an error if the backing store cannot be read or holds malformed data.
    fn load(&self) -> impl Future<Output = Result<Option<Value>, Error>> + Send;

    /// # Errors
    /// Returns an error if `value` is not an object or the write fails.
    fn save(&self, value: Value) -> impl Future<Output = Result<(), Error>> + Send;

    /// Subscribe to changes made through any handle of this store.
    fn subscribe(&self) -> broadcast::Receiver<StorageChange>;
}

fn as_object(value: Value) -> Result<Map<String, Value>, Error> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(anyhow!("Stored configuration must be an object, got {other}")),
    }
}

fn notify(changes: &broadcast::Sender<StorageChange>, new_value: Value) {
    if changes.send(StorageChange { new_value }).is_err() {
        debug!(target: "config", "configuration changed with no subscribers");
    }
}

#[derive(Debug)]
struct MemoryInner {
    items: Mutex<BTreeMap<String, Value>>,
    changes: broadcast::Sender<StorageChange>,
}

/// In-process key/value store. Clones share the same items.
#[derive(Debug, Clone)]
pub struct MemoryStorage {
    inner: Arc<MemoryInner>,
}

impl Default for MemoryStorage {
    fn default() -> Self {
        let (changes, _) = broadcast::channel(16);
        Self {
            inner: Arc::new(MemoryInner {
                items: Mutex::new(BTreeMap::new()),
                changes,
            }),
        }
    }
}

impl MemoryStorage {
    /// A store pre-populated with the top-level keys of `value` (non-objects store nothing).
    pub fn with_value(value: Value) -> Self {
        let storage = Self::default();
        if let Value::Object(map) = value
            && let Ok(mut items) = storage.inner.items.lock()
        {
            items.extend(map);
        }
        storage
    }

    fn snapshot(&self) -> Result<Option<Value>, Error> {
        let items = self
            .inner
            .items
            .lock()
            .map_err(|_| anyhow!("MemoryStorage poisoned"))?;
        if items.is_empty() {
            return Ok(None);
        }
        Ok(Some(Value::Object(
            items
                .iter()
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect(),
        )))
    }
}

impl ConfigStorage for MemoryStorage {
    async fn load(&self) -> Result<Option<Value>, Error> {
        self.snapshot()
    }

    async fn save(&self, value: Value) -> Result<(), Error> {
        let map = as_object(value)?;
        {
            let mut items = self
                .inner
                .items
                .lock()
                .map_err(|_| anyhow!("MemoryStorage poisoned"))?;
            items.extend(map);
        }
        if let Some(new_value) = self.snapshot()? {
            notify(&self.inner.changes, new_value);
        }
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StorageChange> {
        self.inner.changes.subscribe()
    }
}

/// JSON file on disk.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
    changes: broadcast::Sender<StorageChange>,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let (changes, _) = broadcast::channel(16);
        Self {
            path: path.into(),
            changes,
        }
    }

    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigStorage for FileStorage {
    async fn load(&self) -> Result<Option<Value>, Error> {
        let text = match fs::read_to_string(&self.path).await {
            Ok(text) => text,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(target: "config", "no stored configuration at {}", self.path.display());
                return Ok(None);
            }
            Err(err) => {
                return Err(anyhow!("Failed to read {}: {err}", self.path.display()));
            }
        };
        let value = serde_json::from_str(&text)
            .map_err(|err| anyhow!("Malformed JSON in {}: {err}", self.path.display()))?;
        Ok(Some(value))
    }

    async fn save(&self, value: Value) -> Result<(), Error> {
        let mut stored = match self.load().await? {
            Some(existing) => as_object(existing)?,
            None => Map::new(),
        };
        stored.extend(as_object(value)?);
        let new_value = Value::Object(stored);
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).await?;
        }
        let text = serde_json::to_string_pretty(&new_value)?;
        fs::write(&self.path, text)
            .await
            .map_err(|err| anyhow!("Failed to write {}: {err}", self.path.display()))?;
        notify(&self.changes, new_value);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StorageChange> {
        self.changes.subscribe()
    }
}
