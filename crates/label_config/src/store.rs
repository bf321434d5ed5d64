use crate::Config;
use crate::storage::{ConfigStorage, StorageChange};
use log::{debug, error, warn};
use tokio::sync::broadcast;

/// Loads and saves [`Config`] through a [`ConfigStorage`] back end.
#[derive(Debug, Clone)]
pub struct ConfigStore<S> {
    storage: S,
}

impl<S: ConfigStorage> ConfigStore<S> {
    pub const fn new(storage: S) -> Self {
        Self { storage }
    }

    #[inline]
    pub const fn storage(&self) -> &S {
        &self.storage
    }

    /// Resolve the stored configuration. Absent, unreadable, or invalid data yields
    /// [`Config::default`].
    pub async fn get_config(&self) -> Config {
        let stored = match self.storage.load().await {
            Ok(Some(value)) => value,
            Ok(None) => {
                debug!(target: "config", "nothing stored, using default configuration");
                return Config::default();
            }
            Err(err) => {
                warn!(target: "config", "failed to load configuration, using default: {err:#}");
                return Config::default();
            }
        };
        Config::from_stored(&stored)
    }

    /// Write the whole configuration. Failures are logged, never returned.
    pub async fn save_config(&self, config: &Config) {
        if let Err(err) = self.storage.save(config.to_value()).await {
            error!(target: "config", "failed to save configuration: {err:#}");
        }
    }

    /// Changes made through any handle of the underlying storage.
    pub fn on_config_changed(&self) -> broadcast::Receiver<StorageChange> {
        self.storage.subscribe()
    }
}
