//! The persisted configuration document.

use crate::filter::UrlFilter;
use crate::setting::{Lane, LabelSetting};
use crate::ConfigError;
use log::warn;
use serde::Serialize;
use serde_json::{Value, json};
use std::collections::BTreeMap;

/// Prefix the built-in configuration cycles labels on.
pub const DEFAULT_PREFIX: &str = "https://github.com";

/// Path fragments of the pages the content script is injected into.
pub const INJECTED_PATHS: &[&str] = &["/issues/", "/pull/"];

/// `{ labelSetting, hosts }`. `hosts` is always re-derived from `labelSetting`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    label_setting: LabelSetting,
    hosts: BTreeMap<String, bool>,
}

impl Default for Config {
    fn default() -> Self {
        let mut label_setting = LabelSetting::default();
        let lanes = Lane::new(["bug", "wontfix"]).map(|lane| vec![lane]);
        if let Ok(lanes) = lanes
            && label_setting.insert(DEFAULT_PREFIX, lanes).is_ok()
        {
            return Self::new(label_setting);
        }
        Self::new(LabelSetting::default())
    }
}

impl Config {
    pub fn new(label_setting: LabelSetting) -> Self {
        let hosts = Self::derive_hosts(&label_setting);
        Self {
            label_setting,
            hosts,
        }
    }

    fn derive_hosts(label_setting: &LabelSetting) -> BTreeMap<String, bool> {
        label_setting
            .origins()
            .into_iter()
            .map(|origin| (origin, true))
            .collect()
    }

    /// Schema-checked parse of a whole persisted document. A stored `hosts` is ignored.
    ///
    /// # Errors
    /// Returns the first [`ConfigError`] violation found.
    pub fn from_value(value: &Value) -> Result<Self, ConfigError> {
        let Value::Object(map) = value else {
            return Err(ConfigError::NotAnObject);
        };
        let label_setting = map
            .get("labelSetting")
            .ok_or(ConfigError::MissingLabelSetting)?;
        Ok(Self::new(LabelSetting::from_value(label_setting)?))
    }

    /// Like [`Self::from_value`], but an invalid document yields [`Config::default`].
    pub fn from_stored(value: &Value) -> Self {
        Self::from_value(value).unwrap_or_else(|err| {
            warn!(target: "config", "invalid stored configuration, using default: {err}");
            Self::default()
        })
    }

    /// Parse JSON text into a configuration.
    ///
    /// # Errors
    /// Returns [`ConfigError::Json`] for malformed text, otherwise as [`Self::from_value`].
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Self::from_value(&serde_json::from_str(text)?)
    }

    pub fn to_value(&self) -> Value {
        json!({
            "labelSetting": self.label_setting_value(),
            "hosts": self.hosts,
        })
    }

    /// The Label Setting alone as JSON.
    pub fn label_setting_value(&self) -> Value {
        let map: serde_json::Map<String, Value> = self
            .label_setting
            .iter()
            .map(|(prefix, lanes)| {
                let lanes = lanes
                    .iter()
                    .map(|lane| Value::from(lane.titles().to_vec()))
                    .collect();
                (prefix.to_owned(), Value::Array(lanes))
            })
            .collect();
        Value::Object(map)
    }

    #[inline]
    pub fn label_setting(&self) -> &LabelSetting {
        &self.label_setting
    }

    #[inline]
    pub fn hosts(&self) -> &BTreeMap<String, bool> {
        &self.hosts
    }

    /// Replace the whole Label Setting after validating it. On error nothing changes.
    ///
    /// # Errors
    /// Returns the first [`ConfigError`] violation in `value`.
    pub fn set_label_setting(&mut self, value: &Value) -> Result<(), ConfigError> {
        let label_setting = LabelSetting::from_value(value)?;
        self.hosts = Self::derive_hosts(&label_setting);
        self.label_setting = label_setting;
        Ok(())
    }

    /// Lanes for the page at `url` (longest matching prefix).
    #[inline]
    pub fn lanes_for_url(&self, url: &str) -> &[Lane] {
        self.label_setting.lanes_for_url(url)
    }

    /// Navigation filters deciding which pages get the content script.
    pub fn url_filters(&self) -> Vec<UrlFilter> {
        self.label_setting
            .prefixes()
            .flat_map(|prefix| {
                INJECTED_PATHS
                    .iter()
                    .map(move |path| UrlFilter::new(prefix, path))
            })
            .collect()
    }
}

impl TryFrom<Value> for Config {
    type Error = ConfigError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_value(&value)
    }
}
