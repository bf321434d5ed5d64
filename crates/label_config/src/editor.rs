//! State behind the options page: a JSON text area and a save button.

use crate::storage::ConfigStorage;
use crate::store::ConfigStore;
use crate::{Config, ConfigError};
use log::{debug, info};

#[derive(Debug, Default)]
pub struct ConfigEditorPresenter {
    config: Config,
    has_diff: bool,
    has_saved: bool,
    is_label_setting_valid: bool,
    last_error: Option<ConfigError>,
}

impl ConfigEditorPresenter {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            is_label_setting_valid: true,
            ..Self::default()
        }
    }

    /// Load the stored configuration (defaulted when absent or invalid).
    pub async fn setup<S: ConfigStorage>(store: &ConfigStore<S>) -> Self {
        Self::new(store.get_config().await)
    }

    #[inline]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    #[inline]
    pub const fn has_diff(&self) -> bool {
        self.has_diff
    }

    #[inline]
    pub const fn has_saved(&self) -> bool {
        self.has_saved
    }

    #[inline]
    pub const fn is_label_setting_valid(&self) -> bool {
        self.is_label_setting_valid
    }

    /// Why the last input was rejected, if it was.
    #[inline]
    pub const fn last_error(&self) -> Option<&ConfigError> {
        self.last_error.as_ref()
    }

    /// Text the editor is restored with.
    pub fn label_setting_json(&self) -> String {
        let value = self.config.label_setting_value();
        serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string())
    }

    pub fn save_button_text(&self) -> &'static str {
        if !self.has_diff && self.has_saved {
            "Saved!"
        } else {
            "Save"
        }
    }

    pub const fn is_save_button_enabled(&self) -> bool {
        self.has_diff && self.is_label_setting_valid
    }

    /// Every edit of the text area. Valid input replaces the Label Setting immediately.
    pub fn handle_label_setting_input(&mut self, input: &str) {
        self.has_diff = true;
        let result = serde_json::from_str::<serde_json::Value>(input)
            .map_err(ConfigError::from)
            .and_then(|value| self.config.set_label_setting(&value));
        match result {
            Ok(()) => {
                self.is_label_setting_valid = true;
                self.last_error = None;
            }
            Err(err) => {
                debug!(target: "config_editor", "rejected label setting: {err}");
                self.is_label_setting_valid = false;
                self.last_error = Some(err);
            }
        }
    }

    pub async fn handle_save_button_click<S: ConfigStorage>(&mut self, store: &ConfigStore<S>) {
        store.save_config(&self.config).await;
        info!(target: "config_editor", "configuration saved");
        self.has_saved = true;
        self.has_diff = false;
    }
}
