//! Page-level glue for label cycling: the content entry point, the background injection
//! decision, and a session that drives one page view.
#![allow(
    clippy::missing_docs_in_private_items,
    reason = "Internal implementation details don't need public documentation"
)]

pub mod background;
pub mod content;
pub mod session;

use std::env;
use std::path::PathBuf;

/// Harness settings read from the environment.
#[derive(Clone, Debug, Default)]
pub struct HarnessConfig {
    /// JSON configuration file; the built-in default applies when unset.
    pub config_path: Option<PathBuf>,
    /// Cookie header sent with page fetches and label replays.
    pub cookie: Option<String>,
}

impl HarnessConfig {
    /// Reads `CYCLE_LABEL_CONFIG` (config file path) and `CYCLE_LABEL_COOKIE`.
    pub fn from_env() -> Self {
        let config_path = env::var_os("CYCLE_LABEL_CONFIG")
            .filter(|path| !path.is_empty())
            .map(PathBuf::from);
        let cookie = env::var("CYCLE_LABEL_COOKIE")
            .ok()
            .filter(|cookie| !cookie.is_empty());
        Self {
            config_path,
            cookie,
        }
    }
}
