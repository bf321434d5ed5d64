//! Label cycle configuration: which labels cycle on which sites, and where that is stored.

pub mod config;
pub mod editor;
mod error;
pub mod filter;
pub mod setting;
pub mod storage;
pub mod store;

pub use config::Config;
pub use editor::ConfigEditorPresenter;
pub use error::ConfigError;
pub use filter::UrlFilter;
pub use setting::{LabelSetting, Lane};
pub use storage::{ConfigStorage, FileStorage, MemoryStorage, StorageChange};
pub use store::ConfigStore;
