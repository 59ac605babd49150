//! Configuration Management Module
//!
//! Persistent connection settings for the grabarr API, with environment
//! overrides for headless use.

pub mod storage;
pub mod types;

pub use storage::{config_dir, config_file, ConfigStorage, StorageError};
pub use types::{BrowserConfig, DEFAULT_API_BASE_URL};
