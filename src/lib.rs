//! grabarr-browser - remote directory browser for grabarr remotes
//!
//! Lets a user pick a directory on a configured remote while a transfer
//! job is being set up. Listings go through a short-lived browse session
//! on the grabarr API when one can be opened, and through stateless
//! listing calls otherwise.

pub mod backend;
pub mod browser;
pub mod config;

pub use backend::{BrowseBackend, BrowseError, DirectoryEntry, HttpBrowseBackend, RemoteTarget};
pub use browser::{spawn_browser, BrowserController, BrowserHandle, BrowserOptions, CopyMode};
pub use config::{BrowserConfig, ConfigStorage};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global tracing subscriber. `RUST_LOG` overrides the default `info` level.
pub fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}
