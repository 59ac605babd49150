//! grabarr-browse - list a directory on a grabarr remote
//!
//! ```text
//! grabarr-browse <remote-id> [path]
//! ```
//!
//! Connection settings come from `~/.grabarr/browser.json` and the
//! `GRABARR_*` environment variables.

use std::process::ExitCode;
use std::sync::Arc;

use grabarr_browser_lib::browser::BrowseMode;
use grabarr_browser_lib::{
    init_tracing, spawn_browser, BrowserOptions, ConfigStorage, HttpBrowseBackend, RemoteTarget,
};

const VERSION: &str = env!("CARGO_PKG_VERSION");

fn usage() {
    eprintln!("usage: grabarr-browse <remote-id> [path]");
}

#[tokio::main]
async fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();
    if args.len() > 1 && (args[1] == "--version" || args[1] == "-V") {
        println!("grabarr-browse {}", VERSION);
        return ExitCode::SUCCESS;
    }
    if args.len() < 2 || args.len() > 3 || args[1] == "--help" || args[1] == "-h" {
        usage();
        return ExitCode::from(2);
    }

    init_tracing();

    let target = RemoteTarget::new(args[1].as_str());
    let path = args.get(2).cloned().unwrap_or_default();

    let config = match ConfigStorage::new() {
        Ok(storage) => storage.load_effective().await,
        Err(e) => Err(e),
    };
    let config = match config {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let backend = match HttpBrowseBackend::new(&config) {
        Ok(backend) => Arc::new(backend),
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let handle = spawn_browser(
        backend,
        BrowserOptions {
            initial_target: Some(target),
            ..Default::default()
        },
    );
    let controller = handle.controller;

    let snapshot = async {
        if !path.is_empty() {
            controller.navigate(&path).await?;
        }
        controller.wait_settled().await
    }
    .await;

    let code = match snapshot {
        Ok(snapshot) => {
            if snapshot.mode == BrowseMode::Fallback {
                tracing::info!("No browse session available, listed statelessly");
            }
            match snapshot.error {
                Some(error) => {
                    eprintln!("error: {}", error);
                    ExitCode::FAILURE
                }
                None => {
                    for entry in &snapshot.entries {
                        let kind = if entry.is_directory { 'd' } else { '-' };
                        println!("{} {:>12} {}", kind, entry.size_bytes, entry.name);
                    }
                    ExitCode::SUCCESS
                }
            }
        }
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    };

    // Resolves after the session close has been answered
    if let Err(e) = controller.shutdown().await {
        tracing::debug!("Browser already stopped: {}", e);
    }
    code
}
