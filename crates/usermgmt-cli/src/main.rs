//! usermgmt - a command-line client for the user-management service.
//!
//! Every command opens the page it corresponds to first, so the same
//! navigation guard that gates the web UI gates the terminal too.

mod commands;
mod display;

use std::io;

use anyhow::Result;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use usermgmt_core::config::{Config, StorageBackend};
use usermgmt_core::AppContext;

/// Overrides the configured server URL
const ENV_SERVER_URL: &str = "USERMGMT_SERVER_URL";

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

/// Global options that precede the command.
#[derive(Debug, Default, PartialEq)]
struct GlobalOptions {
    server_url: Option<String>,
    storage: Option<StorageBackend>,
}

/// Split leading `--server`, `--storage` and `--ephemeral` flags from the command.
fn parse_global_options(args: &[String]) -> Result<(GlobalOptions, &[String])> {
    let mut options = GlobalOptions::default();
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--server" => {
                let value = args
                    .get(i + 1)
                    .ok_or_else(|| anyhow::anyhow!("--server needs a URL"))?;
                options.server_url = Some(value.clone());
                i += 2;
            }
            "--storage" => {
                let value = args
                    .get(i + 1)
                    .ok_or_else(|| anyhow::anyhow!("--storage needs a value"))?;
                let backend = StorageBackend::parse(value)
                    .ok_or_else(|| anyhow::anyhow!("Unknown storage backend: {}", value))?;
                options.storage = Some(backend);
                i += 2;
            }
            "--ephemeral" => {
                options.storage = Some(StorageBackend::Memory);
                i += 1;
            }
            _ => break,
        }
    }
    Ok((options, &args[i..]))
}

fn load_config(options: &GlobalOptions) -> Config {
    let mut config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            warn!(error = %e, "Failed to load config, using defaults");
            Config::default()
        }
    };

    if let Ok(url) = std::env::var(ENV_SERVER_URL) {
        config.server_url = Some(url);
    }
    if let Some(ref url) = options.server_url {
        config.server_url = Some(url.clone());
    }
    if let Some(storage) = options.storage {
        config.storage = storage;
    }
    config
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (options, command) = parse_global_options(&args)?;

    let mut config = load_config(&options);
    info!(server = config.server_url(), storage = ?config.storage, "usermgmt starting");

    let store = config.open_store()?;
    let mut ctx = AppContext::init(&config, store)?;

    let result = commands::run(&mut ctx, &mut config, command).await;
    ctx.shutdown();
    result
}
