//! keystore-lookup - resolve keys from the command line.
//!
//! Usage: `keystore-lookup <channel>:<access>...`
//!
//! Keys are served from the JSON table named by `KEYSTORE_KEYS_FILE`.
//! See `keystore::config` for the other variables.

use std::process::ExitCode;

use anyhow::{Context, bail};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use keystore::{Config, Keystore, StaticRetriever};

fn main() -> anyhow::Result<ExitCode> {
    // Load .env file first (before anything else)
    dotenvy::dotenv().ok();

    // If RUST_LOG is not set, default to "info" level for our crate
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("keystore=info,keystore_lookup=info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let requests: Vec<String> = std::env::args().skip(1).collect();
    if requests.is_empty() {
        bail!("usage: keystore-lookup <channel>:<access>...");
    }

    let config = Config::from_env().context("invalid configuration")?;
    info!("Configuration loaded: {:?}", config);

    let keystore = match &config.keys_file {
        Some(path) => {
            let table = StaticRetriever::from_file(path).context("failed to load key table")?;
            Keystore::with_retriever(table, config.cache_config())?
        }
        None => {
            info!("No KEYSTORE_KEYS_FILE set, lookups can only miss");
            Keystore::new(config.cache_config())?
        }
    }
    .single_flight(config.single_flight);

    let mut failed = false;
    for request in &requests {
        let Some((channel, access)) = request.split_once(':') else {
            error!("Malformed request {:?}, expected <channel>:<access>", request);
            failed = true;
            continue;
        };

        match keystore.must(channel, access) {
            Ok(key) => println!("{channel}:{access} {key}"),
            Err(err) => {
                error!("{:#}", anyhow::Error::new(err));
                failed = true;
            }
        }
    }

    info!("Lookup stats: {:?}", keystore.stats());

    Ok(if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}
