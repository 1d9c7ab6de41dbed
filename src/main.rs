use anyhow::{anyhow, Context};
use std::io::Read;
use tracing::info;

use fanta_scout::core::config::load_scout_config;
use fanta_scout::{ScoutEngine, ScrapeRequest, SqliteStore};

const ENV_REQUEST: &str = "FANTA_SCOUT_REQUEST";

/// Request source: first positional argument (a path, or `-` for stdin),
/// else the `FANTA_SCOUT_REQUEST` env var holding inline JSON.
fn read_request() -> anyhow::Result<String> {
    match std::env::args().nth(1).as_deref() {
        Some("-") => {
            let mut raw = String::new();
            std::io::stdin()
                .read_to_string(&mut raw)
                .context("read request from stdin")?;
            Ok(raw)
        }
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("read request file {}", path))
        }
        None => std::env::var(ENV_REQUEST).map_err(|_| {
            anyhow!("usage: fanta-scout <request.json | -> (or set {})", ENV_REQUEST)
        }),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,chromiumoxide=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let request: ScrapeRequest =
        serde_json::from_str(&read_request()?).context("parse scrape request")?;

    let config = load_scout_config();
    let db_path = config.storage.resolve_database_path();
    info!("snapshots database: {}", db_path.display());
    let store = SqliteStore::open(&db_path)?;

    let engine = ScoutEngine::new(config, store);
    let report = engine.run(&request).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
