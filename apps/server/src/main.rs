use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;
use vidprompt_core::{DiskVideoStore, OpenAiCompatClient};
use vidprompt_server::{AppState, CliArgs, ServerConfig, VidpromptServer};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = CliArgs::parse();
    let provider = args.provider();

    // Validate API key early
    let client = OpenAiCompatClient::from_provider(&provider)
        .with_context(|| format!("cannot use {}", provider.name()))?;

    let store = DiskVideoStore::new(args.store_dir());
    let model = args.model();
    tracing::info!(
        provider = provider.name(),
        model = %model,
        store = %store.root().display(),
        "configured completion relay"
    );

    let state = AppState {
        store: Arc::new(store),
        client: Arc::new(client),
        model,
        relay: args.relay_config(),
    };

    VidpromptServer::new(state, ServerConfig::from(&args))
        .run()
        .await?;

    Ok(())
}
