use std::sync::{Arc, Mutex};

use anyhow::Result;
use vatmap_app::{AppState, Config, LoggingRenderer, Scheduler, SharedRenderer};
use vatmap_feed::FeedClient;

#[tokio::main]
async fn main() -> Result<()> {
    vatmap_app::logging::init_tracing()?;

    let config = Config::from_env();
    tracing::info!(feed_url = %config.feed_url, "starting vatmap runtime");

    let state = Arc::new(AppState::new(config.cluster));
    let renderer: SharedRenderer = Arc::new(Mutex::new(LoggingRenderer));
    let client = Arc::new(FeedClient::new(config.feed_url.clone()));

    let scheduler = Scheduler::start(&config, state, renderer, client);

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutdown requested");
    scheduler.shutdown().await;
    Ok(())
}
