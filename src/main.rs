/// Profile Seeker - public profile lookup service
///
/// Resolves social profiles through several upstream access strategies,
/// keeps an append-only log of searches, and serves a small admin view
/// over that log.

mod admin;
mod api;
mod auth;
mod config;
mod context;
mod db;
mod error;
mod gateway;
mod jobs;
mod metrics;
mod profile;
mod rate_limit;
mod search_log;
mod server;

use config::ServerConfig;
use context::AppContext;
use error::SeekerResult;
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> SeekerResult<()> {
    // Load configuration
    let config = ServerConfig::from_env()?;

    // Initialize logging
    init_logging(&config.logging.level, config.logging.json);

    tracing::info!("Profile Seeker v{}", env!("CARGO_PKG_VERSION"));

    // Create application context
    let ctx = AppContext::new(config).await?;

    // Start background jobs
    let scheduler = Arc::new(jobs::JobScheduler::new(Arc::new(ctx.clone())));
    scheduler.start();

    // Start server
    server::serve(ctx).await?;

    Ok(())
}

/// `RUST_LOG` wins over the configured filter when set
fn init_logging(level: &str, json: bool) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new(config::DEFAULT_LOG_FILTER));

    let fmt_layer = if json {
        fmt::layer().json().with_current_span(false).boxed()
    } else {
        fmt::layer().boxed()
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}
