//! GameRate Currency Service Binary
//!
//! Serves BTC ask prices and refreshes them on a fixed interval.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gamerate_currency::{router, AppState, CurrencyServiceConfig};
use gamerate_rates::{BitcoinAverageProvider, MemoryStore, RateCache};

/// GameRate currency service CLI
#[derive(Parser, Debug)]
#[command(name = "currency")]
#[command(about = "Serves BTC exchange rates over HTTP")]
struct Args {
    /// Listen address
    #[arg(short, long)]
    listen: Option<String>,

    /// API prefix
    #[arg(long)]
    api_prefix: Option<String>,

    /// Minutes between scheduled rate refreshes
    #[arg(short, long)]
    refresh_minutes: Option<u64>,

    /// Rate feed public key
    #[arg(long)]
    public_key: Option<String>,

    /// Rate feed secret key
    #[arg(long)]
    secret_key: Option<String>,
}

impl Args {
    fn apply(self, config: &mut CurrencyServiceConfig) {
        if let Some(listen) = self.listen {
            config.listen_addr = listen;
        }
        if let Some(prefix) = self.api_prefix {
            config.api_prefix = prefix;
        }
        if let Some(minutes) = self.refresh_minutes {
            config.refresh_interval = Duration::from_secs(minutes * 60);
        }
        if let Some(key) = self.public_key {
            config.feed.public_key = key;
        }
        if let Some(key) = self.secret_key {
            config.feed.secret_key = key;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = CurrencyServiceConfig::from_env();
    args.apply(&mut config);

    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| config.log_level.clone()),
        ))
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    info!("Starting GameRate currency service");

    if let Err(e) = config.validate() {
        error!(error = %e, "Invalid configuration");
        return Err(anyhow::anyhow!("Configuration error: {}", e));
    }

    let provider = Arc::new(BitcoinAverageProvider::new(config.feed.clone())?);
    let cache = Arc::new(RateCache::new(Arc::new(MemoryStore::new()), provider));
    cache.init().await;

    if config.refresh_on_start {
        let cache = cache.clone();
        tokio::spawn(async move {
            cache.refresh_all().await;
        });
    }

    let refresher = cache.clone();
    let interval = config.refresh_interval;
    tokio::spawn(async move {
        refresher.run_refresh_loop(interval).await;
    });

    let app = router(Arc::new(AppState { cache }), &config.api_prefix);

    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    info!(
        listen_addr = %config.listen_addr,
        api_prefix = %config.api_prefix,
        refresh_secs = interval.as_secs(),
        "Currency service running"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Currency service shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
