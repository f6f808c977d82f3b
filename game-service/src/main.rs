//! GameRate Game Service Binary
//!
//! Prices catalog items in USD, EUR, GBP, RUB and BTC.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gamerate_catalog::{MemoryCatalogStore, PgCatalogStore, PgStoreConfig, SharedCatalogStore};
use gamerate_games::{router, AppState, GameServiceConfig};
use gamerate_pricing::{
    ingest_catalog, CurrencyApiClient, Metrics, PriceEngine, PriceFeed, SteamStoreClient,
};

/// GameRate game service CLI
#[derive(Parser, Debug)]
#[command(name = "gameapp")]
#[command(about = "Converts catalog prices through BTC")]
struct Args {
    /// Listen address
    #[arg(short, long)]
    listen: Option<String>,

    /// API prefix
    #[arg(long)]
    api_prefix: Option<String>,

    /// Postgres URL (in-memory catalog when unset)
    #[arg(long)]
    database_url: Option<String>,

    /// Rate service base URL
    #[arg(long)]
    currency_api_url: Option<String>,

    /// Outbound request timeout in seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Skip the startup catalog ingestion
    #[arg(long)]
    no_ingest: bool,

    /// Fetch the base price on every conversion
    #[arg(long)]
    always_refresh: bool,
}

impl Args {
    fn apply(self, config: &mut GameServiceConfig) {
        if let Some(listen) = self.listen {
            config.listen_addr = listen;
        }
        if let Some(prefix) = self.api_prefix {
            config.api_prefix = prefix;
        }
        if let Some(url) = self.database_url {
            config.database_url = url;
        }
        if let Some(url) = self.currency_api_url {
            config.currency_api.base_url = url;
        }
        if let Some(secs) = self.timeout_secs {
            config.set_request_timeout(Duration::from_secs(secs));
        }
        if self.no_ingest {
            config.ingest_on_start = false;
        }
        if self.always_refresh {
            config.engine.always_refresh_base = true;
        }
    }
}

async fn open_store(config: &GameServiceConfig) -> anyhow::Result<SharedCatalogStore> {
    if config.database_url.is_empty() {
        warn!("No database URL configured, using in-memory catalog");
        return Ok(Arc::new(MemoryCatalogStore::new()));
    }

    let store = PgCatalogStore::connect(&PgStoreConfig::new(config.database_url.clone())).await?;
    store.migrate().await?;
    info!("Connected to catalog database");
    Ok(Arc::new(store))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = GameServiceConfig::from_env();
    args.apply(&mut config);

    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| config.log_level.clone()),
        ))
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    info!("Starting GameRate game service");

    if let Err(e) = config.validate() {
        error!(error = %e, "Invalid configuration");
        return Err(anyhow::anyhow!("Configuration error: {}", e));
    }

    let store = open_store(&config).await?;
    let feed: Arc<dyn PriceFeed> = Arc::new(SteamStoreClient::new(config.store_feed.clone())?);
    let rates = Arc::new(CurrencyApiClient::new(config.currency_api.clone())?);

    if config.ingest_on_start {
        match ingest_catalog(store.as_ref(), feed.as_ref()).await {
            Ok(report) => info!(
                fetched = report.fetched,
                inserted = report.inserted,
                "Catalog ingested"
            ),
            Err(e) => error!(error = %e, "Catalog ingestion failed, serving existing catalog"),
        }
    }

    let engine = Arc::new(PriceEngine::new(
        store,
        feed,
        rates,
        Arc::new(Metrics::new()),
        config.engine.clone(),
    ));

    let locks = engine.locks();
    let prune_interval = config.engine.lock_config.prune_interval;
    tokio::spawn(async move {
        locks.run_prune_loop(prune_interval).await;
    });

    let app = router(Arc::new(AppState { engine }), &config.api_prefix);

    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    info!(
        listen_addr = %config.listen_addr,
        api_prefix = %config.api_prefix,
        currency_api = %config.currency_api.base_url,
        "Game service running"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Game service shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
