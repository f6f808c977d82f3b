//! HTTP routes for the rate service.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{get, patch};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;
use tracing::debug;

use gamerate_common::{GameRateError, RateSymbol};
use gamerate_rates::SharedRateCache;

use crate::error::ApiError;

/// Shared state for rate handlers.
pub struct AppState {
    pub cache: SharedRateCache,
}

/// Body of a single-rate response.
#[derive(Debug, Serialize, Deserialize)]
pub struct RateValue {
    pub value: f64,
}

/// Assemble the service router with the API nested under `api_prefix`.
pub fn router(state: Arc<AppState>, api_prefix: &str) -> Router {
    let api = Router::new()
        .route("/update/{symbol}", patch(update_one))
        .route("/currency/{symbol}", get(get_one))
        .route("/currencyall", get(get_all))
        .route("/updateall", patch(update_all));

    let prefix = api_prefix.trim_end_matches('/');
    let app = if prefix.is_empty() {
        Router::new().merge(api)
    } else {
        Router::new().nest(prefix, api)
    };

    app.route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn parse_symbol(raw: &str) -> Result<RateSymbol, ApiError> {
    raw.parse().map_err(|e: GameRateError| {
        debug!(symbol = raw, "Unknown currency symbol");
        ApiError::BadRequest(e.to_string())
    })
}

async fn update_one(
    State(state): State<Arc<AppState>>,
    Path(symbol): Path<String>,
) -> Result<String, ApiError> {
    let symbol = parse_symbol(&symbol)?;
    let value = state
        .cache
        .refresh(symbol)
        .await
        .map_err(|e| ApiError::BadRequest(format!("rate feed error: {}", e)))?;

    Ok(format!("Rate {} updated: {}", symbol, value))
}

async fn get_one(
    State(state): State<Arc<AppState>>,
    Path(symbol): Path<String>,
) -> Result<Json<RateValue>, ApiError> {
    let symbol = parse_symbol(&symbol)?;
    let value = state.cache.get(symbol).await;
    Ok(Json(RateValue { value }))
}

async fn get_all(State(state): State<Arc<AppState>>) -> Json<BTreeMap<RateSymbol, f64>> {
    Json(state.cache.snapshot().await)
}

async fn update_all(State(state): State<Arc<AppState>>) -> String {
    let report = state.cache.refresh_all().await;
    format!(
        "Rates updated: {} of {}",
        report.updated.len(),
        RateSymbol::ALL.len()
    )
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
