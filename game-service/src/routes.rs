//! HTTP routes for the game pricing service.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;
use tracing::debug;

use gamerate_common::{CatalogId, CatalogItem, Currency};
use gamerate_pricing::{ConversionRequest, SharedPriceEngine};

use crate::error::ApiError;

/// Shared state for game handlers.
pub struct AppState {
    pub engine: SharedPriceEngine,
}

/// Form body of a conversion request.
#[derive(Debug, Default, Deserialize)]
pub struct GameForm {
    appid: Option<String>,
    currency: Option<String>,
    #[serde(default)]
    refresh: Option<String>,
}

/// Assemble the service router with the API nested under `api_prefix`.
pub fn router(state: Arc<AppState>, api_prefix: &str) -> Router {
    let api = Router::new()
        .route("/game", post(convert_game))
        .route("/aboutgame/{appid}", get(about_game));

    let prefix = api_prefix.trim_end_matches('/');
    let app = if prefix.is_empty() {
        Router::new().merge(api)
    } else {
        Router::new().nest(prefix, api)
    };

    app.route("/metrics", get(metrics))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn is_truthy(flag: &str) -> bool {
    matches!(flag.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

fn parse_form(form: &GameForm) -> Result<ConversionRequest, ApiError> {
    let appid = form
        .appid
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("missing appid".to_string()))?;
    let catalog_id = CatalogId::parse(appid)?;

    let currency = form
        .currency
        .as_deref()
        .ok_or_else(|| ApiError::BadRequest("missing currency".to_string()))?;
    let target: Currency = currency.parse()?;

    let request = ConversionRequest::new(catalog_id, target);
    Ok(match form.refresh.as_deref() {
        Some(flag) if is_truthy(flag) => request.with_refresh(),
        _ => request,
    })
}

async fn convert_game(
    State(state): State<Arc<AppState>>,
    Form(form): Form<GameForm>,
) -> Result<Json<CatalogItem>, ApiError> {
    let request = parse_form(&form)?;
    debug!(catalog_id = %request.catalog_id, target = %request.target, "Conversion requested");

    state
        .engine
        .convert(request)
        .await
        .map(Json)
        .map_err(ApiError::NoContent)
}

async fn about_game(
    State(state): State<Arc<AppState>>,
    Path(appid): Path<String>,
) -> Result<Json<CatalogItem>, ApiError> {
    let catalog_id = CatalogId::parse(&appid)?;
    let item = state.engine.item(catalog_id).await?;
    Ok(Json(item))
}

async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.engine.metrics().to_prometheus(),
    )
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
