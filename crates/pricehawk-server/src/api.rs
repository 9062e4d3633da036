//! HTTP API: compare, dashboard, and health routes with open CORS.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json as AxumJson, Response},
    routing::get,
    Router,
};
use serde::Deserialize;
use serde_json::json;
use tower_http::cors::CorsLayer;

use crate::error::{ServerError, ServerResult};
use crate::session::ComparisonSession;
use crate::storage::SqliteStore;

pub const DEFAULT_DASHBOARD_LIMIT: usize = 50;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub session: ComparisonSession,
    /// Read side of the product store; `None` when running without a database.
    pub dashboard: Option<Arc<SqliteStore>>,
}

#[derive(Debug, Deserialize)]
pub struct CompareParams {
    pub flipkart_url: Option<String>,
    pub amazon_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DashboardParams {
    pub limit: Option<usize>,
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = if self.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        (status, AxumJson(json!({ "error": self.to_string() }))).into_response()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handle_index))
        .route("/health", get(handle_health))
        .route("/api/compare", get(handle_compare))
        .route("/api/dashboard", get(handle_dashboard))
        .layer(CorsLayer::permissive())
        .with_state(Arc::new(state))
}

/// Bind and serve until the process is stopped.
pub async fn serve(addr: &str, state: AppState) -> ServerResult<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("HTTP API listening on {addr}");
    axum::serve(listener, app)
        .await
        .map_err(|e| ServerError::Transport(e.to_string()))
}

async fn handle_index() -> AxumJson<serde_json::Value> {
    AxumJson(json!({
        "service": "pricehawk",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": ["/health", "/api/compare", "/api/dashboard"],
    }))
}

async fn handle_health() -> AxumJson<serde_json::Value> {
    AxumJson(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn handle_compare(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CompareParams>,
) -> Result<Response, ServerError> {
    let report = state
        .session
        .compare(params.flipkart_url.as_deref(), params.amazon_url.as_deref())
        .await?;
    Ok(AxumJson(report).into_response())
}

async fn handle_dashboard(
    State(state): State<Arc<AppState>>,
    Query(params): Query<DashboardParams>,
) -> Result<Response, ServerError> {
    let store = state.dashboard.clone().ok_or(ServerError::NoDatabase)?;
    let limit = params.limit.unwrap_or(DEFAULT_DASHBOARD_LIMIT);
    let products = tokio::task::spawn_blocking(move || store.recent(limit)).await??;
    Ok(AxumJson(json!({
        "status": "success",
        "count": products.len(),
        "products": products,
    }))
    .into_response())
}
