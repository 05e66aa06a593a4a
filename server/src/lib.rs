use axum::{extract::{Query, State}, http::{HeaderMap, StatusCode}, routing::{get, post}, Json, Router};
use search_core::{IndexService, SearchResult, ServiceStats};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub const DEFAULT_TOP_N_MAX: usize = 100;

#[derive(Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
    #[serde(default = "default_k")]
    pub k: usize,
}
fn default_k() -> usize { 50 }

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub took_s: f64,
    pub total_hits: usize,
    pub results: Vec<SearchResult>,
}

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<IndexService>,
    pub top_n_max: usize,
    pub admin_token: Option<String>,
}

pub fn build_app(state: AppState) -> Router {
    // CORS: read CORS_ALLOW_ORIGIN (comma-separated) or allow Any by default
    let cors = match std::env::var("CORS_ALLOW_ORIGIN") {
        Ok(val) => {
            let origins: Vec<_> = val.split(',').filter_map(|s| s.trim().parse().ok()).collect();
            if origins.is_empty() {
                CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
            } else {
                CorsLayer::new().allow_origin(AllowOrigin::list(origins)).allow_methods(Any).allow_headers(Any)
            }
        }
        Err(_) => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
    };

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/search", get(search_handler))
        .route("/stats", get(stats_handler))
        .route("/index/reload", post(reload_handler))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

pub async fn search_handler(State(state): State<AppState>, Query(params): Query<SearchParams>) -> Json<SearchResponse> {
    let start = std::time::Instant::now();
    let k = params.k.clamp(1, state.top_n_max.max(1));
    let results = state.service.query(&params.q, k);
    Json(SearchResponse {
        total_hits: results.len(),
        took_s: start.elapsed().as_secs_f64(),
        query: params.q,
        results,
    })
}

pub async fn stats_handler(State(state): State<AppState>) -> Json<ServiceStats> {
    Json(state.service.stats())
}

async fn reload_handler(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<ServiceStats>, (StatusCode, String)> {
    authorize(&state, &headers)?;
    let service = Arc::clone(&state.service);
    match tokio::task::spawn_blocking(move || service.reload()).await {
        Ok(Ok(stats)) => Ok(Json(stats)),
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "manual reload failed, keeping previous index");
            Err((StatusCode::INTERNAL_SERVER_ERROR, format!("reload failed: {e}")))
        }
        Err(e) => Err((StatusCode::INTERNAL_SERVER_ERROR, format!("reload task failed: {e}"))),
    }
}

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), (StatusCode, String)> {
    let required = match &state.admin_token {
        Some(t) => t,
        None => return Err((StatusCode::UNAUTHORIZED, "ADMIN_TOKEN not set".into())),
    };
    let provided = headers.get("X-ADMIN-TOKEN").and_then(|v| v.to_str().ok()).unwrap_or("");
    if provided == required {
        Ok(())
    } else {
        Err((StatusCode::UNAUTHORIZED, "invalid admin token".into()))
    }
}

/// Reload the index every `every` until the runtime shuts down. Failures are
/// logged and the previous snapshot keeps serving.
pub fn spawn_reload_loop(service: Arc<IndexService>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        // First tick completes immediately; the startup load already covered it.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let svc = Arc::clone(&service);
            match tokio::task::spawn_blocking(move || svc.reload()).await {
                Ok(Ok(_)) => {}
                Ok(Err(e)) => tracing::warn!(error = %e, "scheduled reload failed, keeping previous index"),
                Err(e) => tracing::error!(error = %e, "reload task panicked"),
            }
        }
    })
}
