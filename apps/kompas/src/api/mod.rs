//! # Kompas HTTP API Module
//!
//! This module implements the HTTP REST API server using axum.
//!
//! ## Endpoints
//!
//! - `GET /health` - Health check
//! - `GET /status` - Pipeline overview
//! - `GET /stage/{slug}` - Show a stage with its calculations
//! - `POST /stage/{slug}` - Merge a patch into a stage draft
//! - `POST /stage/{slug}/confirm` - Confirm a stage
//! - `POST /coefficient` - Growth coefficient from four scores
//! - `POST /roi` - BD ROI for a channel spend
//! - `POST /allocation` - Optimal BD budget allocation
//! - `POST /scenarios` - What-if growth scenarios
//! - `POST /bottlenecks` - Bottleneck analysis
//!
//! ## Configuration (Environment Variables)
//!
//! - `KOMPAS_CORS_ORIGINS`: Comma-separated list of allowed origins,
//!   or "*" for all (default: localhost only)

mod handlers;
mod types;

// Re-export handlers and types for integration tests (via `kompas::api::*`)
#[allow(unused_imports)]
pub use handlers::{
    allocation_handler, bottlenecks_handler, coefficient_handler, health_handler, roi_handler,
    scenarios_handler, stage_confirm_handler, stage_show_handler, stage_update_handler,
    status_handler,
};
#[allow(unused_imports)]
pub use types::{
    AllocationRequest, AllocationResponse, BottlenecksResponse, CoefficientRequest,
    CoefficientResponse, HealthResponse, RoiResponse, ScenariosResponse, StageResponse,
    StatusResponse,
};

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    routing::{get, post},
};
use kompas_core::{KompasError, Pipeline};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

// =============================================================================
// SERVER STATE
// =============================================================================

/// Shared server state containing the assessment pipeline.
#[derive(Clone)]
pub struct AppState {
    /// The pipeline over its document store.
    pub pipeline: Arc<RwLock<Pipeline>>,
}

impl AppState {
    /// Create new app state with a pipeline.
    #[must_use]
    pub fn new(pipeline: Pipeline) -> Self {
        Self {
            pipeline: Arc::new(RwLock::new(pipeline)),
        }
    }
}

// =============================================================================
// CORS CONFIGURATION
// =============================================================================

/// Build CORS layer from environment configuration.
///
/// Reads `KOMPAS_CORS_ORIGINS` environment variable:
/// - If "*": allows all origins (development mode - use with caution!)
/// - If not set: defaults to localhost only (restrictive default)
/// - Otherwise: parses comma-separated list of allowed origins
fn build_cors_layer() -> CorsLayer {
    let origins_env = std::env::var("KOMPAS_CORS_ORIGINS").ok();

    match origins_env.as_deref() {
        Some("*") => {
            tracing::warn!(
                "CORS: Allowing ALL origins (KOMPAS_CORS_ORIGINS=*). This is insecure for production!"
            );
            CorsLayer::permissive()
        }
        Some(origins) => {
            let allowed_origins: Vec<HeaderValue> = origins
                .split(',')
                .filter_map(|s| {
                    let trimmed = s.trim();
                    match trimmed.parse::<HeaderValue>() {
                        Ok(hv) => {
                            tracing::info!("CORS: Allowing origin: {}", trimmed);
                            Some(hv)
                        }
                        Err(e) => {
                            tracing::warn!("CORS: Invalid origin '{}': {}", trimmed, e);
                            None
                        }
                    }
                })
                .collect();

            if allowed_origins.is_empty() {
                tracing::warn!(
                    "CORS: No valid origins in KOMPAS_CORS_ORIGINS, defaulting to localhost only"
                );
                build_localhost_cors()
            } else {
                CorsLayer::new()
                    .allow_origin(allowed_origins)
                    .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                    .allow_headers([header::CONTENT_TYPE])
            }
        }
        None => {
            tracing::info!("CORS: No KOMPAS_CORS_ORIGINS set, defaulting to localhost only");
            build_localhost_cors()
        }
    }
}

/// Build a restrictive CORS layer that only allows localhost origins.
fn build_localhost_cors() -> CorsLayer {
    let localhost_origins = vec![
        "http://localhost:3000".parse::<HeaderValue>().ok(),
        "http://localhost:8080".parse::<HeaderValue>().ok(),
        "http://127.0.0.1:3000".parse::<HeaderValue>().ok(),
        "http://127.0.0.1:8080".parse::<HeaderValue>().ok(),
    ];
    let origins: Vec<HeaderValue> = localhost_origins.into_iter().flatten().collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}

// =============================================================================
// ROUTER CREATION
// =============================================================================

/// Create the axum router with all endpoints and middleware.
///
/// Middleware stack (outer to inner):
/// 1. Tracing - logs all requests
/// 2. CORS - handles preflight requests
/// 3. Body limit - caps request payloads
pub fn create_router(state: AppState) -> Router {
    let cors = build_cors_layer();

    Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/status", get(handlers::status_handler))
        .route(
            "/stage/{slug}",
            get(handlers::stage_show_handler).post(handlers::stage_update_handler),
        )
        .route(
            "/stage/{slug}/confirm",
            post(handlers::stage_confirm_handler),
        )
        .route("/coefficient", post(handlers::coefficient_handler))
        .route("/roi", post(handlers::roi_handler))
        .route("/allocation", post(handlers::allocation_handler))
        .route("/scenarios", post(handlers::scenarios_handler))
        .route("/bottlenecks", post(handlers::bottlenecks_handler))
        .layer(axum::extract::DefaultBodyLimit::max(256 * 1024))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// =============================================================================
// SERVER STARTUP
// =============================================================================

/// Start the HTTP server.
pub async fn run_server(addr: &str, pipeline: Pipeline) -> Result<(), KompasError> {
    let state = AppState::new(pipeline);
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| KompasError::IoError(format!("Bind failed: {}", e)))?;

    tracing::info!("Kompas HTTP server listening on {}", addr);

    axum::serve(listener, router)
        .await
        .map_err(|e| KompasError::IoError(format!("Server error: {}", e)))
}
