//! API routes.

use axum::extract::DefaultBodyLimit;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::handlers::batch::generate_batch;
use crate::handlers::frames::extract_frames;
use crate::handlers::health::{health, ready};
use crate::handlers::jobs::get_job_status;
use crate::handlers::models::list_models;
use crate::state::AppState;

/// Create the API router.
pub fn create_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/extract-frames", post(extract_frames))
        .route("/generate-batch", post(generate_batch))
        .route("/jobs/:request_id", get(get_job_status))
        .route("/models", get(list_models));

    let health_routes = Router::new()
        .route("/health", get(health))
        .route("/healthz", get(health))
        .route("/ready", get(ready));

    // Extracted frames and generated artifacts are plain static files.
    let frames_service = ServeDir::new(&state.config.frames_dir);
    let generated_service = ServeDir::new(&state.config.generated_dir);

    Router::new()
        .nest("/api", api_routes)
        .nest_service("/frames", frames_service)
        .nest_service("/generated", generated_service)
        .merge(health_routes)
        // Raise axum's extractor limit alongside the transport-level one so
        // video uploads actually fit.
        .layer(DefaultBodyLimit::max(state.config.max_body_size))
        .layer(RequestBodyLimitLayer::new(state.config.max_body_size))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}

/// CORS layer from the configured origins; `*` means any.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE]);

    if origins.iter().any(|o| o == "*") {
        layer.allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        layer.allow_origin(AllowOrigin::list(origins))
    }
}
