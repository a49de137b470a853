//! Application setup and server configuration.

use axum::{
    extract::Extension,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderName, Method,
    },
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::kernel::ServerDeps;
use crate::server::routes::{
    create_job_handler, dispatch_handler, health_handler, job_handler, job_history_handler,
    job_progress_handler, job_results_handler, job_stream_handler, websites_handler,
};

/// Shared application state
#[derive(Clone)]
pub struct AxumAppState {
    pub deps: ServerDeps,
}

/// Build the Axum application router
pub fn build_app(deps: ServerDeps) -> Router {
    let app_state = AxumAppState { deps };

    // CORS configuration - browser dashboard calls from any origin
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            AUTHORIZATION,
            CONTENT_TYPE,
            HeaderName::from_static("apikey"),
            HeaderName::from_static("x-client-info"),
        ]);

    Router::new()
        // Orchestration
        .route("/scrape", post(dispatch_handler))
        .route("/jobs", post(create_job_handler).get(job_history_handler))
        // Polled read surface
        .route("/jobs/:id", get(job_handler))
        .route("/jobs/:id/results", get(job_results_handler))
        .route("/jobs/:id/progress", get(job_progress_handler))
        .route("/jobs/:id/stream", get(job_stream_handler))
        .route("/websites", get(websites_handler))
        .route("/health", get(health_handler))
        // Middleware layers (applied in reverse order - last added runs first)
        .layer(Extension(app_state))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
