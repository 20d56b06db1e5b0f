use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::{handlers, jobs, middleware::metrics_middleware};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        // Health, config and metrics
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        .route("/metrics", get(handlers::get_metrics))
        // Chat-style entry point
        .route("/commands", post(jobs::run_command))
        // Jobs
        .route("/jobs", post(jobs::create_job))
        .route("/jobs", get(jobs::list_jobs))
        .route("/jobs/merge", post(jobs::submit_merge_indices))
        .route("/jobs/cancel", post(jobs::request_cancel))
        .route("/jobs/cancel/confirm", post(jobs::confirm_cancel))
        // Requesters
        .route("/requesters/{id}/notices", get(jobs::list_notices))
        // Published sets
        .route("/sticker-sets/{name}", delete(jobs::delete_sticker_set))
        .with_state(state);

    Router::new()
        .nest("/api/v1", api_routes)
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
}
