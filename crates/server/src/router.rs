use axum::routing::{get, post};
use axum::Router;

use crate::api::handlers::{downloads, jobs, library, scan, system};
use crate::state::AppState;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(system::health))
        .route("/api/jobs", get(jobs::list_jobs))
        .route("/api/downloads", get(downloads::list_downloads))
        .route("/api/scan", post(scan::trigger_scan))
        .route("/api/engine/test", post(system::test_engine))
        .route("/api/scheduler/jobs", get(system::scheduler_jobs))
        .route(
            "/api/magazines",
            get(library::list_magazines).post(library::create_magazine),
        )
        .route(
            "/api/providers",
            get(library::list_providers).post(library::create_provider),
        )
        .with_state(state)
}
