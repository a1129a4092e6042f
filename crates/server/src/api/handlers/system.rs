use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use crate::state::AppState;

/// Liveness probe
#[utoipa::path(
    get,
    path = "/health",
    tag = "system",
    responses((status = 200, description = "Service is up"))
)]
pub async fn health() -> impl IntoResponse {
    "ok"
}

/// Verify download engine connectivity
#[utoipa::path(
    post,
    path = "/api/engine/test",
    tag = "system",
    responses(
        (status = 200, description = "Engine reachable"),
        (status = 502, description = "Engine unreachable"),
        (status = 503, description = "Engine not configured")
    )
)]
pub async fn test_engine(State(state): State<AppState>) -> impl IntoResponse {
    let Some(engine) = &state.engine else {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            "Download engine not configured".to_string(),
        )
            .into_response();
    };

    match engine.test().await {
        Ok(message) => (StatusCode::OK, message).into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "engine connectivity test failed");
            (StatusCode::BAD_GATEWAY, format!("Engine test failed: {}", e)).into_response()
        }
    }
}

/// Runtime status of the background jobs
#[utoipa::path(
    get,
    path = "/api/scheduler/jobs",
    tag = "system",
    responses(
        (status = 200, description = "Job statuses", body = Vec<crate::services::scheduler::JobStatus>)
    )
)]
pub async fn scheduler_jobs(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.scheduler.list_jobs().await)
}
