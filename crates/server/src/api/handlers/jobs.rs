use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use crate::repositories::DownloadJobRepository;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct JobsQuery {
    pub limit: Option<i64>,
}

/// List tracked download jobs, most recently touched first
#[utoipa::path(
    get,
    path = "/api/jobs",
    tag = "jobs",
    responses(
        (status = 200, description = "Download jobs", body = Vec<crate::models::DownloadJob>),
        (status = 500, description = "Database error")
    )
)]
pub async fn list_jobs(
    State(state): State<AppState>,
    Query(query): Query<JobsQuery>,
) -> impl IntoResponse {
    let limit = query.limit.unwrap_or(100).clamp(1, 500);
    match DownloadJobRepository::list_recent(&state.db, limit).await {
        Ok(jobs) => Json(jobs).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "failed to list download jobs");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to list jobs: {}", e),
            )
                .into_response()
        }
    }
}
