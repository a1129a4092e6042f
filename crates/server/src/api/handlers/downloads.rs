use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use crate::state::AppState;

/// Describe the completed-downloads directory
#[utoipa::path(
    get,
    path = "/api/downloads",
    tag = "downloads",
    responses(
        (status = 200, description = "Directory entries", body = Vec<crate::services::monitor::DownloadEntry>),
        (status = 500, description = "Filesystem error")
    )
)]
pub async fn list_downloads(State(state): State<AppState>) -> impl IntoResponse {
    match state.monitor.describe_downloads() {
        Ok(entries) => Json(entries).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "failed to describe downloads");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to read downloads: {}", e),
            )
                .into_response()
        }
    }
}
