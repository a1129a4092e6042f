use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::state::AppState;

/// Trigger an auto-download scan
#[utoipa::path(
    post,
    path = "/api/scan",
    tag = "scan",
    responses(
        (status = 200, description = "Scan completed"),
        (status = 409, description = "A scan is already running"),
        (status = 500, description = "Scan failed")
    )
)]
pub async fn trigger_scan(State(state): State<AppState>) -> impl IntoResponse {
    match state.auto_download.scan_now().await {
        Ok((true, enqueued)) => {
            Json(json!({ "started": true, "enqueued": enqueued })).into_response()
        }
        Ok((false, _)) => (
            StatusCode::CONFLICT,
            Json(json!({ "started": false, "enqueued": 0 })),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "manual scan failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Scan failed: {}", e),
            )
                .into_response()
        }
    }
}
