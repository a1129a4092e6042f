use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use crate::models::{CreateMagazine, CreateProvider};
use crate::repositories::{MagazineRepository, ProviderRepository};
use crate::state::AppState;

/// List followed magazines
#[utoipa::path(
    get,
    path = "/api/magazines",
    tag = "library",
    responses(
        (status = 200, description = "Magazines", body = Vec<crate::models::Magazine>),
        (status = 500, description = "Database error")
    )
)]
pub async fn list_magazines(State(state): State<AppState>) -> impl IntoResponse {
    match MagazineRepository::list_all(&state.db).await {
        Ok(magazines) => Json(magazines).into_response(),
        Err(e) => db_error(e),
    }
}

/// Follow a new magazine
#[utoipa::path(
    post,
    path = "/api/magazines",
    tag = "library",
    request_body = CreateMagazine,
    responses(
        (status = 201, description = "Magazine created", body = crate::models::Magazine),
        (status = 500, description = "Database error")
    )
)]
pub async fn create_magazine(
    State(state): State<AppState>,
    Json(data): Json<CreateMagazine>,
) -> impl IntoResponse {
    match MagazineRepository::create(&state.db, data).await {
        Ok(magazine) => (StatusCode::CREATED, Json(magazine)).into_response(),
        Err(e) => db_error(e),
    }
}

/// List configured providers
#[utoipa::path(
    get,
    path = "/api/providers",
    tag = "library",
    responses(
        (status = 200, description = "Providers", body = Vec<crate::models::Provider>),
        (status = 500, description = "Database error")
    )
)]
pub async fn list_providers(State(state): State<AppState>) -> impl IntoResponse {
    match ProviderRepository::list_all(&state.db).await {
        Ok(providers) => Json(providers).into_response(),
        Err(e) => db_error(e),
    }
}

/// Add a provider
#[utoipa::path(
    post,
    path = "/api/providers",
    tag = "library",
    request_body = CreateProvider,
    responses(
        (status = 201, description = "Provider created", body = crate::models::Provider),
        (status = 500, description = "Database error")
    )
)]
pub async fn create_provider(
    State(state): State<AppState>,
    Json(data): Json<CreateProvider>,
) -> impl IntoResponse {
    match ProviderRepository::create(&state.db, data).await {
        Ok(provider) => (StatusCode::CREATED, Json(provider)).into_response(),
        Err(e) => db_error(e),
    }
}

fn db_error(e: sqlx::Error) -> axum::response::Response {
    tracing::error!(error = %e, "database operation failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        format!("Database error: {}", e),
    )
        .into_response()
}
