use utoipa::OpenApi;

use crate::models::{
    CreateMagazine, CreateProvider, DownloadJob, DownloadStatus, Magazine, Provider, SearchResult,
};
use crate::services::monitor::DownloadEntry;
use crate::services::scheduler::JobStatus;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Gazarr API",
        version = "1.0.0"
    ),
    paths(
        crate::api::handlers::system::health,
        crate::api::handlers::system::test_engine,
        crate::api::handlers::system::scheduler_jobs,
        crate::api::handlers::jobs::list_jobs,
        crate::api::handlers::downloads::list_downloads,
        crate::api::handlers::scan::trigger_scan,
        crate::api::handlers::library::list_magazines,
        crate::api::handlers::library::create_magazine,
        crate::api::handlers::library::list_providers,
        crate::api::handlers::library::create_provider
    ),
    tags(
        (name = "jobs", description = "Download job endpoints"),
        (name = "downloads", description = "Completed downloads endpoints"),
        (name = "scan", description = "Auto-download scan trigger"),
        (name = "library", description = "Magazine and provider management"),
        (name = "system", description = "Health and diagnostics")
    ),
    components(schemas(
        DownloadJob,
        DownloadStatus,
        Magazine,
        CreateMagazine,
        Provider,
        CreateProvider,
        SearchResult,
        DownloadEntry,
        JobStatus
    ))
)]
pub struct ApiDoc;
