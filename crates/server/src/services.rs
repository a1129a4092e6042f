pub mod auto_download;
pub mod import;
pub mod monitor;
pub mod scheduler;
pub mod search;
pub mod tracker;

pub use auto_download::AutoDownloadService;
pub use import::{Importer, LibraryImporter};
pub use monitor::MonitorService;
pub use scheduler::{JobResult, SchedulerJob, SchedulerService};
pub use search::{ReleaseSearch, SearchService};
pub use tracker::TrackerService;

use thiserror::Error;

/// Errors surfaced by the pipeline services.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),

    #[error(transparent)]
    Engine(#[from] engine::EngineError),

    #[error(transparent)]
    Search(#[from] torznab::TorznabError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("import failed: {0}")]
    Import(String),
}
