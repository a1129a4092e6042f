pub mod download_job;
pub mod magazine;
pub mod provider;
pub mod search;

pub use download_job::{DownloadJob, DownloadStatus, JobStatusUpdate, UpsertDownloadJob};
pub use magazine::{CreateMagazine, Magazine};
pub use provider::{CreateProvider, Provider};
pub use search::SearchResult;
