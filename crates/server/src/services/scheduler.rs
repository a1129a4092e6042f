pub mod actor;
pub mod auto_download_job;
pub mod handle;
pub mod messages;
pub mod monitor_job;
pub mod service;
pub mod tracker_job;
pub mod traits;

pub use auto_download_job::AutoDownloadJob;
pub use handle::SchedulerHandle;
pub use messages::{JobStatus, SchedulerError};
pub use monitor_job::MonitorJob;
pub use service::SchedulerService;
pub use tracker_job::TrackerJob;
pub use traits::{JobResult, SchedulerJob};
