use serde::Serialize;
use thiserror::Error;
use tokio::sync::oneshot;
use utoipa::ToSchema;

/// Messages handled by the scheduler actor.
pub enum SchedulerMessage {
    TriggerJob {
        job_name: String,
        reply: oneshot::Sender<Result<(), SchedulerError>>,
    },
    ListJobs {
        reply: oneshot::Sender<Vec<JobStatus>>,
    },
    TimerTick {
        job_name: &'static str,
    },
    JobCompleted {
        job_name: &'static str,
        success: bool,
    },
    /// Stop scheduling, wait for in-flight jobs, then reply.
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("job not found: {0}")]
    JobNotFound(String),

    #[error("job already running: {0}")]
    JobAlreadyRunning(String),

    #[error("scheduler unavailable")]
    Unavailable,
}

/// Runtime status of one scheduled job.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct JobStatus {
    pub name: String,
    pub interval_secs: u64,
    pub is_running: bool,
}
