use async_trait::async_trait;
use std::time::Duration;

/// Result type for scheduler job execution.
pub type JobResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// A periodically executed background job.
///
/// Jobs run on their own timer and never overlap: a tick that arrives
/// while the previous execution is still running is dropped.
#[async_trait]
pub trait SchedulerJob: Send + Sync {
    /// Unique name, used for logging and manual triggering.
    fn name(&self) -> &'static str;

    /// Interval between executions.
    fn interval(&self) -> Duration;

    /// Executes the job. Errors are logged and the job retries on the
    /// next tick.
    async fn execute(&self) -> JobResult;
}
