use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use super::traits::{JobResult, SchedulerJob};
use crate::services::AutoDownloadService;

/// Periodic auto-download scan.
pub struct AutoDownloadJob {
    service: Arc<AutoDownloadService>,
    interval: Duration,
}

impl AutoDownloadJob {
    pub fn new(service: Arc<AutoDownloadService>, interval: Duration) -> Self {
        Self { service, interval }
    }
}

#[async_trait]
impl SchedulerJob for AutoDownloadJob {
    fn name(&self) -> &'static str {
        "AutoDownload"
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    async fn execute(&self) -> JobResult {
        let enqueued = self.service.scan().await?;
        if enqueued > 0 {
            tracing::info!(enqueued, "auto-download job enqueued new issues");
        }
        Ok(())
    }
}
