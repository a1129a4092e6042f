use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use super::traits::{JobResult, SchedulerJob};
use crate::services::TrackerService;

/// Periodic queue/history reconciliation.
pub struct TrackerJob {
    service: Arc<TrackerService>,
    interval: Duration,
}

impl TrackerJob {
    pub fn new(service: Arc<TrackerService>, interval: Duration) -> Self {
        Self { service, interval }
    }
}

#[async_trait]
impl SchedulerJob for TrackerJob {
    fn name(&self) -> &'static str {
        "DownloadTracker"
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    async fn execute(&self) -> JobResult {
        let refreshed = self.service.sync_once().await?;
        tracing::debug!(refreshed, "tracker pass finished");
        Ok(())
    }
}
