use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use super::traits::{JobResult, SchedulerJob};
use crate::services::MonitorService;

/// Periodic completed-downloads import.
pub struct MonitorJob {
    service: Arc<MonitorService>,
    interval: Duration,
}

impl MonitorJob {
    pub fn new(service: Arc<MonitorService>, interval: Duration) -> Self {
        Self { service, interval }
    }
}

#[async_trait]
impl SchedulerJob for MonitorJob {
    fn name(&self) -> &'static str {
        "CompletionMonitor"
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    async fn execute(&self) -> JobResult {
        let moved = self.service.scan_once().await?;
        if moved > 0 {
            tracing::info!(moved, "completion monitor imported downloads");
        }
        Ok(())
    }
}
