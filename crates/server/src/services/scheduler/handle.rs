use tokio::sync::{mpsc, oneshot};

use super::messages::{JobStatus, SchedulerError, SchedulerMessage};

/// Cloneable handle for talking to the scheduler actor.
#[derive(Clone)]
pub struct SchedulerHandle {
    sender: mpsc::Sender<SchedulerMessage>,
}

impl SchedulerHandle {
    pub fn new(sender: mpsc::Sender<SchedulerMessage>) -> Self {
        Self { sender }
    }

    /// Trigger a job by name unless it is already running.
    pub async fn trigger_job(&self, job_name: &str) -> Result<(), SchedulerError> {
        let (reply, receiver) = oneshot::channel();
        self.sender
            .send(SchedulerMessage::TriggerJob {
                job_name: job_name.to_string(),
                reply,
            })
            .await
            .map_err(|_| SchedulerError::Unavailable)?;
        receiver.await.map_err(|_| SchedulerError::Unavailable)?
    }

    /// Runtime status of every registered job.
    pub async fn list_jobs(&self) -> Vec<JobStatus> {
        let (reply, receiver) = oneshot::channel();
        if self
            .sender
            .send(SchedulerMessage::ListJobs { reply })
            .await
            .is_err()
        {
            return Vec::new();
        }
        receiver.await.unwrap_or_default()
    }

    /// Stop the scheduler and wait until in-flight jobs have finished.
    pub async fn shutdown(&self) {
        let (reply, receiver) = oneshot::channel();
        if self
            .sender
            .send(SchedulerMessage::Shutdown { reply })
            .await
            .is_err()
        {
            return;
        }
        let _ = receiver.await;
    }

    pub(super) async fn send_timer_tick(&self, job_name: &'static str) {
        let _ = self
            .sender
            .send(SchedulerMessage::TimerTick { job_name })
            .await;
    }

    pub(super) async fn send_job_completed(&self, job_name: &'static str, success: bool) {
        let _ = self
            .sender
            .send(SchedulerMessage::JobCompleted { job_name, success })
            .await;
    }
}
