use std::sync::Arc;
use std::sync::Mutex;

use tokio::sync::mpsc;

use super::actor::SchedulerActor;
use super::handle::SchedulerHandle;
use super::messages::{JobStatus, SchedulerError, SchedulerMessage};
use super::traits::SchedulerJob;

/// Owns the scheduler actor and its registered jobs.
pub struct SchedulerService {
    jobs: Vec<Arc<dyn SchedulerJob>>,
    handle: SchedulerHandle,
    receiver: Mutex<Option<mpsc::Receiver<SchedulerMessage>>>,
}

impl SchedulerService {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::channel(32);
        Self {
            jobs: Vec::new(),
            handle: SchedulerHandle::new(sender),
            receiver: Mutex::new(Some(receiver)),
        }
    }

    pub fn with_job<J: SchedulerJob + 'static>(self, job: J) -> Self {
        self.with_arc_job(Arc::new(job))
    }

    pub fn with_arc_job(mut self, job: Arc<dyn SchedulerJob>) -> Self {
        self.jobs.push(job);
        self
    }

    /// Spawn the actor and the per-job timers. Idempotent: later calls
    /// do nothing.
    pub fn start(&self) {
        let receiver = match self.receiver.lock() {
            Ok(mut guard) => guard.take(),
            Err(_) => None,
        };
        let Some(receiver) = receiver else {
            return;
        };

        let actor = SchedulerActor::new(self.jobs.clone(), receiver, self.handle.clone());
        actor.spawn_timers();
        tokio::spawn(actor.run());
    }

    pub async fn trigger(&self, job_name: &str) -> Result<(), SchedulerError> {
        self.handle.trigger_job(job_name).await
    }

    pub async fn list_jobs(&self) -> Vec<JobStatus> {
        self.handle.list_jobs().await
    }

    /// Stop scheduling and wait for in-flight jobs to finish.
    pub async fn shutdown(&self) {
        self.handle.shutdown().await;
    }
}

impl Default for SchedulerService {
    fn default() -> Self {
        Self::new()
    }
}
