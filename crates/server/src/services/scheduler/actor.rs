use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};

use super::handle::SchedulerHandle;
use super::messages::{JobStatus, SchedulerError, SchedulerMessage};
use super::traits::SchedulerJob;

/// Runtime state of one registered job.
struct JobEntry {
    job: Arc<dyn SchedulerJob>,
    is_running: bool,
}

/// Scheduler actor.
///
/// Jobs execute on detached tokio tasks so the actor loop stays
/// responsive; completion comes back as a message. A job that is still
/// running when its next tick or a manual trigger arrives is skipped.
pub struct SchedulerActor {
    jobs: HashMap<&'static str, JobEntry>,
    receiver: mpsc::Receiver<SchedulerMessage>,
    handle: SchedulerHandle,
    shutdown_reply: Option<oneshot::Sender<()>>,
}

impl SchedulerActor {
    pub fn new(
        jobs: Vec<Arc<dyn SchedulerJob>>,
        receiver: mpsc::Receiver<SchedulerMessage>,
        handle: SchedulerHandle,
    ) -> Self {
        let mut job_map = HashMap::new();
        for job in jobs {
            let name = job.name();
            job_map.insert(
                name,
                JobEntry {
                    job,
                    is_running: false,
                },
            );
        }

        Self {
            jobs: job_map,
            receiver,
            handle,
            shutdown_reply: None,
        }
    }

    /// Spawn the periodic tick task for every job.
    pub fn spawn_timers(&self) {
        for (name, entry) in &self.jobs {
            let handle = self.handle.clone();
            let interval = entry.job.interval();
            let job_name = *name;

            tokio::spawn(async move {
                let mut timer = tokio::time::interval(interval);
                timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

                loop {
                    timer.tick().await;
                    handle.send_timer_tick(job_name).await;
                }
            });
        }
    }

    pub async fn run(mut self) {
        tracing::info!("scheduler started with {} jobs", self.jobs.len());

        while let Some(msg) = self.receiver.recv().await {
            if self.handle_message(msg) {
                break;
            }
        }

        if let Some(reply) = self.shutdown_reply.take() {
            let _ = reply.send(());
        }
        tracing::info!("scheduler stopped");
    }

    /// Returns true once the actor should stop.
    fn handle_message(&mut self, msg: SchedulerMessage) -> bool {
        match msg {
            SchedulerMessage::TriggerJob { job_name, reply } => {
                let result = if self.shutdown_reply.is_some() {
                    Err(SchedulerError::Unavailable)
                } else {
                    self.trigger_job_by_name(&job_name)
                };
                let _ = reply.send(result);
            }

            SchedulerMessage::ListJobs { reply } => {
                let _ = reply.send(self.job_statuses());
            }

            SchedulerMessage::TimerTick { job_name } => {
                if self.shutdown_reply.is_none() {
                    self.spawn_job(job_name);
                }
            }

            SchedulerMessage::JobCompleted { job_name, success } => {
                if let Some(entry) = self.jobs.get_mut(job_name) {
                    entry.is_running = false;
                }
                if success {
                    tracing::debug!("job '{}' completed", job_name);
                } else {
                    tracing::error!("job '{}' failed", job_name);
                }
                if self.shutdown_reply.is_some() && !self.any_running() {
                    return true;
                }
            }

            SchedulerMessage::Shutdown { reply } => {
                tracing::info!("scheduler shutting down, waiting for in-flight jobs");
                self.shutdown_reply = Some(reply);
                if !self.any_running() {
                    return true;
                }
            }
        }
        false
    }

    fn any_running(&self) -> bool {
        self.jobs.values().any(|entry| entry.is_running)
    }

    fn trigger_job_by_name(&mut self, job_name: &str) -> Result<(), SchedulerError> {
        let name = self
            .jobs
            .keys()
            .find(|name| **name == job_name)
            .copied();

        match name {
            Some(name) => {
                let running = self
                    .jobs
                    .get(name)
                    .map(|entry| entry.is_running)
                    .unwrap_or(false);
                if running {
                    Err(SchedulerError::JobAlreadyRunning(job_name.to_string()))
                } else {
                    self.spawn_job(name);
                    Ok(())
                }
            }
            None => Err(SchedulerError::JobNotFound(job_name.to_string())),
        }
    }

    fn spawn_job(&mut self, name: &'static str) {
        let Some(entry) = self.jobs.get_mut(name) else {
            return;
        };

        if entry.is_running {
            tracing::debug!("job '{}' still running, skipping tick", name);
            return;
        }

        entry.is_running = true;
        let job = Arc::clone(&entry.job);
        let handle = self.handle.clone();

        tokio::spawn(async move {
            let result = job.execute().await;
            let success = result.is_ok();

            if let Err(e) = &result {
                tracing::error!("job '{}' execution error: {}", name, e);
            }

            handle.send_job_completed(name, success).await;
        });
    }

    fn job_statuses(&self) -> Vec<JobStatus> {
        self.jobs
            .iter()
            .map(|(name, entry)| JobStatus {
                name: name.to_string(),
                interval_secs: entry.job.interval().as_secs(),
                is_running: entry.is_running,
            })
            .collect()
    }
}
