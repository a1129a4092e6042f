use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Duration, Utc};
use engine::{DownloadEngine, EngineError, HistoryItem, QueueItem};
use sqlx::SqlitePool;

use crate::config::TrackerConfig;
use crate::models::{DownloadJob, DownloadStatus, JobStatusUpdate};
use crate::repositories::DownloadJobRepository;
use crate::services::ServiceError;

/// Reconciles stored jobs against the engine's queue and history.
///
/// Jobs present in neither snapshot are left untouched; a transient
/// engine hiccup must not fail everything we are tracking.
pub struct TrackerService {
    pool: SqlitePool,
    engine: Option<Arc<dyn DownloadEngine>>,
    config: std::sync::RwLock<TrackerConfig>,
}

impl TrackerService {
    pub fn new(
        pool: SqlitePool,
        engine: Option<Arc<dyn DownloadEngine>>,
        config: TrackerConfig,
    ) -> Self {
        Self {
            pool,
            engine,
            config: std::sync::RwLock::new(config),
        }
    }

    /// Swap settings; takes effect from the next cycle.
    pub fn update_config(&self, config: TrackerConfig) {
        let mut guard = self.config.write().unwrap_or_else(|e| e.into_inner());
        *guard = config;
    }

    fn current_config(&self) -> TrackerConfig {
        self.config.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Run one reconciliation pass. Returns the number of jobs refreshed.
    pub async fn sync_once(&self) -> Result<usize, ServiceError> {
        let config = self.current_config();
        let jobs = DownloadJobRepository::list_non_terminal(&self.pool).await?;
        if jobs.is_empty() {
            return Ok(0);
        }

        let Some(engine) = &self.engine else {
            tracing::debug!("download engine not configured, skipping tracker pass");
            return Ok(0);
        };

        let queue = match engine.fetch_queue().await {
            Ok(queue) => queue,
            Err(EngineError::NotConfigured) => {
                tracing::debug!("download engine not configured, skipping tracker pass");
                return Ok(0);
            }
            Err(e) => return Err(e.into()),
        };
        let limit = config.history_limit.max(queue.len() as u32 + 20);
        let history = engine.fetch_history(limit).await?;

        let queue_map: HashMap<&str, &QueueItem> = queue
            .iter()
            .filter_map(|item| item.external_id.as_deref().map(|id| (id, item)))
            .collect();
        let history_map: HashMap<&str, &HistoryItem> = history
            .iter()
            .filter_map(|item| item.external_id.as_deref().map(|id| (id, item)))
            .collect();

        let mut refreshed = 0;
        for job in &jobs {
            let Some(engine_id) = job.engine_id.as_deref() else {
                continue;
            };

            // Queue wins over history for jobs present in both.
            let update = if let Some(item) = queue_map.get(engine_id) {
                Some(queue_update(job, item))
            } else if let Some(item) = history_map.get(engine_id) {
                Some(history_update(item))
            } else {
                None
            };

            if let Some(update) = update {
                DownloadJobRepository::apply_status_update(&self.pool, job.id, update).await?;
                refreshed += 1;
            }
        }

        self.auto_fail_stalled(&jobs, &config).await?;

        Ok(refreshed)
    }

    /// Fail jobs that have shown no engine activity for too long.
    async fn auto_fail_stalled(
        &self,
        jobs: &[DownloadJob],
        config: &TrackerConfig,
    ) -> Result<(), ServiceError> {
        if !config.auto_fail_enabled || config.auto_fail_minutes <= 0.0 {
            return Ok(());
        }

        let threshold = Duration::milliseconds((config.auto_fail_minutes * 60_000.0) as i64);
        let now = Utc::now();

        for job in jobs {
            // Re-read: this pass may just have refreshed the job.
            let Some(current) = DownloadJobRepository::get_by_id(&self.pool, job.id).await? else {
                continue;
            };
            if !is_watched(&current.status) {
                continue;
            }

            let mut reference = current.created_at;
            if current.updated_at > reference {
                reference = current.updated_at;
            }
            if let Some(seen) = current.last_seen {
                if seen > reference {
                    reference = seen;
                }
            }

            if now - reference > threshold {
                let message = format!(
                    "Auto-failed after {}m without download progress",
                    format_minutes(config.auto_fail_minutes)
                );
                tracing::warn!(job_id = current.id, title = %current.title, "auto-failing stalled job");
                DownloadJobRepository::mark_failed(&self.pool, current.id, &message).await?;
            }
        }

        Ok(())
    }
}

/// Statuses eligible for the stall sweep.
fn is_watched(status: &DownloadStatus) -> bool {
    matches!(
        status,
        DownloadStatus::Pending
            | DownloadStatus::Queued
            | DownloadStatus::Downloading
            | DownloadStatus::Processing
            | DownloadStatus::Paused
    )
}

fn format_minutes(minutes: f64) -> String {
    if minutes.fract() == 0.0 {
        format!("{}", minutes as i64)
    } else {
        format!("{}", minutes)
    }
}

/// Map a raw engine queue status onto the job lifecycle.
pub fn map_queue_status(raw: Option<&str>) -> DownloadStatus {
    let Some(raw) = raw else {
        return DownloadStatus::Queued;
    };
    let normalized = raw.trim().to_lowercase();
    if normalized.contains("down") {
        DownloadStatus::Downloading
    } else if normalized.contains("post")
        || normalized.contains("check")
        || normalized.contains("extract")
    {
        DownloadStatus::Processing
    } else if normalized.contains("pause") {
        DownloadStatus::Paused
    } else if normalized.contains("queue") || normalized.contains("wait") {
        DownloadStatus::Queued
    } else {
        DownloadStatus::parse(&normalized.replace(' ', "_"))
    }
}

/// Map a raw engine history status onto the job lifecycle.
pub fn map_history_status(raw: Option<&str>) -> DownloadStatus {
    let Some(raw) = raw else {
        return DownloadStatus::Completed;
    };
    let normalized = raw.trim().to_lowercase();
    match normalized.as_str() {
        "completed" => DownloadStatus::Completed,
        "failed" | "failure" => DownloadStatus::Failed,
        _ => DownloadStatus::parse(&normalized.replace(' ', "_")),
    }
}

fn queue_update(job: &DownloadJob, item: &QueueItem) -> JobStatusUpdate {
    let status = map_queue_status(item.raw_status.as_deref());
    let timeleft = item
        .time_remaining
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string);

    let message = match (&status, &timeleft) {
        (DownloadStatus::Queued | DownloadStatus::Downloading, Some(t)) => {
            Some(format!("{} remaining", t))
        }
        _ => timeleft.clone().or_else(|| job.message.clone()),
    };

    JobStatusUpdate {
        status: Some(status),
        engine_status: item.raw_status.clone(),
        progress: item.percent,
        time_remaining: Some(timeleft),
        message: Some(message),
        content_name: item.display_name.clone(),
        ..Default::default()
    }
}

fn history_update(item: &HistoryItem) -> JobStatusUpdate {
    let status = map_history_status(item.raw_status.as_deref());

    let mut update = JobStatusUpdate {
        status: Some(status.clone()),
        engine_status: item.raw_status.clone(),
        content_name: item.display_name.clone(),
        ..Default::default()
    };

    match status {
        DownloadStatus::Completed => {
            update.progress = Some(100.0);
            update.time_remaining = Some(None);
            update.message = Some(Some("Awaiting import into library".to_string()));
            update.completed_at = Some(item.completed_at.unwrap_or_else(Utc::now));
        }
        DownloadStatus::Failed => {
            update.message = Some(Some(
                item.failure_message
                    .clone()
                    .unwrap_or_else(|| "Download failed".to_string()),
            ));
        }
        _ => {}
    }

    update
}
