use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::SqlitePool;
use utoipa::ToSchema;
use walkdir::WalkDir;

use crate::config::MonitorConfig;
use crate::models::{DownloadJob, DownloadStatus, JobStatusUpdate};
use crate::repositories::DownloadJobRepository;
use crate::services::import::{move_entry, resolve_destination, Importer};
use crate::services::ServiceError;

/// Job statuses a completed folder entry may be matched against.
const MATCHABLE: [DownloadStatus; 5] = [
    DownloadStatus::Pending,
    DownloadStatus::Queued,
    DownloadStatus::Downloading,
    DownloadStatus::Processing,
    DownloadStatus::Completed,
];

/// Watches the engine's completed-downloads directory and imports
/// settled entries that belong to a finished job.
pub struct MonitorService {
    pool: SqlitePool,
    config: std::sync::RwLock<MonitorConfig>,
    importer: Arc<dyn Importer>,
}

/// One entry of the completed-downloads directory, as shown in the API.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DownloadEntry {
    pub name: String,
    pub path: String,
    /// "file" or "dir"
    pub kind: String,
    /// Total size in bytes, recursive for directories
    pub size: u64,
    pub modified: Option<DateTime<Utc>>,
    /// Whether the settle window has passed
    pub ready: bool,
}

impl MonitorService {
    pub fn new(pool: SqlitePool, config: MonitorConfig, importer: Arc<dyn Importer>) -> Self {
        Self {
            pool,
            config: std::sync::RwLock::new(config),
            importer,
        }
    }

    /// Swap settings; takes effect from the next cycle.
    pub fn update_config(&self, config: MonitorConfig) {
        let mut guard = self.config.write().unwrap_or_else(|e| e.into_inner());
        *guard = config;
    }

    fn current_config(&self) -> MonitorConfig {
        self.config.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        let config = self.current_config();
        std::fs::create_dir_all(&config.source_dir)?;
        std::fs::create_dir_all(&config.target_dir)?;
        if let Some(staging) = &config.staging_dir {
            std::fs::create_dir_all(staging)?;
        }
        Ok(())
    }

    /// Run one filesystem pass. Returns the number of imported entries.
    pub async fn scan_once(&self) -> Result<usize, ServiceError> {
        let config = self.current_config();
        let source = &config.source_dir;
        if !source.is_dir() {
            tracing::warn!(path = %source.display(), "source directory missing, recreating");
            std::fs::create_dir_all(source)?;
            return Ok(0);
        }
        self.ensure_dirs()?;

        let settle = Duration::from_secs(config.settle_seconds);
        let now = SystemTime::now();
        let jobs = DownloadJobRepository::list_by_statuses(&self.pool, &MATCHABLE).await?;

        let mut moved = 0;
        for entry in std::fs::read_dir(source)? {
            let Ok(entry) = entry else {
                continue;
            };
            let name = entry.file_name().to_string_lossy().to_string();
            if name.starts_with('.') {
                continue;
            }
            let path = entry.path();
            if !entry_is_ready(&path, settle, now) {
                tracing::debug!(entry = %name, "still settling, skipping");
                continue;
            }

            let Some(job) = find_job_for_entry(&jobs, &name) else {
                tracing::debug!(entry = %name, "no matching job, leaving in place");
                continue;
            };
            if !matches!(
                job.status,
                DownloadStatus::Completed | DownloadStatus::Processing
            ) {
                tracing::debug!(entry = %name, status = %job.status, "job not ready for import");
                continue;
            }

            match self.import_entry(&config, &path, &name, job).await {
                Ok(destination) => {
                    tracing::info!(
                        entry = %name,
                        destination = %destination.display(),
                        "imported completed download"
                    );
                    moved += 1;
                }
                Err(e) => {
                    tracing::warn!(entry = %name, error = %e, "import failed, will retry next pass");
                }
            }
        }

        Ok(moved)
    }

    async fn import_entry(
        &self,
        config: &MonitorConfig,
        path: &Path,
        name: &str,
        job: &DownloadJob,
    ) -> Result<PathBuf, ServiceError> {
        let staged = match &config.staging_dir {
            Some(staging) => {
                let staged = resolve_destination(staging.join(name));
                move_entry(path, &staged)?;
                DownloadJobRepository::apply_status_update(
                    &self.pool,
                    job.id,
                    JobStatusUpdate {
                        status: Some(DownloadStatus::Processing),
                        staging_path: Some(Some(staged.display().to_string())),
                        message: Some(Some("Importing into library".to_string())),
                        ..Default::default()
                    },
                )
                .await?;
                staged
            }
            None => path.to_path_buf(),
        };

        let destination = self
            .importer
            .import(&staged, &config.target_dir, job)
            .await?;

        let clean_name = destination
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| name.to_string());
        DownloadJobRepository::mark_moved(
            &self.pool,
            job.id,
            &destination.display().to_string(),
            &clean_name,
        )
        .await?;

        Ok(destination)
    }

    /// Snapshot of the completed-downloads directory, newest first.
    pub fn describe_downloads(&self) -> Result<Vec<DownloadEntry>, ServiceError> {
        let config = self.current_config();
        let source = &config.source_dir;
        if !source.is_dir() {
            return Ok(Vec::new());
        }

        let settle = Duration::from_secs(config.settle_seconds);
        let now = SystemTime::now();

        let mut entries = Vec::new();
        for entry in std::fs::read_dir(source)? {
            let Ok(entry) = entry else {
                continue;
            };
            let name = entry.file_name().to_string_lossy().to_string();
            if name.starts_with('.') {
                continue;
            }
            let path = entry.path();
            let Ok(meta) = entry.metadata() else {
                continue;
            };

            let size = if meta.is_dir() { dir_size(&path) } else { meta.len() };
            let modified = meta.modified().ok().map(DateTime::<Utc>::from);

            entries.push(DownloadEntry {
                name,
                path: path.display().to_string(),
                kind: if meta.is_dir() { "dir" } else { "file" }.to_string(),
                size,
                modified,
                ready: entry_is_ready(&path, settle, now),
            });
        }

        entries.sort_by(|a, b| b.modified.cmp(&a.modified));
        Ok(entries)
    }
}

fn dir_size(path: &Path) -> u64 {
    WalkDir::new(path)
        .into_iter()
        .flatten()
        .filter_map(|e| e.metadata().ok())
        .filter(|m| m.is_file())
        .map(|m| m.len())
        .sum()
}

/// An entry is ready once it, and everything inside it, has stopped
/// changing for the settle window.
fn entry_is_ready(path: &Path, settle: Duration, now: SystemTime) -> bool {
    let Ok(meta) = std::fs::metadata(path) else {
        return false;
    };
    if !is_settled(&meta, settle, now) {
        return false;
    }
    if meta.is_dir() {
        for entry in WalkDir::new(path) {
            let Ok(entry) = entry else {
                return false;
            };
            let Ok(meta) = entry.metadata() else {
                return false;
            };
            if !is_settled(&meta, settle, now) {
                return false;
            }
        }
    }
    true
}

fn is_settled(meta: &std::fs::Metadata, settle: Duration, now: SystemTime) -> bool {
    match meta.modified() {
        Ok(modified) => now.duration_since(modified).unwrap_or_default() >= settle,
        Err(_) => false,
    }
}

/// Match a directory entry to a tracked job by clean name, content name
/// or title; exact name first, then file-stem equality in either
/// direction, so `pc.gamer.345.pdf` finds a job whose content name is
/// the extensionless `pc.gamer.345`.
fn find_job_for_entry<'a>(jobs: &'a [DownloadJob], entry_name: &str) -> Option<&'a DownloadJob> {
    let entry_lower = entry_name.trim().to_lowercase();
    let entry_stem = stem_of(&entry_lower);

    for job in jobs {
        let candidates = [
            job.clean_name.as_deref(),
            job.content_name.as_deref(),
            Some(job.title.as_str()),
        ];
        for candidate in candidates.into_iter().flatten() {
            let candidate = candidate.trim().to_lowercase();
            if candidate.is_empty() {
                continue;
            }
            let candidate_stem = stem_of(&candidate);
            if candidate == entry_lower
                || candidate == entry_stem
                || candidate_stem == entry_lower
                || candidate_stem == entry_stem
            {
                return Some(job);
            }
        }
    }
    None
}

fn stem_of(name: &str) -> String {
    Path::new(name)
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| name.to_string())
}
