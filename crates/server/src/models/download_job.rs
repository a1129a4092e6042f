use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Lifecycle state of a download job.
///
/// `Failed` and `Moved` are terminal; jobs in those states are never
/// touched by reconciliation again. Statuses the engine reports that we
/// do not recognise are preserved verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(into = "String", from = "String")]
pub enum DownloadStatus {
    Pending,
    Queued,
    Downloading,
    Processing,
    Paused,
    Completed,
    Failed,
    Moved,
    Other(String),
}

impl DownloadStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => "pending",
            Self::Queued => "queued",
            Self::Downloading => "downloading",
            Self::Processing => "processing",
            Self::Paused => "paused",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Moved => "moved",
            Self::Other(s) => s,
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "pending" => Self::Pending,
            "queued" => Self::Queued,
            "downloading" => Self::Downloading,
            "processing" => Self::Processing,
            "paused" => Self::Paused,
            "completed" => Self::Completed,
            "failed" => Self::Failed,
            "moved" => Self::Moved,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Failed | Self::Moved)
    }
}

impl std::fmt::Display for DownloadStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<DownloadStatus> for String {
    fn from(status: DownloadStatus) -> Self {
        status.as_str().to_string()
    }
}

impl From<String> for DownloadStatus {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

/// One tracked download, from enqueue through import into the library.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DownloadJob {
    pub id: i64,
    /// Identifier assigned by the download engine (SABnzbd nzo id)
    pub engine_id: Option<String>,
    /// Release title as enqueued
    pub title: String,
    /// Magazine this job was selected for, if any
    pub magazine_title: Option<String>,
    /// NZB URL the job was enqueued from
    pub link: Option<String>,
    /// Completed file or folder name reported by the engine
    pub content_name: Option<String>,
    pub status: DownloadStatus,
    /// Raw status string from the engine, before mapping
    pub engine_status: Option<String>,
    pub progress: f64,
    pub time_remaining: Option<String>,
    pub message: Option<String>,
    /// Sanitised name the files were renamed to during import
    pub clean_name: Option<String>,
    pub staging_path: Option<String>,
    pub issue_code: Option<String>,
    pub issue_label: Option<String>,
    pub issue_year: Option<i32>,
    pub issue_month: Option<i32>,
    pub issue_number: Option<i64>,
    /// Last time the engine reported this job in queue or history
    pub last_seen: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub moved_at: Option<DateTime<Utc>>,
}

/// Payload for creating or refreshing a job keyed by its engine id.
#[derive(Debug, Clone, Default)]
pub struct UpsertDownloadJob {
    pub engine_id: String,
    pub title: String,
    pub magazine_title: Option<String>,
    pub link: Option<String>,
    pub status: Option<DownloadStatus>,
    pub issue_code: Option<String>,
    pub issue_label: Option<String>,
    pub issue_year: Option<i32>,
    pub issue_month: Option<i32>,
    pub issue_number: Option<i64>,
}

/// Field deltas applied by the tracker during reconciliation.
///
/// `None` fields are left untouched. `last_seen` is always refreshed,
/// `updated_at` only when something actually changed.
#[derive(Debug, Clone, Default)]
pub struct JobStatusUpdate {
    pub status: Option<DownloadStatus>,
    pub engine_status: Option<String>,
    pub progress: Option<f64>,
    pub time_remaining: Option<Option<String>>,
    pub message: Option<Option<String>>,
    pub content_name: Option<String>,
    pub clean_name: Option<String>,
    pub staging_path: Option<Option<String>>,
    pub completed_at: Option<DateTime<Utc>>,
}
