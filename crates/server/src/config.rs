use std::path::PathBuf;

use engine::EngineConfig;
use serde::{Deserialize, Serialize};

/// Top-level runtime configuration.
///
/// Assembled by the CLI from flags and environment variables; shared
/// read-only through [`crate::state::AppState`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database_url: String,
    pub max_connections: u32,
    pub engine: EngineConfig,
    pub search: SearchConfig,
    pub auto_download: AutoDownloadConfig,
    pub tracker: TrackerConfig,
    pub monitor: MonitorConfig,
}

impl Config {
    pub fn new(database_url: String) -> Self {
        Self {
            database_url,
            max_connections: 5,
            engine: EngineConfig::sabnzbd(String::new(), String::new()),
            search: SearchConfig::default(),
            auto_download: AutoDownloadConfig::default(),
            tracker: TrackerConfig::default(),
            monitor: MonitorConfig::default(),
        }
    }
}

/// Provider search settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// HTTP timeout for provider queries, in seconds
    pub timeout_secs: u64,
    /// Drop results whose publication date is older than this; 0 disables
    pub max_age_days: i64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            max_age_days: 0,
        }
    }
}

/// Auto-download scheduler settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutoDownloadConfig {
    /// Seconds between automatic scans
    pub poll_interval_secs: u64,
    /// Cap on enqueued candidates per scan cycle; clamped to at least 1
    pub max_results_per_scan: usize,
}

impl Default for AutoDownloadConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 900,
            max_results_per_scan: 5,
        }
    }
}

/// Download status tracker settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Seconds between reconciliation passes
    pub poll_interval_secs: u64,
    /// Minimum number of history slots to request per pass
    pub history_limit: u32,
    /// Whether stalled jobs are failed automatically
    pub auto_fail_enabled: bool,
    /// Minutes without progress before a watched job is auto-failed
    pub auto_fail_minutes: f64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 30,
            history_limit: 50,
            auto_fail_enabled: true,
            auto_fail_minutes: 120.0,
        }
    }
}

/// Completion monitor settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Directory the download engine completes into
    pub source_dir: PathBuf,
    /// Library root completed issues are moved under
    pub target_dir: PathBuf,
    /// Optional intermediate directory used while importing
    pub staging_dir: Option<PathBuf>,
    /// Seconds between filesystem scans
    pub poll_interval_secs: u64,
    /// An entry is ready once nothing inside it changed for this long
    pub settle_seconds: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from("downloads/complete"),
            target_dir: PathBuf::from("library"),
            staging_dir: None,
            poll_interval_secs: 60,
            settle_seconds: 30,
        }
    }
}
