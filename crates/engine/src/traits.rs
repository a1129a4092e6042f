use async_trait::async_trait;

use crate::error::Result;
use crate::models::{HistoryItem, QueueItem};

/// Core download-engine interface.
///
/// Implementations translate these calls onto a concrete usenet/torrent
/// client. Callers must treat `EngineError::NotConfigured` as "skip this
/// cycle" rather than a failure.
#[async_trait]
pub trait DownloadEngine: Send + Sync {
    /// Submit a download by URL. Returns every external id the engine
    /// assigned; multi-part submissions may return more than one.
    async fn enqueue(&self, url: &str, title: Option<&str>) -> Result<Vec<String>>;

    /// Snapshot of the active queue.
    async fn fetch_queue(&self) -> Result<Vec<QueueItem>>;

    /// Snapshot of the most recent history entries.
    async fn fetch_history(&self, limit: u32) -> Result<Vec<HistoryItem>>;

    /// Verify connectivity and credentials. Returns a human-readable message.
    async fn test(&self) -> Result<String>;

    /// Engine type name (for logging)
    fn engine_type(&self) -> &'static str;
}
