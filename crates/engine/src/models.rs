use chrono::{DateTime, Utc};

/// One live queue entry, engine-agnostic.
#[derive(Debug, Clone)]
pub struct QueueItem {
    /// External engine id (SABnzbd nzo id). Absent ids cannot be reconciled.
    pub external_id: Option<String>,
    pub display_name: Option<String>,
    pub raw_status: Option<String>,
    pub percent: Option<f64>,
    pub time_remaining: Option<String>,
}

/// One finished-downloads history entry, engine-agnostic.
#[derive(Debug, Clone)]
pub struct HistoryItem {
    pub external_id: Option<String>,
    pub display_name: Option<String>,
    pub raw_status: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
    pub failure_message: Option<String>,
}
