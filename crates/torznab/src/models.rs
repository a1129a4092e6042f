use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One release entry from a Torznab/Newznab search response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseItem {
    /// Release title as reported by the indexer
    pub title: String,
    /// NZB download URL
    pub link: String,
    /// Publication timestamp from `pubDate`
    pub published: Option<DateTime<Utc>>,
    /// Size in bytes from the `size` newznab attribute
    pub size: Option<i64>,
    /// Category ids from the `category` newznab attributes
    pub categories: Vec<String>,
}
