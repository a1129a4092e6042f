use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A magazine the user follows.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Magazine {
    pub id: i64,
    pub title: String,
    /// Optional override used as the provider search term instead of the title
    pub search_term: Option<String>,
    /// Language hint for issue parsing ("en", "de", "es")
    pub language: Option<String>,
    /// Only "Active" magazines are searched
    pub status: String,
    /// Auto-download guard: skip issues published before this year
    pub auto_since_year: Option<i32>,
    /// Auto-download guard: within the guard year, skip issues below this number
    pub auto_since_issue: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl Magazine {
    pub fn is_active(&self) -> bool {
        self.status.eq_ignore_ascii_case("active")
    }

    /// Term sent to providers when searching for this magazine.
    pub fn query_term(&self) -> &str {
        match self.search_term.as_deref() {
            Some(term) if !term.trim().is_empty() => term,
            _ => &self.title,
        }
    }
}

/// Request body for creating a magazine.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateMagazine {
    pub title: String,
    pub search_term: Option<String>,
    pub language: Option<String>,
    pub auto_since_year: Option<i32>,
    pub auto_since_issue: Option<i64>,
}
