use chrono::{DateTime, Utc};
use parser::IssueMetadata;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One provider search hit, enriched with parsed issue identity.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SearchResult {
    pub title: String,
    /// NZB download URL
    pub link: String,
    /// Name of the provider that returned this result
    pub provider: String,
    /// Magazine the search was run for
    pub magazine_title: String,
    pub published: Option<DateTime<Utc>>,
    pub size: Option<i64>,
    pub issue_code: Option<String>,
    pub issue_label: Option<String>,
    pub issue_year: Option<i32>,
    pub issue_month: Option<i32>,
    pub issue_day: Option<i32>,
    pub issue_number: Option<i64>,
}

impl SearchResult {
    /// Copy parsed issue identity onto the result.
    pub fn attach_issue(&mut self, issue: &IssueMetadata) {
        self.issue_code = Some(issue.issue_code.clone());
        self.issue_label = Some(issue.label.clone());
        self.issue_year = issue.year;
        self.issue_month = issue.month.map(|m| m as i32);
        self.issue_day = issue.day.map(|d| d as i32);
        self.issue_number = issue.issue_number;
    }
}
