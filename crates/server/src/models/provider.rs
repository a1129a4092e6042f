use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A Torznab/Newznab indexer.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Provider {
    pub id: i64,
    pub name: String,
    pub base_url: String,
    #[serde(skip_serializing)]
    pub api_key: String,
    pub enabled: bool,
    /// Media kinds this provider serves; magazines need an "M"
    pub download_types: String,
    pub created_at: DateTime<Utc>,
}

impl Provider {
    /// Whether this provider should be queried for magazine releases.
    pub fn serves_magazines(&self) -> bool {
        self.enabled && self.download_types.to_uppercase().contains('M')
    }
}

/// Request body for creating a provider.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateProvider {
    pub name: String,
    pub base_url: String,
    pub api_key: String,
    pub enabled: Option<bool>,
    pub download_types: Option<String>,
}
