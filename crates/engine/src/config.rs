use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Download engine type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum EngineType {
    #[default]
    Sabnzbd,
}

/// Configuration for creating a download-engine client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Engine type
    pub engine_type: EngineType,
    /// Base URL, e.g. `http://localhost:8080/sabnzbd`
    pub base_url: String,
    /// API key
    pub api_key: String,
    /// Optional category applied to every submission
    pub category: Option<String>,
    /// Optional priority (-1, 0, 1, 2) applied to every submission
    pub priority: Option<i32>,
    /// HTTP timeout in seconds
    pub timeout_secs: u64,
}

impl EngineConfig {
    /// Create config for SABnzbd
    pub fn sabnzbd(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            engine_type: EngineType::Sabnzbd,
            base_url: base_url.into(),
            api_key: api_key.into(),
            category: None,
            priority: None,
            timeout_secs: 10,
        }
    }

    /// Both a base URL and an API key are required before any call can work.
    pub fn is_configured(&self) -> bool {
        !self.base_url.is_empty() && !self.api_key.is_empty()
    }
}
