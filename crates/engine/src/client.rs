use async_trait::async_trait;

use crate::config::{EngineConfig, EngineType};
use crate::error::Result;
use crate::models::{HistoryItem, QueueItem};
use crate::sabnzbd_impl::SabnzbdEngine;
use crate::traits::DownloadEngine;

/// Unified download-engine client (enum dispatch)
pub enum EngineClient {
    Sabnzbd(SabnzbdEngine),
}

impl EngineClient {
    /// Create an engine client from configuration
    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        match config.engine_type {
            EngineType::Sabnzbd => Ok(Self::Sabnzbd(SabnzbdEngine::new(config)?)),
        }
    }
}

#[async_trait]
impl DownloadEngine for EngineClient {
    async fn enqueue(&self, url: &str, title: Option<&str>) -> Result<Vec<String>> {
        match self {
            Self::Sabnzbd(engine) => engine.enqueue(url, title).await,
        }
    }

    async fn fetch_queue(&self) -> Result<Vec<QueueItem>> {
        match self {
            Self::Sabnzbd(engine) => engine.fetch_queue().await,
        }
    }

    async fn fetch_history(&self, limit: u32) -> Result<Vec<HistoryItem>> {
        match self {
            Self::Sabnzbd(engine) => engine.fetch_history(limit).await,
        }
    }

    async fn test(&self) -> Result<String> {
        match self {
            Self::Sabnzbd(engine) => engine.test().await,
        }
    }

    fn engine_type(&self) -> &'static str {
        match self {
            Self::Sabnzbd(engine) => engine.engine_type(),
        }
    }
}
