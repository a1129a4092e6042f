use std::time::Duration;

use async_trait::async_trait;
use sabnzbd::{HistorySlot, QueueSlot, SabnzbdClient};

use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::models::{HistoryItem, QueueItem};
use crate::traits::DownloadEngine;

/// SABnzbd download-engine wrapper
pub struct SabnzbdEngine {
    client: SabnzbdClient,
    category: Option<String>,
    priority: Option<i32>,
}

impl SabnzbdEngine {
    /// Create a new SABnzbd engine from configuration.
    ///
    /// Fails with `NotConfigured` when the base URL or API key is missing.
    pub fn new(config: &EngineConfig) -> Result<Self> {
        if !config.is_configured() {
            return Err(EngineError::NotConfigured);
        }
        let client = SabnzbdClient::new(
            &config.base_url,
            &config.api_key,
            Duration::from_secs(config.timeout_secs),
        )?;
        Ok(Self {
            client,
            category: config.category.clone(),
            priority: config.priority,
        })
    }
}

#[async_trait]
impl DownloadEngine for SabnzbdEngine {
    async fn enqueue(&self, url: &str, title: Option<&str>) -> Result<Vec<String>> {
        let result = self
            .client
            .add_url(url, title, self.category.as_deref(), self.priority)
            .await?;
        Ok(result.nzo_ids)
    }

    async fn fetch_queue(&self) -> Result<Vec<QueueItem>> {
        let slots = self.client.queue().await?;
        Ok(slots.into_iter().map(queue_item).collect())
    }

    async fn fetch_history(&self, limit: u32) -> Result<Vec<HistoryItem>> {
        let slots = self.client.history(limit).await?;
        Ok(slots.into_iter().map(history_item).collect())
    }

    async fn test(&self) -> Result<String> {
        let result = self.client.auth().await?;
        tracing::debug!("SABnzbd connection verified");
        Ok(result.message)
    }

    fn engine_type(&self) -> &'static str {
        "sabnzbd"
    }
}

fn queue_item(slot: QueueSlot) -> QueueItem {
    QueueItem {
        external_id: slot.nzo_id,
        display_name: slot.filename,
        raw_status: slot.status,
        percent: slot.percentage,
        time_remaining: slot.timeleft,
    }
}

fn history_item(slot: HistorySlot) -> HistoryItem {
    HistoryItem {
        external_id: slot.nzo_id,
        display_name: slot.name,
        raw_status: slot.status,
        completed_at: slot.completed,
        failure_message: slot.fail_message,
    }
}
