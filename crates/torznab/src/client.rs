use std::time::Duration;

use crate::models::ReleaseItem;
use crate::parse::parse_torznab_feed;

/// Torznab/Newznab search client.
///
/// One client is shared across providers; per-provider URL and API key are
/// passed per call.
pub struct TorznabClient {
    client: reqwest::Client,
}

impl TorznabClient {
    pub fn new(timeout: Duration) -> crate::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    /// Run a free-text search (`?t=search&q=`) against one provider.
    pub async fn search(
        &self,
        base_url: &str,
        api_key: &str,
        term: &str,
    ) -> crate::Result<Vec<ReleaseItem>> {
        let url = normalise_provider_url(base_url);
        tracing::debug!(url = %url, term, "querying torznab provider");

        let response = self
            .client
            .get(&url)
            .query(&[("apikey", api_key), ("t", "search"), ("q", term)])
            .send()
            .await?
            .error_for_status()?;

        let bytes = response.bytes().await?;
        let items = parse_torznab_feed(&bytes)?;
        tracing::debug!(count = items.len(), "parsed torznab results");
        Ok(items)
    }
}

/// Append "/api" to a provider base URL unless it already ends with it.
fn normalise_provider_url(base_url: &str) -> String {
    if base_url.ends_with("/api") {
        base_url.to_string()
    } else {
        format!("{}/api", base_url.trim_end_matches('/'))
    }
}
