use std::time::Duration;

use serde_json::Value;

/// Client for the SABnzbd Web API.
///
/// SABnzbd exposes one endpoint taking a `mode=` query parameter; every call
/// here requests JSON output and authenticates with the API key.
pub struct SabnzbdClient {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
}

impl SabnzbdClient {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> crate::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_url: build_api_url(base_url),
            api_key: api_key.to_string(),
        })
    }

    pub(crate) async fn get_json(&self, params: &[(&str, String)]) -> crate::Result<Value> {
        let response = self
            .client
            .get(&self.api_url)
            .query(&self.base_params())
            .query(params)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json().await?)
    }

    pub(crate) async fn post_json(&self, params: &[(&str, String)]) -> crate::Result<Value> {
        let response = self
            .client
            .post(&self.api_url)
            .query(&self.base_params())
            .query(params)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json().await?)
    }

    fn base_params(&self) -> [(&str, &str); 2] {
        [("apikey", self.api_key.as_str()), ("output", "json")]
    }
}

/// Normalise a configured base URL to the API endpoint: trailing slashes are
/// dropped and "/api" is appended unless already present.
fn build_api_url(base_url: &str) -> String {
    let trimmed = base_url.trim_end_matches('/');
    if trimmed.ends_with("/api") {
        trimmed.to_string()
    } else {
        format!("{trimmed}/api")
    }
}

/// SABnzbd reports success as boolean `true` or as one of a handful of
/// truthy strings, depending on the endpoint and version.
pub(crate) fn status_ok(value: Option<&Value>) -> bool {
    match value {
        Some(Value::String(text)) => {
            matches!(text.to_lowercase().as_str(), "true" | "1" | "ok" | "success")
        }
        Some(other) => truthy(other),
        None => false,
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Value::String(text) => !text.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// Extract the server-side error message from a rejected response.
pub(crate) fn error_message(payload: &Value, fallback: &str) -> String {
    payload
        .get("error")
        .or_else(|| payload.get("error_message"))
        .and_then(Value::as_str)
        .unwrap_or(fallback)
        .to_string()
}
