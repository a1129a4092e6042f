use serde_json::Value;

use crate::client::{error_message, status_ok, SabnzbdClient};
use crate::error::SabnzbdError;
use crate::models::{AddUrlResult, QueueSlot};

impl SabnzbdClient {
    /// Submit an NZB by URL (`mode=addurl`).
    ///
    /// Returns the external ids SABnzbd assigned; a single submission may be
    /// split into several jobs.
    pub async fn add_url(
        &self,
        nzb_url: &str,
        nzbname: Option<&str>,
        category: Option<&str>,
        priority: Option<i32>,
    ) -> crate::Result<AddUrlResult> {
        let mut params: Vec<(&str, String)> = vec![
            ("mode", "addurl".to_string()),
            ("name", nzb_url.to_string()),
        ];
        if let Some(name) = nzbname {
            params.push(("nzbname", name.to_string()));
        }
        if let Some(cat) = category {
            params.push(("cat", cat.to_string()));
        }
        if let Some(prio) = priority {
            params.push(("priority", prio.to_string()));
        }

        let payload = self.post_json(&params).await?;
        let result = parse_add_url_response(&payload)?;
        tracing::debug!(url = nzb_url, ids = ?result.nzo_ids, "enqueued NZB");
        Ok(result)
    }

    /// Fetch the active queue (`mode=queue`).
    pub async fn queue(&self) -> crate::Result<Vec<QueueSlot>> {
        let params = [("mode", "queue".to_string())];
        let payload = self.get_json(&params).await?;
        Ok(parse_queue_response(&payload))
    }

}

fn parse_add_url_response(payload: &Value) -> crate::Result<AddUrlResult> {
    if !status_ok(payload.get("status")) {
        return Err(SabnzbdError::Api(error_message(
            payload,
            "SABnzbd rejected the NZB.",
        )));
    }
    let nzo_ids = match payload.get("nzo_ids") {
        Some(Value::Array(items)) => items.iter().map(value_to_string).collect(),
        Some(Value::Null) | None => Vec::new(),
        Some(single) => vec![value_to_string(single)],
    };
    Ok(AddUrlResult { nzo_ids })
}

fn parse_queue_response(payload: &Value) -> Vec<QueueSlot> {
    payload
        .get("queue")
        .and_then(|queue| queue.get("slots"))
        .and_then(Value::as_array)
        .map(|slots| slots.iter().map(QueueSlot::from_value).collect())
        .unwrap_or_default()
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_add_url_list_of_ids() {
        let result = parse_add_url_response(&json!({
            "status": true,
            "nzo_ids": ["SABnzbd_nzo_a", "SABnzbd_nzo_b"],
        }))
        .expect("should parse");
        assert_eq!(result.nzo_ids, vec!["SABnzbd_nzo_a", "SABnzbd_nzo_b"]);
    }

    #[test]
    fn test_add_url_scalar_id() {
        let result = parse_add_url_response(&json!({
            "status": "true",
            "nzo_ids": "SABnzbd_nzo_a",
        }))
        .expect("should parse");
        assert_eq!(result.nzo_ids, vec!["SABnzbd_nzo_a"]);
    }

    #[test]
    fn test_add_url_missing_ids() {
        let result = parse_add_url_response(&json!({"status": "ok"})).expect("should parse");
        assert!(result.nzo_ids.is_empty());
    }

    #[test]
    fn test_add_url_rejected() {
        let err = parse_add_url_response(&json!({
            "status": false,
            "error": "API Key Incorrect",
        }))
        .expect_err("should be rejected");
        assert!(matches!(err, SabnzbdError::Api(message) if message == "API Key Incorrect"));
    }

    #[test]
    fn test_parse_queue_response() {
        let slots = parse_queue_response(&json!({
            "queue": {
                "slots": [
                    {"nzo_id": "a", "filename": "one", "status": "Downloading", "percentage": "10"},
                    {"nzo_id": "b", "filename": "two", "status": "Paused"},
                ]
            }
        }));
        assert_eq!(slots.len(), 2);
        assert_eq!(slots[0].nzo_id.as_deref(), Some("a"));
        assert_eq!(slots[0].percentage, Some(10.0));
        assert_eq!(slots[1].status.as_deref(), Some("Paused"));
    }

    #[test]
    fn test_parse_queue_response_empty() {
        assert!(parse_queue_response(&json!({})).is_empty());
        assert!(parse_queue_response(&json!({"queue": {}})).is_empty());
    }
}
