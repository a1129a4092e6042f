use serde_json::Value;

use crate::client::SabnzbdClient;
use crate::models::HistorySlot;

impl SabnzbdClient {
    /// Fetch the most recent history entries (`mode=history`).
    pub async fn history(&self, limit: u32) -> crate::Result<Vec<HistorySlot>> {
        let params = [
            ("mode", "history".to_string()),
            ("limit", limit.to_string()),
        ];
        let payload = self.get_json(&params).await?;
        Ok(parse_history_response(&payload))
    }
}

fn parse_history_response(payload: &Value) -> Vec<HistorySlot> {
    payload
        .get("history")
        .and_then(|history| history.get("slots"))
        .and_then(Value::as_array)
        .map(|slots| slots.iter().map(HistorySlot::from_value).collect())
        .unwrap_or_default()
}
