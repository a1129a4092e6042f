use chrono::{DateTime, Utc};
use serde_json::Value;

/// One entry of the active download queue (`mode=queue`).
#[derive(Debug, Clone)]
pub struct QueueSlot {
    pub nzo_id: Option<String>,
    pub filename: Option<String>,
    pub status: Option<String>,
    pub percentage: Option<f64>,
    pub timeleft: Option<String>,
}

impl QueueSlot {
    pub(crate) fn from_value(slot: &Value) -> Self {
        Self {
            nzo_id: value_str(slot, "nzo_id"),
            filename: value_str(slot, "filename").or_else(|| value_str(slot, "title")),
            status: value_str(slot, "status"),
            percentage: value_f64(slot, "percentage"),
            timeleft: value_str(slot, "timeleft"),
        }
    }
}

/// One entry of the finished-downloads history (`mode=history`).
#[derive(Debug, Clone)]
pub struct HistorySlot {
    pub nzo_id: Option<String>,
    pub name: Option<String>,
    pub status: Option<String>,
    pub completed: Option<DateTime<Utc>>,
    pub fail_message: Option<String>,
}

impl HistorySlot {
    pub(crate) fn from_value(slot: &Value) -> Self {
        Self {
            nzo_id: value_str(slot, "nzo_id"),
            name: value_str(slot, "name").or_else(|| value_str(slot, "title")),
            status: value_str(slot, "status"),
            completed: value_timestamp(slot, "completed"),
            fail_message: value_str(slot, "fail_message"),
        }
    }
}

/// Result of `mode=addurl`. One submission can produce several nzo ids.
#[derive(Debug, Clone)]
pub struct AddUrlResult {
    pub nzo_ids: Vec<String>,
}

/// Result of a successful `mode=auth` check.
#[derive(Debug, Clone)]
pub struct AuthResult {
    pub message: String,
}

fn value_str(slot: &Value, key: &str) -> Option<String> {
    slot.get(key).and_then(Value::as_str).map(str::to_string)
}

/// Percentages arrive as numbers or as strings like "50.0".
fn value_f64(slot: &Value, key: &str) -> Option<f64> {
    match slot.get(key)? {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.parse().ok(),
        _ => None,
    }
}

/// Completion timestamps arrive as unix seconds, numeric or stringified.
fn value_timestamp(slot: &Value, key: &str) -> Option<DateTime<Utc>> {
    let seconds = match slot.get(key)? {
        Value::Number(number) => number.as_i64()?,
        Value::String(text) => text.parse().ok()?,
        _ => return None,
    };
    DateTime::from_timestamp(seconds, 0)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_queue_slot_from_value() {
        let slot = QueueSlot::from_value(&json!({
            "nzo_id": "SABnzbd_nzo_1",
            "filename": "Some.Magazine.2024",
            "status": "Downloading",
            "percentage": "42.5",
            "timeleft": "0:03:10",
        }));
        assert_eq!(slot.nzo_id.as_deref(), Some("SABnzbd_nzo_1"));
        assert_eq!(slot.filename.as_deref(), Some("Some.Magazine.2024"));
        assert_eq!(slot.percentage, Some(42.5));
        assert_eq!(slot.timeleft.as_deref(), Some("0:03:10"));
    }

    #[test]
    fn test_queue_slot_falls_back_to_title() {
        let slot = QueueSlot::from_value(&json!({"title": "Fallback Name"}));
        assert_eq!(slot.filename.as_deref(), Some("Fallback Name"));
        assert_eq!(slot.percentage, None);
    }

    #[test]
    fn test_history_slot_timestamps() {
        let numeric = HistorySlot::from_value(&json!({"completed": 1700000000}));
        assert!(numeric.completed.is_some());
        let stringy = HistorySlot::from_value(&json!({"completed": "1700000000"}));
        assert_eq!(numeric.completed, stringy.completed);
        let bogus = HistorySlot::from_value(&json!({"completed": "soon"}));
        assert_eq!(bogus.completed, None);
    }
}
