use serde_json::Value;

use crate::client::{error_message, status_ok, SabnzbdClient};
use crate::error::SabnzbdError;
use crate::models::AuthResult;

impl SabnzbdClient {
    /// Verify connectivity and the API key (`mode=auth`).
    pub async fn auth(&self) -> crate::Result<AuthResult> {
        let params = [("mode", "auth".to_string())];
        let payload = self.get_json(&params).await?;
        parse_auth_response(&payload)
    }
}

fn parse_auth_response(payload: &Value) -> crate::Result<AuthResult> {
    let status = payload.get("status");
    // Older SABnzbd versions answer `mode=auth` with just {"auth": "apikey"}.
    let ok = match status {
        None => payload.get("auth").is_some(),
        Some(Value::Null) => payload.get("auth").is_some(),
        Some(_) => status_ok(status),
    };
    if !ok {
        return Err(SabnzbdError::Api(error_message(
            payload,
            "SABnzbd authentication failed.",
        )));
    }
    let message = payload
        .get("msg")
        .or_else(|| payload.get("auth"))
        .and_then(Value::as_str)
        .unwrap_or("Connection successful.")
        .to_string();
    Ok(AuthResult { message })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_auth_legacy_shape() {
        let result = parse_auth_response(&json!({"auth": "apikey"})).expect("should pass");
        assert_eq!(result.message, "apikey");
    }

    #[test]
    fn test_auth_status_shape() {
        let result =
            parse_auth_response(&json!({"status": true, "msg": "welcome"})).expect("should pass");
        assert_eq!(result.message, "welcome");
    }

    #[test]
    fn test_auth_failure() {
        let err = parse_auth_response(&json!({"status": false, "error": "bad key"}))
            .expect_err("should fail");
        assert!(matches!(err, SabnzbdError::Api(message) if message == "bad key"));
    }

    #[test]
    fn test_auth_default_message() {
        let result = parse_auth_response(&json!({"status": "ok"})).expect("should pass");
        assert_eq!(result.message, "Connection successful.");
    }
}
