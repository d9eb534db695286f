//! Provider response types.
//!
//! A successful send returns the created message resource; a rejected send
//! returns an error document with a provider error code.

use serde::{Deserialize, Serialize};

/// Message resource returned on `201 Created`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResource {
    pub sid: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub error_code: Option<i64>,
    #[serde(default)]
    pub error_message: Option<String>,
}

/// Error document returned on 4xx/5xx.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderError {
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub more_info: Option<String>,
    #[serde(default)]
    pub status: Option<u16>,
}

impl ProviderError {
    /// One-line description for logs and delivery errors.
    pub fn describe(&self, http_status: u16) -> String {
        match (self.code, self.message.as_deref()) {
            (Some(code), Some(msg)) => format!("HTTP {http_status}, code {code}: {msg}"),
            (None, Some(msg)) => format!("HTTP {http_status}: {msg}"),
            (Some(code), None) => format!("HTTP {http_status}, code {code}"),
            (None, None) => format!("HTTP {http_status}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_message_resource() {
        let json = r#"{"sid":"SM123","status":"queued","to":"whatsapp:+27821234567","from":"whatsapp:+14155238886","error_code":null}"#;
        let msg: MessageResource = serde_json::from_str(json).unwrap();
        assert_eq!(msg.sid.as_deref(), Some("SM123"));
        assert_eq!(msg.status.as_deref(), Some("queued"));
        assert!(msg.error_code.is_none());
    }

    #[test]
    fn test_provider_error_describe() {
        let json = r#"{"code":21211,"message":"The 'To' number is not a valid phone number.","status":400}"#;
        let err: ProviderError = serde_json::from_str(json).unwrap();
        assert_eq!(
            err.describe(400),
            "HTTP 400, code 21211: The 'To' number is not a valid phone number."
        );

        let empty: ProviderError = serde_json::from_str("{}").unwrap();
        assert_eq!(empty.describe(503), "HTTP 503");
    }
}
