//! Decoding the payload the settings web view hands back when it closes.

use serde_json::Value;
use thiserror::Error;
use weatherbridge_core::OutboundMessage;

/// Payload sent by the host when the page was dismissed without saving
pub const CANCELLED: &str = "CANCELLED";

/// User preferences chosen on the settings page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConfigResult {
    pub use_celsius: bool,
}

impl ConfigResult {
    pub fn to_message(self) -> OutboundMessage {
        OutboundMessage::use_celsius(self.use_celsius)
    }
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("settings page closed without saving")]
    Cancelled,

    #[error("payload is not valid percent-encoded UTF-8: {0}")]
    Encoding(String),

    #[error("payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("payload is not a JSON object")]
    NotAnObject,
}

/// Decode a URL-encoded JSON object such as `%7B%22useCelsius%22%3Atrue%7D`.
///
/// `useCelsius` follows JavaScript truthiness, so a missing field means Fahrenheit.
pub fn decode_settings(response: &str) -> Result<ConfigResult, SettingsError> {
    let response = response.trim();
    if response.is_empty() || response == CANCELLED {
        return Err(SettingsError::Cancelled);
    }

    let decoded =
        urlencoding::decode(response).map_err(|e| SettingsError::Encoding(e.to_string()))?;
    let value: Value = serde_json::from_str(&decoded)?;
    let object = value.as_object().ok_or(SettingsError::NotAnObject)?;

    tracing::info!("Configuration page returned: {}", value);

    Ok(ConfigResult {
        use_celsius: object.get("useCelsius").is_some_and(is_truthy),
    })
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use weatherbridge_core::MessageKey;

    #[test]
    fn test_decode_true() {
        let result = decode_settings("%7B%22useCelsius%22%3Atrue%7D").unwrap();
        assert!(result.use_celsius);
        assert_eq!(result.to_message().get(MessageKey::UseCelsius), Some(1));
    }

    #[test]
    fn test_decode_false() {
        let result = decode_settings("%7B%22useCelsius%22%3Afalse%7D").unwrap();
        assert!(!result.use_celsius);
        assert_eq!(result.to_message().get(MessageKey::UseCelsius), Some(0));
    }

    #[test]
    fn test_decode_plain_json() {
        assert!(decode_settings(r#"{"useCelsius":true}"#).unwrap().use_celsius);
    }

    #[test]
    fn test_missing_flag_means_fahrenheit() {
        assert!(!decode_settings("%7B%7D").unwrap().use_celsius);
    }

    #[test]
    fn test_truthiness() {
        assert!(decode_settings(r#"{"useCelsius":1}"#).unwrap().use_celsius);
        assert!(decode_settings(r#"{"useCelsius":"on"}"#).unwrap().use_celsius);
        assert!(!decode_settings(r#"{"useCelsius":0}"#).unwrap().use_celsius);
        assert!(!decode_settings(r#"{"useCelsius":""}"#).unwrap().use_celsius);
        assert!(!decode_settings(r#"{"useCelsius":null}"#).unwrap().use_celsius);
    }

    #[test]
    fn test_cancelled() {
        assert!(matches!(decode_settings("CANCELLED"), Err(SettingsError::Cancelled)));
        assert!(matches!(decode_settings(""), Err(SettingsError::Cancelled)));
    }

    #[test]
    fn test_malformed_payloads() {
        assert!(matches!(decode_settings("%7Bnope"), Err(SettingsError::Json(_))));
        assert!(matches!(decode_settings("%5B1%5D"), Err(SettingsError::NotAnObject)));
        assert!(matches!(decode_settings("%FF%FE"), Err(SettingsError::Encoding(_))));
    }
}
