//! Structured messages exchanged with the paired device.
//!
//! The watchface speaks a fixed key -> integer dictionary protocol. Outbound
//! messages carry temperatures or the unit preference; inbound messages are
//! refresh requests whose content is not inspected.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Keys understood by the watchface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MessageKey {
    #[serde(rename = "KEY_TEMPERATURE")]
    Temperature,
    #[serde(rename = "KEY_TEMPERATURE_IN_C")]
    TemperatureInC,
    #[serde(rename = "useCelsius")]
    UseCelsius,
}

/// Dictionary sent to the paired device. Created per event and sent once.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OutboundMessage {
    entries: BTreeMap<MessageKey, i32>,
}

impl OutboundMessage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Temperature update in both units.
    pub fn temperature(fahrenheit: i32, celsius: i32) -> Self {
        Self::new()
            .with(MessageKey::Temperature, fahrenheit)
            .with(MessageKey::TemperatureInC, celsius)
    }

    /// Unit preference relayed from the settings page.
    pub fn use_celsius(enabled: bool) -> Self {
        Self::new().with(MessageKey::UseCelsius, i32::from(enabled))
    }

    pub fn with(mut self, key: MessageKey, value: i32) -> Self {
        self.entries.insert(key, value);
        self
    }

    pub fn get(&self, key: MessageKey) -> Option<i32> {
        self.entries.get(&key).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Message received from the paired device, keyed by numeric app-message ids.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InboundMessage {
    entries: BTreeMap<u32, i32>,
}

impl InboundMessage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: u32, value: i32) -> Self {
        self.entries.insert(key, value);
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_temperature_message_keys() {
        let msg = OutboundMessage::temperature(81, 27);
        assert_eq!(msg.get(MessageKey::Temperature), Some(81));
        assert_eq!(msg.get(MessageKey::TemperatureInC), Some(27));
        assert_eq!(msg.get(MessageKey::UseCelsius), None);
        assert_eq!(msg.len(), 2);
    }

    #[test]
    fn test_use_celsius_flag() {
        assert_eq!(OutboundMessage::use_celsius(true).get(MessageKey::UseCelsius), Some(1));
        assert_eq!(OutboundMessage::use_celsius(false).get(MessageKey::UseCelsius), Some(0));
    }

    #[test]
    fn test_serializes_with_wire_key_names() {
        let json = serde_json::to_value(OutboundMessage::temperature(70, 21)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"KEY_TEMPERATURE": 70, "KEY_TEMPERATURE_IN_C": 21})
        );

        let json = serde_json::to_value(OutboundMessage::use_celsius(true)).unwrap();
        assert_eq!(json, serde_json::json!({"useCelsius": 1}));
    }

    #[test]
    fn test_inbound_message_len() {
        let msg = InboundMessage::new().with(0, 0).with(1, 5);
        assert_eq!(msg.len(), 2);
        assert!(!msg.is_empty());
        assert!(InboundMessage::new().is_empty());
    }
}
