//! Event handling that ties the device runtime to the weather pipeline.
//!
//! `WeatherBridge` listens for host events, runs the
//! location -> weather -> message pipeline for each refresh request, and
//! relays the settings page result back to the paired device.

pub mod bridge;
pub mod error;
pub mod host;
pub mod settings;

pub use bridge::WeatherBridge;
pub use error::BridgeError;
pub use host::{ChannelHost, HostCommand, HostRuntime};
pub use settings::{decode_settings, ConfigResult, SettingsError};
