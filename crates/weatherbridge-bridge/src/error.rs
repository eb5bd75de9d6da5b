use thiserror::Error;
use weatherbridge_core::{AppError, HostError};
use weatherbridge_weather::{LocationError, WeatherError};

use crate::settings::SettingsError;

/// Everything that can end a bridge pipeline early.
///
/// None of these reach the device; they are logged where the pipeline was spawned.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("Error requesting location: {0}")]
    Location(#[from] LocationError),

    #[error("Error fetching weather: {0}")]
    Weather(#[from] WeatherError),

    #[error("Error sending message to device: {0}")]
    Host(#[from] HostError),

    #[error("Error reading settings: {0}")]
    Settings(#[from] SettingsError),

    #[error("No async runtime available to run the bridge")]
    NoRuntime,
}

impl BridgeError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Location(e) => e.user_message(),
            Self::Weather(e) => e.user_message(),
            Self::Host(e) => e.user_message(),
            Self::Settings(_) => "Settings could not be read.",
            Self::NoRuntime => "WeatherBridge is not running.",
        }
    }
}

impl From<BridgeError> for AppError {
    fn from(e: BridgeError) -> Self {
        match e {
            BridgeError::Host(host) => AppError::Host(host),
            BridgeError::Weather(WeatherError::Network(net)) => AppError::Network(net),
            other => AppError::Service(other.to_string()),
        }
    }
}
