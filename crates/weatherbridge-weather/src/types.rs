use serde::{Deserialize, Serialize};
use std::time::Instant;
use weatherbridge_core::{NetworkError, OutboundMessage};

/// Offset between Kelvin and Celsius scales
pub const KELVIN_OFFSET: f64 = 273.15;

/// Geographic coordinates in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

impl std::fmt::Display for Coordinates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.latitude, self.longitude)
    }
}

/// Coordinates tagged with the moment they were acquired
#[derive(Debug, Clone, Copy)]
pub struct Position {
    pub coords: Coordinates,
    pub acquired_at: Instant,
}

impl Position {
    pub fn now(coords: Coordinates) -> Self {
        Self {
            coords,
            acquired_at: Instant::now(),
        }
    }

    pub fn age(&self) -> std::time::Duration {
        self.acquired_at.elapsed()
    }
}

/// How a fractional temperature becomes the integer the watchface displays
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rounding {
    /// Nearest integer, halves away from zero
    Nearest,
    /// Drop the fractional part
    Truncate,
}

impl Rounding {
    pub fn apply(self, value: f64) -> i32 {
        match self {
            Rounding::Nearest => value.round() as i32,
            Rounding::Truncate => value.trunc() as i32,
        }
    }
}

pub fn kelvin_to_celsius(kelvin: f64) -> f64 {
    kelvin - KELVIN_OFFSET
}

pub fn celsius_to_fahrenheit(celsius: f64) -> f64 {
    celsius * 1.8 + 32.0
}

/// Current temperature in both units, ready for the watchface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeatherReading {
    pub temperature_f: i32,
    pub temperature_c: i32,
}

impl WeatherReading {
    pub fn from_celsius(celsius: f64, rounding: Rounding) -> Self {
        Self {
            temperature_f: rounding.apply(celsius_to_fahrenheit(celsius)),
            temperature_c: rounding.apply(celsius),
        }
    }

    pub fn from_kelvin(kelvin: f64, rounding: Rounding) -> Self {
        Self::from_celsius(kelvin_to_celsius(kelvin), rounding)
    }
}

impl From<WeatherReading> for OutboundMessage {
    fn from(reading: WeatherReading) -> Self {
        OutboundMessage::temperature(reading.temperature_f, reading.temperature_c)
    }
}

/// Location service errors
#[derive(Debug, thiserror::Error)]
pub enum LocationError {
    #[error("Location permission denied")]
    PermissionDenied,
    #[error("Location service unavailable: {0}")]
    ServiceUnavailable(String),
    #[error("Location request timed out after {0:?}")]
    Timeout(std::time::Duration),
    #[error("Location error: {0}")]
    Other(String),
}

impl LocationError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::PermissionDenied => "Location access was denied.",
            Self::ServiceUnavailable(_) => "Location service unavailable.",
            Self::Timeout(_) => "Finding your location took too long.",
            Self::Other(_) => "Could not determine your location.",
        }
    }
}

/// Weather provider errors
#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Invalid request URL: {0}")]
    InvalidUrl(String),
    #[error("Missing API key for {0}")]
    MissingApiKey(&'static str),
}

impl WeatherError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Network(e) => e.user_message(),
            Self::Parse(_) => "Weather service returned unexpected data.",
            Self::InvalidUrl(_) => "Weather service address is invalid. Check settings.",
            Self::MissingApiKey(_) => "Weather API key is missing. Check settings.",
        }
    }
}

impl From<serde_json::Error> for WeatherError {
    fn from(e: serde_json::Error) -> Self {
        WeatherError::Parse(e.to_string())
    }
}

impl From<url::ParseError> for WeatherError {
    fn from(e: url::ParseError) -> Self {
        WeatherError::InvalidUrl(e.to_string())
    }
}
