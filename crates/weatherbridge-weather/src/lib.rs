//! Weather data for WeatherBridge
//!
//! Resolves the device position, asks the configured weather API for the
//! current temperature, and converts it into the integers the watchface shows.

pub mod location;
pub mod openweathermap;
pub mod provider;
pub mod types;
pub mod yahoo;

pub use location::{FixedLocation, GeolocationSource, Geolocator, IpGeolocation, PositionOptions};
pub use openweathermap::OpenWeatherMap;
pub use provider::{provider_from_config, WeatherClient, WeatherProvider};
pub use types::*;
pub use yahoo::YahooWeather;
