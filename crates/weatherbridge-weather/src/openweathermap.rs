//! OpenWeatherMap current-weather adapter. Temperatures arrive in Kelvin.

use serde::Deserialize;
use url::Url;

use crate::provider::WeatherProvider;
use crate::types::{Coordinates, Rounding, WeatherError, WeatherReading};

#[derive(Debug, Deserialize)]
struct CurrentWeatherResponse {
    main: Option<MainBlock>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MainBlock {
    temp: f64,
}

#[derive(Debug, Clone)]
pub struct OpenWeatherMap {
    base_url: Url,
    api_key: String,
}

impl OpenWeatherMap {
    pub fn new(base_url: &str, api_key: impl Into<String>) -> Result<Self, WeatherError> {
        Ok(Self {
            base_url: Url::parse(base_url)?,
            api_key: api_key.into(),
        })
    }
}

impl WeatherProvider for OpenWeatherMap {
    fn name(&self) -> &'static str {
        "openweathermap"
    }

    fn request_url(&self, coords: &Coordinates) -> Result<Url, WeatherError> {
        let mut url = self.base_url.clone();
        url.query_pairs_mut()
            .append_pair("lat", &coords.latitude.to_string())
            .append_pair("lon", &coords.longitude.to_string())
            .append_pair("appid", &self.api_key);
        Ok(url)
    }

    fn parse_reading(&self, body: &str) -> Result<WeatherReading, WeatherError> {
        let response: CurrentWeatherResponse = serde_json::from_str(body)?;

        let kelvin = match response.main {
            Some(main) => main.temp,
            None => {
                return Err(WeatherError::Parse(format!(
                    "response has no main.temp ({})",
                    response.message.as_deref().unwrap_or("no message")
                )))
            }
        };

        if !kelvin.is_finite() {
            return Err(WeatherError::Parse(format!("temperature is not finite: {}", kelvin)));
        }

        Ok(WeatherReading::from_kelvin(kelvin, Rounding::Nearest))
    }
}
