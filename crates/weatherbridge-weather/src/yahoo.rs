//! Yahoo YQL weather adapter. Asks for Celsius and truncates like the watchface expects.

use serde::Deserialize;
use url::Url;

use crate::provider::WeatherProvider;
use crate::types::{Coordinates, Rounding, WeatherError, WeatherReading};

#[derive(Debug, Deserialize)]
struct YqlResponse {
    query: YqlQuery,
}

#[derive(Debug, Deserialize)]
struct YqlQuery {
    results: Option<YqlResults>,
}

#[derive(Debug, Deserialize)]
struct YqlResults {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    item: Item,
}

#[derive(Debug, Deserialize)]
struct Item {
    condition: Condition,
}

#[derive(Debug, Deserialize)]
struct Condition {
    temp: Temperature,
}

/// YQL reports numbers as strings; accept either.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Temperature {
    Number(f64),
    Text(String),
}

impl Temperature {
    fn celsius(&self) -> Result<f64, WeatherError> {
        let value = match self {
            Temperature::Number(n) => *n,
            Temperature::Text(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|_| WeatherError::Parse(format!("temperature is not a number: {:?}", s)))?,
        };

        if value.is_finite() {
            Ok(value)
        } else {
            Err(WeatherError::Parse(format!("temperature is not finite: {}", value)))
        }
    }
}

#[derive(Debug, Clone)]
pub struct YahooWeather {
    base_url: Url,
}

impl YahooWeather {
    pub fn new(base_url: &str) -> Result<Self, WeatherError> {
        Ok(Self {
            base_url: Url::parse(base_url)?,
        })
    }

    fn query(coords: &Coordinates) -> String {
        format!(
            "select item.condition.temp from weather.forecast where woeid in \
             (select woeid from geo.places(1) where text=\"({}, {})\") and u=\"c\"",
            coords.latitude, coords.longitude
        )
    }
}

impl WeatherProvider for YahooWeather {
    fn name(&self) -> &'static str {
        "yahoo"
    }

    fn request_url(&self, coords: &Coordinates) -> Result<Url, WeatherError> {
        let mut url = self.base_url.clone();
        url.query_pairs_mut()
            .append_pair("q", &Self::query(coords))
            .append_pair("format", "json");
        Ok(url)
    }

    fn parse_reading(&self, body: &str) -> Result<WeatherReading, WeatherError> {
        let response: YqlResponse = serde_json::from_str(body)?;

        let results = response
            .query
            .results
            .ok_or_else(|| WeatherError::Parse("query returned no results".to_string()))?;

        let celsius = results.channel.item.condition.temp.celsius()?;
        Ok(WeatherReading::from_celsius(celsius, Rounding::Truncate))
    }
}
