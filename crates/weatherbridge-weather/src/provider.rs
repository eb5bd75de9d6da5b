use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::instrument;
use url::Url;
use weatherbridge_core::{NetworkError, ProviderKind, ReqwestErrorExt, WeatherConfig};

use crate::openweathermap::OpenWeatherMap;
use crate::types::{Coordinates, WeatherError, WeatherReading};
use crate::yahoo::YahooWeather;

/// A weather API: how to ask for the current temperature and how to read the answer.
pub trait WeatherProvider: Send + Sync {
    /// Short identifier used in logs
    fn name(&self) -> &'static str;

    /// GET URL for the current conditions at `coords`
    fn request_url(&self, coords: &Coordinates) -> Result<Url, WeatherError>;

    /// Extract the current temperature from a response body
    fn parse_reading(&self, body: &str) -> Result<WeatherReading, WeatherError>;
}

/// Build the provider selected in configuration
pub fn provider_from_config(config: &WeatherConfig) -> Result<Arc<dyn WeatherProvider>, WeatherError> {
    let provider: Arc<dyn WeatherProvider> = match config.provider {
        ProviderKind::OpenWeatherMap => {
            let owm = &config.openweathermap;
            let api_key = owm
                .api_key
                .clone()
                .filter(|k| !k.trim().is_empty())
                .ok_or(WeatherError::MissingApiKey("openweathermap"))?;
            Arc::new(OpenWeatherMap::new(&owm.base_url, api_key)?)
        }
        ProviderKind::Yahoo => Arc::new(YahooWeather::new(&config.yahoo.base_url)?),
    };

    Ok(provider)
}

/// HTTP client that fetches and parses readings through a provider
#[derive(Clone)]
pub struct WeatherClient {
    client: Client,
    provider: Arc<dyn WeatherProvider>,
}

impl WeatherClient {
    /// `timeout` of `None` leaves requests unbounded.
    pub fn new(
        provider: Arc<dyn WeatherProvider>,
        timeout: Option<Duration>,
    ) -> Result<Self, WeatherError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|e| e.into_network_error())?;

        Ok(Self { client, provider })
    }

    pub fn from_config(config: &WeatherConfig) -> Result<Self, WeatherError> {
        let provider = provider_from_config(config)?;
        Self::new(provider, config.http_timeout_secs.map(Duration::from_secs))
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    /// Fetch the current reading at `coords`.
    #[instrument(skip(self), fields(provider = self.provider.name()), level = "info")]
    pub async fn fetch(&self, coords: &Coordinates) -> Result<WeatherReading, WeatherError> {
        let url = self.provider.request_url(coords)?;
        tracing::info!("URL is {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| e.into_network_error())?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(NetworkError::ServerError {
                status: status.as_u16(),
                message,
            }
            .into());
        }

        let body = response.text().await.map_err(|e| e.into_network_error())?;
        tracing::debug!("Parsing JSON: {}", body);

        let reading = self.provider.parse_reading(&body)?;
        tracing::info!(
            "Temperature: {}F / {}C",
            reading.temperature_f,
            reading.temperature_c
        );
        Ok(reading)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn owm_client(base: &str) -> WeatherClient {
        let provider = Arc::new(OpenWeatherMap::new(base, "test-key").unwrap());
        WeatherClient::new(provider, None).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_openweathermap() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/data/2.5/weather"))
            .and(query_param("lat", "37"))
            .and(query_param("lon", "-122"))
            .and(query_param("appid", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "main": { "temp": 300.15, "humidity": 40 },
                "name": "Mountain View"
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = owm_client(&format!("{}/data/2.5/weather", mock_server.uri()));
        let reading = client.fetch(&Coordinates::new(37.0, -122.0)).await.unwrap();

        assert_eq!(reading, WeatherReading { temperature_f: 81, temperature_c: 27 });
    }

    #[tokio::test]
    async fn test_fetch_server_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401).set_body_string("Invalid API key"))
            .mount(&mock_server)
            .await;

        let client = owm_client(&format!("{}/data/2.5/weather", mock_server.uri()));
        let err = client.fetch(&Coordinates::new(37.0, -122.0)).await.unwrap_err();

        match err {
            WeatherError::Network(NetworkError::ServerError { status, message }) => {
                assert_eq!(status, 401);
                assert!(message.contains("Invalid API key"));
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_malformed_json() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&mock_server)
            .await;

        let client = owm_client(&format!("{}/data/2.5/weather", mock_server.uri()));
        let err = client.fetch(&Coordinates::new(37.0, -122.0)).await.unwrap_err();

        assert!(matches!(err, WeatherError::Parse(_)));
    }

    #[tokio::test]
    async fn test_fetch_connection_refused() {
        // Nothing listens on port 9 on test machines
        let client = owm_client("http://127.0.0.1:9/data/2.5/weather");
        let err = client.fetch(&Coordinates::new(37.0, -122.0)).await.unwrap_err();

        assert!(matches!(err, WeatherError::Network(_)));
    }

    #[test]
    fn test_provider_from_config_requires_key() {
        let mut config = WeatherConfig::default();
        config.openweathermap.api_key = None;
        assert!(matches!(
            provider_from_config(&config),
            Err(WeatherError::MissingApiKey(_))
        ));

        config.openweathermap.api_key = Some("abc".to_string());
        assert_eq!(provider_from_config(&config).unwrap().name(), "openweathermap");
    }

    #[test]
    fn test_provider_from_config_yahoo() {
        let config = WeatherConfig {
            provider: ProviderKind::Yahoo,
            ..WeatherConfig::default()
        };
        let client = WeatherClient::from_config(&config).unwrap();
        assert_eq!(client.provider_name(), "yahoo");
    }
}
