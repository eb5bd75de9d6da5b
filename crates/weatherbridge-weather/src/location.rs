//! Device geolocation: pluggable sources behind a timeout and a freshness window.

use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use weatherbridge_core::{GeolocationConfig, LocationSource, ReqwestErrorExt};

use crate::types::{Coordinates, LocationError, Position};

const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Something that can report where the device currently is.
#[async_trait]
pub trait GeolocationSource: Send + Sync {
    fn name(&self) -> &str;

    async fn current_position(&self) -> Result<Coordinates, LocationError>;
}

/// Coordinates pinned in configuration.
#[derive(Debug, Clone)]
pub struct FixedLocation {
    coords: Coordinates,
}

impl FixedLocation {
    pub fn new(coords: Coordinates) -> Self {
        Self { coords }
    }
}

#[async_trait]
impl GeolocationSource for FixedLocation {
    fn name(&self) -> &str {
        "fixed"
    }

    async fn current_position(&self) -> Result<Coordinates, LocationError> {
        Ok(self.coords)
    }
}

#[derive(Debug, Deserialize)]
struct IpLookupResponse {
    status: String,
    lat: Option<f64>,
    lon: Option<f64>,
    message: Option<String>,
    city: Option<String>,
}

/// Approximate coordinates from an ip-api.com compatible lookup service.
#[derive(Debug, Clone)]
pub struct IpGeolocation {
    client: Client,
    url: String,
}

impl IpGeolocation {
    pub fn new(url: impl Into<String>) -> Result<Self, LocationError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| LocationError::Other(e.to_string()))?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl GeolocationSource for IpGeolocation {
    fn name(&self) -> &str {
        "ip"
    }

    async fn current_position(&self) -> Result<Coordinates, LocationError> {
        let unavailable =
            |e: reqwest::Error| LocationError::ServiceUnavailable(e.into_network_error().to_string());

        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(unavailable)?;

        if !response.status().is_success() {
            return Err(LocationError::ServiceUnavailable(format!(
                "lookup returned status {}",
                response.status()
            )));
        }

        let body: IpLookupResponse = response.json().await.map_err(unavailable)?;

        if body.status != "success" {
            return Err(LocationError::ServiceUnavailable(
                body.message.unwrap_or(body.status),
            ));
        }

        match (body.lat, body.lon) {
            (Some(lat), Some(lon)) => {
                tracing::debug!(
                    "IP lookup placed device near {}",
                    body.city.as_deref().unwrap_or("unknown city")
                );
                Ok(Coordinates::new(lat, lon))
            }
            _ => Err(LocationError::Other(
                "lookup response missing coordinates".to_string(),
            )),
        }
    }
}

/// Bounds on a single position request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionOptions {
    /// How long to wait for the source before giving up
    pub timeout: Duration,
    /// How old a previous position may be and still be returned
    pub maximum_age: Duration,
}

impl Default for PositionOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(15),
            maximum_age: Duration::from_secs(60),
        }
    }
}

impl From<&GeolocationConfig> for PositionOptions {
    fn from(config: &GeolocationConfig) -> Self {
        Self {
            timeout: Duration::from_secs(config.timeout_secs),
            maximum_age: Duration::from_secs(config.maximum_age_secs),
        }
    }
}

/// Position lookups with a bounded wait and reuse of recent positions.
pub struct Geolocator {
    source: Arc<dyn GeolocationSource>,
    options: PositionOptions,
    last: Mutex<Option<Position>>,
}

impl Geolocator {
    pub fn new(source: Arc<dyn GeolocationSource>, options: PositionOptions) -> Self {
        Self {
            source,
            options,
            last: Mutex::new(None),
        }
    }

    /// Build the source selected in configuration
    pub fn from_config(config: &GeolocationConfig) -> Result<Self, LocationError> {
        let source: Arc<dyn GeolocationSource> = match config.source {
            LocationSource::Fixed => match (config.latitude, config.longitude) {
                (Some(lat), Some(lon)) => Arc::new(FixedLocation::new(Coordinates::new(lat, lon))),
                _ => {
                    return Err(LocationError::Other(
                        "fixed location requires latitude and longitude".to_string(),
                    ))
                }
            },
            LocationSource::Ip => Arc::new(IpGeolocation::new(config.ip_lookup_url.clone())?),
        };

        Ok(Self::new(source, PositionOptions::from(config)))
    }

    pub fn options(&self) -> PositionOptions {
        self.options
    }

    pub fn source_name(&self) -> &str {
        self.source.name()
    }

    /// Current position, reusing the last one if it is younger than `maximum_age`.
    pub async fn current_position(&self) -> Result<Position, LocationError> {
        if let Some(position) = self.fresh_position() {
            tracing::debug!(
                "Reusing position acquired {:?} ago",
                position.age()
            );
            return Ok(position);
        }

        let coords = tokio::time::timeout(self.options.timeout, self.source.current_position())
            .await
            .map_err(|_| LocationError::Timeout(self.options.timeout))??;

        let position = Position::now(coords);
        *self.last.lock() = Some(position);
        Ok(position)
    }

    fn fresh_position(&self) -> Option<Position> {
        let last = *self.last.lock();
        last.filter(|p| p.age() < self.options.maximum_age)
    }
}
