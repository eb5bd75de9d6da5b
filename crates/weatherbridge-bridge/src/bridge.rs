//! The companion-side event handler.
//! Each event spawns an independent pipeline; failures are logged and dropped.

use std::sync::Arc;

use tokio::runtime::Handle;
use tokio_util::task::TaskTracker;
use weatherbridge_core::{EventListener, HostError, InboundMessage, OutboundMessage};
use weatherbridge_weather::{Coordinates, Geolocator, WeatherClient, WeatherReading};

use crate::error::BridgeError;
use crate::host::HostRuntime;
use crate::settings::{decode_settings, SettingsError};

struct Pipeline {
    host: Arc<dyn HostRuntime>,
    geolocator: Arc<Geolocator>,
    weather: WeatherClient,
}

impl Pipeline {
    async fn refresh(&self) -> Result<WeatherReading, BridgeError> {
        let position = self.geolocator.current_position().await?;
        tracing::info!("Lat is {}", position.coords.latitude);
        tracing::info!("Lon is {}", position.coords.longitude);

        self.fetch_weather(position.coords).await
    }

    async fn fetch_weather(&self, coords: Coordinates) -> Result<WeatherReading, BridgeError> {
        let reading = self.weather.fetch(&coords).await?;
        self.send(OutboundMessage::from(reading)).await?;
        Ok(reading)
    }

    async fn send(&self, message: OutboundMessage) -> Result<(), HostError> {
        tracing::debug!("Sending {} keys to device", message.len());
        self.host.send_app_message(&message).await?;
        tracing::info!("Message sent to device successfully");
        Ok(())
    }
}

/// Runs the location -> weather -> message pipeline on host events.
pub struct WeatherBridge {
    pipeline: Arc<Pipeline>,
    configuration_url: String,
    tracker: TaskTracker,
    runtime: Handle,
}

impl WeatherBridge {
    /// Must be called from within a tokio runtime; pipelines are spawned on it.
    pub fn new(
        host: Arc<dyn HostRuntime>,
        geolocator: Arc<Geolocator>,
        weather: WeatherClient,
        configuration_url: impl Into<String>,
    ) -> Result<Self, BridgeError> {
        let runtime = Handle::try_current().map_err(|_| BridgeError::NoRuntime)?;

        Ok(Self {
            pipeline: Arc::new(Pipeline {
                host,
                geolocator,
                weather,
            }),
            configuration_url: configuration_url.into(),
            tracker: TaskTracker::new(),
            runtime,
        })
    }

    /// Start a refresh in the background. Concurrent refreshes all run to completion.
    pub fn refresh_weather(&self) {
        let pipeline = self.pipeline.clone();
        self.tracker.spawn_on(
            async move {
                match pipeline.refresh().await {
                    Ok(reading) => tracing::debug!(
                        "Refresh complete: {}F / {}C",
                        reading.temperature_f,
                        reading.temperature_c
                    ),
                    Err(e) => tracing::error!("{}", e),
                }
            },
            &self.runtime,
        );
    }

    /// Fetch the reading at `coords` and send it to the device.
    pub async fn fetch_weather(&self, coords: Coordinates) -> Result<WeatherReading, BridgeError> {
        self.pipeline.fetch_weather(coords).await
    }

    /// Send a message to the device.
    pub async fn send(&self, message: OutboundMessage) -> Result<(), HostError> {
        self.pipeline.send(message).await
    }

    /// Open the settings page.
    pub fn show_configuration(&self) {
        tracing::info!("Showing configuration page: {}", self.configuration_url);
        if let Err(e) = self.pipeline.host.open_url(&self.configuration_url) {
            tracing::error!("{}", e);
        }
    }

    /// Decode the settings page result and forward the unit preference.
    pub fn configuration_closed(&self, response: &str) {
        let settings = match decode_settings(response) {
            Ok(settings) => settings,
            Err(SettingsError::Cancelled) => {
                tracing::info!("Configuration page closed without changes");
                return;
            }
            Err(e) => {
                tracing::error!("{}", BridgeError::from(e));
                return;
            }
        };

        let pipeline = self.pipeline.clone();
        self.tracker.spawn_on(
            async move {
                match pipeline.send(settings.to_message()).await {
                    Ok(()) => tracing::info!("Send successful!"),
                    Err(e) => tracing::error!("Send failed: {}", e),
                }
            },
            &self.runtime,
        );
    }

    /// Wait until every pipeline spawned so far has finished.
    pub async fn idle(&self) {
        self.tracker.close();
        self.tracker.wait().await;
        self.tracker.reopen();
    }

    /// Number of pipelines still running. Diagnostics only; the harness logs it
    /// before shutting down.
    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }
}

impl EventListener for WeatherBridge {
    fn id(&self) -> &str {
        "weather-bridge"
    }

    fn on_ready(&self) {
        tracing::info!("Companion ready, fetching weather");
        self.refresh_weather();
    }

    fn on_app_message(&self, message: &InboundMessage) {
        tracing::info!("AppMessage received ({} keys)", message.len());
        self.refresh_weather();
    }

    fn on_show_configuration(&self) {
        self.show_configuration();
    }

    fn on_configuration_closed(&self, response: &str) {
        self.configuration_closed(response);
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use crate::host::{ChannelHost, HostCommand};
    use weatherbridge_core::MessageKey;
    use weatherbridge_weather::{FixedLocation, PositionOptions, YahooWeather};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn geolocator() -> Arc<Geolocator> {
        Arc::new(Geolocator::new(
            Arc::new(FixedLocation::new(Coordinates::new(37.0, -122.0))),
            PositionOptions::default(),
        ))
    }

    fn yahoo_client(base: &str) -> WeatherClient {
        WeatherClient::new(Arc::new(YahooWeather::new(base).unwrap()), None).unwrap()
    }

    #[test]
    fn test_requires_runtime() {
        let (host, _rx) = ChannelHost::channel();
        let result = WeatherBridge::new(
            Arc::new(host),
            geolocator(),
            yahoo_client("http://localhost/v1/public/yql"),
            "http://example.com/settings",
        );
        assert!(matches!(result, Err(BridgeError::NoRuntime)));
    }

    #[tokio::test]
    async fn test_show_configuration_opens_url() {
        let (host, mut rx) = ChannelHost::channel();
        let bridge = WeatherBridge::new(
            Arc::new(host),
            geolocator(),
            yahoo_client("http://localhost/v1/public/yql"),
            "http://example.com/settings",
        )
        .unwrap();

        bridge.on_show_configuration();

        assert_eq!(
            rx.recv().await,
            Some(HostCommand::OpenUrl("http://example.com/settings".to_string()))
        );
    }

    #[tokio::test]
    async fn test_cancelled_settings_send_nothing() {
        let (host, mut rx) = ChannelHost::channel();
        let bridge = WeatherBridge::new(
            Arc::new(host),
            geolocator(),
            yahoo_client("http://localhost/v1/public/yql"),
            "http://example.com/settings",
        )
        .unwrap();

        bridge.on_configuration_closed("CANCELLED");
        bridge.on_configuration_closed("%7Bbroken");
        bridge.idle().await;

        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_fetch_weather_sends_reading() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/public/yql"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "query": { "results": { "channel": { "item": { "condition": { "temp": "18" } } } } }
            })))
            .mount(&mock_server)
            .await;

        let (host, mut rx) = ChannelHost::channel();
        let bridge = WeatherBridge::new(
            Arc::new(host),
            geolocator(),
            yahoo_client(&format!("{}/v1/public/yql", mock_server.uri())),
            "http://example.com/settings",
        )
        .unwrap();

        let reading = bridge
            .fetch_weather(Coordinates::new(37.0, -122.0))
            .await
            .unwrap();

        // 18 C = 64.4 F
        assert_eq!(reading, WeatherReading { temperature_f: 64, temperature_c: 18 });
        match rx.recv().await {
            Some(HostCommand::SendAppMessage(msg)) => {
                assert_eq!(msg.get(MessageKey::Temperature), Some(64));
                assert_eq!(msg.get(MessageKey::TemperatureInC), Some(18));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_in_flight_drops_to_zero_after_idle() {
        let (host, _rx) = ChannelHost::channel();
        let bridge = WeatherBridge::new(
            Arc::new(host),
            geolocator(),
            yahoo_client("http://localhost/v1/public/yql"),
            "http://example.com/settings",
        )
        .unwrap();

        bridge.on_configuration_closed(r#"{"useCelsius":true}"#);
        assert_eq!(bridge.in_flight(), 1);

        bridge.idle().await;
        assert_eq!(bridge.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_send_reports_disconnected_device() {
        let (host, rx) = ChannelHost::channel();
        drop(rx);
        let bridge = WeatherBridge::new(
            Arc::new(host),
            geolocator(),
            yahoo_client("http://localhost/v1/public/yql"),
            "http://example.com/settings",
        )
        .unwrap();

        let err = bridge.send(OutboundMessage::use_celsius(true)).await.unwrap_err();
        assert!(matches!(err, HostError::NotConnected));
    }
}
