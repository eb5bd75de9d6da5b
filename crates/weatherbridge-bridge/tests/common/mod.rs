//! Shared fixtures for bridge scenario tests.

#![allow(dead_code, clippy::expect_used)]

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc::UnboundedReceiver;
use weatherbridge_bridge::{ChannelHost, HostCommand, WeatherBridge};
use weatherbridge_core::{App, Config, OutboundMessage};
use weatherbridge_weather::{
    Coordinates, FixedLocation, GeolocationSource, Geolocator, LocationError, OpenWeatherMap,
    PositionOptions, WeatherClient,
};
use wiremock::MockServer;

pub const SETTINGS_URL: &str = "http://settings.example.com";

/// Geolocation source that always refuses.
pub struct DeniedLocation;

#[async_trait]
impl GeolocationSource for DeniedLocation {
    fn name(&self) -> &str {
        "denied"
    }

    async fn current_position(&self) -> Result<Coordinates, LocationError> {
        Err(LocationError::PermissionDenied)
    }
}

pub fn owm_weather(server: &MockServer) -> WeatherClient {
    let provider = OpenWeatherMap::new(&format!("{}/data/2.5/weather", server.uri()), "test-key")
        .expect("valid base url");
    WeatherClient::new(Arc::new(provider), None).expect("client builds")
}

pub fn fixed_geolocator() -> Arc<Geolocator> {
    Arc::new(Geolocator::new(
        Arc::new(FixedLocation::new(Coordinates::new(37.0, -122.0))),
        PositionOptions::default(),
    ))
}

pub fn denied_geolocator() -> Arc<Geolocator> {
    Arc::new(Geolocator::new(
        Arc::new(DeniedLocation),
        PositionOptions::default(),
    ))
}

/// App with a single bridge registered, plus the receiving end of its host.
pub fn app_with_bridge(
    geolocator: Arc<Geolocator>,
    weather: WeatherClient,
) -> (App, Arc<WeatherBridge>, UnboundedReceiver<HostCommand>) {
    let (host, rx) = ChannelHost::channel();
    let bridge = Arc::new(
        WeatherBridge::new(Arc::new(host), geolocator, weather, SETTINGS_URL)
            .expect("inside a runtime"),
    );
    let mut app = App::new(Config::default());
    app.register_listener(bridge.clone());
    (app, bridge, rx)
}

/// Drain every message the bridge sent so far.
pub fn sent_messages(rx: &mut UnboundedReceiver<HostCommand>) -> Vec<OutboundMessage> {
    let mut messages = Vec::new();
    while let Ok(command) = rx.try_recv() {
        if let HostCommand::SendAppMessage(msg) = command {
            messages.push(msg);
        }
    }
    messages
}
