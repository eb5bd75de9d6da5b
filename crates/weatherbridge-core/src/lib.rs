pub mod app;
pub mod config;
pub mod error;
pub mod events;
pub mod message;

pub use app::App;
pub use config::{
    Config, GeolocationConfig, LocationSource, LoggingConfig, OpenWeatherMapConfig, ProviderKind,
    SettingsConfig, ValidationResult, WeatherConfig, YahooConfig,
};
pub use error::{AppError, ConfigError, HostError, NetworkError, ReqwestErrorExt};
pub use events::{EventListener, HostEvent};
pub use message::{InboundMessage, MessageKey, OutboundMessage};

use anyhow::Result;

/// Initialize tracing/logging.
///
/// `RUST_LOG` takes precedence; otherwise `default_level` is used as the filter.
pub fn init(default_level: &str) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to install tracing subscriber: {}", e))?;

    tracing::info!("WeatherBridge core initialized");
    Ok(())
}
