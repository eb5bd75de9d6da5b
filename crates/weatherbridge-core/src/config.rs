use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

use crate::error::ConfigError;

/// Environment variable consulted when no OpenWeatherMap key is configured.
pub const API_KEY_ENV: &str = "OPENWEATHERMAP_API_KEY";

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of config validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are OK)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Get a single-line message summarizing all errors
    pub fn error_summary(&self) -> String {
        if self.errors.is_empty() {
            return String::new();
        }
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Weather provider selection and endpoints
    #[serde(default)]
    pub weather: WeatherConfig,

    /// Where device coordinates come from
    #[serde(default)]
    pub geolocation: GeolocationConfig,

    /// Watchface settings page
    #[serde(default)]
    pub settings: SettingsConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Which weather API answers refresh requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    OpenWeatherMap,
    Yahoo,
}

impl std::str::FromStr for ProviderKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openweathermap" | "owm" => Ok(Self::OpenWeatherMap),
            "yahoo" | "yql" => Ok(Self::Yahoo),
            other => Err(ConfigError::Invalid(format!(
                "unknown weather provider: {}",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct WeatherConfig {
    #[serde(default)]
    pub provider: ProviderKind,

    /// Request timeout for the weather API. Unset means no timeout.
    #[serde(default)]
    pub http_timeout_secs: Option<u64>,

    #[serde(default)]
    pub openweathermap: OpenWeatherMapConfig,

    #[serde(default)]
    pub yahoo: YahooConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenWeatherMapConfig {
    #[serde(default = "default_owm_url")]
    pub base_url: String,

    /// Bare API key appended as `appid`
    #[serde(default)]
    pub api_key: Option<String>,
}

fn default_owm_url() -> String {
    "http://api.openweathermap.org/data/2.5/weather".to_string()
}

impl Default for OpenWeatherMapConfig {
    fn default() -> Self {
        Self {
            base_url: default_owm_url(),
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YahooConfig {
    #[serde(default = "default_yahoo_url")]
    pub base_url: String,
}

fn default_yahoo_url() -> String {
    "https://query.yahooapis.com/v1/public/yql".to_string()
}

impl Default for YahooConfig {
    fn default() -> Self {
        Self {
            base_url: default_yahoo_url(),
        }
    }
}

/// Source of device coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LocationSource {
    /// Coordinates pinned in the config file
    Fixed,
    /// Approximate coordinates from an IP lookup service
    #[default]
    Ip,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeolocationConfig {
    #[serde(default)]
    pub source: LocationSource,

    #[serde(default)]
    pub latitude: Option<f64>,

    #[serde(default)]
    pub longitude: Option<f64>,

    #[serde(default = "default_ip_lookup_url")]
    pub ip_lookup_url: String,

    /// Upper bound on a single position lookup
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// How old a previously acquired position may be and still be reused
    #[serde(default = "default_maximum_age_secs")]
    pub maximum_age_secs: u64,
}

fn default_ip_lookup_url() -> String {
    "http://ip-api.com/json".to_string()
}

fn default_timeout_secs() -> u64 {
    15
}

fn default_maximum_age_secs() -> u64 {
    60
}

impl Default for GeolocationConfig {
    fn default() -> Self {
        Self {
            source: LocationSource::default(),
            latitude: None,
            longitude: None,
            ip_lookup_url: default_ip_lookup_url(),
            timeout_secs: default_timeout_secs(),
            maximum_age_secs: default_maximum_age_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingsConfig {
    /// Page opened when the user asks for watchface settings
    #[serde(default = "default_configuration_url")]
    pub configuration_url: String,
}

fn default_configuration_url() -> String {
    "http://659196e.ngrok.com".to_string()
}

impl Default for SettingsConfig {
    fn default() -> Self {
        Self {
            configuration_url: default_configuration_url(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default tracing filter when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Config {
    /// Load configuration from the default location, creating it if it doesn't exist.
    ///
    /// Returns the config, its path and whether a default file was written.
    pub fn load() -> Result<(Self, PathBuf, bool)> {
        let config_path = Self::config_path()?;
        let (config, created) = Self::load_or_create(&config_path)?;
        Ok((config, config_path, created))
    }

    /// Load `path`, writing the default configuration there first if it is missing.
    /// The flag is true when the file was created.
    pub fn load_or_create(path: &Path) -> Result<(Self, bool)> {
        if !path.exists() {
            let mut config = Self::default();
            config.save_to(path)?;
            config.apply_env();
            return Ok((config, true));
        }

        let config = Self::load_from(path).context("Failed to load config file")?;
        Ok((config, false))
    }

    /// Load configuration from an explicit path
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }

        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Invalid(format!("{}: {}", path.display(), e)))?;

        let mut config: Config =
            toml::from_str(&contents).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.apply_env();

        Ok(config)
    }

    /// Fill the OpenWeatherMap key from the environment when the file has none
    fn apply_env(&mut self) {
        if self.weather.openweathermap.api_key.is_none() {
            self.weather.openweathermap.api_key = std::env::var(API_KEY_ENV).ok();
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        match self.weather.provider {
            ProviderKind::OpenWeatherMap => {
                Self::validate_url(
                    &self.weather.openweathermap.base_url,
                    "weather.openweathermap.base_url",
                    &mut result,
                );
                let key_missing = self
                    .weather
                    .openweathermap
                    .api_key
                    .as_deref()
                    .map_or(true, |k| k.trim().is_empty());
                if key_missing {
                    result.add_error(
                        "weather.openweathermap.api_key",
                        format!("No API key configured (set it here or in {})", API_KEY_ENV),
                    );
                }
            }
            ProviderKind::Yahoo => {
                Self::validate_url(
                    &self.weather.yahoo.base_url,
                    "weather.yahoo.base_url",
                    &mut result,
                );
                result.add_warning(
                    "weather.provider",
                    "The Yahoo YQL endpoint has been retired; prefer openweathermap",
                );
            }
        }

        if self.geolocation.maximum_age_secs == 0 {
            result.add_warning(
                "geolocation.maximum_age_secs",
                "Every refresh will perform a fresh location lookup",
            );
        }

        if self.weather.http_timeout_secs == Some(0) {
            result.add_error(
                "weather.http_timeout_secs",
                "Timeout must be greater than 0 (omit it to disable)",
            );
        }

        match self.geolocation.source {
            LocationSource::Fixed => {
                match (self.geolocation.latitude, self.geolocation.longitude) {
                    (Some(lat), Some(lon)) => {
                        if !(-90.0..=90.0).contains(&lat) {
                            result.add_error(
                                "geolocation.latitude",
                                format!("Latitude out of range: {}", lat),
                            );
                        }
                        if !(-180.0..=180.0).contains(&lon) {
                            result.add_error(
                                "geolocation.longitude",
                                format!("Longitude out of range: {}", lon),
                            );
                        }
                    }
                    _ => result.add_error(
                        "geolocation",
                        "Fixed source requires both latitude and longitude",
                    ),
                }
            }
            LocationSource::Ip => {
                Self::validate_url(
                    &self.geolocation.ip_lookup_url,
                    "geolocation.ip_lookup_url",
                    &mut result,
                );
            }
        }

        if self.geolocation.timeout_secs == 0 {
            result.add_error(
                "geolocation.timeout_secs",
                "Geolocation timeout must be greater than 0",
            );
        }

        Self::validate_url(
            &self.settings.configuration_url,
            "settings.configuration_url",
            &mut result,
        );

        result
    }

    fn validate_url(url_str: &str, field_name: &str, result: &mut ValidationResult) {
        match Url::parse(url_str) {
            Ok(url) => {
                if url.scheme() != "http" && url.scheme() != "https" {
                    result.add_error(
                        field_name,
                        format!("URL must use http or https scheme, got: {}", url.scheme()),
                    );
                }

                if url.host().is_none() {
                    result.add_error(field_name, "URL must have a host");
                }
            }
            Err(e) => {
                result.add_error(field_name, format!("Invalid URL: {}", e));
            }
        }
    }

    /// Save configuration to the given path
    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(config_path, contents).context("Failed to write config file")?;

        Ok(())
    }

    /// Get the path to the default configuration file
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join("weatherbridge");

        Ok(config_dir.join("config.toml"))
    }
}
