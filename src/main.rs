use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use argh::FromArgs;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc::UnboundedReceiver;
use weatherbridge_bridge::{BridgeError, ChannelHost, HostCommand, WeatherBridge};
use weatherbridge_core::{App, AppError, Config, HostEvent, ProviderKind};
use weatherbridge_weather::{Geolocator, WeatherClient};

mod console;

#[derive(FromArgs)]
/// Weather companion for a paired watchface
struct Args {
    /// path to the configuration file (default: <config dir>/weatherbridge/config.toml)
    #[argh(option, short = 'c')]
    config: Option<String>,

    /// weather provider to use instead of the configured one (openweathermap, yahoo)
    #[argh(option)]
    provider: Option<ProviderKind>,

    /// fetch the weather once and exit instead of reading events from stdin
    #[argh(switch)]
    once: bool,
}

fn build_app(
    config: Config,
) -> Result<(App, Arc<WeatherBridge>, UnboundedReceiver<HostCommand>), AppError> {
    let geolocator = Geolocator::from_config(&config.geolocation).map_err(BridgeError::from)?;
    let weather = WeatherClient::from_config(&config.weather).map_err(BridgeError::from)?;
    tracing::info!(
        "Using {} weather with {} location (timeout {:?}, maximum age {:?})",
        weather.provider_name(),
        geolocator.source_name(),
        geolocator.options().timeout,
        geolocator.options().maximum_age
    );

    let (host, rx) = ChannelHost::channel();
    let bridge = Arc::new(WeatherBridge::new(
        Arc::new(host),
        Arc::new(geolocator),
        weather,
        config.settings.configuration_url.clone(),
    )?);

    let mut app = App::new(config);
    app.register_listener(bridge.clone());

    Ok((app, bridge, rx))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Args = argh::from_env();

    let (mut config, written) = match &args.config {
        Some(path) => {
            let config = Config::load_from(Path::new(path))
                .map_err(|e| anyhow::anyhow!("{} ({})", e.user_message(), e))?;
            (config, None)
        }
        None => {
            let (config, path, created) = Config::load()?;
            (config, created.then_some(path))
        }
    };
    if let Some(provider) = args.provider {
        config.weather.provider = provider;
    }

    weatherbridge_core::init(&config.logging.level)?;

    if let Some(path) = written {
        tracing::info!("Wrote default configuration to {}", path.display());
    }

    let validation = config.validate();
    for warning in &validation.warnings {
        tracing::warn!("Config warning: {}", warning);
    }
    if !validation.is_valid() {
        anyhow::bail!(
            "Configuration validation failed: {}",
            validation.error_summary()
        );
    }

    let (app, bridge, rx) = match build_app(config) {
        Ok(parts) => parts,
        Err(e) => {
            tracing::error!("{} ({})", e.user_message(), e);
            return Err(e.into());
        }
    };
    let console = tokio::spawn(console::run(rx));

    tracing::info!(
        "WeatherBridge started ({} listeners, settings page {})",
        app.listeners().len(),
        app.config().settings.configuration_url
    );

    app.dispatch(&HostEvent::Ready);

    if !args.once {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Some(line) = lines.next_line().await? {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if line == "quit" || line == "exit" {
                break;
            }
            match HostEvent::from_command(line) {
                Some(event) => app.dispatch(&event),
                None => tracing::warn!("Unknown event: {}", line),
            }
        }
    }

    tracing::debug!("Waiting for {} in-flight pipelines", bridge.in_flight());
    bridge.idle().await;

    // Dropping the last host handle ends the console task
    drop(app);
    drop(bridge);
    console.await?;

    tracing::info!("WeatherBridge stopped");
    Ok(())
}
