use std::sync::Arc;

use crate::{Config, EventListener, HostEvent};

/// Application state and event routing
pub struct App {
    config: Arc<Config>,
    listeners: Vec<Arc<dyn EventListener>>,
}

impl App {
    /// Create an application around an already-loaded config
    pub fn new(config: Config) -> Self {
        Self {
            config: Arc::new(config),
            listeners: Vec::new(),
        }
    }

    /// Register a listener; every subsequent event is delivered to it
    pub fn register_listener(&mut self, listener: Arc<dyn EventListener>) {
        tracing::info!("Registering event listener: {}", listener.id());
        self.listeners.push(listener);
    }

    /// Route a host event to every registered listener
    pub fn dispatch(&self, event: &HostEvent) {
        tracing::debug!(
            "Dispatching '{}' to {} listeners",
            event.name(),
            self.listeners.len()
        );

        if self.listeners.is_empty() {
            tracing::warn!("No listeners registered for '{}'", event.name());
            return;
        }

        for listener in &self.listeners {
            match event {
                HostEvent::Ready => listener.on_ready(),
                HostEvent::AppMessage(message) => listener.on_app_message(message),
                HostEvent::ShowConfiguration => listener.on_show_configuration(),
                HostEvent::WebViewClosed { response } => {
                    listener.on_configuration_closed(response)
                }
            }
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn listeners(&self) -> &[Arc<dyn EventListener>] {
        &self.listeners
    }
}
