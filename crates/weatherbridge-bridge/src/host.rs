use async_trait::async_trait;
use tokio::sync::mpsc;
use weatherbridge_core::{HostError, OutboundMessage};

/// Outbound side of the device runtime.
#[async_trait]
pub trait HostRuntime: Send + Sync {
    /// Deliver a structured message to the paired device.
    async fn send_app_message(&self, message: &OutboundMessage) -> Result<(), HostError>;

    /// Show an external page (the watchface settings) to the user.
    fn open_url(&self, url: &str) -> Result<(), HostError>;
}

/// Requests a [`ChannelHost`] forwards to whoever owns the receiver
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCommand {
    SendAppMessage(OutboundMessage),
    OpenUrl(String),
}

/// Host runtime that hands every request to an mpsc channel.
///
/// Sends fail with `NotConnected` once the receiver is dropped.
#[derive(Debug, Clone)]
pub struct ChannelHost {
    tx: mpsc::UnboundedSender<HostCommand>,
}

impl ChannelHost {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<HostCommand>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl HostRuntime for ChannelHost {
    async fn send_app_message(&self, message: &OutboundMessage) -> Result<(), HostError> {
        self.tx
            .send(HostCommand::SendAppMessage(message.clone()))
            .map_err(|_| HostError::NotConnected)
    }

    fn open_url(&self, url: &str) -> Result<(), HostError> {
        self.tx
            .send(HostCommand::OpenUrl(url.to_string()))
            .map_err(|_| HostError::OpenUrlFailed {
                url: url.to_string(),
                reason: "host runtime closed".to_string(),
            })
    }
}
