use crate::message::InboundMessage;

/// Events delivered by the host runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    /// The companion runtime finished starting up
    Ready,
    /// The paired device asked for fresh data
    AppMessage(InboundMessage),
    /// The user opened the watchface settings
    ShowConfiguration,
    /// The settings web view closed; `response` is the raw URL-encoded payload
    WebViewClosed { response: String },
}

impl HostEvent {
    /// Event name as used by the host runtime
    pub fn name(&self) -> &'static str {
        match self {
            HostEvent::Ready => "ready",
            HostEvent::AppMessage(_) => "appmessage",
            HostEvent::ShowConfiguration => "showConfiguration",
            HostEvent::WebViewClosed { .. } => "webviewclosed",
        }
    }

    /// Parse a single command line of the form `<event name> [payload]`.
    ///
    /// `appmessage` accepts an optional JSON object of numeric keys;
    /// `webviewclosed` takes the rest of the line verbatim.
    pub fn from_command(line: &str) -> Option<Self> {
        let line = line.trim();
        let (name, rest) = match line.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim()),
            None => (line, ""),
        };

        match name {
            "ready" => Some(HostEvent::Ready),
            "appmessage" => {
                let message = if rest.is_empty() {
                    InboundMessage::default()
                } else {
                    serde_json::from_str(rest).ok()?
                };
                Some(HostEvent::AppMessage(message))
            }
            "showConfiguration" => Some(HostEvent::ShowConfiguration),
            "webviewclosed" => Some(HostEvent::WebViewClosed {
                response: rest.to_string(),
            }),
            _ => None,
        }
    }
}

/// Receiver of host events, registered with [`crate::App`] at startup.
///
/// Handlers must return promptly; long-running work is spawned and runs to
/// completion independently of the caller.
pub trait EventListener: Send + Sync {
    /// Unique identifier for this listener
    fn id(&self) -> &str;

    fn on_ready(&self);

    fn on_app_message(&self, message: &InboundMessage);

    fn on_show_configuration(&self);

    fn on_configuration_closed(&self, response: &str);
}
