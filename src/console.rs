use tokio::sync::mpsc::UnboundedReceiver;
use weatherbridge_bridge::HostCommand;

/// Stand-in for the device runtime: prints outgoing messages and opens
/// requested pages in the system browser. Returns once every host handle is dropped.
pub async fn run(mut rx: UnboundedReceiver<HostCommand>) {
    while let Some(command) = rx.recv().await {
        match command {
            HostCommand::SendAppMessage(message) => match serde_json::to_string(&message) {
                Ok(json) => println!("appmessage {}", json),
                Err(e) => tracing::error!("Failed to encode message: {}", e),
            },
            HostCommand::OpenUrl(url) => {
                if let Err(e) = webbrowser::open(&url) {
                    tracing::warn!("Failed to open browser: {}", e);
                }
                println!("open {}", url);
            }
        }
    }
}
