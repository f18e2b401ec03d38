use std::error::Error;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::time::{sleep, Duration};
use tracing::{error, info};
use tracing_sematext::{
    init::{init_tracing, SinkConfig},
    transport::Transport,
};
use url::Url;

/// Example of shipping through a completely custom client by implementing
/// the `Transport` trait directly. Imagine this goes through some
/// in-house HTTP stack instead of reqwest.
struct StdoutTransport;

#[async_trait]
impl Transport for StdoutTransport {
    async fn post(&self, url: &Url, body: Vec<u8>) -> Result<(), Box<dyn Error + Send + Sync>> {
        // For the sake of example we just print the payload.
        println!("[POST {}] {}", url, String::from_utf8_lossy(&body));
        Ok(())
    }
}

#[tokio::main]
async fn main() -> tracing_sematext::error::Result<()> {
    let sink = SinkConfig {
        base_url: "https://logsene-receiver.sematext.com/my-app-token/".to_string(),
        group: "example".to_string(),
        facility: "custom-transport".to_string(),
        environment: "dev".to_string(),
    };
    init_tracing(Arc::new(StdoutTransport), &sink)?;

    info!("custom transport example started");
    error!(db = "orders", "simulated error sent via custom transport");

    sleep(Duration::from_millis(500)).await;
    Ok(())
}
