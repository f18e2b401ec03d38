use std::sync::Arc;
use tokio::time::{sleep, Duration};
use tracing::{error, info};

use tracing_sematext::env::env_or;
use tracing_sematext::http_transport::{HttpTransport, HttpTransportConfig};
use tracing_sematext::init::{init_tracing, SinkConfig};
use tracing_sematext::severity::LogrusLevels;

#[tokio::main]
async fn main() -> tracing_sematext::error::Result<()> {
    let sink = SinkConfig::from_env().unwrap_or_else(|_| SinkConfig {
        base_url: env_or("SEMATEXT_URL", "http://127.0.0.1:8080/my-app-token/"),
        group: "orders".to_string(),
        facility: "api".to_string(),
        environment: "dev".to_string(),
    });

    let transport = Arc::new(HttpTransport::new(HttpTransportConfig::default())?);
    let hook = init_tracing(transport, &sink)?;
    hook.set_level_mapper(LogrusLevels);

    info!("starting service");

    let err = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "payment gateway down");
    error!(
        user_id = 42,
        error = &err as &(dyn std::error::Error + 'static),
        "payment failed"
    );

    sleep(Duration::from_secs(2)).await;
    Ok(())
}
