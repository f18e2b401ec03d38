use std::sync::Arc;
use std::time::Instant;
use tokio::time::{sleep, Duration};
use tracing::error;

use tracing_sematext::init::{init_tracing_with_config, LayerConfig, SinkConfig};
use tracing_sematext::transport::NoopTransport;

#[tokio::main]
async fn main() -> tracing_sematext::error::Result<()> {
    let sink = SinkConfig {
        base_url: "http://127.0.0.1:8080/token/".to_string(),
        group: "load".to_string(),
        facility: "load-test".to_string(),
        environment: "local".to_string(),
    };
    let layer_config = LayerConfig {
        queue_capacity: 50_000,
        max_in_flight: 64,
        enable_stdout: false,
        ..Default::default()
    };

    let hook = init_tracing_with_config(Arc::new(NoopTransport), &sink, layer_config)?;

    let n: u64 = 100_000;
    let start = Instant::now();

    for i in 0..n {
        error!(iteration = i, "load test error");
    }

    let elapsed = start.elapsed();
    println!("fired {} events in {:?} (~{:.0} ev/s)",
        n,
        elapsed,
        n as f64 / elapsed.as_secs_f64()
    );

    // Give the background task a little time to drain the queue
    sleep(Duration::from_secs(2)).await;
    println!("{:?}", hook.stats());
    Ok(())
}
