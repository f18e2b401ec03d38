use crate::dispatch::DispatchConfig;
use crate::error::{Error, Result};
use crate::hook::{Hook, SematextHook};
use crate::layer::SinkLayer;
use crate::message::MessageContext;
use crate::record::Level;
use crate::transport::Transport;
use std::sync::Arc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Registry;

/// Where and as whom records are shipped.
///
/// **Fields**
/// - `base_url`: receiver url including the app token, e.g.
///   `https://logsene-receiver.sematext.com/<APP_TOKEN>/`.
/// - `group`: logsene type, resolved relative to `base_url`.
/// - `facility`: name of the service, written to every record.
/// - `environment`: deployment environment, written to every record.
#[derive(Clone, Debug, Default)]
pub struct SinkConfig {
    pub base_url: String,
    pub group: String,
    pub facility: String,
    pub environment: String,
}

/// Configuration of the logging layer.
///
/// **Fields**
/// - `queue_capacity`: records waiting for a free transmission slot before
///   new records are dropped.
/// - `max_in_flight`: maximum number of concurrent outbound requests.
/// - `enable_stdout`: if `true`, a `tracing_subscriber::fmt::Layer` is added
///   on top of the sink layer and events are also printed to the console.
/// - `min_level`: least severe level shipped to the receiver.
#[derive(Clone, Debug)]
pub struct LayerConfig {
    pub queue_capacity: usize,
    pub max_in_flight: usize,
    pub enable_stdout: bool,
    pub min_level: Level,
}

impl Default for LayerConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 1024,
            max_in_flight: 32,
            enable_stdout: true,
            min_level: Level::INFO,
        }
    }
}

impl LayerConfig {
    fn dispatch(&self) -> DispatchConfig {
        DispatchConfig {
            queue_capacity: self.queue_capacity,
            max_in_flight: self.max_in_flight,
        }
    }
}

/// Build a [`SematextHook`] from the two configuration halves. Fails
/// outside a Tokio runtime.
pub fn build_hook(
    transport: Arc<dyn Transport>,
    sink: &SinkConfig,
    layer: &LayerConfig,
) -> Result<SematextHook> {
    let hook = SematextHook::with_dispatch(
        transport,
        &sink.base_url,
        &sink.group,
        MessageContext {
            facility: sink.facility.clone(),
            environment: sink.environment.clone(),
        },
        layer.dispatch(),
    )?;
    Ok(hook.with_levels(layer.min_level.and_above()))
}

/// Initialize the global `tracing` subscriber shipping to Sematext.
///
/// **Parameters**
/// - `transport`: HTTP client used for every POST.
/// - `sink`: [`SinkConfig`] naming the receiver, facility and environment.
/// - `config`: [`LayerConfig`] controlling dispatch sizing and console output.
///
/// **Returns**
/// - The installed hook, e.g. to swap its level mapper or read its stats.
/// - `Err(..)` if the endpoint is malformed or a global subscriber is
///   already set.
pub fn init_tracing_with_config(
    transport: Arc<dyn Transport>,
    sink: &SinkConfig,
    config: LayerConfig,
) -> Result<Arc<SematextHook>> {
    let hook = Arc::new(build_hook(transport, sink, &config)?);
    let layer = SinkLayer::new(Arc::clone(&hook) as Arc<dyn Hook>);

    // Console output needs a differently typed subscriber, so both
    // variants are assembled separately.
    let installed = if config.enable_stdout {
        let fmt_layer = tracing_subscriber::fmt::layer();
        let subscriber = Registry::default().with(layer).with(fmt_layer);
        tracing::subscriber::set_global_default(subscriber)
    } else {
        let subscriber = Registry::default().with(layer);
        tracing::subscriber::set_global_default(subscriber)
    };
    installed.map_err(|e| Error::SubscriberInit(e.to_string()))?;

    Ok(hook)
}

/// Initialize tracing with sensible defaults.
///
/// Equivalent to calling [`init_tracing_with_config`] with
/// [`LayerConfig::default`]. This is the recommended entrypoint for
/// typical microservices.
pub fn init_tracing(transport: Arc<dyn Transport>, sink: &SinkConfig) -> Result<Arc<SematextHook>> {
    init_tracing_with_config(transport, sink, LayerConfig::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::NoopTransport;

    fn sink() -> SinkConfig {
        SinkConfig {
            base_url: "http://localhost:9999/token/".into(),
            group: "app".into(),
            facility: "api".into(),
            environment: "test".into(),
        }
    }

    #[tokio::test]
    async fn hook_levels_follow_min_level() {
        let config = LayerConfig {
            min_level: Level::WARN,
            ..Default::default()
        };
        let hook = build_hook(Arc::new(NoopTransport), &sink(), &config).unwrap();
        assert_eq!(hook.levels(), &[Level::PANIC, Level::FATAL, Level::ERROR, Level::WARN]);
        assert_eq!(hook.endpoint().as_str(), "http://localhost:9999/token/app");
    }

    #[test]
    fn build_hook_without_runtime_is_an_error() {
        let result = build_hook(Arc::new(NoopTransport), &sink(), &LayerConfig::default());
        assert!(matches!(result, Err(Error::NoRuntime)));
    }

    #[tokio::test]
    async fn malformed_base_url_is_reported() {
        let mut bad = sink();
        bad.base_url = "no scheme".into();
        assert!(build_hook(Arc::new(NoopTransport), &bad, &LayerConfig::default()).is_err());
    }
}
