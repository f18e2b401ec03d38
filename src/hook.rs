use crate::dispatch::{DispatchConfig, DispatchStats, Dispatcher, Pipeline};
use crate::error::{Error, Result};
use crate::message::MessageContext;
use crate::record::{Level, LogEntry};
use crate::severity::{LevelMapper, LogbackLevels};
use crate::transport::Transport;
use std::sync::Arc;
use url::Url;

/// Contract between a logging facility and a sink attached to it.
///
/// The facility only calls `fire` for entries whose level is listed in
/// `levels`, and does not wait for the entry to be processed.
pub trait Hook: Send + Sync {
    /// Levels this hook wants to receive.
    fn levels(&self) -> &[Level];

    /// Hand one entry to the hook. Sinks that dispatch asynchronously
    /// report success as soon as the entry is handed off.
    fn fire(&self, entry: LogEntry) -> Result<()>;
}

/// Levels a [`SematextHook`] accepts unless told otherwise.
pub const DEFAULT_LEVELS: [Level; 5] = [
    Level::PANIC,
    Level::FATAL,
    Level::ERROR,
    Level::WARN,
    Level::INFO,
];

/// A hook that ships enriched entries to a Sematext Logsene receiver.
pub struct SematextHook {
    pipeline: Arc<Pipeline>,
    dispatcher: Dispatcher,
    levels: Vec<Level>,
}

impl SematextHook {
    /// Create a new hook with the default dispatch sizing.
    ///
    /// - `transport`: the HTTP client used for every POST
    /// - `base_url`: the receiver url, something like `https://logsene-receiver.sematext.com/<APP_TOKEN>/`
    /// - `group`: logsene type, resolved relative to `base_url`, most likely your product's name
    /// - `facility`: the name of the service, e.g. `api`
    /// - `environment`: deployment environment, e.g. `production`
    ///
    /// Fails when `base_url` or the resolved endpoint is not a valid URL,
    /// or when called outside a Tokio runtime.
    pub fn new(
        transport: Arc<dyn Transport>,
        base_url: &str,
        group: &str,
        facility: &str,
        environment: &str,
    ) -> Result<Self> {
        Self::with_dispatch(
            transport,
            base_url,
            group,
            MessageContext {
                facility: facility.to_string(),
                environment: environment.to_string(),
            },
            DispatchConfig::default(),
        )
    }

    /// Like [`SematextHook::new`] with explicit dispatcher sizing.
    pub fn with_dispatch(
        transport: Arc<dyn Transport>,
        base_url: &str,
        group: &str,
        context: MessageContext,
        dispatch: DispatchConfig,
    ) -> Result<Self> {
        let endpoint = resolve_endpoint(base_url, group)?;
        let pipeline = Arc::new(Pipeline::new(transport, endpoint, context, Arc::new(LogbackLevels)));
        let (dispatcher, _handle) = Dispatcher::new(Arc::clone(&pipeline), dispatch)?;
        Ok(SematextHook {
            pipeline,
            dispatcher,
            levels: DEFAULT_LEVELS.to_vec(),
        })
    }

    /// Replace the accepted levels.
    pub fn with_levels(mut self, levels: impl Into<Vec<Level>>) -> Self {
        self.levels = levels.into();
        self
    }

    /// Set your own level mapper. Entries already being processed keep the
    /// mapper they started with.
    pub fn set_level_mapper<M>(&self, mapper: M)
    where
        M: LevelMapper + 'static,
    {
        self.pipeline.set_level_mapper(Arc::new(mapper));
    }

    /// The resolved ingestion endpoint.
    pub fn endpoint(&self) -> &Url {
        self.pipeline.endpoint()
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    pub fn stats(&self) -> DispatchStats {
        self.dispatcher.stats()
    }
}

impl Hook for SematextHook {
    fn levels(&self) -> &[Level] {
        &self.levels
    }

    fn fire(&self, entry: LogEntry) -> Result<()> {
        self.dispatcher.dispatch(entry);
        Ok(())
    }
}

/// Resolve `group` as a URL reference relative to `base_url`.
///
/// `http://host/base/` + `tenant1` gives `http://host/base/tenant1`; without
/// the trailing slash the last path segment of `base_url` is replaced.
pub fn resolve_endpoint(base_url: &str, group: &str) -> Result<Url> {
    let base = Url::parse(base_url).map_err(|source| Error::InvalidEndpoint {
        context: format!("parsing base url '{}'", base_url),
        source,
    })?;
    base.join(group).map_err(|source| Error::InvalidEndpoint {
        context: format!("resolving group '{}' against '{}'", group, base_url),
        source,
    })
}
