use crate::error::{Error, Result};
use crate::merge::merge;
use crate::message::{self, BaseMessage, MessageContext};
use crate::record::LogEntry;
use crate::severity::LevelMapper;
use crate::transport::Transport;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use tokio::runtime::Handle;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinHandle;
use url::Url;

/// Everything a single fire needs: build, merge-or-fallback, serialize,
/// transmit. Shared read-only between all in-flight dispatches except for
/// the level mapper, which can be swapped atomically.
pub struct Pipeline {
    transport: Arc<dyn Transport>,
    endpoint: Url,
    context: MessageContext,
    mapper: RwLock<Arc<dyn LevelMapper>>,
}

impl Pipeline {
    pub fn new(
        transport: Arc<dyn Transport>,
        endpoint: Url,
        context: MessageContext,
        mapper: Arc<dyn LevelMapper>,
    ) -> Self {
        Pipeline {
            transport,
            endpoint,
            context,
            mapper: RwLock::new(mapper),
        }
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn context(&self) -> &MessageContext {
        &self.context
    }

    /// Strategy used by dispatches started after this call returns.
    pub fn set_level_mapper(&self, mapper: Arc<dyn LevelMapper>) {
        let mut guard = self.mapper.write().unwrap_or_else(|e| e.into_inner());
        *guard = mapper;
    }

    pub fn level_mapper(&self) -> Arc<dyn LevelMapper> {
        let guard = self.mapper.read().unwrap_or_else(|e| e.into_inner());
        Arc::clone(&*guard)
    }

    /// Build the base message for `entry`.
    pub fn base_message(&self, entry: &LogEntry) -> BaseMessage {
        let mapper = self.level_mapper();
        message::build(entry, &self.context, mapper.as_ref())
    }

    /// Serialized payload for `entry`. When merging the extra fields fails
    /// the unmerged base message is serialized instead.
    pub fn payload(&self, entry: LogEntry) -> Result<Vec<u8>> {
        let base = self.base_message(&entry);
        if !entry.fields.is_empty() {
            match merge(&base, entry.fields) {
                Ok(data) => return to_json(&data),
                Err(e) => eprintln!("failed to merge log fields, sending base message: {}", e),
            }
        }
        to_json(&base)
    }

    /// Run the whole pipeline for one entry.
    pub async fn deliver(&self, entry: LogEntry) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let body = self.payload(entry)?;
        self.transport.post(&self.endpoint, body).await
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(value).map_err(|source| Error::Serialize {
        context: "serializing log payload".to_string(),
        source,
    })
}

/// Sizing of the [`Dispatcher`].
#[derive(Clone, Copy, Debug)]
pub struct DispatchConfig {
    /// Records waiting for a free transmission slot before new ones are
    /// dropped.
    pub queue_capacity: usize,
    /// Maximum number of concurrent outbound requests.
    pub max_in_flight: usize,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 1024,
            max_in_flight: 32,
        }
    }
}

#[derive(Default)]
struct Counters {
    total: AtomicU64,
    enqueued: AtomicU64,
    dropped: AtomicU64,
    delivered: AtomicU64,
    failed: AtomicU64,
}

/// Snapshot of the dispatcher counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DispatchStats {
    /// Records handed to [`Dispatcher::dispatch`].
    pub total: u64,
    /// Successfully enqueued.
    pub enqueued: u64,
    /// Dropped because the queue was full or closed.
    pub dropped: u64,
    /// Accepted by the transport.
    pub delivered: u64,
    /// Failed to serialize or transmit.
    pub failed: u64,
}

/// Fire-and-forget front of the [`Pipeline`].
///
/// `dispatch` never blocks: records go into a bounded channel drained by a
/// background task, which spawns one task per record while holding one of
/// `max_in_flight` permits. A full queue drops the new record.
pub struct Dispatcher {
    sender: mpsc::Sender<LogEntry>,
    counters: Arc<Counters>,
}

impl Dispatcher {
    /// Create a dispatcher and spawn its background task on the current
    /// Tokio runtime. Fails with [`Error::NoRuntime`] outside of one.
    ///
    /// Minimal thresholds are enforced for `queue_capacity` and
    /// `max_in_flight` to avoid degenerate configurations.
    pub fn new(pipeline: Arc<Pipeline>, config: DispatchConfig) -> Result<(Self, JoinHandle<()>)> {
        let runtime = Handle::try_current().map_err(|_| Error::NoRuntime)?;
        let queue_capacity = config.queue_capacity.max(16);
        let max_in_flight = config.max_in_flight.max(1);

        let (tx, mut rx) = mpsc::channel::<LogEntry>(queue_capacity);
        let counters = Arc::new(Counters::default());
        let permits = Arc::new(Semaphore::new(max_in_flight));

        let counters_bg = Arc::clone(&counters);
        let handle = runtime.spawn(async move {
            while let Some(entry) = rx.recv().await {
                let permit = match Arc::clone(&permits).acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => break,
                };
                let pipeline = Arc::clone(&pipeline);
                let counters = Arc::clone(&counters_bg);
                tokio::spawn(async move {
                    match pipeline.deliver(entry).await {
                        Ok(()) => {
                            counters.delivered.fetch_add(1, Ordering::Relaxed);
                        }
                        Err(e) => {
                            counters.failed.fetch_add(1, Ordering::Relaxed);
                            eprintln!("Failed to ship log record to {}: {}", pipeline.endpoint(), e);
                        }
                    }
                    drop(permit);
                });
            }
        });

        Ok((Self { sender: tx, counters }, handle))
    }

    /// Queue `entry` for transmission without waiting.
    pub fn dispatch(&self, entry: LogEntry) {
        self.counters.total.fetch_add(1, Ordering::Relaxed);
        match self.sender.try_send(entry) {
            Ok(()) => {
                self.counters.enqueued.fetch_add(1, Ordering::Relaxed);
            }
            Err(mpsc::error::TrySendError::Full(_)) => {
                self.counters.dropped.fetch_add(1, Ordering::Relaxed);
                eprintln!("log dispatch queue full, dropping log record");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                self.counters.dropped.fetch_add(1, Ordering::Relaxed);
                eprintln!("{}, dropping log record", Error::QueueClosed);
            }
        }
    }

    pub fn stats(&self) -> DispatchStats {
        DispatchStats {
            total: self.counters.total.load(Ordering::Relaxed),
            enqueued: self.counters.enqueued.load(Ordering::Relaxed),
            dropped: self.counters.dropped.load(Ordering::Relaxed),
            delivered: self.counters.delivered.load(Ordering::Relaxed),
            failed: self.counters.failed.load(Ordering::Relaxed),
        }
    }
}
