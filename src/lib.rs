//! Enrich structured log records and ship them, as JSON over HTTP, to a
//! Sematext Logsene receiver without blocking the logging call.
//!
//! A [`SematextHook`](hook::SematextHook) is attached to the `tracing`
//! facility through [`SinkLayer`](layer::SinkLayer), usually via
//! [`init::init_tracing`]. Each accepted event is turned into a base
//! message, merged with its structured fields and posted by a background
//! task.
//!
//! ```no_run
//! use std::sync::Arc;
//! use tracing_sematext::http_transport::{HttpTransport, HttpTransportConfig};
//! use tracing_sematext::init::{init_tracing, SinkConfig};
//!
//! # async fn run() -> tracing_sematext::error::Result<()> {
//! let transport = Arc::new(HttpTransport::new(HttpTransportConfig::default())?);
//! let sink = SinkConfig {
//!     base_url: "https://logsene-receiver.sematext.com/<APP_TOKEN>/".into(),
//!     group: "myservice".into(),
//!     facility: "api".into(),
//!     environment: "production".into(),
//! };
//! init_tracing(transport, &sink)?;
//! tracing::error!(order_id = 7, "payment failed");
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod record;
pub mod field;
pub mod severity;
pub mod message;
pub mod merge;
pub mod transport;

#[cfg(feature = "reqwest-transport")]
pub mod http_transport;

pub mod dispatch;
pub mod hook;
pub mod layer;
pub mod init;
pub mod env;
pub mod access_log;
