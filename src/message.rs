use crate::record::LogEntry;
use crate::severity::LevelMapper;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Maximum length, in characters, of `short_message`.
pub const SHORT_MESSAGE_MAX: usize = 255;

/// Fixed-shape part of every payload, derived from the entry and the
/// sink's static configuration only.
///
/// Empty strings and an unresolved host are left out of the JSON entirely.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BaseMessage {
    #[serde(rename = "Severity", skip_serializing_if = "String::is_empty")]
    pub severity: String,
    #[serde(rename = "Time")]
    pub time: DateTime<Utc>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub environment: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub facility: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    pub level: u32,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub short_message: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub full_message: String,
}

/// Static inputs of [`build`], owned by the sink.
#[derive(Debug, Clone, Default)]
pub struct MessageContext {
    pub facility: String,
    pub environment: String,
}

/// Build the base message for `entry`, resolving the local host name.
pub fn build(entry: &LogEntry, ctx: &MessageContext, mapper: &dyn LevelMapper) -> BaseMessage {
    build_with_host(entry, ctx, mapper, local_hostname())
}

/// Same as [`build`] with an already resolved host.
pub fn build_with_host(
    entry: &LogEntry,
    ctx: &MessageContext,
    mapper: &dyn LevelMapper,
    host: Option<String>,
) -> BaseMessage {
    BaseMessage {
        severity: mapper.map(entry.level),
        time: entry.time,
        environment: ctx.environment.clone(),
        facility: ctx.facility.clone(),
        host: host.filter(|h| !h.is_empty()),
        level: entry.level.ordinal(),
        short_message: truncate(&entry.message, SHORT_MESSAGE_MAX).to_string(),
        full_message: entry.message.clone(),
    }
}

/// Longest prefix of `message` holding at most `max` characters.
pub fn truncate(message: &str, max: usize) -> &str {
    match message.char_indices().nth(max) {
        Some((idx, _)) => &message[..idx],
        None => message,
    }
}

/// Host name of this machine, `None` when it cannot be determined.
#[cfg(unix)]
pub fn local_hostname() -> Option<String> {
    match nix::unistd::gethostname() {
        Ok(name) => name.into_string().ok(),
        Err(e) => {
            eprintln!("failed to resolve host name: {}", e);
            None
        }
    }
}

#[cfg(not(unix))]
pub fn local_hostname() -> Option<String> {
    std::env::var("COMPUTERNAME").ok()
}
