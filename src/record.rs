use crate::field::FieldValue;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::fmt;

/// Severity ordinal of a log entry.
///
/// Ordinals follow the logrus convention, lower is more severe. Values
/// outside `0..=6` are representable on purpose: level mappers must stay
/// total and map them to their `unknown` sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Level(pub u32);

impl Level {
    pub const PANIC: Level = Level(0);
    pub const FATAL: Level = Level(1);
    pub const ERROR: Level = Level(2);
    pub const WARN: Level = Level(3);
    pub const INFO: Level = Level(4);
    pub const DEBUG: Level = Level(5);
    pub const TRACE: Level = Level(6);

    /// All defined levels, most severe first.
    pub const ALL: [Level; 7] = [
        Level::PANIC,
        Level::FATAL,
        Level::ERROR,
        Level::WARN,
        Level::INFO,
        Level::DEBUG,
        Level::TRACE,
    ];

    /// Raw ordinal as written to the `level` field of the payload.
    pub fn ordinal(self) -> u32 {
        self.0
    }

    /// Every defined level at least as severe as `self`.
    pub fn and_above(self) -> Vec<Level> {
        Level::ALL.iter().copied().filter(|l| *l <= self).collect()
    }
}

impl From<tracing::Level> for Level {
    fn from(level: tracing::Level) -> Self {
        match level {
            tracing::Level::ERROR => Level::ERROR,
            tracing::Level::WARN => Level::WARN,
            tracing::Level::INFO => Level::INFO,
            tracing::Level::DEBUG => Level::DEBUG,
            _ => Level::TRACE,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(crate::severity::LogbackLevels::name(*self))
    }
}

/// A single log call as handed to the sink by the logging facility.
///
/// Entries are consumed by the dispatcher and never retained after the
/// record has been transmitted or dropped.
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub level: Level,
    pub message: String,
    pub time: DateTime<Utc>,
    pub fields: BTreeMap<String, FieldValue>,
}

impl LogEntry {
    /// New entry stamped with the current time and no extra fields.
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        LogEntry {
            level,
            message: message.into(),
            time: Utc::now(),
            fields: BTreeMap::new(),
        }
    }

    pub fn at(mut self, time: DateTime<Utc>) -> Self {
        self.time = time;
        self
    }

    /// Attach a caller-supplied field. A later value for the same key
    /// replaces the earlier one.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Attach several fields at once.
    pub fn with_fields<I, K, V>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<FieldValue>,
    {
        self.fields
            .extend(fields.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Attach an error under the conventional `error` key.
    pub fn with_error<E>(self, err: &E) -> Self
    where
        E: std::error::Error + ?Sized,
    {
        self.with_field(ERROR_KEY, FieldValue::error(err))
    }
}

/// Key used by [`LogEntry::with_error`].
pub const ERROR_KEY: &str = "error";
