use crate::record::Level;

/// Strategy turning a [`Level`] into the `Severity` string of a payload.
///
/// Implementations must be total: every ordinal, defined or not, maps to a
/// non-empty string. Any `Fn(Level) -> String` closure is a strategy too.
pub trait LevelMapper: Send + Sync {
    fn map(&self, level: Level) -> String;
}

impl<F> LevelMapper for F
where
    F: Fn(Level) -> String + Send + Sync,
{
    fn map(&self, level: Level) -> String {
        self(level)
    }
}

/// CAPITAL_CASE severities as logback and friends print them.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogbackLevels;

impl LogbackLevels {
    pub fn name(level: Level) -> &'static str {
        match level {
            Level::TRACE => "TRACE",
            Level::DEBUG => "DEBUG",
            Level::INFO => "INFO",
            Level::WARN => "WARN",
            Level::ERROR => "ERROR",
            Level::FATAL => "FATAL",
            Level::PANIC => "PANIC",
            _ => "UNKNOWN",
        }
    }
}

impl LevelMapper for LogbackLevels {
    fn map(&self, level: Level) -> String {
        Self::name(level).to_string()
    }
}

/// lower_case severities as logrus prints them. WARN is spelled `warning`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogrusLevels;

impl LogrusLevels {
    pub fn name(level: Level) -> &'static str {
        match level {
            Level::TRACE => "trace",
            Level::DEBUG => "debug",
            Level::INFO => "info",
            Level::WARN => "warning",
            Level::ERROR => "error",
            Level::FATAL => "fatal",
            Level::PANIC => "panic",
            _ => "unknown",
        }
    }
}

impl LevelMapper for LogrusLevels {
    fn map(&self, level: Level) -> String {
        Self::name(level).to_string()
    }
}
