//! Environment variable names used by this crate for convenient
//! configuration of the sink from microservices.
//!
//! These are purely helpers; the core hook stays decoupled from
//! environment access.

use crate::error::{Error, Result};
use crate::init::SinkConfig;

/// Receiver base url including the app token.
pub const SEMATEXT_URL_ENV: &str = "SEMATEXT_URL";

/// Logsene type the records are grouped under.
pub const SEMATEXT_GROUP_ENV: &str = "SEMATEXT_GROUP";

/// Optional service name, defaults to the empty string (omitted).
pub const SEMATEXT_FACILITY_ENV: &str = "SEMATEXT_FACILITY";

/// Optional deployment environment, defaults to the empty string (omitted).
pub const SEMATEXT_ENVIRONMENT_ENV: &str = "SEMATEXT_ENVIRONMENT";

/// Read an environment variable or fall back to a provided default.
pub fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn required(key: &'static str) -> Result<String> {
    match std::env::var(key) {
        Ok(value) if !value.is_empty() => Ok(value),
        _ => Err(Error::MissingConfig(key)),
    }
}

impl SinkConfig {
    /// Read the sink configuration from the `SEMATEXT_*` variables.
    pub fn from_env() -> Result<Self> {
        Ok(SinkConfig {
            base_url: required(SEMATEXT_URL_ENV)?,
            group: required(SEMATEXT_GROUP_ENV)?,
            facility: env_or(SEMATEXT_FACILITY_ENV, ""),
            environment: env_or(SEMATEXT_ENVIRONMENT_ENV, ""),
        })
    }
}
