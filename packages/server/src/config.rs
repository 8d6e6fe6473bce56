//! Server configuration.

use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_FLUSH_INTERVAL_MS: u64 = 50;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("host must not be empty")]
    EmptyHost,
    #[error("flush interval must be between 1 and {max} ms, got {got}")]
    InvalidFlushInterval { got: u64, max: u64 },
    #[error("admin secret must not be blank")]
    BlankAdminSecret,
}

/// Validated settings for one broker process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Period of the low-priority flush tick.
    pub flush_interval: Duration,
    /// Shared secret an operator must present when registering.
    pub admin_secret: Option<String>,
}

impl ServerConfig {
    pub const MAX_FLUSH_INTERVAL_MS: u64 = 10_000;

    pub fn new(
        host: String,
        port: u16,
        flush_interval_ms: u64,
        admin_secret: Option<String>,
    ) -> Result<Self, ConfigError> {
        let host = host.trim().to_string();
        if host.is_empty() {
            return Err(ConfigError::EmptyHost);
        }
        if flush_interval_ms == 0 || flush_interval_ms > Self::MAX_FLUSH_INTERVAL_MS {
            return Err(ConfigError::InvalidFlushInterval {
                got: flush_interval_ms,
                max: Self::MAX_FLUSH_INTERVAL_MS,
            });
        }
        if admin_secret.as_deref().is_some_and(|s| s.trim().is_empty()) {
            return Err(ConfigError::BlankAdminSecret);
        }

        Ok(Self {
            host,
            port,
            flush_interval: Duration::from_millis(flush_interval_ms),
            admin_secret,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            flush_interval: Duration::from_millis(DEFAULT_FLUSH_INTERVAL_MS),
            admin_secret: None,
        }
    }
}
