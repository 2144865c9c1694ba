use std::path::PathBuf;
use std::time::Duration;

use switchyard_core::config::{CONFIG_PATH_ENV, DEFAULT_CONFIG_FILE};
use switchyard_core::Error;
use switchyard_downstream::DEFAULT_UPSTREAM_TIMEOUT;

pub const HOST_ENV: &str = "SWITCHYARD_HOST";
pub const PORT_ENV: &str = "SWITCHYARD_PORT";
pub const UPSTREAM_TIMEOUT_ENV: &str = "SWITCHYARD_UPSTREAM_TIMEOUT_MS";

/// Process settings, read from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub upstream_timeout: Duration,
    pub nodes_file: PathBuf,
}

impl ServerConfig {
    /// # Errors
    ///
    /// Returns [`Error::Config`] if a numeric variable does not parse.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, Error> {
        let host = lookup(HOST_ENV).unwrap_or_else(|| "0.0.0.0".to_string());
        let port = match lookup(PORT_ENV) {
            Some(raw) => raw
                .parse()
                .map_err(|e| Error::Config(format!("{PORT_ENV}={raw}: {e}")))?,
            None => 8787,
        };
        let upstream_timeout = match lookup(UPSTREAM_TIMEOUT_ENV) {
            Some(raw) => Duration::from_millis(
                raw.parse()
                    .map_err(|e| Error::Config(format!("{UPSTREAM_TIMEOUT_ENV}={raw}: {e}")))?,
            ),
            None => DEFAULT_UPSTREAM_TIMEOUT,
        };

        Ok(Self {
            host,
            port,
            upstream_timeout,
            nodes_file: lookup(CONFIG_PATH_ENV)
                .filter(|p| !p.is_empty())
                .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE), PathBuf::from),
        })
    }

    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
