//! # Service configuration
//!
//! Loaded from a JSON file whose path comes from the `CONFIG` environment
//! variable (default `config.json`). Every field has a default, so a partial
//! file or no file at all is accepted.
//!
//! ```json
//! {
//!     "port": 8080,
//!     "host": "https://api.example.com",
//!     "database_url": "sqlite:payments.db"
//! }
//! ```
//!
//! The `PORT`, `PUBLIC_HOST` and `DATABASE_URL` environment variables override
//! the file values.

use std::fs::File;
use std::io::{BufReader, Read};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::warn;

const DEFAULT_CONFIG_PATH: &str = "config.json";

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Config {
    /// Port the HTTP server listens on.
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_bind_address")]
    pub bind_address: IpAddr,

    /// Public base URL used when building resource links.
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_database_url")]
    pub database_url: String,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Deadline for a single request, storage calls included.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_port() -> u16 {
    8080
}

fn default_bind_address() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

fn default_host() -> String {
    "http://example.com".to_string()
}

fn default_database_url() -> String {
    "sqlite:payments.db".to_string()
}

fn default_max_connections() -> u32 {
    5
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: default_port(),
            bind_address: default_bind_address(),
            host: default_host(),
            database_url: default_database_url(),
            max_connections: default_max_connections(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl Config {
    /// Load the configuration for this process, then apply environment
    /// overrides.
    pub fn load() -> Result<Self> {
        let path = std::env::var("CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        let mut config = Self::from_path(&path)?;

        if let Ok(port) = std::env::var("PORT") {
            config.port = port.parse().context("PORT must be a valid port number")?;
        }
        if let Ok(host) = std::env::var("PUBLIC_HOST") {
            config.host = host;
            config.trim_host();
        }
        if let Ok(url) = std::env::var("DATABASE_URL") {
            config.database_url = url;
        }

        Ok(config)
    }

    /// Read a configuration file. A missing file yields the defaults; a file
    /// that exists but does not parse is an error.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) => {
                warn!("Failed to open config file {}: {}", path.display(), e);
                return Ok(Self::default());
            }
        };

        Self::from_reader(BufReader::new(file))
            .with_context(|| format!("Failed to decode configuration file {}", path.display()))
    }

    pub fn from_reader(reader: impl Read) -> Result<Self> {
        let mut config: Self = serde_json::from_reader(reader)?;
        config.trim_host();
        if config.request_timeout_secs == 0 {
            warn!(
                "request_timeout_secs must be positive, using {}",
                default_request_timeout_secs()
            );
            config.request_timeout_secs = default_request_timeout_secs();
        }
        Ok(config)
    }

    // Links are built as `{host}/v1/...`
    fn trim_host(&mut self) {
        while self.host.ends_with('/') {
            self.host.pop();
        }
    }

    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_address, self.port)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
