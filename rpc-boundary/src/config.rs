//! Boundary configuration.
//!
//! Defaults can be overridden via environment variables, and both structs
//! can be loaded from a TOML file.

use std::env;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{BoundaryError, BoundaryResult};

/// Parse an environment variable as a typed value with a default fallback
fn env_var_or_default<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

/// Server-side listen configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Port the rpc server binds on.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: env_var_or_default("RPC_PORT", 50051),
        }
    }
}

impl ServerConfig {
    /// Load from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> BoundaryResult<Self> {
        load(path)
    }
}

/// Client-side dial and call configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Target endpoint, e.g. `http://127.0.0.1:50051`.
    pub url: String,
    /// Upper bound on a single outbound call.
    #[serde(with = "humantime_serde")]
    pub call_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            url: format!("http://127.0.0.1:{}", env_var_or_default("RPC_PORT", 50051u16)),
            call_timeout: Duration::from_millis(env_var_or_default("RPC_CALL_TIMEOUT_MS", 1000)),
        }
    }
}

impl ClientConfig {
    /// Load from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> BoundaryResult<Self> {
        load(path)
    }
}

fn load<T: serde::de::DeserializeOwned>(path: impl AsRef<Path>) -> BoundaryResult<T> {
    let raw = std::fs::read_to_string(path.as_ref()).map_err(|err| {
        BoundaryError::Config(format!(
            "failed to read {}: {}",
            path.as_ref().display(),
            err
        ))
    })?;
    toml::from_str(&raw).map_err(|err| BoundaryError::Config(err.to_string()))
}
