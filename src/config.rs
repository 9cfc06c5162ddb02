//! Engine tuning configuration (§10.3): worker pool size and per-node fetch
//! timeout. This is ambient plumbing for *how the engine runs*, not
//! query-graph state, so it doesn't fall under §6's "no persisted state"
//! rule - that rule is about nodes and tables, not about `--workers 8`.

use std::fmt;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Worker pool size and per-node fetch timeout (§5, §6 `execute(...,
/// worker_count?, timeout?, ...)`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Bounded worker pool size for the fetch phase. Defaults to the
    /// number of available cores (§5 "Parallel workers with a bounded
    /// pool").
    pub worker_count: usize,
    /// Per-node fetch timeout, in milliseconds. Expiry is an `execution`
    /// error (§5 "Timeouts").
    pub fetch_timeout_ms: u64,
}

impl EngineConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    /// Loads an `EngineConfig` from a TOML file, falling back to
    /// [`Default`] values for any field the file omits.
    pub fn from_path(path: &Path) -> Result<Self, ConfigLoadError> {
        let raw = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&raw)?)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            worker_count: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4),
            fetch_timeout_ms: 30_000,
        }
    }
}

/// Errors loading an [`EngineConfig`] from disk - a demo-binary-level
/// concern, distinct from [`crate::error::GraphError`] (which is about
/// query-graph execution, not its own tuning knobs).
#[derive(Debug)]
pub enum ConfigLoadError {
    Io(std::io::Error),
    Toml(toml::de::Error),
}

impl fmt::Display for ConfigLoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigLoadError::Io(e) => write!(f, "could not read config file: {e}"),
            ConfigLoadError::Toml(e) => write!(f, "could not parse config file: {e}"),
        }
    }
}

impl std::error::Error for ConfigLoadError {}

impl From<std::io::Error> for ConfigLoadError {
    fn from(item: std::io::Error) -> Self {
        ConfigLoadError::Io(item)
    }
}

impl From<toml::de::Error> for ConfigLoadError {
    fn from(item: toml::de::Error) -> Self {
        ConfigLoadError::Toml(item)
    }
}
