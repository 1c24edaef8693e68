//! Engine configuration files.
//!
//! A configuration is a JSON document; every field is optional:
//!
//! ```json
//! {
//!   "selection": {
//!     "include": ["SafeAndConsensual", "NumericLiteralUnderscores"],
//!     "exclude": ["EmptyStatement"],
//!     "language_level": 11
//!   },
//!   "driver": { "pass_bound": 10, "retry_cap": 16 },
//!   "jobs": 4
//! }
//! ```

use std::num::NonZeroUsize;
use std::path::Path;

use derive_more::{Display, Error};
use polish_engine::{DriverConfig, RuleSelection};
use serde::Deserialize;

/// Errors raised while loading a configuration.
#[derive(Debug, Display, Error)]
pub enum ConfigError {
    #[display("cannot read config {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[display("malformed config {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },

    #[display("`jobs` must be at least 1")]
    NoWorkers,
}

/// Settings shared by every unit of a run.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Which rules are active.
    pub selection: RuleSelection,
    /// Pass bound and retry cap of the driver.
    pub driver: DriverConfig,
    /// Worker threads for batch runs.
    pub jobs: Option<usize>,
}

impl EngineConfig {
    /// Parse a configuration; `origin` names it in error messages.
    pub fn from_json(text: &str, origin: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig =
            serde_json::from_str(text).map_err(|source| ConfigError::Parse {
                path: origin.to_owned(),
                source,
            })?;
        if config.jobs == Some(0) {
            return Err(ConfigError::NoWorkers);
        }
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let origin = path.display().to_string();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: origin.clone(),
            source,
        })?;
        tracing::debug!(path = %origin, "loading configuration");
        Self::from_json(&text, &origin)
    }

    /// Load `path` if given, otherwise the defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        path.map_or_else(|| Ok(Self::default()), Self::load)
    }

    /// Worker count: the configured one, or the available parallelism.
    pub fn jobs(&self) -> usize {
        self.jobs.unwrap_or_else(|| {
            std::thread::available_parallelism().map_or(1, NonZeroUsize::get)
        })
    }
}
