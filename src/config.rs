//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/outliner/outliner.toml`
//! 3. Explicit config file passed by the embedding application
//! 4. Environment variables: `OUTLINER_*` prefix

use std::path::Path;
use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

/// Tunables of the outline tree core.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Minimum continuous hover time before a collapsed drop target
    /// auto-expands, in milliseconds.
    pub dwell_threshold_ms: u64,
    /// Blob store key the serialized canonical tree is mirrored under.
    pub persist_key: String,
    /// Blob store key of the single-slot edit cache.
    pub edit_cache_key: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            dwell_threshold_ms: 300,
            persist_key: "outline-tree".to_string(),
            edit_cache_key: "saved-item".to_string(),
        }
    }
}

impl Settings {
    /// Load settings with layered precedence. `config_path` is the embedding
    /// application's own config file, if it has one.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder().add_source(Config::try_from(&Settings::default())?);

        if let Some(dirs) = ProjectDirs::from("", "", "outliner") {
            let global = dirs.config_dir().join("outliner.toml");
            if global.exists() {
                builder = builder.add_source(File::from(global));
            }
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::from(path.to_path_buf()));
        }

        builder = builder.add_source(Environment::with_prefix("OUTLINER"));

        builder.build()?.try_deserialize()
    }

    pub fn dwell_threshold(&self) -> Duration {
        Duration::from_millis(self.dwell_threshold_ms)
    }
}
