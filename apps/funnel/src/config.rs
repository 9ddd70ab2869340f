//! # Configuration
//!
//! Optional `funnel.toml` file. Every key has a default; CLI flags and
//! `FUNNEL_*` environment variables (read by clap) win over the file.
//!
//! ```toml
//! database = "funnel.redb"
//! import_mode = "strict"   # or "lenient"
//! promotion = "guarded"    # or "repeat"
//!
//! [server]
//! host = "127.0.0.1"
//! port = 8080
//! ```

use funnel_core::{FunnelError, ImportMode, PromotionPolicy, SessionSettings};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File read when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "funnel.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_database")]
    pub database: PathBuf,
    #[serde(default)]
    pub import_mode: ImportMode,
    #[serde(default)]
    pub promotion: PromotionPolicy,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_database() -> PathBuf {
    PathBuf::from("funnel.redb")
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: default_database(),
            import_mode: ImportMode::default(),
            promotion: PromotionPolicy::default(),
            server: ServerConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Config {
    /// Parse TOML text.
    pub fn parse(text: &str) -> Result<Self, FunnelError> {
        toml::from_str(text)
            .map_err(|e| FunnelError::SerializationError(format!("Invalid config: {}", e)))
    }

    /// Load `path`, or `funnel.toml` if present, or the defaults.
    ///
    /// An explicitly named file must exist.
    pub fn load(path: Option<&Path>) -> Result<Self, FunnelError> {
        let (path, explicit) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        };
        if !explicit && !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(&path).map_err(|e| {
            FunnelError::IoError(format!("Cannot read config {}: {}", path.display(), e))
        })?;
        let config = Self::parse(&text)?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    #[must_use]
    pub fn settings(&self) -> SessionSettings {
        SessionSettings {
            import_mode: self.import_mode,
            promotion: self.promotion,
        }
    }
}
