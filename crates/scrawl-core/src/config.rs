//! Configuration system for scrawl.
//!
//! Resolution order: environment variables → config file → defaults.
//!
//! Config file location:
//!   1. $SCRAWL_CONFIG (explicit override)
//!   2. $XDG_CONFIG_HOME/scrawl/config.toml
//!   3. ~/.config/scrawl/config.toml

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrawlConfig {
    pub link: LinkConfig,
    pub model: ModelConfig,
    pub inference: InferenceConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkConfig {
    /// Serial device the peer is attached to.
    pub device: PathBuf,
    /// Line rate in baud. Must be one of the standard termios rates.
    pub baud: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Path to the binary weight file. See model.rs for the format.
    pub weights_path: PathBuf,
}

/// Which classifier backend the daemon drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    /// Fixed-point software engine.
    Software,
    /// Memory-mapped hardware accelerator.
    Accel,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    pub backend: Backend,
    /// Physical base address of the accelerator register block.
    /// Only read when backend = "accel".
    pub accel_base: u64,
}

// ── Defaults ──────────────────────────────────────────────────────────────────

impl Default for ScrawlConfig {
    fn default() -> Self {
        Self {
            link: LinkConfig::default(),
            model: ModelConfig::default(),
            inference: InferenceConfig::default(),
        }
    }
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            device: PathBuf::from("/dev/ttyUL0"),
            baud: 9600,
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            weights_path: data_dir().join("mlp-784x32x10.scw"),
        }
    }
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            backend: Backend::Software,
            accel_base: 0x44A0_0000,
        }
    }
}

// ── Path helpers ──────────────────────────────────────────────────────────────

fn config_dir() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| dirs_or_home().join(".config"))
        .join("scrawl")
}

fn data_dir() -> PathBuf {
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| dirs_or_home().join(".local").join("share"))
        .join("scrawl")
}

fn dirs_or_home() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/tmp"))
}

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {0}: {1}")]
    ReadFailed(PathBuf, std::io::Error),
    #[error("failed to parse {0}: {1}")]
    ParseFailed(PathBuf, toml::de::Error),
    #[error("failed to write {0}: {1}")]
    WriteFailed(PathBuf, std::io::Error),
    #[error("failed to serialize: {0}")]
    SerializeFailed(toml::ser::Error),
}

// ── Loading ───────────────────────────────────────────────────────────────────

impl ScrawlConfig {
    /// Load config: env vars → file → defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::file_path();
        let mut config = if path.exists() {
            let text = std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::ReadFailed(path.clone(), e))?;
            toml::from_str(&text).map_err(|e| ConfigError::ParseFailed(path.clone(), e))?
        } else {
            ScrawlConfig::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Config file path.
    pub fn file_path() -> PathBuf {
        std::env::var("SCRAWL_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| config_dir().join("config.toml"))
    }

    /// Write default config if none exists. Returns the path.
    pub fn write_default_if_missing() -> Result<PathBuf, ConfigError> {
        let path = Self::file_path();
        if !path.exists() {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| ConfigError::WriteFailed(path.clone(), e))?;
            }
            let text = toml::to_string_pretty(&ScrawlConfig::default())
                .map_err(ConfigError::SerializeFailed)?;
            std::fs::write(&path, text).map_err(|e| ConfigError::WriteFailed(path.clone(), e))?;
        }
        Ok(path)
    }

    /// Apply SCRAWL_* env var overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("SCRAWL_LINK__DEVICE") {
            self.link.device = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("SCRAWL_LINK__BAUD") {
            if let Ok(b) = v.parse() {
                self.link.baud = b;
            }
        }
        if let Ok(v) = std::env::var("SCRAWL_MODEL__WEIGHTS_PATH") {
            self.model.weights_path = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("SCRAWL_INFERENCE__BACKEND") {
            match v.as_str() {
                "software" => self.inference.backend = Backend::Software,
                "accel" => self.inference.backend = Backend::Accel,
                _ => {}
            }
        }
        if let Ok(v) = std::env::var("SCRAWL_INFERENCE__ACCEL_BASE") {
            let parsed = v
                .strip_prefix("0x")
                .map(|hexpart| u64::from_str_radix(hexpart, 16))
                .unwrap_or_else(|| v.parse());
            if let Ok(base) = parsed {
                self.inference.accel_base = base;
            }
        }
    }
}
