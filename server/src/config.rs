//! Server configuration
//!
//! Loaded from a TOML file; every field has a default so a missing file
//! still yields a usable configuration. Command-line flags override it.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::domain::User;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
    #[serde(default)]
    pub users: Vec<User>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address
    #[serde(default = "default_bind")]
    pub bind: String,

    /// SQLite database file
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Directory for rolling log files
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,

    /// Path prefix every route is mounted under
    #[serde(default = "default_base_uri")]
    pub base_uri: String,

    /// How long a mutating request waits for the store lock
    #[serde(default = "default_lock_wait_ms")]
    pub lock_wait_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            db_path: default_db_path(),
            log_dir: default_log_dir(),
            base_uri: default_base_uri(),
            lock_wait_ms: default_lock_wait_ms(),
        }
    }
}

impl ServerConfig {
    pub fn lock_wait(&self) -> Duration {
        Duration::from_millis(self.lock_wait_ms)
    }

    /// `base_uri` with one leading slash and no trailing slash
    pub fn normalized_base_uri(&self) -> String {
        let trimmed = self.base_uri.trim_matches('/');
        if trimmed.is_empty() {
            String::new()
        } else {
            format!("/{}", trimmed)
        }
    }
}

fn default_bind() -> String { "127.0.0.1:8080".to_string() }
fn default_db_path() -> PathBuf { PathBuf::from("recipe.db") }
fn default_log_dir() -> PathBuf { PathBuf::from("logs") }
fn default_base_uri() -> String { "/recipe".to_string() }
fn default_lock_wait_ms() -> u64 { 250 }

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Maximum entries per ingredient or direction list
    #[serde(default = "default_max_list_len")]
    pub max_list_len: usize,

    /// Recipes one owner may create without `unlimited_recipes`
    #[serde(default = "default_max_recipes_per_owner")]
    pub max_recipes_per_owner: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_list_len: default_max_list_len(),
            max_recipes_per_owner: default_max_recipes_per_owner(),
        }
    }
}

fn default_max_list_len() -> usize { 64 }
fn default_max_recipes_per_owner() -> usize { 32 }

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl Config {
    /// Load from `path`, or defaults if the file does not exist
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Config::default());
        }

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}
