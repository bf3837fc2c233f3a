//! Configuration management for the Chatter responder.
//!
//! The realm id, node bindings and limits are fixed for the lifetime of the process. The file
//! at `~/.chatter/config.json` is optional; every missing section falls back to the static
//! constants below.
//!
//! # Configuration Priority
//!
//! 1. Environment variables (CHATTER_* prefix)
//! 2. Explicit config file values
//! 3. Default values (the constants)
//!
//! # Environment Variable Mapping
//!
//! - `CHATTER_LOG_LEVEL` → observability.log_level
//! - `CHATTER_LOG_FORMAT` → observability.log_format
//! - `CHATTER_REALM_ID` → realm.realm_id

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

// ============================================================================
// Static Constants
// ============================================================================

/// Tenant identifier every session belongs to.
pub const STATIC_REALM_ID: &str =
    "0x1f7a3b9e5c0d2e4f6a8b0c2d4e6f8a0b2c4d6e8f0a2b4c6d8e0f2a4b6c8d0e2f4";

/// Node addresses bound to the realm at init.
pub const STATIC_NODE_ADDRESSES: &[&str] = &["10.17.0.11:7401", "10.17.0.12:7401"];

/// Maximum utterance length, in characters.
pub const MAX_UTTERANCE_LEN: usize = 512;

/// Maximum number of live sessions per realm.
pub const MAX_SESSIONS_PER_REALM: usize = 65536;

/// Replies longer than this many characters are truncated.
pub const MAX_REPLY_LEN: usize = 1024;

/// Idle time after which a session is treated as expired.
pub const SESSION_TTL_MS: u64 = 3_600_000;

/// Utterances accepted per session per rolling window.
pub const RATE_LIMIT_UTTERANCES_PER_MIN: u32 = 60;

/// Length of the rolling rate-limit window.
pub const RATE_WINDOW_MS: u64 = 60_000;

/// Get the configuration directory path.
pub fn config_dir() -> PathBuf {
    directories::UserDirs::new().map_or_else(
        || PathBuf::from(".chatter"),
        |dirs| dirs.home_dir().join(".chatter"),
    )
}

/// Get the configuration file path.
pub fn config_path() -> PathBuf {
    config_dir().join("config.json")
}

// ============================================================================
// Realm Configuration
// ============================================================================

/// Realm binding: tenant id and node addresses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RealmConfig {
    /// Realm id sessions are bound to. Anything other than [`STATIC_REALM_ID`]
    /// makes every session lookup fail with a realm mismatch.
    #[serde(default = "default_realm_id")]
    pub realm_id: String,

    /// Node socket addresses (`host:port`)
    #[serde(default = "default_nodes")]
    pub nodes: Vec<String>,
}

fn default_realm_id() -> String {
    STATIC_REALM_ID.to_string()
}

fn default_nodes() -> Vec<String> {
    STATIC_NODE_ADDRESSES.iter().map(|s| (*s).to_string()).collect()
}

impl Default for RealmConfig {
    fn default() -> Self {
        Self {
            realm_id: default_realm_id(),
            nodes: default_nodes(),
        }
    }
}

// ============================================================================
// Limits Configuration
// ============================================================================

/// Capacity, length, TTL and rate limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Maximum utterance length in characters (default: 512)
    #[serde(default = "default_max_utterance_len")]
    pub max_utterance_len: usize,

    /// Maximum live sessions (default: 65536)
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,

    /// Maximum reply length in characters (default: 1024)
    #[serde(default = "default_max_reply_len")]
    pub max_reply_len: usize,

    /// Session idle TTL in milliseconds (default: 3600000)
    #[serde(default = "default_session_ttl_ms")]
    pub session_ttl_ms: u64,

    /// Utterances per session per window (default: 60)
    #[serde(default = "default_rate_limit")]
    pub rate_limit_per_min: u32,

    /// Rate window length in milliseconds (default: 60000)
    #[serde(default = "default_rate_window_ms")]
    pub rate_window_ms: u64,
}

fn default_max_utterance_len() -> usize {
    MAX_UTTERANCE_LEN
}

fn default_max_sessions() -> usize {
    MAX_SESSIONS_PER_REALM
}

fn default_max_reply_len() -> usize {
    MAX_REPLY_LEN
}

fn default_session_ttl_ms() -> u64 {
    SESSION_TTL_MS
}

fn default_rate_limit() -> u32 {
    RATE_LIMIT_UTTERANCES_PER_MIN
}

fn default_rate_window_ms() -> u64 {
    RATE_WINDOW_MS
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_utterance_len: default_max_utterance_len(),
            max_sessions: default_max_sessions(),
            max_reply_len: default_max_reply_len(),
            session_ttl_ms: default_session_ttl_ms(),
            rate_limit_per_min: default_rate_limit(),
            rate_window_ms: default_rate_window_ms(),
        }
    }
}

// ============================================================================
// Observability Configuration
// ============================================================================

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error)
    /// Aliases: "level"
    #[serde(default = "default_log_level", alias = "level")]
    pub log_level: String,

    /// Log format (json, pretty)
    /// Aliases: "format"
    #[serde(default = "default_log_format", alias = "format")]
    pub log_format: String,

    /// Additional module targets forced to `warn`.
    #[serde(default)]
    pub excluded_targets: Vec<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
            excluded_targets: Vec::new(),
        }
    }
}

// ============================================================================
// Root Configuration
// ============================================================================

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Realm binding
    #[serde(default)]
    pub realm: RealmConfig,

    /// Limits
    #[serde(default)]
    pub limits: LimitsConfig,

    /// Logging
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Config {
    /// Load configuration from the default path, falling back to defaults when absent.
    pub fn load() -> Result<Self> {
        let path = config_path();
        if !path.exists() {
            tracing::info!("Config file not found, using defaults");
            return Ok(Self::default());
        }

        Self::load_from(&path)
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))
    }

    /// Load configuration from `path` if given, otherwise the default location,
    /// then apply environment overrides.
    pub fn load_with_env(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) => Self::load_from(p)?,
            None => Self::load()?,
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides to the configuration.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(level) = std::env::var("CHATTER_LOG_LEVEL") {
            self.observability.log_level = level;
        }
        if let Ok(format) = std::env::var("CHATTER_LOG_FORMAT") {
            self.observability.log_format = format;
        }
        if let Ok(realm) = std::env::var("CHATTER_REALM_ID") {
            self.realm.realm_id = realm;
        }
    }

    /// Write the configuration as pretty JSON.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write config to {}", path.display()))
    }
}
