//! Configuration validation.
//!
//! Checks that the realm binding is well formed and every limit is usable
//! before any session is opened.

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::{Config, LimitsConfig, ObservabilityConfig, RealmConfig};

/// Configuration validation error.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Multiple validation errors: {0:?}")]
    Multiple(Vec<ValidationError>),
}

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Trait for validatable configuration sections.
pub trait Validate {
    /// Validate this configuration section.
    fn validate(&self) -> ValidationResult<()>;
}

fn is_hex_id(id: &str) -> bool {
    id.strip_prefix("0x")
        .is_some_and(|hex| !hex.is_empty() && hex.chars().all(|c| c.is_ascii_hexdigit()))
}

fn collect(mut errors: Vec<ValidationError>) -> ValidationResult<()> {
    if errors.is_empty() {
        Ok(())
    } else if errors.len() == 1 {
        Err(errors.remove(0))
    } else {
        Err(ValidationError::Multiple(errors))
    }
}

impl Config {
    /// Validate the entire configuration.
    pub fn validate(&self) -> ValidationResult<()> {
        let mut errors = Vec::new();

        if let Err(e) = self.realm.validate() {
            errors.push(e);
        }
        if let Err(e) = self.limits.validate() {
            errors.push(e);
        }
        if let Err(e) = self.observability.validate() {
            errors.push(e);
        }

        collect(errors)
    }

    /// Load and validate configuration.
    pub fn load_and_validate() -> anyhow::Result<Self> {
        let config = Self::load()?;
        config.validate().map_err(|e| anyhow::anyhow!("{}", e))?;
        Ok(config)
    }
}

impl Validate for RealmConfig {
    fn validate(&self) -> ValidationResult<()> {
        let mut errors = Vec::new();

        if self.realm_id.is_empty() {
            errors.push(ValidationError::MissingField {
                field: "realm.realm_id".into(),
            });
        } else if !is_hex_id(&self.realm_id) {
            errors.push(ValidationError::InvalidValue {
                field: "realm.realm_id".into(),
                reason: "must be 0x followed by hex digits".into(),
            });
        }

        if self.nodes.is_empty() {
            errors.push(ValidationError::MissingField {
                field: "realm.nodes".into(),
            });
        }
        for (i, node) in self.nodes.iter().enumerate() {
            if node.parse::<SocketAddr>().is_err() {
                errors.push(ValidationError::InvalidValue {
                    field: format!("realm.nodes[{i}]"),
                    reason: format!("'{node}' is not a socket address"),
                });
            }
        }

        collect(errors)
    }
}

impl Validate for LimitsConfig {
    fn validate(&self) -> ValidationResult<()> {
        let fields: [(&str, u64); 6] = [
            ("limits.max_utterance_len", self.max_utterance_len as u64),
            ("limits.max_sessions", self.max_sessions as u64),
            ("limits.max_reply_len", self.max_reply_len as u64),
            ("limits.session_ttl_ms", self.session_ttl_ms),
            ("limits.rate_limit_per_min", u64::from(self.rate_limit_per_min)),
            ("limits.rate_window_ms", self.rate_window_ms),
        ];

        let errors = fields
            .iter()
            .filter(|(_, value)| *value == 0)
            .map(|(field, _)| ValidationError::InvalidValue {
                field: (*field).to_string(),
                reason: "must be greater than 0".into(),
            })
            .collect();

        collect(errors)
    }
}

impl Validate for ObservabilityConfig {
    fn validate(&self) -> ValidationResult<()> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        let mut errors = Vec::new();

        if !valid_levels.contains(&self.log_level.to_lowercase().as_str()) {
            errors.push(ValidationError::InvalidValue {
                field: "observability.log_level".into(),
                reason: format!("must be one of: {}", valid_levels.join(", ")),
            });
        }
        if self.log_format != "json" && self.log_format != "pretty" {
            errors.push(ValidationError::InvalidValue {
                field: "observability.log_format".into(),
                reason: "must be 'json' or 'pretty'".into(),
            });
        }

        collect(errors)
    }
}
