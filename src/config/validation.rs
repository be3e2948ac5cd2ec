//! Charm option validation.
//!
//! # Responsibilities
//! - Turn untyped options into typed [`CharmOptions`]
//! - Validate value ranges (port within 1..=65535)
//! - Report every offending field, not just the first
//!
//! # Design Decisions
//! - Validation is a pure function: RawConfig → Result<CharmOptions, ValidationFailure>
//! - Unknown options are ignored; the host framework owns the option schema

use thiserror::Error;

use crate::config::schema::RawConfig;

/// Port Falcosidekick listens on when `port` is not set.
pub const DEFAULT_PORT: u16 = 2801;

/// Options that passed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharmOptions {
    pub port: u16,
}

/// Raised when user-supplied options are invalid.
///
/// The message names the offending fields and is meant to be shown to the
/// operator verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid charm configuration: {}", fields.join(" "))]
pub struct ValidationFailure {
    fields: Vec<String>,
}

impl ValidationFailure {
    pub fn new(fields: Vec<String>) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }
}

/// Validate raw options.
pub fn validate_options(raw: &RawConfig) -> Result<CharmOptions, ValidationFailure> {
    let mut invalid = Vec::new();

    let port = match raw.get("port") {
        None => DEFAULT_PORT,
        Some(toml::Value::Integer(value)) => match u16::try_from(*value) {
            Ok(port) if port >= 1 => port,
            _ => {
                tracing::error!(port = value, "Invalid port number. Must be between 1 and 65535.");
                invalid.push("port".to_string());
                DEFAULT_PORT
            }
        },
        Some(other) => {
            tracing::error!(port = %other, "Port must be an integer");
            invalid.push("port".to_string());
            DEFAULT_PORT
        }
    };

    if !invalid.is_empty() {
        return Err(ValidationFailure::new(invalid));
    }
    Ok(CharmOptions { port })
}
