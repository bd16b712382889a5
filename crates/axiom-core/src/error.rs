//! Error types for the Axiom application.

use serde::Serialize;
use thiserror::Error;

/// Default message shown when a solve fails without a usable description.
pub const DEFAULT_SOLVE_FAILURE: &str =
    "The engine encountered a logical conflict. Please rephrase the problem.";

/// A shared error type for the entire Axiom application.
///
/// Variants are typed and structured; common library errors convert into
/// them through `From`.
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
pub enum AxiomError {
    /// The submitted problem text was empty after trimming.
    #[error("Problem text must not be empty")]
    EmptyInput,

    /// A solve request is already in flight.
    #[error("A calculation is already in progress")]
    Busy,

    /// Entity not found error with type information
    #[error("Entity not found: {entity_type} '{id}'")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// The reasoning API failed (transport, HTTP status, or empty reply).
    #[error("{0}")]
    Api(String),

    /// The reasoning API replied with a payload that violates the response schema.
    #[error("Malformed engine response: field '{field}' {reason}")]
    SchemaViolation { field: String, reason: String },

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization {
        format: String, // "TOML", "JSON", etc.
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AxiomError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates a NotFound error
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    /// Creates an Api error
    pub fn api(message: impl Into<String>) -> Self {
        Self::Api(message.into())
    }

    /// Creates a SchemaViolation error
    pub fn schema(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::SchemaViolation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Creates an IO error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    /// Check if this is a NotFound error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this error came from the reasoning API or its payload.
    pub fn is_solve_failure(&self) -> bool {
        matches!(self, Self::Api(_) | Self::SchemaViolation { .. })
    }

    /// Message suitable for the error panel.
    ///
    /// Falls back to [`DEFAULT_SOLVE_FAILURE`] when the error renders as blank.
    pub fn user_message(&self) -> String {
        let message = self.to_string();
        if message.trim().is_empty() {
            DEFAULT_SOLVE_FAILURE.to_string()
        } else {
            message
        }
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for AxiomError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for AxiomError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for AxiomError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<anyhow::Error> for AxiomError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// A type alias for `Result<T, AxiomError>`.
pub type Result<T> = std::result::Result<T, AxiomError>;
