// ABOUTME: Unified error handling: error codes, AppError type, and AppResult alias
// ABOUTME: Store-layer anyhow errors are wrapped here before crossing the public API
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Stride Contributors

//! # Unified Error Handling
//!
//! Defines the standard error codes and the [`AppError`] type used across the
//! public API. Storage backends report `anyhow::Error` internally; services
//! convert those into [`AppError`] with [`ErrorCode::PersistenceFailure`] so
//! callers see one consistent taxonomy.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Standard error codes used throughout the library
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    // Permissions (1000-1999)
    /// Motion-sensor access was refused by the user or platform
    #[serde(rename = "PERMISSION_DENIED")]
    PermissionDenied = 1000,

    // Sensors (2000-2999)
    /// The motion sensor could not be started or is not present
    #[serde(rename = "SENSOR_UNAVAILABLE")]
    SensorUnavailable = 2000,

    // Validation (3000-3999)
    /// The provided input is invalid
    #[serde(rename = "INVALID_INPUT")]
    InvalidInput = 3000,
    /// The provided value is outside the acceptable range
    #[serde(rename = "VALUE_OUT_OF_RANGE")]
    ValueOutOfRange = 3001,

    // Resources (4000-4999)
    /// The requested record was not found
    #[serde(rename = "RESOURCE_NOT_FOUND")]
    ResourceNotFound = 4000,

    // Session state machine (5000-5999)
    /// An event arrived that the current session state does not accept
    #[serde(rename = "INVALID_TRANSITION")]
    InvalidTransition = 5000,

    // Configuration (6000-6999)
    /// Configuration error encountered
    #[serde(rename = "CONFIG_ERROR")]
    ConfigError = 6000,
    /// Configuration value is present but invalid
    #[serde(rename = "CONFIG_INVALID")]
    ConfigInvalid = 6001,

    // Internal (9000-9999)
    /// An internal error occurred
    #[serde(rename = "INTERNAL_ERROR")]
    InternalError = 9000,
    /// A record-store write or read was rejected or timed out
    #[serde(rename = "PERSISTENCE_FAILURE")]
    PersistenceFailure = 9001,
    /// Data serialization/deserialization failed
    #[serde(rename = "SERIALIZATION_ERROR")]
    SerializationError = 9002,
}

impl ErrorCode {
    /// Get a user-friendly description of this error
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::PermissionDenied => "Motion-sensor permission was denied",
            Self::SensorUnavailable => "The motion sensor is unavailable",
            Self::InvalidInput => "The provided input is invalid",
            Self::ValueOutOfRange => "The provided value is outside the acceptable range",
            Self::ResourceNotFound => "The requested record was not found",
            Self::InvalidTransition => "The session cannot accept this event in its current state",
            Self::ConfigError => "Configuration error encountered",
            Self::ConfigInvalid => "Configuration is invalid",
            Self::InternalError => "An internal error occurred",
            Self::PersistenceFailure => "Record store operation failed",
            Self::SerializationError => "Data serialization/deserialization failed",
        }
    }
}

/// Additional context that can be attached to errors
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorContext {
    /// User ID if available
    pub user_id: Option<Uuid>,
    /// Record or resource identifier if applicable
    pub resource_id: Option<String>,
    /// Additional key-value context
    pub details: serde_json::Value,
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self {
            user_id: None,
            resource_id: None,
            details: serde_json::Value::Object(serde_json::Map::new()),
        }
    }
}

/// Unified error type for the library
#[derive(Debug, Error)]
pub struct AppError {
    /// Error code
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Additional context
    pub context: ErrorContext,
    /// Source error for error chaining
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new `AppError` with the given code and message
    #[must_use]
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            context: ErrorContext::default(),
            source: None,
        }
    }

    /// Add a user ID to the error context
    #[must_use]
    pub fn with_user_id(mut self, user_id: Uuid) -> Self {
        self.context.user_id = Some(user_id);
        self
    }

    /// Add a record or resource ID to the error context
    #[must_use]
    pub fn with_resource_id(mut self, resource_id: impl Into<String>) -> Self {
        self.context.resource_id = Some(resource_id.into());
        self
    }

    /// Add details to the error context
    #[must_use]
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.context.details = details;
        self
    }

    /// Add a source error for error chaining
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.description(), self.message)
    }
}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;

/// Convenience constructors for the common error cases
impl AppError {
    /// Motion-sensor permission denied; tracking must not start
    #[must_use]
    pub fn permission_denied() -> Self {
        Self::new(
            ErrorCode::PermissionDenied,
            "motion-sensor permission denied",
        )
    }

    /// The motion sensor failed to start or is missing
    #[must_use]
    pub fn sensor_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::SensorUnavailable, message)
    }

    /// Invalid input
    #[must_use]
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    /// Record not found
    #[must_use]
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::ResourceNotFound,
            format!("{} not found", resource.into()),
        )
    }

    /// An event the current session state does not accept
    #[must_use]
    pub fn invalid_transition(event: impl Into<String>, state: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::InvalidTransition,
            format!("{} is not valid in state {state}", event.into()),
        )
    }

    /// Configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigError, message)
    }

    /// Internal error
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    /// Record-store failure, preserving the store-layer error as the source
    #[must_use]
    pub fn persistence(message: impl Into<String>, source: anyhow::Error) -> Self {
        let mut error = Self::new(ErrorCode::PersistenceFailure, message);
        error.source = Some(source.into());
        error
    }
}

/// Conversion from `anyhow::Error` for `?` interop at module boundaries
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        let message = error.to_string();
        let mut converted = Self::new(ErrorCode::InternalError, message);
        converted.source = Some(error.into());
        converted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_description() {
        assert_eq!(
            ErrorCode::PermissionDenied.description(),
            "Motion-sensor permission was denied"
        );
        assert_eq!(
            ErrorCode::PersistenceFailure.description(),
            "Record store operation failed"
        );
    }

    #[test]
    fn test_app_error_creation() {
        let error = AppError::permission_denied().with_user_id(Uuid::new_v4());

        assert_eq!(error.code, ErrorCode::PermissionDenied);
        assert!(error.context.user_id.is_some());
        assert!(error.source.is_none());
    }

    #[test]
    fn test_invalid_transition_message() {
        let error = AppError::invalid_transition("complete_set", "Paused");

        assert_eq!(error.code, ErrorCode::InvalidTransition);
        assert!(error.message.contains("complete_set"));
        assert!(error.message.contains("Paused"));
    }

    #[test]
    fn test_persistence_preserves_source() {
        let source = anyhow::anyhow!("disk full");
        let error = AppError::persistence("flush failed", source);

        assert_eq!(error.code, ErrorCode::PersistenceFailure);
        assert!(std::error::Error::source(&error).is_some());
    }

    #[test]
    fn test_display_format() {
        let error = AppError::invalid_input("sets must be at least 1");
        let rendered = error.to_string();

        assert!(rendered.starts_with("The provided input is invalid"));
        assert!(rendered.contains("sets must be at least 1"));
    }
}
