// ABOUTME: Environment, log level, and store URL parsing for deployment settings
// ABOUTME: Strongly typed wrappers over the STRIDE_* environment variables
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Stride Contributors

//! Environment-based configuration primitives.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::errors::{AppError, AppResult, ErrorCode};

/// Strongly typed log level configuration
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
#[allow(missing_docs)]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Convert to `tracing::Level`
    #[must_use]
    pub const fn to_tracing_level(self) -> tracing::Level {
        match self {
            Self::Error => tracing::Level::ERROR,
            Self::Warn => tracing::Level::WARN,
            Self::Info => tracing::Level::INFO,
            Self::Debug => tracing::Level::DEBUG,
            Self::Trace => tracing::Level::TRACE,
        }
    }

    /// Parse from string with fallback
    #[must_use]
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "error" => Self::Error,
            "warn" => Self::Warn,
            "debug" => Self::Debug,
            "trace" => Self::Trace,
            _ => Self::Info, // Default fallback
        }
    }

    /// Stable lowercase form
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Deployment environment, which tunes logging defaults
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
#[allow(missing_docs)]
pub enum Environment {
    #[default]
    Development,
    Production,
    Testing,
}

impl Environment {
    /// Parse from string with fallback
    #[must_use]
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "testing" | "test" => Self::Testing,
            _ => Self::Development,
        }
    }

    /// Whether this is the production environment
    #[must_use]
    pub const fn is_production(self) -> bool {
        matches!(self, Self::Production)
    }

    /// Whether this is the development environment
    #[must_use]
    pub const fn is_development(self) -> bool {
        matches!(self, Self::Development)
    }

    /// Whether this is the testing environment
    #[must_use]
    pub const fn is_testing(self) -> bool {
        matches!(self, Self::Testing)
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Development => f.write_str("development"),
            Self::Production => f.write_str("production"),
            Self::Testing => f.write_str("testing"),
        }
    }
}

/// Which record-store backend to use, parsed once at construction
///
/// `memory://` selects the in-memory demo store; `sqlite:<path>` (including
/// `sqlite::memory:`) selects the SQLite store. A bare path is treated as a
/// SQLite file path.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum StoreUrl {
    /// In-memory demo store, data lost on drop
    Memory,
    /// SQLite database with file path (or `:memory:`)
    Sqlite {
        /// Database file path as given in the URL
        path: PathBuf,
    },
}

impl StoreUrl {
    /// Parse a store URL string
    ///
    /// # Errors
    ///
    /// Returns `ConfigInvalid` for an empty URL or a scheme this library does
    /// not support (for example `postgres://`).
    pub fn parse(s: &str) -> AppResult<Self> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(AppError::new(
                ErrorCode::ConfigInvalid,
                "store URL must not be empty",
            ));
        }
        if trimmed == "memory" || trimmed == "memory://" {
            return Ok(Self::Memory);
        }
        if let Some(path) = trimmed.strip_prefix("sqlite:") {
            return Ok(Self::Sqlite {
                path: PathBuf::from(path),
            });
        }
        if trimmed.contains("://") {
            return Err(AppError::new(
                ErrorCode::ConfigInvalid,
                format!("unsupported store URL scheme: {trimmed}"),
            ));
        }
        // Fallback: treat as SQLite file path
        Ok(Self::Sqlite {
            path: PathBuf::from(trimmed),
        })
    }

    /// Connection string form accepted by `parse`
    #[must_use]
    pub fn to_connection_string(&self) -> String {
        match self {
            Self::Memory => "memory://".into(),
            Self::Sqlite { path } => format!("sqlite:{}", path.display()),
        }
    }

    /// Whether this selects the in-memory demo store
    #[must_use]
    pub const fn is_memory(&self) -> bool {
        matches!(self, Self::Memory)
    }

    /// Whether this selects the SQLite store
    #[must_use]
    pub const fn is_sqlite(&self) -> bool {
        matches!(self, Self::Sqlite { .. })
    }
}

impl Default for StoreUrl {
    fn default() -> Self {
        Self::Sqlite {
            path: PathBuf::from("./data/stride.db"),
        }
    }
}

impl std::fmt::Display for StoreUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_connection_string())
    }
}
