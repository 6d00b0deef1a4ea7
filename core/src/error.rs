//! Error types for churn-bench-core

use thiserror::Error;

/// Broad category of a [`BenchError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BenchErrorKind {
    /// Scenario configuration failed validation
    Config,

    /// A builder was missing a required component
    MissingConfig,

    /// The scenario could not be driven to completion
    Orchestration,
}

/// Core error type
///
/// Only scenario-level problems surface as errors. Per-iteration failures
/// are classified into outcomes and never reach this type.
#[derive(Error, Debug, Clone)]
#[error("{kind:?} error: {message}")]
pub struct BenchError {
    /// Error category
    pub kind: BenchErrorKind,

    /// Human readable description
    pub message: String,
}

impl BenchError {
    /// Invalid configuration
    pub fn config(message: impl Into<String>) -> Self {
        Self {
            kind: BenchErrorKind::Config,
            message: message.into(),
        }
    }

    /// Required builder field not provided
    pub fn missing_config(field: &str) -> Self {
        Self {
            kind: BenchErrorKind::MissingConfig,
            message: format!("missing required field: {field}"),
        }
    }

    /// Failure while running the scenario
    pub fn orchestration(message: impl Into<String>) -> Self {
        Self {
            kind: BenchErrorKind::Orchestration,
            message: message.into(),
        }
    }

    /// Whether this error came from configuration validation
    pub fn is_config(&self) -> bool {
        matches!(
            self.kind,
            BenchErrorKind::Config | BenchErrorKind::MissingConfig
        )
    }
}

impl From<crate::config::ConfigError> for BenchError {
    fn from(err: crate::config::ConfigError) -> Self {
        Self::config(err.to_string())
    }
}

/// Result type alias
pub type BenchResult<T> = std::result::Result<T, BenchError>;
