//! Error types for costctl
//!
//! This module defines the error handling strategy for costctl. There are two
//! error types: `CostctlError` (main error enum) and `ConfigError` (configuration-specific).
//!
//! ## Error Handling Philosophy
//!
//! Library code uses `crate::error::Result<T>` which returns `CostctlError`.
//! CLI code uses `anyhow::Result<T>` for top-level error handling. The conversion
//! happens at the CLI boundary using `anyhow::Error::from` to preserve error chains.
//!
//! This split exists because:
//! - Library code benefits from structured error types for programmatic handling
//! - CLI code benefits from `anyhow`'s context chains and user-friendly display
//! - Conversion preserves full error information (not just strings)
//!
//! ## Retry Awareness
//!
//! Errors implement `IsRetryable` to indicate whether an operation should be retried.
//! The `RetryPolicy` in `src/retry.rs` uses this to determine retry behavior.
//! Only `Throttled`, `CloudProvider`, `Io`, and `Retryable` variants are retryable.
//!
//! Bulk enumeration across 18 regions is exactly the workload that trips AWS
//! request-rate limits, so throttling responses get their own variant instead of
//! being folded into the generic `Aws` string. `wrap_aws_error` does the
//! classification at the call site.
//!
//! Non-retryable errors (e.g., `Validation`, `Config`) fail immediately to avoid
//! wasting time on operations that cannot succeed.

use thiserror::Error;

/// Main error type for costctl
#[derive(Error, Debug)]
pub enum CostctlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Cloud provider error: {provider} - {message}")]
    CloudProvider {
        provider: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("AWS API throttled: {operation} - {message}")]
    Throttled { operation: String, message: String },

    #[error("Retryable error (attempt {attempt}/{max_attempts}): {reason}")]
    Retryable {
        attempt: u32,
        max_attempts: u32,
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("AWS SDK error: {0}")]
    Aws(String),

    #[error("Report error: {report} - {message}")]
    Report { report: String, message: String },

    #[error("Validation error: {field} - {reason}")]
    Validation { field: String, reason: String },

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Config file not found: {0}")]
    NotFound(String),

    #[error("Failed to parse config: {0}")]
    ParseError(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, CostctlError>;

/// Trait for determining if an error is retryable
///
/// Used by `RetryPolicy` implementations to determine whether an error
/// should trigger a retry attempt.
pub trait IsRetryable {
    fn is_retryable(&self) -> bool;
}

impl IsRetryable for CostctlError {
    fn is_retryable(&self) -> bool {
        matches!(
            self,
            CostctlError::Throttled { .. }
                | CostctlError::Retryable { .. }
                | CostctlError::CloudProvider { .. }
                | CostctlError::Io(_)
        )
    }
}

/// Classify an AWS SDK error for an operation.
///
/// SDK v1 errors are complex generic types, so classification works on the
/// rendered message: throttling responses become `Throttled` (retryable),
/// everything else becomes `Aws` (not retryable).
pub fn wrap_aws_error(operation: &str, err: impl std::fmt::Display) -> CostctlError {
    let message = format!("{}", err);
    if is_throttling_message(&message) {
        CostctlError::Throttled {
            operation: operation.to_string(),
            message,
        }
    } else {
        CostctlError::Aws(format!("{}: {}", operation, message))
    }
}

fn is_throttling_message(message: &str) -> bool {
    message.contains("Throttling")
        || message.contains("RequestLimitExceeded")
        || message.contains("TooManyRequests")
}
