//! Structured error types for spheron-agent
//!
//! One error enum covers initialization, validation, gateway and watchdog
//! failures so callers can decide between surfacing and swallowing.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Primary error type for deployment operations
#[derive(Error, Debug)]
pub enum DeployError {
    // =========================================================================
    // Initialization / Configuration Errors
    // =========================================================================
    /// Missing required setting (fatal to every action)
    #[error("missing required configuration: {key}")]
    MissingConfig { key: String },

    /// Invalid settings or deployment configuration
    #[error("invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// Settings file could not be read
    #[error("settings file not found: {path}")]
    SettingsNotFound { path: PathBuf },

    // =========================================================================
    // Extraction Errors
    // =========================================================================
    /// Extractor output failed schema checks
    #[error("invalid deployment request: {reason}")]
    Validation { reason: String },

    /// Content generation call failed
    #[error("content extraction failed: {message}")]
    Extraction { message: String },

    // =========================================================================
    // Gateway Errors
    // =========================================================================
    /// A remote deployment/lease/escrow call failed
    #[error("failed to {operation}: {message}")]
    Gateway {
        operation: String,
        message: String,
        status: Option<u16>,
    },

    /// A bounded operation ran out of time
    #[error("{operation} timed out after {duration:?}")]
    Timeout { operation: String, duration: Duration },

    /// Connection to a remote endpoint could not be established
    #[error("connection failed: {message}")]
    ConnectionFailed { message: String },

    // =========================================================================
    // Manifest Errors
    // =========================================================================
    /// Rendering or parsing a manifest failed
    #[error("manifest error: {message}")]
    Manifest { message: String },

    // =========================================================================
    // External Error Wrappers
    // =========================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yml::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("HTTP error: {0}")]
    Http(String),
}

impl DeployError {
    /// Wrap a failed gateway call with the operation it was performing
    pub fn gateway(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Gateway {
            operation: operation.into(),
            message: message.into(),
            status: None,
        }
    }

    /// Same as [`DeployError::gateway`] but keeps the upstream HTTP status
    pub fn gateway_status(
        operation: impl Into<String>,
        status: u16,
        message: impl Into<String>,
    ) -> Self {
        Self::Gateway {
            operation: operation.into(),
            message: message.into(),
            status: Some(status),
        }
    }

    /// Re-wrap an error as the failure of an enclosing gateway operation
    pub fn within(self, operation: impl Into<String>) -> Self {
        let status = match &self {
            Self::Gateway { status, .. } => *status,
            _ => None,
        };
        Self::Gateway {
            operation: operation.into(),
            message: self.to_string(),
            status,
        }
    }

    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    pub fn manifest(message: impl Into<String>) -> Self {
        Self::Manifest {
            message: message.into(),
        }
    }

    /// Check if error is transient
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout { .. } | Self::ConnectionFailed { .. } => true,

            Self::Gateway { status, .. } => match status {
                Some(code) => matches!(code, 429 | 500 | 502 | 503 | 504),
                // No status means the request never got an answer
                None => true,
            },

            Self::Io(io_err) => matches!(
                io_err.kind(),
                std::io::ErrorKind::Interrupted
                    | std::io::ErrorKind::WouldBlock
                    | std::io::ErrorKind::TimedOut
            ),

            Self::MissingConfig { .. }
            | Self::InvalidConfig { .. }
            | Self::SettingsNotFound { .. }
            | Self::Validation { .. }
            | Self::Extraction { .. }
            | Self::Manifest { .. }
            | Self::Json(_)
            | Self::Yaml(_)
            | Self::Csv(_)
            | Self::Http(_) => false,
        }
    }

    /// Check if error requires the operator to change something
    pub fn requires_user_action(&self) -> bool {
        matches!(
            self,
            Self::MissingConfig { .. }
                | Self::InvalidConfig { .. }
                | Self::SettingsNotFound { .. }
                | Self::Gateway {
                    status: Some(401 | 403),
                    ..
                }
        )
    }

    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            Self::MissingConfig { key } => {
                format!("{} is not set. Add it to your settings or environment.", key)
            }
            Self::Validation { reason } => {
                format!("Invalid deployment configuration generated: {}", reason)
            }
            Self::Gateway {
                status: Some(401 | 403),
                ..
            } => "The Spheron gateway rejected the credential. Check SPHERON_PRIVATE_KEY.".to_string(),
            Self::Timeout { operation, .. } => {
                format!("The Spheron gateway did not answer in time ({}).", operation)
            }
            _ => self.to_string(),
        }
    }
}

impl From<reqwest::Error> for DeployError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() {
            Self::ConnectionFailed {
                message: err.to_string(),
            }
        } else {
            Self::Http(err.to_string())
        }
    }
}

impl From<tera::Error> for DeployError {
    fn from(err: tera::Error) -> Self {
        Self::Manifest {
            message: err.to_string(),
        }
    }
}

/// Result type alias using DeployError
pub type Result<T> = std::result::Result<T, DeployError>;

/// Extension trait for converting Option to Result with DeployError
pub trait OptionExt<T> {
    fn ok_or_missing(self, key: impl Into<String>) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_missing(self, key: impl Into<String>) -> Result<T> {
        self.ok_or_else(|| DeployError::MissingConfig { key: key.into() })
    }
}
