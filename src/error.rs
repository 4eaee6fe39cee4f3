//! Error Handling Infrastructure
//!
//! This module defines all error types used throughout cloud-sql-execute.
//! Every error maps to a stable error code and to the process exit code.
//!
//! # Error Categories
//! - Configuration: `MissingInstance`, `InvalidRowLimit`, `Auth` (detected before any network call)
//! - `ProjectResolution`: no project given and none could be detected
//! - `Credentials`: Application Default Credentials unavailable
//! - `Transport`: the Cloud SQL Admin API call failed
//! - `InvalidResponse` / `Output`: the response could not be decoded or written

use thiserror::Error;

use crate::auth::AuthError;

/// Main error type for cloud-sql-execute operations
#[derive(Error, Debug)]
pub enum ExecError {
    /// No instance ID on the command line or in `CLOUD_SQL_INSTANCE`
    #[error(
        "Cloud SQL Instance ID is required. Specify with -i/--instance or set CLOUD_SQL_INSTANCE environment variable."
    )]
    MissingInstance,

    /// Row limit outside the accepted range
    #[error("Invalid row limit {0}: the limit must be a positive number of rows")]
    InvalidRowLimit(u64),

    /// Authentication options are inconsistent
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// No project given and auto-detection found nothing
    #[error(
        "Could not detect default project ID. Please specify with -p/--project option. \
         Make sure you're authenticated with 'gcloud auth application-default login'."
    )]
    ProjectResolution,

    /// Ambient credentials could not be loaded or exchanged for a token
    #[error("Credentials error: {0}")]
    Credentials(String),

    /// The remote call failed
    ///
    /// `body` is the raw response body returned by the API (never the request payload).
    #[error("API request failed: {message}")]
    Transport {
        message: String,
        status: Option<u16>,
        status_text: Option<String>,
        url: String,
        body: Option<String>,
    },

    /// The API answered with something that is not an executeSql response
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Writing to the primary output stream failed
    #[error("Output error: {0}")]
    Output(String),
}

impl ExecError {
    /// Convert error to error code string
    ///
    /// Error codes are stable and suitable for programmatic handling.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::MissingInstance => "MISSING_INSTANCE",
            Self::InvalidRowLimit(_) => "INVALID_ROW_LIMIT",
            Self::Auth(AuthError::MultipleAuthMethods { .. }) => "MULTIPLE_AUTH_METHODS",
            Self::Auth(AuthError::MissingUser) => "MISSING_USER",
            Self::ProjectResolution => "PROJECT_RESOLUTION",
            Self::Credentials(_) => "CREDENTIALS",
            Self::Transport { .. } => "TRANSPORT",
            Self::InvalidResponse(_) => "INVALID_RESPONSE",
            Self::Output(_) => "OUTPUT",
        }
    }

    /// True for errors detected before any network-affecting work
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(self, Self::MissingInstance | Self::InvalidRowLimit(_) | Self::Auth(_))
    }

    /// Process exit code for this error
    ///
    /// Every failure exits with 1; success is 0.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        1
    }

    /// Create a credentials error
    pub fn credentials(message: impl Into<String>) -> Self {
        Self::Credentials(message.into())
    }

    /// Create an invalid response error
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse(message.into())
    }

    /// Create an output error
    pub fn output(message: impl Into<String>) -> Self {
        Self::Output(message.into())
    }
}

/// Result type alias for cloud-sql-execute operations
pub type Result<T> = std::result::Result<T, ExecError>;
