//! cloud-sql-execute - Run one SQL statement on a Cloud SQL instance
//!
//! The tool sends a single statement to the Cloud SQL Admin API
//! (`executeSql`) and prints the result as a tab-separated table or as raw
//! JSON.
//!
//! # Core Principles
//! - Command-line options override environment variables
//! - Authentication options are validated before any network call
//! - Credentials never reach the log channel (redacted payloads only)
//! - stdout carries results only; every diagnostic goes to stderr
//!
//! # Module Organization
//! - [`env`] - Typed environment variable lookups
//! - [`config`] - Option merging and pre-flight checks
//! - [`auth`] - Authentication mode validation
//! - [`request`] - `executeSql` payload construction and redaction
//! - [`client`] - Credential, transport and API client seams
//! - [`output`] - Response types and result formatting
//! - [`pipeline`] - End-to-end statement execution
//! - [`logging`] - stderr log subscriber
//! - [`error`] - Error types and handling

pub mod auth;
pub mod client;
pub mod config;
pub mod env;
pub mod error;
pub mod logging;
pub mod output;
pub mod pipeline;
pub mod request;

// Re-export commonly used types for convenience
pub use auth::{AuthError, AuthMode};
pub use client::{
    CredentialProvider, GcpCredentials, HttpTransport, SqlAdmin, SqlAdminClient, Transport,
    TransportFailure,
};
pub use config::{check_required, merge, OutputFormat, RawOptions, ResolvedOptions};
pub use env::{EnvSource, ProcessEnv};
pub use error::{ExecError, Result};
pub use output::{ExecuteSqlResponse, Rendered};
pub use pipeline::execute_query;
pub use request::{RequestPayload, MASK};
