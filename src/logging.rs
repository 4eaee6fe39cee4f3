//! Diagnostic channel setup.
//!
//! All log events go to stderr so stdout carries only query results.

use tracing::Level;
use tracing_subscriber::EnvFilter;

use crate::error::{ExecError, Result};

/// Log level for the given verbosity: DEBUG when verbose, otherwise ERROR only
#[must_use]
pub const fn level_for(verbose: bool) -> Level {
    if verbose {
        Level::DEBUG
    } else {
        Level::ERROR
    }
}

/// Installs the global stderr subscriber.
///
/// `RUST_LOG`, when set, takes precedence over `verbose`.
///
/// # Example
/// ```rust,no_run
/// use cloud_sql_execute::logging::init_logging;
///
/// init_logging(true).expect("Failed to initialize logging");
/// ```
pub fn init_logging(verbose: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level_for(verbose).as_str().to_lowercase()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(verbose)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .try_init()
        .map_err(|e| ExecError::output(format!("Failed to initialize logging: {e}")))?;

    Ok(())
}
