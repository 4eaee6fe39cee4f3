//! Environment Resolver
//!
//! Reads named environment variables into typed values. Lookups go through
//! the [`EnvSource`] trait so callers can pass an explicit snapshot instead
//! of the live process environment.
//!
//! None of the typed readers fail: malformed input is treated as "no value".

use std::collections::HashMap;

/// Environment variable names, one per command-line option
pub mod vars {
    pub const PROJECT: &str = "GOOGLE_CLOUD_PROJECT";
    pub const INSTANCE: &str = "CLOUD_SQL_INSTANCE";
    pub const DATABASE: &str = "CLOUD_SQL_DATABASE";
    pub const USER: &str = "CLOUD_SQL_USER";
    pub const PASSWORD: &str = "CLOUD_SQL_PASSWORD";
    pub const ACCESS_TOKEN: &str = "CLOUD_SQL_ACCESS_TOKEN";
    pub const SECRET_PATH: &str = "CLOUD_SQL_SECRET_PATH";
    pub const AUTO_IAM_AUTHN: &str = "CLOUD_SQL_AUTO_IAM_AUTHN";
    pub const FORMAT: &str = "CLOUD_SQL_FORMAT";
    pub const LIMIT: &str = "CLOUD_SQL_LIMIT";
    pub const VERBOSE: &str = "CLOUD_SQL_VERBOSE";
}

/// Read-only key-value lookup of environment variables
pub trait EnvSource {
    /// Raw value of `name`, if set
    fn get(&self, name: &str) -> Option<String>;
}

/// The live process environment
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn get(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

impl EnvSource for HashMap<String, String> {
    fn get(&self, name: &str) -> Option<String> {
        HashMap::get(self, name).cloned()
    }
}

impl EnvSource for HashMap<&str, &str> {
    fn get(&self, name: &str) -> Option<String> {
        HashMap::get(self, name).map(|v| (*v).to_string())
    }
}

/// String value of `name`; unset and empty values are both `None`
pub fn env_value(env: &impl EnvSource, name: &str) -> Option<String> {
    env.get(name).filter(|v| !v.is_empty())
}

/// Boolean value of `name`: true only for the literals `"true"` and `"1"`
pub fn env_bool(env: &impl EnvSource, name: &str) -> bool {
    matches!(env.get(name).as_deref(), Some("true" | "1"))
}

/// Integer value of `name`, `None` when unset or not a whole number
///
/// Trailing text is not tolerated: `"10rows"` is `None`, not 10.
pub fn env_number(env: &impl EnvSource, name: &str) -> Option<u64> {
    env.get(name).and_then(|v| v.trim().parse().ok())
}
