//! Option Resolution
//!
//! This module merges command-line options with environment variables.
//!
//! # Resolution Precedence
//! 1. Explicit command-line value (highest priority)
//! 2. Environment variable (see [`crate::env::vars`])
//! 3. Absent
//!
//! Empty strings count as absent at every level, so `--database ""` falls
//! through to `CLOUD_SQL_DATABASE`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::env::{env_bool, env_number, env_value, vars, EnvSource};
use crate::error::{ExecError, Result};

/// Output shape for query results
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Tab-separated tables and status messages
    #[default]
    Text,
    /// The full API response, pretty-printed
    Json,
}

impl OutputFormat {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Json => "json",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown output format '{other}' (expected json or text)")),
        }
    }
}

/// Options exactly as supplied on the command line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawOptions {
    pub project: Option<String>,
    pub instance: Option<String>,
    pub database: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub access_token: Option<String>,
    pub secret_path: Option<String>,
    pub auto_iam_authn: bool,
    pub format: Option<OutputFormat>,
    pub limit: Option<u64>,
    pub verbose: bool,
}

/// Options after environment backfill
///
/// A field is `Some` iff it was given on the command line or its environment
/// variable was set and non-empty. `instance` is the one required field and
/// is an empty string when neither source provided it; see [`check_required`].
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ResolvedOptions {
    pub project: Option<String>,
    pub instance: String,
    pub database: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub access_token: Option<String>,
    pub secret_path: Option<String>,
    pub auto_iam_authn: bool,
    pub format: Option<OutputFormat>,
    pub limit: Option<u64>,
    pub verbose: bool,
}

impl ResolvedOptions {
    /// Output format, defaulting to text
    #[must_use]
    pub fn output_format(&self) -> OutputFormat {
        self.format.unwrap_or_default()
    }
}

// Hand-written so secrets never reach a log line through `{:?}`.
impl fmt::Debug for ResolvedOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mask = |v: &Option<String>| v.as_ref().map(|_| crate::request::MASK);
        f.debug_struct("ResolvedOptions")
            .field("project", &self.project)
            .field("instance", &self.instance)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &mask(&self.password))
            .field("access_token", &mask(&self.access_token))
            .field("secret_path", &self.secret_path)
            .field("auto_iam_authn", &self.auto_iam_authn)
            .field("format", &self.format)
            .field("limit", &self.limit)
            .field("verbose", &self.verbose)
            .finish()
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn pick(cli: Option<String>, env: &impl EnvSource, name: &str) -> Option<String> {
    non_empty(cli).or_else(|| env_value(env, name))
}

/// Merge command-line options with the environment (command line wins)
///
/// Pure function of `cli` and `env`; nothing is written anywhere.
pub fn merge(cli: RawOptions, env: &impl EnvSource) -> ResolvedOptions {
    ResolvedOptions {
        project: pick(cli.project, env, vars::PROJECT),
        instance: pick(cli.instance, env, vars::INSTANCE).unwrap_or_default(),
        database: pick(cli.database, env, vars::DATABASE),
        user: pick(cli.user, env, vars::USER),
        password: pick(cli.password, env, vars::PASSWORD),
        access_token: pick(cli.access_token, env, vars::ACCESS_TOKEN),
        secret_path: pick(cli.secret_path, env, vars::SECRET_PATH),
        auto_iam_authn: cli.auto_iam_authn || env_bool(env, vars::AUTO_IAM_AUTHN),
        format: cli
            .format
            .or_else(|| env_value(env, vars::FORMAT).and_then(|v| v.parse().ok())),
        limit: cli.limit.or_else(|| env_number(env, vars::LIMIT)),
        verbose: cli.verbose || env_bool(env, vars::VERBOSE),
    }
}

/// Checks that must pass before anything else runs
///
/// The instance ID is required, and a row limit of zero is rejected rather
/// than guessing whether it means "no limit" or "no rows".
pub fn check_required(options: &ResolvedOptions) -> Result<()> {
    if options.instance.is_empty() {
        return Err(ExecError::MissingInstance);
    }

    if let Some(0) = options.limit {
        return Err(ExecError::InvalidRowLimit(0));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&'static str, &'static str)]) -> HashMap<&'static str, &'static str> {
        pairs.iter().copied().collect()
    }

    #[test]
    fn test_cli_wins_over_env() {
        let cli = RawOptions {
            instance: Some("cli-instance".into()),
            database: Some("cli-db".into()),
            limit: Some(5),
            format: Some(OutputFormat::Json),
            ..Default::default()
        };
        let e = env(&[
            (vars::INSTANCE, "env-instance"),
            (vars::DATABASE, "env-db"),
            (vars::LIMIT, "50"),
            (vars::FORMAT, "text"),
        ]);

        let merged = merge(cli, &e);
        assert_eq!(merged.instance, "cli-instance");
        assert_eq!(merged.database.as_deref(), Some("cli-db"));
        assert_eq!(merged.limit, Some(5));
        assert_eq!(merged.format, Some(OutputFormat::Json));
    }

    #[test]
    fn test_env_fills_missing_cli_values() {
        let e = env(&[
            (vars::PROJECT, "p"),
            (vars::INSTANCE, "i"),
            (vars::DATABASE, "d"),
            (vars::USER, "u"),
            (vars::PASSWORD, "pw"),
            (vars::ACCESS_TOKEN, "tok"),
            (vars::SECRET_PATH, "projects/p/secrets/s/versions/1"),
            (vars::AUTO_IAM_AUTHN, "true"),
            (vars::FORMAT, "json"),
            (vars::LIMIT, "10"),
            (vars::VERBOSE, "1"),
        ]);

        let merged = merge(RawOptions::default(), &e);
        assert_eq!(merged.project.as_deref(), Some("p"));
        assert_eq!(merged.instance, "i");
        assert_eq!(merged.database.as_deref(), Some("d"));
        assert_eq!(merged.user.as_deref(), Some("u"));
        assert_eq!(merged.password.as_deref(), Some("pw"));
        assert_eq!(merged.access_token.as_deref(), Some("tok"));
        assert_eq!(merged.secret_path.as_deref(), Some("projects/p/secrets/s/versions/1"));
        assert!(merged.auto_iam_authn);
        assert_eq!(merged.format, Some(OutputFormat::Json));
        assert_eq!(merged.limit, Some(10));
        assert!(merged.verbose);
    }

    #[test]
    fn test_absent_everywhere() {
        let merged = merge(RawOptions::default(), &env(&[]));
        assert_eq!(merged.instance, "");
        assert!(merged.project.is_none());
        assert!(merged.password.is_none());
        assert!(!merged.auto_iam_authn);
        assert!(merged.format.is_none());
        assert_eq!(merged.output_format(), OutputFormat::Text);
        assert!(merged.limit.is_none());
    }

    #[test]
    fn test_empty_values_count_as_absent() {
        let cli = RawOptions { database: Some(String::new()), ..Default::default() };
        let e = env(&[(vars::DATABASE, "env-db"), (vars::USER, "")]);

        let merged = merge(cli, &e);
        assert_eq!(merged.database.as_deref(), Some("env-db"));
        assert!(merged.user.is_none());
    }

    #[test]
    fn test_bad_env_values_are_ignored() {
        let e = env(&[(vars::FORMAT, "yaml"), (vars::LIMIT, "lots"), (vars::VERBOSE, "yes")]);
        let merged = merge(RawOptions::default(), &e);
        assert!(merged.format.is_none());
        assert!(merged.limit.is_none());
        assert!(!merged.verbose);
    }

    #[test]
    fn test_merge_is_repeatable_across_environments() {
        let cli = RawOptions::default();
        let a = merge(cli.clone(), &env(&[(vars::INSTANCE, "a")]));
        let b = merge(cli, &env(&[(vars::INSTANCE, "b")]));
        assert_eq!(a.instance, "a");
        assert_eq!(b.instance, "b");
    }

    #[test]
    fn test_check_required_missing_instance() {
        let err = check_required(&ResolvedOptions::default()).unwrap_err();
        assert!(matches!(err, ExecError::MissingInstance));
    }

    #[test]
    fn test_check_required_zero_limit() {
        let options =
            ResolvedOptions { instance: "i".into(), limit: Some(0), ..Default::default() };
        assert!(matches!(check_required(&options), Err(ExecError::InvalidRowLimit(0))));
    }

    #[test]
    fn test_check_required_ok() {
        let options =
            ResolvedOptions { instance: "i".into(), limit: Some(1), ..Default::default() };
        assert!(check_required(&options).is_ok());
    }

    #[test]
    fn test_debug_masks_secrets() {
        let options = ResolvedOptions {
            password: Some("hunter2".into()),
            access_token: Some("ya29.secret".into()),
            ..Default::default()
        };
        let debug = format!("{options:?}");
        assert!(!debug.contains("hunter2"));
        assert!(!debug.contains("ya29.secret"));
        assert!(debug.contains("***MASKED***"));
    }

    #[test]
    fn test_output_format_parse() {
        assert_eq!("json".parse::<OutputFormat>(), Ok(OutputFormat::Json));
        assert_eq!("text".parse::<OutputFormat>(), Ok(OutputFormat::Text));
        assert!("JSON".parse::<OutputFormat>().is_err());
    }
}
