//! executeSql Request Payload
//!
//! [`build`] turns resolved options and the SQL text into the body of the
//! Cloud SQL Admin `executeSql` call. Optional fields are omitted (never
//! `null`) unless their option was provided.
//!
//! [`RequestPayload::redacted`] produces a separate copy with credential
//! fields masked. Only the redacted copy may be logged.

use serde::{Deserialize, Serialize};

use crate::config::ResolvedOptions;

/// Placeholder written over credential fields in diagnostic output
pub const MASK: &str = "***MASKED***";

/// Body of an `executeSql` request
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestPayload {
    /// Statement text, always present
    pub sql_statement: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,

    /// WARNING: Sensitive data, log only through [`RequestPayload::redacted`]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// WARNING: Sensitive data, log only through [`RequestPayload::redacted`]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,

    /// Secret Manager resource name, not a secret itself
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret_path: Option<String>,

    /// Present only as `true`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_iam_authn: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub row_limit: Option<u64>,
}

impl RequestPayload {
    /// Copy of this payload with credential-bearing fields masked
    #[must_use]
    pub fn redacted(&self) -> Self {
        let mask = |v: &Option<String>| v.as_ref().map(|_| MASK.to_string());
        Self {
            password: mask(&self.password),
            access_token: mask(&self.access_token),
            ..self.clone()
        }
    }

    /// Redacted payload as a single JSON line, for log events
    #[must_use]
    pub fn redacted_json(&self) -> String {
        serde_json::to_string(&self.redacted()).unwrap_or_else(|_| "<unserializable>".to_string())
    }
}

impl std::fmt::Debug for RequestPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.redacted_json())
    }
}

/// Build the request payload for `sql`
///
/// Total and deterministic: every check that can fail has already run.
pub fn build(sql: &str, options: &ResolvedOptions) -> RequestPayload {
    RequestPayload {
        sql_statement: sql.to_string(),
        database: options.database.clone(),
        user: options.user.clone(),
        password: options.password.clone(),
        access_token: options.access_token.clone(),
        secret_path: options.secret_path.clone(),
        auto_iam_authn: options.auto_iam_authn.then_some(true),
        row_limit: options.limit,
    }
}
