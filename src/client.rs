//! Cloud SQL Admin API Client
//!
//! The remote call is split across two seams so the pipeline can run
//! without network access in tests:
//! - [`CredentialProvider`]: default project detection and bearer tokens
//! - [`Transport`]: one authenticated JSON POST
//!
//! [`SqlAdminClient`] composes the two into the `executeSql` operation.
//! Production implementations are [`GcpCredentials`] (Application Default
//! Credentials via `gcp_auth`) and [`HttpTransport`] (`reqwest`).
//!
//! No retries and no timeouts beyond the transport's defaults; a failed call
//! is reported once and ends the invocation.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error};

use crate::error::{ExecError, Result};
use crate::output::ExecuteSqlResponse;
use crate::request::RequestPayload;

/// Production API endpoint
pub const DEFAULT_BASE_URL: &str = "https://sqladmin.googleapis.com";

/// OAuth scope requested for the bearer token
pub const CLOUD_PLATFORM_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";

/// Source of project ID and access tokens
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Project configured for the ambient credentials, if any
    async fn default_project_id(&self) -> Option<String>;

    /// Bearer token for the Cloud SQL Admin API
    async fn access_token(&self) -> Result<String>;
}

/// Failed HTTP exchange as seen by the caller
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransportFailure {
    pub message: String,
    pub status: Option<u16>,
    pub status_text: Option<String>,
    pub body: Option<String>,
}

/// One authenticated JSON request
#[async_trait]
pub trait Transport: Send + Sync {
    /// POST `body` to `url` and decode the JSON answer
    async fn post_json(
        &self,
        url: &str,
        bearer: &str,
        body: &Value,
    ) -> std::result::Result<Value, TransportFailure>;
}

/// The operations the query pipeline needs from the API
#[async_trait]
pub trait SqlAdmin: Send + Sync {
    async fn default_project_id(&self) -> Option<String>;

    async fn execute_sql(
        &self,
        project: &str,
        instance: &str,
        payload: &RequestPayload,
    ) -> Result<ExecuteSqlResponse>;
}

/// Application Default Credentials
///
/// Discovery never fails up front: when no credentials are found, project
/// detection yields nothing and token requests fail with the reason.
pub struct GcpCredentials {
    provider: std::result::Result<Arc<dyn gcp_auth::TokenProvider>, String>,
}

impl GcpCredentials {
    /// Discover credentials the way `gcloud` and the client libraries do
    pub async fn discover() -> Self {
        match gcp_auth::provider().await {
            Ok(provider) => Self { provider: Ok(provider) },
            Err(e) => Self::unavailable(e.to_string()),
        }
    }

    /// Credentials that could not be loaded, for `reason`
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self { provider: Err(reason.into()) }
    }

    fn provider(&self) -> Result<&Arc<dyn gcp_auth::TokenProvider>> {
        self.provider.as_ref().map_err(|reason| {
            ExecError::credentials(format!(
                "{reason}. Run 'gcloud auth application-default login' to authenticate."
            ))
        })
    }
}

#[async_trait]
impl CredentialProvider for GcpCredentials {
    async fn default_project_id(&self) -> Option<String> {
        let provider = match &self.provider {
            Ok(provider) => provider,
            Err(reason) => {
                debug!("No Application Default Credentials: {reason}");
                return None;
            }
        };

        match provider.project_id().await {
            Ok(project) => Some(project.to_string()),
            Err(e) => {
                debug!("Project detection failed: {e}");
                None
            }
        }
    }

    async fn access_token(&self) -> Result<String> {
        let token = self
            .provider()?
            .token(&[CLOUD_PLATFORM_SCOPE])
            .await
            .map_err(|e| ExecError::credentials(format!("Could not obtain access token: {e}")))?;
        Ok(token.as_str().to_string())
    }
}

/// `reqwest`-backed transport
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post_json(
        &self,
        url: &str,
        bearer: &str,
        body: &Value,
    ) -> std::result::Result<Value, TransportFailure> {
        let response = self
            .client
            .post(url)
            .bearer_auth(bearer)
            .json(body)
            .send()
            .await
            .map_err(|e| TransportFailure { message: e.to_string(), ..Default::default() })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.ok();
            return Err(TransportFailure {
                message: format!("Request failed with status code {}", status.as_u16()),
                status: Some(status.as_u16()),
                status_text: status.canonical_reason().map(str::to_string),
                body,
            });
        }

        response.json::<Value>().await.map_err(|e| TransportFailure {
            message: format!("Could not decode response body: {e}"),
            status: Some(status.as_u16()),
            status_text: status.canonical_reason().map(str::to_string),
            body: None,
        })
    }
}

/// Cloud SQL Admin client (`sql/v1beta4`)
pub struct SqlAdminClient<C, T> {
    credentials: C,
    transport: T,
    base_url: String,
}

impl<C: CredentialProvider, T: Transport> SqlAdminClient<C, T> {
    pub fn new(credentials: C, transport: T) -> Self {
        Self { credentials, transport, base_url: DEFAULT_BASE_URL.to_string() }
    }

    /// Point the client at another endpoint
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// URL of the `executeSql` method for one instance
    #[must_use]
    pub fn execute_sql_url(&self, project: &str, instance: &str) -> String {
        format!(
            "{}/sql/v1beta4/projects/{project}/instances/{instance}/executeSql",
            self.base_url
        )
    }
}

#[async_trait]
impl<C: CredentialProvider, T: Transport> SqlAdmin for SqlAdminClient<C, T> {
    async fn default_project_id(&self) -> Option<String> {
        self.credentials.default_project_id().await
    }

    async fn execute_sql(
        &self,
        project: &str,
        instance: &str,
        payload: &RequestPayload,
    ) -> Result<ExecuteSqlResponse> {
        let url = self.execute_sql_url(project, instance);
        let token = self.credentials.access_token().await?;
        let body = serde_json::to_value(payload)
            .map_err(|e| ExecError::invalid_response(format!("Could not encode payload: {e}")))?;

        match self.transport.post_json(&url, &token, &body).await {
            Ok(value) => serde_json::from_value(value).map_err(|e| {
                ExecError::invalid_response(format!("Unexpected executeSql response: {e}"))
            }),
            Err(failure) => {
                error!(
                    "API request failed: {} - Status: {} {} - URL: {url} - Data: {}",
                    failure.message,
                    failure.status.map_or_else(|| "none".to_string(), |s| s.to_string()),
                    failure.status_text.as_deref().unwrap_or(""),
                    failure.body.as_deref().unwrap_or("none"),
                );
                debug!(
                    "Error details - URL: {url} - Payload: {} - Status: {:?}",
                    payload.redacted_json(),
                    failure.status,
                );
                Err(ExecError::Transport {
                    message: failure.message,
                    status: failure.status,
                    status_text: failure.status_text,
                    url,
                    body: failure.body,
                })
            }
        }
    }
}
