//! Query execution pipeline
//!
//! auth validation → project resolution → payload → `executeSql` → formatting.
//! Validation happens first; when it fails the API is never contacted.

use tracing::{debug, info};

use crate::auth::AuthMode;
use crate::client::SqlAdmin;
use crate::config::ResolvedOptions;
use crate::error::{ExecError, Result};
use crate::output::{self, Rendered};
use crate::request;

/// Run one SQL statement and render its response
pub async fn execute_query(
    sql: &str,
    options: &ResolvedOptions,
    admin: &impl SqlAdmin,
) -> Result<Rendered> {
    let mode = AuthMode::resolve(options)?;
    debug!("Authentication method: {}", mode.name());

    let project = resolve_project(options, admin).await?;

    let payload = request::build(sql, options);
    debug!("Request payload: {}", payload.redacted_json());
    info!("Executing SQL on {project}/{}...", options.instance);

    let response = admin.execute_sql(&project, &options.instance, &payload).await?;
    debug!(
        "Response received: {}",
        serde_json::to_string(&response).unwrap_or_else(|_| "<unserializable>".to_string())
    );

    output::format(&response, options.output_format())
}

/// Explicit project, or the one configured for the ambient credentials
pub async fn resolve_project(options: &ResolvedOptions, admin: &impl SqlAdmin) -> Result<String> {
    if let Some(project) = &options.project {
        return Ok(project.clone());
    }

    info!("No project specified, attempting to detect default project...");
    let project = admin
        .default_project_id()
        .await
        .filter(|p| !p.is_empty())
        .ok_or(ExecError::ProjectResolution)?;
    info!("Using detected project: {project}");
    Ok(project)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthError;
    use crate::output::ExecuteSqlResponse;
    use crate::request::RequestPayload;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingAdmin {
        detected: Option<String>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl SqlAdmin for CountingAdmin {
        async fn default_project_id(&self) -> Option<String> {
            self.detected.clone()
        }

        async fn execute_sql(
            &self,
            _project: &str,
            _instance: &str,
            _payload: &RequestPayload,
        ) -> Result<ExecuteSqlResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(ExecuteSqlResponse::default())
        }
    }

    fn options() -> ResolvedOptions {
        ResolvedOptions { instance: "i1".into(), ..Default::default() }
    }

    #[tokio::test]
    async fn test_explicit_project_wins() {
        let admin = CountingAdmin { detected: Some("detected".into()), ..Default::default() };
        let opts = ResolvedOptions { project: Some("explicit".into()), ..options() };
        assert_eq!(resolve_project(&opts, &admin).await.unwrap(), "explicit");
    }

    #[tokio::test]
    async fn test_detected_project() {
        let admin = CountingAdmin { detected: Some("detected".into()), ..Default::default() };
        assert_eq!(resolve_project(&options(), &admin).await.unwrap(), "detected");
    }

    #[tokio::test]
    async fn test_no_project_anywhere() {
        let admin = CountingAdmin::default();
        let err = execute_query("SELECT 1", &options(), &admin).await.unwrap_err();
        assert!(matches!(err, ExecError::ProjectResolution));
        assert_eq!(admin.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_auth_failure_prevents_call() {
        let admin = CountingAdmin { detected: Some("p".into()), ..Default::default() };
        let opts = ResolvedOptions { password: Some("p1".into()), ..options() };
        let err = execute_query("SELECT 1", &opts, &admin).await.unwrap_err();
        assert!(matches!(err, ExecError::Auth(AuthError::MissingUser)));
        assert_eq!(admin.calls.load(Ordering::SeqCst), 0);
    }
}
