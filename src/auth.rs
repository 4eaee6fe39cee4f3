//! Authentication Mode Validation
//!
//! Four mutually exclusive ways of authenticating the statement exist:
//! - database user + password
//! - database user + Secret Manager path
//! - IAM access token
//! - automatic IAM authentication with the caller's identity
//!
//! [`AuthMode::resolve`] is the single place that decides which one is in
//! effect. Selecting none is allowed and falls back to the ambient identity.
//!
//! Validation runs before any network call; a failure stops the pipeline.

use thiserror::Error;

use crate::config::ResolvedOptions;

/// Authentication option conflicts
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// More than one authentication method was selected
    #[error("Multiple authentication methods specified: {}. Please use only one.", .methods.join(", "))]
    MultipleAuthMethods { methods: Vec<&'static str> },

    /// Password or secret path given without a database user
    #[error("--user is required when using --password or --secret-path")]
    MissingUser,
}

/// The authentication method in effect for one invocation
#[derive(Clone, PartialEq, Eq)]
pub enum AuthMode<'a> {
    /// No method selected; the API call relies on the ambient identity
    Ambient,
    Password { user: &'a str, password: &'a str },
    SecretPath { user: &'a str, secret_path: &'a str },
    AccessToken(&'a str),
    AutoIam,
}

impl<'a> AuthMode<'a> {
    /// Pick the authentication mode from resolved options
    ///
    /// Fails with [`AuthError::MultipleAuthMethods`] when more than one of
    /// password, secret path, access token and auto IAM is set, and with
    /// [`AuthError::MissingUser`] when password or secret path lacks a user.
    pub fn resolve(options: &'a ResolvedOptions) -> Result<Self, AuthError> {
        let methods: Vec<&'static str> = [
            options.password.is_some().then_some("password"),
            options.secret_path.is_some().then_some("secretPath"),
            options.access_token.is_some().then_some("accessToken"),
            options.auto_iam_authn.then_some("autoIamAuthn"),
        ]
        .into_iter()
        .flatten()
        .collect();

        if methods.len() > 1 {
            return Err(AuthError::MultipleAuthMethods { methods });
        }

        let user = options.user.as_deref();
        match (options, user) {
            (ResolvedOptions { password: Some(password), .. }, Some(user)) => {
                Ok(Self::Password { user, password: password.as_str() })
            }
            (ResolvedOptions { secret_path: Some(secret_path), .. }, Some(user)) => {
                Ok(Self::SecretPath { user, secret_path: secret_path.as_str() })
            }
            (ResolvedOptions { password: Some(_), .. }, None)
            | (ResolvedOptions { secret_path: Some(_), .. }, None) => Err(AuthError::MissingUser),
            (ResolvedOptions { access_token: Some(token), .. }, _) => Ok(Self::AccessToken(token.as_str())),
            (ResolvedOptions { auto_iam_authn: true, .. }, _) => Ok(Self::AutoIam),
            _ => Ok(Self::Ambient),
        }
    }

    /// Name used in diagnostics
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Ambient => "ambient",
            Self::Password { .. } => "password",
            Self::SecretPath { .. } => "secretPath",
            Self::AccessToken(_) => "accessToken",
            Self::AutoIam => "autoIamAuthn",
        }
    }
}

impl std::fmt::Debug for AuthMode<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Password { user, .. } => {
                f.debug_struct("Password").field("user", user).finish_non_exhaustive()
            }
            Self::SecretPath { user, secret_path } => f
                .debug_struct("SecretPath")
                .field("user", user)
                .field("secret_path", secret_path)
                .finish(),
            Self::AccessToken(_) => f.write_str("AccessToken(..)"),
            Self::Ambient | Self::AutoIam => f.write_str(self.name()),
        }
    }
}

/// Validate authentication options without keeping the resolved mode
pub fn validate(options: &ResolvedOptions) -> Result<(), AuthError> {
    AuthMode::resolve(options).map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> ResolvedOptions {
        ResolvedOptions { instance: "i1".into(), ..Default::default() }
    }

    #[test]
    fn test_no_method_is_ambient() {
        let opts = options();
        assert_eq!(AuthMode::resolve(&opts), Ok(AuthMode::Ambient));
    }

    #[test]
    fn test_password_with_user() {
        let opts = ResolvedOptions {
            user: Some("u1".into()),
            password: Some("p1".into()),
            ..options()
        };
        assert_eq!(
            AuthMode::resolve(&opts),
            Ok(AuthMode::Password { user: "u1", password: "p1" })
        );
    }

    #[test]
    fn test_secret_path_with_user() {
        let opts = ResolvedOptions {
            user: Some("u1".into()),
            secret_path: Some("s1".into()),
            ..options()
        };
        assert_eq!(
            AuthMode::resolve(&opts),
            Ok(AuthMode::SecretPath { user: "u1", secret_path: "s1" })
        );
    }

    #[test]
    fn test_token_and_auto_iam_need_no_user() {
        let opts = ResolvedOptions { access_token: Some("t".into()), ..options() };
        assert_eq!(AuthMode::resolve(&opts), Ok(AuthMode::AccessToken("t")));

        let opts = ResolvedOptions { auto_iam_authn: true, ..options() };
        assert_eq!(AuthMode::resolve(&opts), Ok(AuthMode::AutoIam));
    }

    #[test]
    fn test_password_and_secret_path_conflict() {
        let opts = ResolvedOptions {
            user: Some("u1".into()),
            password: Some("p1".into()),
            secret_path: Some("s1".into()),
            ..options()
        };
        assert_eq!(
            validate(&opts),
            Err(AuthError::MultipleAuthMethods { methods: vec!["password", "secretPath"] })
        );
    }

    #[test]
    fn test_every_pair_conflicts() {
        let setters: [fn(&mut ResolvedOptions); 4] = [
            |o| o.password = Some("p".into()),
            |o| o.secret_path = Some("s".into()),
            |o| o.access_token = Some("t".into()),
            |o| o.auto_iam_authn = true,
        ];

        for i in 0..setters.len() {
            for j in (i + 1)..setters.len() {
                let mut opts = ResolvedOptions { user: Some("u".into()), ..options() };
                setters[i](&mut opts);
                setters[j](&mut opts);
                match validate(&opts) {
                    Err(AuthError::MultipleAuthMethods { methods }) => assert_eq!(methods.len(), 2),
                    other => panic!("pair ({i}, {j}) gave {other:?}"),
                }
            }
        }
    }

    #[test]
    fn test_all_four_named() {
        let opts = ResolvedOptions {
            password: Some("p".into()),
            secret_path: Some("s".into()),
            access_token: Some("t".into()),
            auto_iam_authn: true,
            ..options()
        };
        let err = validate(&opts).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Multiple authentication methods specified: password, secretPath, accessToken, autoIamAuthn. Please use only one."
        );
    }

    #[test]
    fn test_conflict_reported_before_missing_user() {
        let opts = ResolvedOptions {
            password: Some("p".into()),
            access_token: Some("t".into()),
            ..options()
        };
        assert!(matches!(validate(&opts), Err(AuthError::MultipleAuthMethods { .. })));
    }

    #[test]
    fn test_missing_user() {
        let opts = ResolvedOptions { password: Some("p".into()), ..options() };
        assert_eq!(validate(&opts), Err(AuthError::MissingUser));

        let opts = ResolvedOptions { secret_path: Some("s".into()), ..options() };
        assert_eq!(validate(&opts), Err(AuthError::MissingUser));
    }

    #[test]
    fn test_debug_hides_credentials() {
        let opts = ResolvedOptions {
            user: Some("u1".into()),
            password: Some("hunter2".into()),
            ..options()
        };
        let mode = AuthMode::resolve(&opts).unwrap();
        assert!(!format!("{mode:?}").contains("hunter2"));
    }
}
