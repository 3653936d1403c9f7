mod callback;
mod signin;

use serde_json::Value;

use crate::config::{GitHubAuthConfig, GitHubAuthOptions};
use crate::errors::{GitHubAuthError, SessionError};
use crate::provider::GitHubClient;
use crate::session::{FlowSession, read_access_token, read_profile};
use crate::utils::QueryParams;

/// Result of running one request through the flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowOutcome {
    /// Terminate the request with a 302 to this location.
    Redirect(String),
    /// Hand the request to the next pipeline stage.
    PassThrough,
}

/// Which part of the flow a request path belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowRoute {
    SignIn,
    Callback,
    PassThrough,
}

/// The GitHub sign-in flow, built once at startup and shared by all requests.
///
/// Holds the validated configuration and an HTTP client whose timeout is
/// fixed at construction.
///
/// # Example
///
/// ```no_run
/// use oauth2_github::{GitHubAuth, GitHubAuthOptions};
///
/// let auth = GitHubAuth::from_options(
///     GitHubAuthOptions::new("id", "secret", "http://localhost:7001/github/auth/callback")
///         .with_user_session_key("user"),
/// )
/// .expect("valid configuration");
/// assert_eq!(auth.config().callback_path(), "/github/auth/callback");
/// ```
#[derive(Debug, Clone)]
pub struct GitHubAuth {
    config: GitHubAuthConfig,
    client: GitHubClient,
}

impl GitHubAuth {
    pub fn new(config: GitHubAuthConfig) -> Result<Self, GitHubAuthError> {
        let client = GitHubClient::new(&config)?;
        tracing::info!(
            "Initialized github auth: signin={}, callback={}",
            config.signin_path,
            config.callback_path
        );
        Ok(Self { config, client })
    }

    pub fn from_options(options: GitHubAuthOptions) -> Result<Self, GitHubAuthError> {
        Self::new(GitHubAuthConfig::try_from(options)?)
    }

    /// Builds the flow from `OAUTH2_GITHUB_*` environment variables.
    pub fn from_env() -> Result<Self, GitHubAuthError> {
        Self::from_options(GitHubAuthOptions::from_env()?)
    }

    pub fn config(&self) -> &GitHubAuthConfig {
        &self.config
    }

    pub fn route(&self, path: &str) -> FlowRoute {
        if path == self.config.signin_path {
            FlowRoute::SignIn
        } else if path == self.config.callback_path {
            FlowRoute::Callback
        } else {
            FlowRoute::PassThrough
        }
    }

    /// Runs one request through the flow.
    ///
    /// `query` is the raw query string without the leading `?`. Errors carry
    /// the status to report via [`GitHubAuthError::status_code`].
    #[tracing::instrument(skip(self, query, session))]
    pub async fn handle<S: FlowSession + ?Sized>(
        &self,
        path: &str,
        query: Option<&str>,
        session: &mut S,
    ) -> Result<FlowOutcome, GitHubAuthError> {
        match self.route(path) {
            FlowRoute::SignIn => {
                let params = QueryParams::parse(query);
                signin::start_signin(&self.config, &params, session).await
            }
            FlowRoute::Callback => {
                tracing::debug!("After auth, jump from github");
                let params = QueryParams::parse(query);
                callback::handle_callback(&self.config, &self.client, &params, session).await
            }
            FlowRoute::PassThrough => {
                if read_access_token(&*session, &self.config).await?.is_some() {
                    tracing::trace!("Already has github token");
                }
                Ok(FlowOutcome::PassThrough)
            }
        }
    }

    /// Access token stored by a completed flow.
    pub async fn access_token<S: FlowSession + ?Sized>(
        &self,
        session: &S,
    ) -> Result<Option<String>, SessionError> {
        read_access_token(session, &self.config).await
    }

    /// Profile stored by a completed flow, when a profile key is configured.
    pub async fn profile<S: FlowSession + ?Sized>(
        &self,
        session: &S,
    ) -> Result<Option<Value>, SessionError> {
        read_profile(session, &self.config).await
    }
}
