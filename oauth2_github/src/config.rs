//! Configuration for the GitHub authorization code flow

use serde::Deserialize;
use std::env;
use std::fmt;
use std::time::Duration;
use url::Url;

use crate::errors::GitHubAuthError;

pub(crate) const DEFAULT_SIGNIN_PATH: &str = "/github/auth";
pub(crate) const DEFAULT_TOKEN_SESSION_KEY: &str = "githubToken";
pub(crate) const DEFAULT_REDIRECT_PARAM_NAME: &str = "redirect_uri";
pub(crate) const DEFAULT_TIMEOUT_MS: u64 = 5000;
pub(crate) const DEFAULT_SCOPE: &[&str] = &["user"];

pub(crate) const GITHUB_AUTHORIZE_URL: &str = "https://github.com/login/oauth/authorize";
pub(crate) const GITHUB_TOKEN_URL: &str = "https://github.com/login/oauth/access_token";
pub(crate) const GITHUB_USER_URL: &str = "https://api.github.com/user";

/// Raw, unvalidated options for the GitHub middleware.
///
/// Every field is optional so options can be assembled from environment
/// variables, configuration files, or code. Use [`GitHubAuthConfig::try_from`]
/// to validate them and apply defaults.
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct GitHubAuthOptions {
    /// OAuth app client ID (required)
    pub client_id: Option<String>,
    /// OAuth app client secret (required)
    pub client_secret: Option<String>,
    /// Absolute URL GitHub redirects back to (required)
    pub callback_url: Option<String>,
    /// Local path that starts the flow. Default: "/github/auth"
    pub signin_path: Option<String>,
    /// Session field holding the access token. Default: "githubToken"
    pub token_session_key: Option<String>,
    /// Session field holding the profile. Profile fetch is skipped when unset.
    pub user_session_key: Option<String>,
    /// Scopes requested from GitHub. Default: ["user"]
    pub scope: Option<Vec<String>>,
    /// Timeout for outbound calls in milliseconds. Default: 5000
    pub timeout_ms: Option<u64>,
    /// Query parameter carrying the post-login destination. Default: "redirect_uri"
    pub redirect_param_name: Option<String>,
    pub authorize_url: Option<String>,
    pub token_url: Option<String>,
    pub user_url: Option<String>,
    pub user_agent: Option<String>,
    /// Only write the token once the profile fetch has succeeded. Default: false
    pub atomic_profile_commit: Option<bool>,
}

impl GitHubAuthOptions {
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        callback_url: impl Into<String>,
    ) -> Self {
        Self {
            client_id: Some(client_id.into()),
            client_secret: Some(client_secret.into()),
            callback_url: Some(callback_url.into()),
            ..Default::default()
        }
    }

    /// Reads options from `OAUTH2_GITHUB_*` environment variables.
    ///
    /// Unset variables stay `None`; validation happens in
    /// [`GitHubAuthConfig::try_from`].
    pub fn from_env() -> Result<Self, GitHubAuthError> {
        let timeout_ms = match env::var("OAUTH2_GITHUB_TIMEOUT_MS").ok() {
            Some(raw) => Some(raw.parse::<u64>().map_err(|e| {
                GitHubAuthError::Configuration(format!(
                    "OAUTH2_GITHUB_TIMEOUT_MS must be an integer: {e}"
                ))
            })?),
            None => None,
        };

        let atomic_profile_commit = env::var("OAUTH2_GITHUB_ATOMIC_PROFILE_COMMIT")
            .ok()
            .map(|val| val.to_lowercase() == "true");

        Ok(Self {
            client_id: env::var("OAUTH2_GITHUB_CLIENT_ID").ok(),
            client_secret: env::var("OAUTH2_GITHUB_CLIENT_SECRET").ok(),
            callback_url: env::var("OAUTH2_GITHUB_CALLBACK_URL").ok(),
            signin_path: env::var("OAUTH2_GITHUB_SIGNIN_PATH").ok(),
            token_session_key: env::var("OAUTH2_GITHUB_TOKEN_SESSION_KEY").ok(),
            user_session_key: env::var("OAUTH2_GITHUB_USER_SESSION_KEY").ok(),
            scope: env::var("OAUTH2_GITHUB_SCOPE")
                .ok()
                .map(|raw| parse_scope_list(&raw)),
            timeout_ms,
            redirect_param_name: env::var("OAUTH2_GITHUB_REDIRECT_PARAM").ok(),
            authorize_url: env::var("OAUTH2_GITHUB_AUTH_URL").ok(),
            token_url: env::var("OAUTH2_GITHUB_TOKEN_URL").ok(),
            user_url: env::var("OAUTH2_GITHUB_USER_URL").ok(),
            user_agent: env::var("OAUTH2_GITHUB_USER_AGENT").ok(),
            atomic_profile_commit,
        })
    }

    pub fn with_user_session_key(mut self, key: impl Into<String>) -> Self {
        self.user_session_key = Some(key.into());
        self
    }

    pub fn with_scope<I, S>(mut self, scope: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scope = Some(scope.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX));
        self
    }

    pub fn with_signin_path(mut self, path: impl Into<String>) -> Self {
        self.signin_path = Some(path.into());
        self
    }

    pub fn with_token_session_key(mut self, key: impl Into<String>) -> Self {
        self.token_session_key = Some(key.into());
        self
    }

    pub fn with_redirect_param_name(mut self, name: impl Into<String>) -> Self {
        self.redirect_param_name = Some(name.into());
        self
    }

    /// Points all three provider endpoints at `base_url`
    /// (`/login/oauth/authorize`, `/login/oauth/access_token`, `/user`).
    pub fn with_provider_base_url(mut self, base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        self.authorize_url = Some(format!("{base}/login/oauth/authorize"));
        self.token_url = Some(format!("{base}/login/oauth/access_token"));
        self.user_url = Some(format!("{base}/user"));
        self
    }

    pub fn with_atomic_profile_commit(mut self, enabled: bool) -> Self {
        self.atomic_profile_commit = Some(enabled);
        self
    }
}

impl fmt::Debug for GitHubAuthOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GitHubAuthOptions")
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "***"))
            .field("callback_url", &self.callback_url)
            .field("signin_path", &self.signin_path)
            .field("token_session_key", &self.token_session_key)
            .field("user_session_key", &self.user_session_key)
            .field("scope", &self.scope)
            .field("timeout_ms", &self.timeout_ms)
            .field("redirect_param_name", &self.redirect_param_name)
            .finish_non_exhaustive()
    }
}

/// Validated, immutable configuration built once at startup.
#[derive(Clone)]
pub struct GitHubAuthConfig {
    pub(crate) client_id: String,
    pub(crate) client_secret: String,
    pub(crate) callback_url: String,
    pub(crate) callback_path: String,
    pub(crate) signin_path: String,
    pub(crate) token_session_key: String,
    pub(crate) user_session_key: Option<String>,
    pub(crate) scope: Vec<String>,
    pub(crate) timeout: Duration,
    pub(crate) redirect_param_name: String,
    pub(crate) authorize_url: Url,
    pub(crate) token_url: Url,
    pub(crate) user_url: Url,
    pub(crate) user_agent: String,
    pub(crate) atomic_profile_commit: bool,
}

impl GitHubAuthConfig {
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn callback_url(&self) -> &str {
        &self.callback_url
    }

    /// Path component of the callback URL, matched against incoming requests.
    pub fn callback_path(&self) -> &str {
        &self.callback_path
    }

    pub fn signin_path(&self) -> &str {
        &self.signin_path
    }

    pub fn token_session_key(&self) -> &str {
        &self.token_session_key
    }

    pub fn user_session_key(&self) -> Option<&str> {
        self.user_session_key.as_deref()
    }

    pub fn scope(&self) -> &[String] {
        &self.scope
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn redirect_param_name(&self) -> &str {
        &self.redirect_param_name
    }

    /// Scope as sent on the authorization URL.
    pub(crate) fn scope_param(&self) -> String {
        self.scope.join(" ")
    }
}

impl fmt::Debug for GitHubAuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GitHubAuthConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"***")
            .field("callback_url", &self.callback_url)
            .field("callback_path", &self.callback_path)
            .field("signin_path", &self.signin_path)
            .field("token_session_key", &self.token_session_key)
            .field("user_session_key", &self.user_session_key)
            .field("scope", &self.scope)
            .field("timeout", &self.timeout)
            .field("redirect_param_name", &self.redirect_param_name)
            .field("authorize_url", &self.authorize_url.as_str())
            .field("token_url", &self.token_url.as_str())
            .field("user_url", &self.user_url.as_str())
            .field("atomic_profile_commit", &self.atomic_profile_commit)
            .finish()
    }
}

impl TryFrom<GitHubAuthOptions> for GitHubAuthConfig {
    type Error = GitHubAuthError;

    fn try_from(options: GitHubAuthOptions) -> Result<Self, Self::Error> {
        let client_id = required(options.client_id, "client_id")?;
        let client_secret = required(options.client_secret, "client_secret")?;
        let callback_url = required(options.callback_url, "callback_url")?;

        let parsed_callback = Url::parse(&callback_url).map_err(|e| {
            GitHubAuthError::Configuration(format!("callback_url is not an absolute URL: {e}"))
        })?;
        let callback_path = parsed_callback.path().to_string();

        let signin_path = options
            .signin_path
            .unwrap_or_else(|| DEFAULT_SIGNIN_PATH.to_string());
        if !signin_path.starts_with('/') {
            return Err(GitHubAuthError::Configuration(format!(
                "signin_path must start with '/': {signin_path}"
            )));
        }
        if signin_path == callback_path {
            return Err(GitHubAuthError::Configuration(
                "signin_path and callback path must differ".to_string(),
            ));
        }

        let scope = match options.scope {
            Some(scope) if !scope.is_empty() => scope,
            _ => DEFAULT_SCOPE.iter().map(|s| s.to_string()).collect(),
        };

        let config = Self {
            client_id,
            client_secret,
            callback_url,
            callback_path,
            signin_path,
            token_session_key: non_empty_or(options.token_session_key, DEFAULT_TOKEN_SESSION_KEY),
            user_session_key: options.user_session_key.filter(|k| !k.is_empty()),
            scope,
            timeout: Duration::from_millis(options.timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS)),
            redirect_param_name: non_empty_or(
                options.redirect_param_name,
                DEFAULT_REDIRECT_PARAM_NAME,
            ),
            authorize_url: endpoint(options.authorize_url, GITHUB_AUTHORIZE_URL, "authorize_url")?,
            token_url: endpoint(options.token_url, GITHUB_TOKEN_URL, "token_url")?,
            user_url: endpoint(options.user_url, GITHUB_USER_URL, "user_url")?,
            user_agent: options
                .user_agent
                .unwrap_or_else(|| format!("oauth2-github/{}", env!("CARGO_PKG_VERSION"))),
            atomic_profile_commit: options.atomic_profile_commit.unwrap_or(false),
        };

        tracing::debug!("Initialized GitHub auth with config: {:?}", config);
        Ok(config)
    }
}

fn required(value: Option<String>, name: &str) -> Result<String, GitHubAuthError> {
    value.filter(|v| !v.trim().is_empty()).ok_or_else(|| {
        GitHubAuthError::Configuration(format!(
            "github auth needs client_id, client_secret and callback_url: missing {name}"
        ))
    })
}

fn non_empty_or(value: Option<String>, default: &str) -> String {
    value
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn endpoint(value: Option<String>, default: &str, name: &str) -> Result<Url, GitHubAuthError> {
    let raw = value.unwrap_or_else(|| default.to_string());
    Url::parse(&raw)
        .map_err(|e| GitHubAuthError::Configuration(format!("Invalid {name} '{raw}': {e}")))
}

/// Splits a scope list on commas and whitespace.
pub(crate) fn parse_scope_list(raw: &str) -> Vec<String> {
    raw.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
