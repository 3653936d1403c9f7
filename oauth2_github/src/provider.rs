//! Outbound calls to GitHub: code-for-token exchange and profile fetch.

use http::header::{ACCEPT, CONTENT_TYPE};
use serde::Deserialize;
use serde_json::Value;

use crate::config::GitHubAuthConfig;
use crate::errors::GitHubAuthError;

const MAX_ERROR_BODY_LEN: usize = 200;

/// Token endpoint response. GitHub answers 200 with `error` set when the
/// code is invalid, so every field is optional.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct TokenResponse {
    pub(crate) access_token: Option<String>,
    #[allow(dead_code)]
    pub(crate) token_type: Option<String>,
    #[allow(dead_code)]
    pub(crate) scope: Option<String>,
    pub(crate) error: Option<String>,
    pub(crate) error_description: Option<String>,
}

impl TokenResponse {
    /// Parses a JSON or `application/x-www-form-urlencoded` body.
    pub(crate) fn parse(body: &str, content_type: Option<&str>) -> Result<Self, String> {
        let looks_like_json = content_type.is_some_and(|ct| ct.contains("json"))
            || body.trim_start().starts_with('{');
        if looks_like_json {
            return serde_json::from_str(body).map_err(|e| e.to_string());
        }

        let mut response = Self::default();
        for (key, value) in url::form_urlencoded::parse(body.trim().as_bytes()) {
            let value = Some(value.into_owned());
            match key.as_ref() {
                "access_token" => response.access_token = value,
                "token_type" => response.token_type = value,
                "scope" => response.scope = value,
                "error" => response.error = value,
                "error_description" => response.error_description = value,
                _ => {}
            }
        }
        Ok(response)
    }
}

/// HTTP client bound to one configuration.
///
/// The timeout is fixed when the client is built and applies to every
/// outbound call, so nothing process-wide is mutated.
#[derive(Debug, Clone)]
pub(crate) struct GitHubClient {
    http: reqwest::Client,
}

impl GitHubClient {
    pub(crate) fn new(config: &GitHubAuthConfig) -> Result<Self, GitHubAuthError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| {
                GitHubAuthError::Configuration(format!("Failed to build HTTP client: {e}"))
            })?;
        Ok(Self { http })
    }

    pub(crate) async fn exchange_code_for_token(
        &self,
        config: &GitHubAuthConfig,
        code: &str,
    ) -> Result<String, GitHubAuthError> {
        let response = self
            .http
            .post(config.token_url.clone())
            .header(ACCEPT, "application/json")
            .form(&[
                ("client_id", config.client_id.as_str()),
                ("client_secret", config.client_secret.as_str()),
                ("code", code),
            ])
            .send()
            .await
            .map_err(|e| upstream("request github token error", e))?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|h| h.to_str().ok())
            .map(str::to_string);
        let body = response
            .text()
            .await
            .map_err(|e| upstream("request github token error", e))?;

        if status != reqwest::StatusCode::OK {
            tracing::error!("Token exchange failed with status {}", status);
            return Err(GitHubAuthError::Upstream(format!(
                "request github token error: {status}: {}",
                truncate(&body)
            )));
        }

        let token_response = TokenResponse::parse(&body, content_type.as_deref()).map_err(|e| {
            GitHubAuthError::Upstream(format!("request github token error: malformed body: {e}"))
        })?;

        match token_response.access_token.filter(|t| !t.is_empty()) {
            Some(token) => {
                tracing::debug!("Received access token from GitHub");
                Ok(token)
            }
            None => {
                let reason = match (token_response.error, token_response.error_description) {
                    (Some(error), Some(description)) => format!(": {error}: {description}"),
                    (Some(error), None) => format!(": {error}"),
                    _ => String::new(),
                };
                tracing::error!("Token exchange response has no token{}", reason);
                Err(GitHubAuthError::Upstream(format!(
                    "request github token response no token{reason}"
                )))
            }
        }
    }

    pub(crate) async fn fetch_user(
        &self,
        config: &GitHubAuthConfig,
        access_token: &str,
    ) -> Result<Value, GitHubAuthError> {
        let response = self
            .http
            .get(config.user_url.clone())
            .bearer_auth(access_token)
            .header(ACCEPT, "application/vnd.github+json")
            .send()
            .await
            .map_err(|e| upstream("request github user info error", e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| upstream("request github user info error", e))?;

        if status != reqwest::StatusCode::OK {
            tracing::error!("Profile fetch failed with status {}", status);
            return Err(GitHubAuthError::Upstream(format!(
                "request github user info error: {status}: {}",
                truncate(&body)
            )));
        }

        if body.trim().is_empty() {
            return Err(GitHubAuthError::Upstream(
                "request github user info response no user".to_string(),
            ));
        }

        let profile: Value = serde_json::from_str(&body).map_err(|e| {
            GitHubAuthError::Upstream(format!(
                "request github user info error: malformed body: {e}"
            ))
        })?;

        if profile.is_null() {
            return Err(GitHubAuthError::Upstream(
                "request github user info response no user".to_string(),
            ));
        }

        tracing::debug!("Fetched GitHub profile");
        Ok(profile)
    }
}

fn upstream(context: &str, err: reqwest::Error) -> GitHubAuthError {
    let detail = if err.is_timeout() {
        "request timed out".to_string()
    } else {
        err.without_url().to_string()
    };
    tracing::error!("{}: {}", context, detail);
    GitHubAuthError::Upstream(format!("{context}: {detail}"))
}

fn truncate(body: &str) -> &str {
    let body = body.trim();
    if body.len() <= MAX_ERROR_BODY_LEN {
        return body;
    }
    let mut end = MAX_ERROR_BODY_LEN;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}
