use http::StatusCode;
use thiserror::Error;

/// Errors raised by the session backing a visitor.
#[derive(Debug, Error, Clone)]
pub enum SessionError {
    #[error("Session storage error: {0}")]
    Storage(String),

    #[error("Session value error: {0}")]
    Serde(String),
}

impl From<serde_json::Error> for SessionError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serde(err.to_string())
    }
}

/// Errors produced while configuring or running the GitHub sign-in flow.
///
/// Messages never contain the client secret or an access token.
#[derive(Debug, Error, Clone)]
pub enum GitHubAuthError {
    /// Missing or invalid configuration, fatal at construction
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Callback is missing `code` or `state`
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Callback `state` does not match the one stored in the session
    #[error("State mismatch, possible cross-site request forgery")]
    ForgeryDetected,

    /// Token exchange or profile fetch failed
    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Local failure unrelated to the request or GitHub, such as the RNG
    #[error("Internal error: {0}")]
    Internal(String),
}

impl GitHubAuthError {
    /// HTTP status reported to the visitor for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::ForgeryDetected => StatusCode::FORBIDDEN,
            Self::Configuration(_) | Self::Upstream(_) | Self::Session(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}
