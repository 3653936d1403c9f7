//! oauth2_github - GitHub OAuth2 authorization code flow as request middleware
//!
//! The flow turns an anonymous visitor into one whose session holds a GitHub
//! access token (and optionally their profile). It is framework-agnostic:
//! callers hand over the request path, query string and the visitor's
//! session, and act on the returned [`FlowOutcome`]. See the
//! `oauth2-github-axum` crate for the axum integration.

mod config;
mod errors;
mod flow;
mod provider;
mod session;
mod utils;

pub use config::{GitHubAuthConfig, GitHubAuthOptions};
pub use errors::{GitHubAuthError, SessionError};
pub use flow::{FlowOutcome, FlowRoute, GitHubAuth};
pub use session::{
    AuthSession, FlowSession, InMemorySessionStore, REDIRECT_SESSION_KEY, STATE_SESSION_KEY,
    SessionStore, StoreSession, new_session_id,
};
