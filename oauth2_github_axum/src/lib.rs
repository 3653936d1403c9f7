//! oauth2_github_axum - axum integration for the oauth2-github sign-in flow
//!
//! Mount order matters: the session layer must run before the GitHub
//! middleware. [`with_github_auth`] applies both in the right order.

mod config;
mod error;
mod middleware;
mod session;

pub use config::{SESSION_COOKIE_MAX_AGE, SESSION_COOKIE_NAME};
pub use error::IntoResponseError;
pub use middleware::{github_auth, with_github_auth};
pub use session::{GitHubSession, SessionManager, VisitorSession, session_layer};

// Re-export the core types most applications need
pub use oauth2_github::{
    FlowSession, GitHubAuth, GitHubAuthConfig, GitHubAuthError, GitHubAuthOptions,
    InMemorySessionStore, SessionStore, StoreSession,
};
