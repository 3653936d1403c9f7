use axum::{Router, routing::get};
use dotenvy::dotenv;
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use oauth2_github_axum::{
    GitHubAuth, GitHubAuthOptions, InMemorySessionStore, SESSION_COOKIE_MAX_AGE, with_github_auth,
};

mod handlers;

use crate::handlers::{index, profile};

const PORT: u16 = 7001;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("{}=debug,oauth2_github=debug", env!("CARGO_CRATE_NAME")).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Keep the profile around so the index page can greet the user
    let mut options = GitHubAuthOptions::from_env()?;
    if options.user_session_key.is_none() {
        options = options.with_user_session_key("user");
    }
    let auth = GitHubAuth::from_options(options)?;

    let app = Router::new()
        .route("/", get(index))
        .route("/profile", get(profile));
    // Server-side sessions expire with the cookie
    let store = InMemorySessionStore::with_ttl(Duration::from_secs(*SESSION_COOKIE_MAX_AGE));
    let app = with_github_auth(app, auth, Arc::new(store));

    let addr = SocketAddr::from(([0, 0, 0, 0], PORT));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::debug!("HTTP server listening on {}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}
