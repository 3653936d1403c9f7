use std::sync::Arc;

use oauth2_github::{
    FlowOutcome, FlowSession, InMemorySessionStore, REDIRECT_SESSION_KEY, STATE_SESSION_KEY,
    SessionStore, StoreSession,
};
use serde_json::json;

use crate::common::{CALLBACK_URL, MockGitHub, mock_auth, state_from_url};

/// Sign-in without a session redirects to the authorize endpoint and the
/// state in the URL is the one now held by the session.
#[tokio::test]
async fn test_signin_redirects_with_session_bound_state() {
    let mock = MockGitHub::start().await;
    let auth = mock_auth(&mock);
    let store: Arc<dyn SessionStore> = Arc::new(InMemorySessionStore::new());
    let mut session = StoreSession::new(store, "visitor-1");

    let outcome = auth
        .handle("/github/auth", None, &mut session)
        .await
        .expect("signin should succeed");

    let FlowOutcome::Redirect(auth_url) = outcome else {
        panic!("Expected redirect to provider");
    };
    assert!(
        auth_url.starts_with(&format!("{}/login/oauth/authorize?", mock.base_url)),
        "unexpected authorize URL: {auth_url}"
    );

    let url = url::Url::parse(&auth_url).unwrap();
    let pairs: std::collections::HashMap<_, _> = url.query_pairs().into_owned().collect();
    assert_eq!(pairs["client_id"], "test-client-id");
    assert_eq!(pairs["redirect_uri"], CALLBACK_URL);
    assert_eq!(pairs["scope"], "user");

    let state = state_from_url(&auth_url);
    assert_eq!(
        session.get(STATE_SESSION_KEY).await.unwrap(),
        Some(json!(state))
    );

    // No outbound call happens at this stage
    assert_eq!(mock.token_requests(), 0);
}

#[tokio::test]
async fn test_signin_with_custom_redirect_param_name() {
    let mock = MockGitHub::start().await;
    let auth = oauth2_github::GitHubAuth::from_options(
        crate::common::mock_options(&mock)
            .with_redirect_param_name("next")
            .with_signin_path("/login/github"),
    )
    .unwrap();
    let mut session: std::collections::HashMap<String, serde_json::Value> =
        std::collections::HashMap::new();

    auth.handle("/login/github", Some("next=%2Fsettings&redirect_uri=%2Fignored"), &mut session)
        .await
        .unwrap();

    assert_eq!(
        FlowSession::get(&session, REDIRECT_SESSION_KEY).await.unwrap(),
        Some(json!("/settings"))
    );
}

/// Different visitors get independent state values.
#[tokio::test]
async fn test_signin_state_is_per_visitor() {
    let mock = MockGitHub::start().await;
    let auth = mock_auth(&mock);
    let store: Arc<dyn SessionStore> = Arc::new(InMemorySessionStore::new());
    let mut alice = StoreSession::new(store.clone(), "alice");
    let mut bob = StoreSession::new(store.clone(), "bob");

    auth.handle("/github/auth", None, &mut alice).await.unwrap();
    auth.handle("/github/auth", None, &mut bob).await.unwrap();

    let alice_state = alice.get(STATE_SESSION_KEY).await.unwrap();
    let bob_state = bob.get(STATE_SESSION_KEY).await.unwrap();
    assert!(alice_state.is_some() && bob_state.is_some());
    assert_ne!(alice_state, bob_state);
}
