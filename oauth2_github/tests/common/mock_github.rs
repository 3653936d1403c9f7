//! Axum-based mock of the GitHub OAuth endpoints
//!
//! Each test starts its own server on an ephemeral port, so tests can run in
//! parallel without sharing provider state.

use axum::{
    Form, Router,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    response::IntoResponse,
    routing::{get, post},
};
use serde_json::json;
use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

pub const MOCK_ACCESS_TOKEN: &str = "gho_mock_access_token";

/// How the mock answers the next requests.
#[derive(Clone, Debug)]
pub struct MockBehavior {
    pub token_status: u16,
    pub token_body: String,
    pub token_content_type: &'static str,
    pub user_status: u16,
    pub user_body: String,
    pub delay: Option<Duration>,
}

impl Default for MockBehavior {
    fn default() -> Self {
        Self {
            token_status: 200,
            token_body: json!({
                "access_token": MOCK_ACCESS_TOKEN,
                "scope": "user",
                "token_type": "bearer"
            })
            .to_string(),
            token_content_type: "application/json; charset=utf-8",
            user_status: 200,
            user_body: json!({"login": "octocat", "id": 1, "name": "The Octocat"}).to_string(),
            delay: None,
        }
    }
}

/// Shared state for the mock server
#[derive(Clone, Default)]
pub struct MockState {
    pub behavior: Arc<Mutex<MockBehavior>>,
    pub token_requests: Arc<AtomicUsize>,
    pub user_requests: Arc<AtomicUsize>,
    pub last_token_form: Arc<Mutex<Option<HashMap<String, String>>>>,
    pub last_authorization: Arc<Mutex<Option<String>>>,
}

pub struct MockGitHub {
    pub base_url: String,
    pub state: MockState,
}

impl MockGitHub {
    pub async fn start() -> Self {
        Self::start_with(MockBehavior::default()).await
    }

    pub async fn start_with(behavior: MockBehavior) -> Self {
        let state = MockState {
            behavior: Arc::new(Mutex::new(behavior)),
            ..Default::default()
        };

        let app = Router::new()
            .route("/login/oauth/access_token", post(access_token))
            .route("/user", get(user))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock GitHub server");
        let addr = listener.local_addr().expect("Mock server has no address");

        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                println!("Mock GitHub server error: {e}");
            }
        });

        Self {
            base_url: format!("http://{addr}"),
            state,
        }
    }

    pub fn set_behavior(&self, update: impl FnOnce(&mut MockBehavior)) {
        update(&mut self.state.behavior.lock().unwrap());
    }

    pub fn token_requests(&self) -> usize {
        self.state.token_requests.load(Ordering::SeqCst)
    }

    pub fn user_requests(&self) -> usize {
        self.state.user_requests.load(Ordering::SeqCst)
    }

    pub fn last_token_form(&self) -> Option<HashMap<String, String>> {
        self.state.last_token_form.lock().unwrap().clone()
    }

    pub fn last_authorization(&self) -> Option<String> {
        self.state.last_authorization.lock().unwrap().clone()
    }
}

async fn access_token(
    State(state): State<MockState>,
    Form(form): Form<HashMap<String, String>>,
) -> impl IntoResponse {
    state.token_requests.fetch_add(1, Ordering::SeqCst);
    *state.last_token_form.lock().unwrap() = Some(form);

    let behavior = state.behavior.lock().unwrap().clone();
    if let Some(delay) = behavior.delay {
        tokio::time::sleep(delay).await;
    }

    (
        StatusCode::from_u16(behavior.token_status).unwrap(),
        [(header::CONTENT_TYPE, behavior.token_content_type)],
        behavior.token_body,
    )
}

async fn user(State(state): State<MockState>, headers: HeaderMap) -> impl IntoResponse {
    state.user_requests.fetch_add(1, Ordering::SeqCst);
    *state.last_authorization.lock().unwrap() = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .map(str::to_string);

    let behavior = state.behavior.lock().unwrap().clone();
    if let Some(delay) = behavior.delay {
        tokio::time::sleep(delay).await;
    }

    (
        StatusCode::from_u16(behavior.user_status).unwrap(),
        [(header::CONTENT_TYPE, "application/json")],
        behavior.user_body,
    )
}
