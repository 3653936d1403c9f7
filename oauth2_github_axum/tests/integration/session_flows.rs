use reqwest::StatusCode;

use crate::common::{
    MockBrowser, MockGitHub, mock_browser::set_cookie, start_app_without_github_auth,
    start_app_without_session_layer, start_session_only_app,
};

#[tokio::test]
async fn test_session_persists_across_requests() {
    let browser = MockBrowser::new(&start_session_only_app().await);

    let response = browser.get("/").await;
    assert!(set_cookie(&response).is_some());
    assert_eq!(response.text().await.unwrap(), "1");

    let response = browser.get("/").await;
    assert!(set_cookie(&response).is_none());
    assert_eq!(response.text().await.unwrap(), "2");
}

#[tokio::test]
async fn test_unusable_cookie_is_replaced() {
    let browser = MockBrowser::new(&start_session_only_app().await);
    browser.set_cookie(Some(format!(
        "{}=not%20a%20valid%20id",
        oauth2_github_axum::SESSION_COOKIE_NAME.as_str()
    )));

    let response = browser.get("/").await;

    assert!(set_cookie(&response).is_some());
    assert_eq!(response.text().await.unwrap(), "1");
}

#[tokio::test]
async fn test_missing_session_layer_is_server_error() {
    let mock = MockGitHub::start().await;
    let browser = MockBrowser::new(&start_app_without_session_layer(&mock).await);

    assert_eq!(
        browser.get("/").await.status(),
        StatusCode::INTERNAL_SERVER_ERROR
    );
    assert_eq!(
        browser.get("/count").await.status(),
        StatusCode::INTERNAL_SERVER_ERROR
    );
}

#[tokio::test]
async fn test_github_session_without_middleware_is_server_error() {
    let browser = MockBrowser::new(&start_app_without_github_auth().await);

    assert_eq!(
        browser.get("/").await.status(),
        StatusCode::INTERNAL_SERVER_ERROR
    );
}
