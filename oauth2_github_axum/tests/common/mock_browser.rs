use reqwest::{Client, Response, StatusCode, header};
use std::sync::Mutex;

/// Browser stand-in that keeps the session cookie between requests.
///
/// Redirects are not followed so tests can inspect each `Location`.
/// The session cookie is `Secure`, which a real cookie jar would not send
/// over plain HTTP, so it is tracked by hand.
pub struct MockBrowser {
    client: Client,
    base_url: String,
    cookie: Mutex<Option<String>>,
}

impl MockBrowser {
    pub fn new(base_url: &str) -> Self {
        let client = Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .unwrap();

        Self {
            client,
            base_url: base_url.to_string(),
            cookie: Mutex::new(None),
        }
    }

    /// GET `path`, sending the current session cookie and keeping any new one.
    pub async fn get(&self, path: &str) -> Response {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.client.get(&url);
        if let Some(cookie) = self.cookie() {
            request = request.header(header::COOKIE, cookie);
        }

        let response = request.send().await.expect("request should reach the app");
        if let Some(cookie) = set_cookie(&response) {
            *self.cookie.lock().unwrap() = Some(cookie);
        }
        response
    }

    /// GET `path` and return the `Location` of the expected `302 Found`.
    pub async fn follow(&self, path: &str) -> String {
        let response = self.get(path).await;
        assert_eq!(
            response.status(),
            StatusCode::FOUND,
            "Expected 302 from {path}"
        );
        location(&response)
    }

    pub fn cookie(&self) -> Option<String> {
        self.cookie.lock().unwrap().clone()
    }

    /// Adopt another browser's session, as a cookie-stealing attacker would.
    pub fn set_cookie(&self, cookie: Option<String>) {
        *self.cookie.lock().unwrap() = cookie;
    }
}

/// `name=value` part of the response's `Set-Cookie`, if any.
pub fn set_cookie(response: &Response) -> Option<String> {
    response
        .headers()
        .get(header::SET_COOKIE)?
        .to_str()
        .ok()?
        .split(';')
        .next()
        .map(str::to_string)
}

pub fn location(response: &Response) -> String {
    response
        .headers()
        .get(header::LOCATION)
        .expect("response should redirect")
        .to_str()
        .expect("ascii location")
        .to_string()
}
