pub mod mock_github;

pub use mock_github::{MOCK_ACCESS_TOKEN, MockBehavior, MockGitHub};

use oauth2_github::{GitHubAuth, GitHubAuthOptions};

pub const CALLBACK_URL: &str = "http://localhost:7001/github/auth/callback";

/// Options pointing at the mock provider.
pub fn mock_options(mock: &MockGitHub) -> GitHubAuthOptions {
    GitHubAuthOptions::new("test-client-id", "test-client-secret", CALLBACK_URL)
        .with_provider_base_url(&mock.base_url)
}

pub fn mock_auth(mock: &MockGitHub) -> GitHubAuth {
    GitHubAuth::from_options(mock_options(mock)).expect("valid test configuration")
}

/// Extracts the `state` query parameter from an authorization URL.
pub fn state_from_url(auth_url: &str) -> String {
    url::Url::parse(auth_url)
        .expect("authorization URL should parse")
        .query_pairs()
        .find(|(key, _)| key == "state")
        .map(|(_, value)| value.into_owned())
        .expect("No state parameter in authorization URL")
}
