use subtle::ConstantTimeEq;

use crate::config::GitHubAuthConfig;
use crate::errors::GitHubAuthError;
use crate::provider::GitHubClient;
use crate::session::{AuthSession, FlowSession};
use crate::utils::QueryParams;

use super::FlowOutcome;

/// Completes the flow when GitHub redirects back.
///
/// Steps run in order and stop at the first failure: re-entry check,
/// parameter check, state check, token exchange, optional profile fetch,
/// completion redirect. Once the state check has started, both ephemeral
/// fields are gone whatever the outcome.
pub(super) async fn handle_callback<S: FlowSession + ?Sized>(
    config: &GitHubAuthConfig,
    client: &GitHubClient,
    params: &QueryParams,
    session: &mut S,
) -> Result<FlowOutcome, GitHubAuthError> {
    let mut auth_session = AuthSession::new(session, config);

    if auth_session.is_authenticated().await? {
        tracing::debug!("Already has github token, skip callback");
        return Ok(FlowOutcome::Redirect("/".to_string()));
    }

    let (Some(code), Some(state)) = (params.get("code"), params.get("state")) else {
        tracing::debug!("Callback request is missing `code` or `state`");
        return Err(GitHubAuthError::BadRequest(
            "callback requires `code` and `state` query parameters".to_string(),
        ));
    };

    let stored_state = auth_session.take_state().await?;
    let destination = auth_session
        .take_redirect()
        .await?
        .unwrap_or_else(|| "/".to_string());

    if !state_matches(state, stored_state.as_deref()) {
        tracing::warn!(
            "Callback state does not match session state (session state present: {})",
            stored_state.is_some()
        );
        return Err(GitHubAuthError::ForgeryDetected);
    }

    let token = client.exchange_code_for_token(config, code).await?;

    if config.user_session_key.is_none() {
        auth_session.set_access_token(&token).await?;
        tracing::debug!("Stored access token in session.{}", config.token_session_key);
        return Ok(FlowOutcome::Redirect(destination));
    }

    if config.atomic_profile_commit {
        let profile = client.fetch_user(config, &token).await?;
        auth_session.set_access_token(&token).await?;
        auth_session.set_profile(profile).await?;
    } else {
        // The token stays in the session even if the profile fetch fails.
        auth_session.set_access_token(&token).await?;
        let profile = client.fetch_user(config, &token).await?;
        auth_session.set_profile(profile).await?;
    }

    tracing::debug!(
        "Stored access token and profile in session.{} / session.{}",
        config.token_session_key,
        config.user_session_key.as_deref().unwrap_or_default()
    );
    Ok(FlowOutcome::Redirect(destination))
}

fn state_matches(received: &str, stored: Option<&str>) -> bool {
    match stored {
        Some(stored) => received.as_bytes().ct_eq(stored.as_bytes()).into(),
        None => false,
    }
}
