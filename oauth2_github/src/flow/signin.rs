use url::Url;

use crate::config::GitHubAuthConfig;
use crate::errors::GitHubAuthError;
use crate::session::{AuthSession, FlowSession};
use crate::utils::{QueryParams, gen_random_string, validate_redirect_target};

use super::FlowOutcome;

/// Bytes of randomness in the anti-forgery state.
const STATE_TOKEN_BYTES: usize = 32;

/// Starts the flow: stores fresh state and the requested destination, then
/// redirects to GitHub. A visitor who already holds a token is sent straight
/// to the destination instead.
pub(super) async fn start_signin<S: FlowSession + ?Sized>(
    config: &GitHubAuthConfig,
    params: &QueryParams,
    session: &mut S,
) -> Result<FlowOutcome, GitHubAuthError> {
    let destination = requested_destination(config, params);
    let mut auth_session = AuthSession::new(session, config);

    if auth_session.is_authenticated().await? {
        let stored = auth_session.take_redirect().await?;
        let target = destination
            .map(str::to_string)
            .or(stored)
            .unwrap_or_else(|| "/".to_string());
        tracing::debug!("Already has github token, redirect to {}", target);
        return Ok(FlowOutcome::Redirect(target));
    }

    let state = gen_random_string(STATE_TOKEN_BYTES)
        .map_err(|e| GitHubAuthError::Internal(e.to_string()))?;
    auth_session.set_state(&state).await?;

    // A destination from an abandoned attempt must not carry over
    match destination {
        Some(destination) => auth_session.set_redirect(destination).await?,
        None => auth_session.clear_redirect().await?,
    }

    let auth_url = build_authorize_url(config, &state);
    tracing::debug!("Request github auth, redirect to {}", config.authorize_url);
    Ok(FlowOutcome::Redirect(auth_url))
}

fn requested_destination<'a>(
    config: &GitHubAuthConfig,
    params: &'a QueryParams,
) -> Option<&'a str> {
    let name = config.redirect_param_name.as_str();
    if params.is_undecodable(name) {
        tracing::warn!("Ignoring {} that is not valid percent-encoding", name);
        return None;
    }
    let raw = params.get(name)?;
    match validate_redirect_target(raw) {
        Some(target) => Some(target),
        None => {
            tracing::warn!("Ignoring {} that is not a local path: {:?}", name, raw);
            None
        }
    }
}

pub(super) fn build_authorize_url(config: &GitHubAuthConfig, state: &str) -> String {
    let mut url: Url = config.authorize_url.clone();
    url.query_pairs_mut()
        .append_pair("client_id", &config.client_id)
        .append_pair("redirect_uri", &config.callback_url)
        .append_pair("scope", &config.scope_param())
        .append_pair("state", state);
    url.into()
}
