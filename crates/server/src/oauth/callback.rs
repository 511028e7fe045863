//! Callback handler: code → token → handshake page.

use crate::AppResources;
use crate::error::AuthError;
use crate::github::{AccessToken, GithubClient};
use crate::oauth::handshake::{Handshake, HandshakeMessage};
use crate::oauth::{AuthParams, state};
use axum::http::{HeaderMap, HeaderValue, header};
use axum::response::{IntoResponse, Response};
use tracing::{info, warn};

/// Runs the callback steps in order, stopping at the first failure.
///
/// Credentials and `state` are checked before anything leaves the process, so a
/// misconfigured deployment never talks to the provider.
pub async fn handle_callback(
    resources: &AppResources,
    params: &AuthParams,
    headers: &HeaderMap,
) -> Result<Response, AuthError> {
    let code = params
        .code
        .as_deref()
        .filter(|c| !c.is_empty())
        .ok_or(AuthError::MissingCode)?;

    let config = &resources.config;
    let client_id = config
        .client_id()
        .ok_or(AuthError::MissingConfiguration("CLIENT_ID"))?;
    let client_secret = config
        .client_secret()
        .ok_or(AuthError::MissingConfiguration("CLIENT_SECRET"))?;

    let state_secret = config.state_secret();
    if let Some(secret) = state_secret {
        state::verify(secret, headers, params.state.as_deref())?;
    }

    let token = resources
        .github
        .exchange_code(client_id, client_secret, code)
        .await?
        .into_result()
        .inspect_err(|e| warn!(error_code = e.code(), "token exchange rejected by provider"))?;

    log_identity(&resources.github, &token).await;

    let message = HandshakeMessage::success(&config.provider_name, &token);
    let page = Handshake::new(message).render_page();

    let mut response = (
        [
            (header::CONTENT_TYPE, "text/html; charset=utf-8"),
            (header::CACHE_CONTROL, "no-store"),
        ],
        page,
    )
        .into_response();
    if state_secret.is_some() {
        let clear = HeaderValue::from_str(&state::clear_cookie())
            .map_err(|e| AuthError::Internal(format!("invalid state cookie: {e}")))?;
        response.headers_mut().append(header::SET_COOKIE, clear);
    }
    Ok(response)
}

/// Best-effort: who just signed in. Failures are logged and otherwise ignored.
async fn log_identity(github: &GithubClient, token: &AccessToken) {
    match github.fetch_identity(&token.token).await {
        Ok(identity) => info!(
            login = %identity.login,
            scope = token.scope.as_deref().unwrap_or_default(),
            "GitHub OAuth success"
        ),
        Err(e) => warn!(error = %e, "GitHub OAuth success, identity lookup failed"),
    }
}
