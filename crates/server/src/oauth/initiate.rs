//! Authorization initiator: redirects the popup to the provider's consent screen.

use crate::AppResources;
use crate::config::AppConfig;
use crate::error::AuthError;
use crate::oauth::{AUTH_PATH, state};
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use tracing::info;
use url::Url;

/// Everything the provider needs to start the flow. Lives for one request.
#[derive(Debug, Clone)]
pub struct AuthorizationRequest {
    pub client_id: String,
    pub redirect_uri: String,
    pub scope: String,
    pub state: String,
}

impl AuthorizationRequest {
    /// Builds a request whose callback comes back to this same endpoint.
    pub fn new(client_id: &str, origin: &str, scope: &str) -> Result<Self, AuthError> {
        Ok(Self {
            client_id: client_id.to_string(),
            redirect_uri: format!("{origin}{AUTH_PATH}"),
            scope: scope.to_string(),
            state: state::generate_state()?,
        })
    }

    pub fn authorize_url(&self, authorize_endpoint: &str) -> Result<Url, url::ParseError> {
        let mut url = Url::parse(authorize_endpoint)?;
        url.query_pairs_mut()
            .append_pair("client_id", &self.client_id)
            .append_pair("redirect_uri", &self.redirect_uri)
            .append_pair("scope", &self.scope)
            .append_pair("state", &self.state);
        Ok(url)
    }
}

/// Origin (`scheme://host[:port]`) under which clients reach this service.
///
/// `public_url` wins when configured; otherwise the forwarding headers set by the
/// hosting proxy are trusted, falling back to `Host`.
pub fn resolve_origin(config: &AppConfig, headers: &HeaderMap) -> Result<String, AuthError> {
    if let Some(public_url) = config.public_url.as_deref().filter(|u| !u.is_empty()) {
        return Ok(public_url.trim_end_matches('/').to_string());
    }

    let first = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    let host = first("x-forwarded-host")
        .or_else(|| first(header::HOST.as_str()))
        .ok_or(AuthError::MissingOrigin)?;
    let scheme = match first("x-forwarded-proto") {
        Some("https") => "https",
        _ => "http",
    };
    Ok(format!("{scheme}://{host}"))
}

/// Issues the 302 to the provider, plus the signed state cookie when enabled.
pub fn initiate(resources: &AppResources, headers: &HeaderMap) -> Result<Response, AuthError> {
    let config = &resources.config;
    let client_id = config
        .client_id()
        .ok_or(AuthError::MissingConfiguration("CLIENT_ID"))?;
    // The callback cannot succeed without a secret, so don't send the user to GitHub.
    if config.client_secret().is_none() {
        return Err(AuthError::MissingConfiguration("CLIENT_SECRET"));
    }
    let origin = resolve_origin(config, headers)?;

    let request = AuthorizationRequest::new(client_id, &origin, &config.scope)?;
    let location = request
        .authorize_url(&config.github.authorize_url)
        .map_err(|e| AuthError::Internal(format!("invalid authorize url: {e}")))?;
    let location = HeaderValue::from_str(location.as_str())
        .map_err(|e| AuthError::Internal(format!("invalid location header: {e}")))?;

    let mut response = (StatusCode::FOUND, [(header::LOCATION, location)]).into_response();
    if let Some(secret) = config.state_secret() {
        let cookie = state::issue_cookie(secret, &request.state)?;
        let cookie = HeaderValue::from_str(&cookie)
            .map_err(|e| AuthError::Internal(format!("invalid state cookie: {e}")))?;
        response.headers_mut().append(header::SET_COOKIE, cookie);
    }

    info!(
        redirect_uri = %request.redirect_uri,
        scope = %request.scope,
        signed_state = config.state_secret().is_some(),
        "redirecting to provider"
    );
    Ok(response)
}
