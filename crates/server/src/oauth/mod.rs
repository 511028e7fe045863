//! GitHub OAuth bridge for the CMS client.
//!
//! A single endpoint serves both halves of the authorization-code flow:
//!
//! - `GET|POST /api/auth` without `code` - redirect to GitHub's consent screen
//! - `GET|POST /api/auth?code=...` - exchange the code and hand the token to the
//!   opener window through the popup handshake
//!
//! No state is kept between the two requests; see [`state`] for the optional signed
//! `state` cookie.

pub mod callback;
pub mod handshake;
pub mod initiate;
pub mod state;

use crate::AppResources;
use crate::error::AuthError;
use crate::error::ProviderError;
use axum::{
    Extension,
    extract::Query,
    http::HeaderMap,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tracing::{error, warn};
use utoipa::IntoParams;
use utoipa_axum::{router::OpenApiRouter, routes};

/// OpenAPI tag for the auth endpoint.
pub const AUTH_TAG: &str = "Auth";
/// Path the provider redirects back to. Also the redirect_uri and cookie path.
pub const AUTH_PATH: &str = "/api/auth";

/// Query parameters of `/api/auth`.
#[derive(Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AuthParams {
    /// Authorization code from the provider. Its presence selects the callback path.
    pub code: Option<String>,
    /// State nonce echoed back by the provider.
    pub state: Option<String>,
    /// Set by the provider when the user declined or the request was invalid.
    pub error: Option<String>,
    pub error_description: Option<String>,
}

/// Creates the auth router, to be nested under `/api`.
pub fn router() -> OpenApiRouter {
    OpenApiRouter::new().routes(routes!(auth))
}

/// OAuth entry point and callback.
#[tracing::instrument(
    skip_all,
    fields(has_code = params.code.is_some(), has_state = params.state.is_some())
)]
#[utoipa::path(
    method(get, post),
    path = "/auth",
    tag = AUTH_TAG,
    operation_id = "GitHub OAuth",
    summary = "Start or complete GitHub sign-in for the CMS",
    description = "Without a `code` parameter, redirects to GitHub's authorize endpoint with a fresh `state`.\n\n\
                   With a `code` parameter, exchanges it for an access token and returns a small HTML page \
                   that passes the token to the window that opened the sign-in popup.\n\n\
                   POST behaves exactly like GET; some CMS client versions use it.",
    params(AuthParams),
    responses(
        (status = 200, description = "Handshake page delivering the token to the opener", content_type = "text/html"),
        (status = 302, description = "Redirect to the provider's authorize endpoint"),
        (status = 400, description = "Missing code, invalid state, or OAuth error reported by the provider", body = str, content_type = "text/plain"),
        (status = 500, description = "Missing client credentials or provider unreachable", body = str, content_type = "text/plain")
    )
)]
pub async fn auth(
    Extension(resources): Extension<AppResources>,
    headers: HeaderMap,
    Query(params): Query<AuthParams>,
) -> Response {
    let result = if params.code.is_some() {
        callback::handle_callback(&resources, &params, &headers).await
    } else if let Some(code) = params.error.clone() {
        Err(AuthError::Provider(ProviderError::OAuth {
            code,
            description: params.error_description.clone(),
        }))
    } else {
        initiate::initiate(&resources, &headers)
    };

    match result {
        Ok(response) => response,
        Err(err) => {
            match &err {
                AuthError::Unexpected(source) => {
                    error!(error = %source, "provider request failed")
                }
                AuthError::Internal(detail) => error!(error = %detail, "auth request failed"),
                other => warn!(status = %other.status(), error = %other, "auth request rejected"),
            }
            err.into_response()
        }
    }
}
