use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Transport-level failures talking to the identity provider.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Network timeout after {0:?}")]
    Timeout(std::time::Duration),
    #[error("Network error: {0}")]
    Network(String),
    #[error("HTTP status {status}: {context}")]
    Http { status: StatusCode, context: String },
    #[error("JSON parse error: {0}")]
    Json(String),
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

/// The provider answered, but not with an access token.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("OAuth error: {}", description.as_deref().unwrap_or(code.as_str()))]
    OAuth {
        code: String,
        description: Option<String>,
    },
    #[error("OAuth error: token response did not contain an access token")]
    MissingAccessToken,
    #[error("OAuth error: malformed token response")]
    MalformedResponse,
    #[error("OAuth error: token endpoint returned HTTP {0}")]
    Status(StatusCode),
}

impl ProviderError {
    /// Error code as reported by the provider, for logging.
    pub fn code(&self) -> &str {
        match self {
            ProviderError::OAuth { code, .. } => code,
            ProviderError::MissingAccessToken => "missing_access_token",
            ProviderError::MalformedResponse => "malformed_response",
            ProviderError::Status(_) => "unexpected_status",
        }
    }
}

/// Everything that can end an `/api/auth` request early.
///
/// Each variant maps to exactly one status code; the body is plain text and never
/// contains configuration secrets.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{0} is not configured")]
    MissingConfiguration(&'static str),
    #[error("Missing code parameter")]
    MissingCode,
    #[error("Unable to determine request origin")]
    MissingOrigin,
    #[error("Invalid or expired state parameter")]
    InvalidState,
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error("Internal server error")]
    Unexpected(#[source] FetchError),
    /// Local failures (RNG, signing, header encoding). The detail is logged, not returned.
    #[error("Internal server error")]
    Internal(String),
}

impl AuthError {
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::MissingConfiguration(_)
            | AuthError::Unexpected(_)
            | AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AuthError::MissingCode
            | AuthError::MissingOrigin
            | AuthError::InvalidState
            | AuthError::Provider(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl From<FetchError> for AuthError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::Json(_) => AuthError::Provider(ProviderError::MalformedResponse),
            FetchError::Http { status, .. } => AuthError::Provider(ProviderError::Status(status)),
            other => AuthError::Unexpected(other),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        (
            self.status(),
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            self.to_string(),
        )
            .into_response()
    }
}
