//! Wire shapes of the GitHub OAuth endpoints.

use crate::error::ProviderError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Body of the code-for-token exchange.
#[derive(Serialize)]
pub(crate) struct ExchangeRequest<'a> {
    pub client_id: &'a str,
    pub client_secret: &'a str,
    pub code: &'a str,
}

/// Raw token endpoint response.
///
/// GitHub reports OAuth errors with a 200 status and an `error` field, so every
/// field is optional and the outcome is decided by [`TokenResponse::into_result`].
#[derive(Debug, Default, Deserialize)]
pub struct TokenResponse {
    pub access_token: Option<String>,
    pub token_type: Option<String>,
    pub scope: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

impl TokenResponse {
    pub fn into_result(self) -> Result<AccessToken, ProviderError> {
        if let Some(code) = self.error.filter(|e| !e.is_empty()) {
            return Err(ProviderError::OAuth {
                code,
                description: self.error_description.filter(|d| !d.is_empty()),
            });
        }
        match self.access_token {
            Some(token) if !token.is_empty() => Ok(AccessToken {
                token,
                token_type: self.token_type,
                scope: self.scope,
            }),
            _ => Err(ProviderError::MissingAccessToken),
        }
    }
}

/// A successfully exchanged access token. Only ever handed to the browser, never stored.
#[derive(Clone)]
pub struct AccessToken {
    pub token: String,
    pub token_type: Option<String>,
    pub scope: Option<String>,
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("token", &"<redacted>")
            .field("token_type", &self.token_type)
            .field("scope", &self.scope)
            .finish()
    }
}

/// The part of `GET /user` we log.
#[derive(Debug, Clone, Deserialize)]
pub struct IdentitySummary {
    pub login: String,
}
