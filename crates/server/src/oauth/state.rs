//! The OAuth `state` nonce and its optional signed cookie.
//!
//! With a configured secret, the initiator signs `{state, exp}` into a short-lived
//! cookie scoped to the auth endpoint, and the callback only proceeds when the `state`
//! query parameter matches the signed claim. Nothing is stored server-side.

use crate::error::AuthError;
use crate::oauth::AUTH_PATH;
use axum::http::{HeaderMap, header};
use base64::Engine;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::debug;

pub const STATE_COOKIE: &str = "cms_oauth_state";
/// How long the user has to finish the provider consent screen.
pub const STATE_TTL_SECS: i64 = 600;

#[derive(Debug, Serialize, Deserialize)]
pub struct StateClaims {
    pub exp: usize,
    pub state: String,
}

/// Fresh random state: 32 bytes from the OS RNG, base64url without padding.
pub fn generate_state() -> Result<String, AuthError> {
    let mut bytes = [0u8; 32];
    getrandom::fill(&mut bytes)
        .map_err(|e| AuthError::Internal(format!("failed to generate random state: {e}")))?;
    Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes))
}

/// `Set-Cookie` value carrying the signed state.
pub fn issue_cookie(secret: &str, state: &str) -> Result<String, AuthError> {
    let exp = (OffsetDateTime::now_utc() + time::Duration::seconds(STATE_TTL_SECS))
        .unix_timestamp() as usize;
    let claims = StateClaims {
        exp,
        state: state.to_string(),
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AuthError::Internal(format!("failed to sign state: {e}")))?;
    Ok(format!(
        "{STATE_COOKIE}={token}; Max-Age={STATE_TTL_SECS}; Path={AUTH_PATH}; HttpOnly; Secure; SameSite=Lax"
    ))
}

/// `Set-Cookie` value that removes the state cookie once it has been used.
pub fn clear_cookie() -> String {
    format!("{STATE_COOKIE}=; Max-Age=0; Path={AUTH_PATH}; HttpOnly; Secure; SameSite=Lax")
}

/// Checks the returned `state` against the signed cookie.
pub fn verify(secret: &str, headers: &HeaderMap, returned: Option<&str>) -> Result<(), AuthError> {
    let returned = returned
        .filter(|s| !s.is_empty())
        .ok_or(AuthError::InvalidState)?;
    let token = cookie_value(headers, STATE_COOKIE).ok_or(AuthError::InvalidState)?;

    let mut validation = Validation::default();
    validation.validate_exp = true;
    let data = decode::<StateClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|e| {
        debug!(error = %e, "rejecting state cookie");
        AuthError::InvalidState
    })?;

    if data.claims.state != returned {
        debug!("state parameter does not match signed cookie");
        return Err(AuthError::InvalidState);
    }
    Ok(())
}

fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    fn headers_with_cookie(set_cookie: &str) -> HeaderMap {
        // Browsers send back only the `name=value` part.
        let pair = set_cookie.split(';').next().unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_str(&format!("other=1; {pair}")).unwrap(),
        );
        headers
    }

    #[test]
    fn generated_states_are_distinct_and_url_safe() {
        let a = generate_state().unwrap();
        let b = generate_state().unwrap();
        assert_ne!(a, b);
        assert_eq!(a.len(), 43);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn signed_state_round_trips() {
        let cookie = issue_cookie(SECRET, "abc").unwrap();
        assert!(cookie.starts_with("cms_oauth_state="));
        assert!(cookie.contains("Path=/api/auth"));
        assert!(cookie.contains("HttpOnly"));
        let headers = headers_with_cookie(&cookie);
        assert!(verify(SECRET, &headers, Some("abc")).is_ok());
    }

    #[test]
    fn mismatched_state_is_rejected() {
        let headers = headers_with_cookie(&issue_cookie(SECRET, "abc").unwrap());
        assert!(matches!(
            verify(SECRET, &headers, Some("xyz")),
            Err(AuthError::InvalidState)
        ));
        assert!(matches!(
            verify(SECRET, &headers, None),
            Err(AuthError::InvalidState)
        ));
    }

    #[test]
    fn cookie_signed_with_other_secret_is_rejected() {
        let headers = headers_with_cookie(
            &issue_cookie("ffffffffffffffffffffffffffffffff", "abc").unwrap(),
        );
        assert!(verify(SECRET, &headers, Some("abc")).is_err());
    }

    #[test]
    fn missing_cookie_is_rejected() {
        assert!(verify(SECRET, &HeaderMap::new(), Some("abc")).is_err());
    }

    #[test]
    fn expired_cookie_is_rejected() {
        let claims = StateClaims {
            exp: (OffsetDateTime::now_utc() - time::Duration::hours(1)).unix_timestamp() as usize,
            state: "abc".into(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();
        let headers = headers_with_cookie(&format!("{STATE_COOKIE}={token}"));
        assert!(verify(SECRET, &headers, Some("abc")).is_err());
    }

    #[test]
    fn clear_cookie_expires_immediately() {
        let cookie = clear_cookie();
        assert!(cookie.starts_with("cms_oauth_state=;"));
        assert!(cookie.contains("Max-Age=0"));
    }
}
