use axum::response::IntoResponse;
use cms_oauth_bridge::error::{AuthError, FetchError, ProviderError};
use hyper::StatusCode;
use std::time::Duration;

#[test]
fn test_auth_error_status_mapping() {
    let cases = [
        (
            AuthError::MissingConfiguration("CLIENT_ID"),
            StatusCode::INTERNAL_SERVER_ERROR,
        ),
        (AuthError::MissingCode, StatusCode::BAD_REQUEST),
        (AuthError::MissingOrigin, StatusCode::BAD_REQUEST),
        (AuthError::InvalidState, StatusCode::BAD_REQUEST),
        (
            AuthError::Provider(ProviderError::MissingAccessToken),
            StatusCode::BAD_REQUEST,
        ),
        (
            AuthError::Unexpected(FetchError::Network("connection refused".into())),
            StatusCode::INTERNAL_SERVER_ERROR,
        ),
        (
            AuthError::Internal("rng failure".into()),
            StatusCode::INTERNAL_SERVER_ERROR,
        ),
    ];

    for (error, expected) in cases {
        assert_eq!(error.status(), expected, "{error:?}");
        assert_eq!(error.into_response().status(), expected);
    }
}

#[test]
fn test_fetch_error_conversion() {
    // Unparseable bodies are the provider's fault, transport problems are ours
    let json: AuthError = FetchError::Json("expected value".into()).into();
    assert!(matches!(
        json,
        AuthError::Provider(ProviderError::MalformedResponse)
    ));

    let http: AuthError = FetchError::Http {
        status: StatusCode::BAD_GATEWAY,
        context: "token endpoint".into(),
    }
    .into();
    assert!(matches!(
        http,
        AuthError::Provider(ProviderError::Status(StatusCode::BAD_GATEWAY))
    ));

    let timeout: AuthError = FetchError::Timeout(Duration::from_secs(10)).into();
    assert!(matches!(timeout, AuthError::Unexpected(FetchError::Timeout(_))));
}

#[test]
fn test_unexpected_errors_hide_details() {
    let err = AuthError::Unexpected(FetchError::Network(
        "dns error: github.com secret-host".into(),
    ));
    assert_eq!(err.to_string(), "Internal server error");

    let err = AuthError::Internal("failed to sign state: bad key".into());
    assert_eq!(err.to_string(), "Internal server error");
}

#[test]
fn test_provider_error_messages() {
    let err = ProviderError::OAuth {
        code: "bad_verification_code".into(),
        description: Some("The code passed is incorrect or expired.".into()),
    };
    assert_eq!(err.code(), "bad_verification_code");
    assert_eq!(
        AuthError::from(err).to_string(),
        "OAuth error: The code passed is incorrect or expired."
    );

    let err = ProviderError::Status(StatusCode::SERVICE_UNAVAILABLE);
    assert!(err.to_string().contains("503"));
}

#[tokio::test]
async fn test_error_body_is_plain_text() {
    let response = AuthError::MissingCode.into_response();
    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);
    assert_eq!(content_type.as_deref(), Some("text/plain; charset=utf-8"));

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    assert_eq!(&body[..], b"Missing code parameter");
}
