//! Outbound calls to GitHub: the code-for-token exchange and the (best-effort) identity lookup.
//!
//! Both calls go through one pooled hyper client and are bounded by the configured
//! request timeout. Nothing is retried: authorization codes are single-use.

mod types;

pub use types::{AccessToken, IdentitySummary, TokenResponse};

use crate::config::AppConfig;
use crate::error::FetchError;
use crate::tls::get_shared_tls_config;
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::{Method, Request, StatusCode, header};
use hyper_rustls::HttpsConnector;
use hyper_util::client::legacy::{Client, connect::HttpConnector};
use hyper_util::rt::TokioExecutor;
use tokio::time::{Duration, timeout};
use tracing::debug;
use types::ExchangeRequest;

pub const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

#[derive(Clone, Debug)]
pub struct GithubClient {
    http: Client<HttpsConnector<HttpConnector>, Full<Bytes>>,
    token_url: String,
    user_url: String,
    timeout: Duration,
}

impl GithubClient {
    pub fn new(config: &AppConfig) -> Self {
        let https = hyper_rustls::HttpsConnectorBuilder::new()
            .with_tls_config((*get_shared_tls_config()).clone())
            .https_or_http()
            .enable_http1()
            .build();
        let http = Client::builder(TokioExecutor::new()).build(https);
        Self {
            http,
            token_url: config.github.token_url.clone(),
            user_url: config.github.user_url.clone(),
            timeout: config.request_timeout(),
        }
    }

    /// POSTs the code to the token endpoint and returns the parsed body.
    ///
    /// A JSON body is returned as-is whatever the status, since GitHub reports OAuth
    /// errors inside it. A non-JSON body becomes `Http` for non-2xx statuses and `Json`
    /// otherwise.
    #[tracing::instrument(name = "github_exchange_code", skip_all)]
    pub async fn exchange_code(
        &self,
        client_id: &str,
        client_secret: &str,
        code: &str,
    ) -> Result<TokenResponse, FetchError> {
        let body = serde_json::to_vec(&ExchangeRequest {
            client_id,
            client_secret,
            code,
        })
        .map_err(|e| FetchError::Json(e.to_string()))?;

        let req = Request::builder()
            .method(Method::POST)
            .uri(self.token_url.as_str())
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::ACCEPT, "application/json")
            .header(header::USER_AGENT, USER_AGENT)
            .body(Full::new(Bytes::from(body)))
            .map_err(|e| FetchError::InvalidUrl(e.to_string()))?;

        let (status, bytes) = self.send(req).await?;
        debug!(%status, len = bytes.len(), "token endpoint responded");
        match serde_json::from_slice::<TokenResponse>(&bytes) {
            Ok(parsed) => Ok(parsed),
            Err(_) if !status.is_success() => Err(FetchError::Http {
                status,
                context: "token endpoint".to_string(),
            }),
            Err(e) => Err(FetchError::Json(e.to_string())),
        }
    }

    /// Looks up the login that owns `token`.
    #[tracing::instrument(name = "github_fetch_identity", skip_all)]
    pub async fn fetch_identity(&self, token: &str) -> Result<IdentitySummary, FetchError> {
        let req = Request::builder()
            .method(Method::GET)
            .uri(self.user_url.as_str())
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .header(header::ACCEPT, "application/json")
            .header(header::USER_AGENT, USER_AGENT)
            .body(Full::new(Bytes::new()))
            .map_err(|e| FetchError::InvalidUrl(e.to_string()))?;

        let (status, bytes) = self.send(req).await?;
        if !status.is_success() {
            return Err(FetchError::Http {
                status,
                context: "user endpoint".to_string(),
            });
        }
        serde_json::from_slice(&bytes).map_err(|e| FetchError::Json(e.to_string()))
    }

    async fn send(&self, req: Request<Full<Bytes>>) -> Result<(StatusCode, Bytes), FetchError> {
        let exchange = async {
            let res = self
                .http
                .request(req)
                .await
                .map_err(|e| FetchError::Network(e.to_string()))?;
            let status = res.status();
            let body = res
                .into_body()
                .collect()
                .await
                .map_err(|e| FetchError::Network(e.to_string()))?
                .to_bytes();
            Ok::<_, FetchError>((status, body))
        };
        timeout(self.timeout, exchange)
            .await
            .map_err(|_| FetchError::Timeout(self.timeout))?
    }
}
