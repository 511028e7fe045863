use serde::Deserialize;
use std::fmt;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration build error: {0}")]
    Build(#[from] config::ConfigError),
    #[error("Invalid configuration: {0}")]
    Validation(String),
}

/// Endpoints of the identity provider. Defaults point at github.com.
#[derive(Clone, Debug, Deserialize)]
pub struct GithubConfig {
    #[serde(default = "default_authorize_url")]
    pub authorize_url: String,
    #[serde(default = "default_token_url")]
    pub token_url: String,
    #[serde(default = "default_user_url")]
    pub user_url: String,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            authorize_url: default_authorize_url(),
            token_url: default_token_url(),
            user_url: default_user_url(),
        }
    }
}

#[derive(Clone, Deserialize)]
pub struct AppConfig {
    /// OAuth app client id. Missing values are reported per request, not at startup.
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub client_secret: Option<String>,
    /// `GITHUB_CLIENT_ID`, used when `client_id` is unset or empty.
    #[serde(default)]
    pub github_client_id: Option<String>,
    /// `GITHUB_CLIENT_SECRET`, used when `client_secret` is unset or empty.
    #[serde(default)]
    pub github_client_secret: Option<String>,
    /// HMAC secret for the signed `state` cookie. When unset, `state` is not verified.
    #[serde(default)]
    pub state_secret: Option<String>,
    /// Public origin of this service, e.g. `https://shop.example.org`.
    /// If not provided, the origin is derived from the request's host headers.
    #[serde(default)]
    pub public_url: Option<String>,
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_scope")]
    pub scope: String,
    #[serde(default = "default_provider_name")]
    pub provider_name: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub github: GithubConfig,
}

impl AppConfig {
    /// Client id, treating an empty string the same as an absent one.
    /// `client_id` takes precedence over `github_client_id`.
    pub fn client_id(&self) -> Option<&str> {
        non_empty(&self.client_id).or_else(|| non_empty(&self.github_client_id))
    }

    /// Client secret; `client_secret` takes precedence over `github_client_secret`.
    pub fn client_secret(&self) -> Option<&str> {
        non_empty(&self.client_secret).or_else(|| non_empty(&self.github_client_secret))
    }

    pub fn state_secret(&self) -> Option<&str> {
        non_empty(&self.state_secret)
    }

    pub fn request_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            github_client_id: None,
            github_client_secret: None,
            state_secret: None,
            public_url: None,
            bind_address: default_bind_address(),
            scope: default_scope(),
            provider_name: default_provider_name(),
            request_timeout_secs: default_request_timeout_secs(),
            github: GithubConfig::default(),
        }
    }
}

// Secrets stay out of logs even when the whole config is debug-printed.
impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "<redacted>"))
            .field("github_client_id", &self.github_client_id)
            .field(
                "github_client_secret",
                &self.github_client_secret.as_ref().map(|_| "<redacted>"),
            )
            .field("state_secret", &self.state_secret.as_ref().map(|_| "<redacted>"))
            .field("public_url", &self.public_url)
            .field("bind_address", &self.bind_address)
            .field("scope", &self.scope)
            .field("provider_name", &self.provider_name)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("github", &self.github)
            .finish()
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

fn default_authorize_url() -> String {
    "https://github.com/login/oauth/authorize".to_string()
}

fn default_token_url() -> String {
    "https://github.com/login/oauth/access_token".to_string()
}

fn default_user_url() -> String {
    "https://api.github.com/user".to_string()
}

fn default_bind_address() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_scope() -> String {
    "repo,user".to_string()
}

fn default_provider_name() -> String {
    "github".to_string()
}

fn default_request_timeout_secs() -> u64 {
    10
}

/// Load application configuration from `config.yaml` (optional) + environment overrides.
///
/// The file path can be changed with `CONFIG_PATH`. Any environment variable matching a
/// key path separated by double underscores (e.g. `GITHUB__TOKEN_URL`) overrides the file
/// value, so plain `CLIENT_ID` / `CLIENT_SECRET` work as-is.
///
/// Returns a `ConfigError` instead of panicking so the caller can decide how to fail.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    use config::{Config, Environment, File};
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.yaml".to_string());
    let cfg = Config::builder()
        .add_source(File::with_name(&path).required(false))
        .add_source(Environment::default().separator("__"))
        .build()?;

    let app: AppConfig = cfg.try_deserialize()?;
    validate(&app)?;
    Ok(app)
}

/// Checks the parts of the config that would otherwise only fail mid-request.
pub fn validate(app: &AppConfig) -> Result<(), ConfigError> {
    if app.request_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "request_timeout_secs must be > 0".into(),
        ));
    }
    if let Some(secret) = app.state_secret()
        && secret.len() < 32
    {
        return Err(ConfigError::Validation(
            "state_secret must be at least 32 characters".into(),
        ));
    }
    if let Some(public_url) = app.public_url.as_deref() {
        Url::parse(public_url)
            .map_err(|e| ConfigError::Validation(format!("public_url is invalid: {e}")))?;
    }
    for (name, value) in [
        ("github.authorize_url", &app.github.authorize_url),
        ("github.token_url", &app.github.token_url),
        ("github.user_url", &app.github.user_url),
    ] {
        Url::parse(value).map_err(|e| ConfigError::Validation(format!("{name} is invalid: {e}")))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_github() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.scope, "repo,user");
        assert_eq!(cfg.provider_name, "github");
        assert_eq!(cfg.github.token_url, "https://github.com/login/oauth/access_token");
        assert!(validate(&cfg).is_ok());
    }

    #[test]
    fn empty_credentials_count_as_missing() {
        let cfg = AppConfig {
            client_id: Some(String::new()),
            client_secret: Some("s".into()),
            ..AppConfig::default()
        };
        assert_eq!(cfg.client_id(), None);
        assert_eq!(cfg.client_secret(), Some("s"));
    }

    #[test]
    fn client_id_takes_precedence_over_github_prefixed_name() {
        let cfg = AppConfig {
            client_id: Some("plain".into()),
            github_client_id: Some("prefixed".into()),
            client_secret: None,
            github_client_secret: Some("prefixed-secret".into()),
            ..AppConfig::default()
        };
        assert_eq!(cfg.client_id(), Some("plain"));
        assert_eq!(cfg.client_secret(), Some("prefixed-secret"));
    }

    #[test]
    fn short_state_secret_is_rejected() {
        let cfg = AppConfig {
            state_secret: Some("too-short".into()),
            ..AppConfig::default()
        };
        assert!(matches!(validate(&cfg), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let cfg = AppConfig {
            request_timeout_secs: 0,
            ..AppConfig::default()
        };
        assert!(validate(&cfg).is_err());
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let cfg = AppConfig {
            client_id: Some("id-123".into()),
            client_secret: Some("very-secret-value".into()),
            ..AppConfig::default()
        };
        let printed = format!("{cfg:?}");
        assert!(printed.contains("id-123"));
        assert!(!printed.contains("very-secret-value"));
    }
}
