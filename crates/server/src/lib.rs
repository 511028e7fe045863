//! GitHub OAuth bridge for a statically hosted, CMS-managed catalog.
//!
//! The site has no backend of its own; this service only performs the OAuth
//! authorization-code exchange on behalf of the CMS client and hands the resulting
//! token to the browser. Nothing is persisted.

use std::sync::Arc;

use crate::config::AppConfig;
use crate::github::GithubClient;

pub mod api;
pub mod config;
pub mod error;
pub mod github;
pub mod oauth;
pub mod tls;

/// Immutable per-process resources shared by all requests.
#[derive(Clone, Debug)]
pub struct AppResources {
    pub config: Arc<AppConfig>,
    pub github: GithubClient,
}

impl AppResources {
    pub fn new(config: AppConfig) -> Self {
        let github = GithubClient::new(&config);
        Self {
            config: Arc::new(config),
            github,
        }
    }
}
