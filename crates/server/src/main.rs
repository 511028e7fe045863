use cms_oauth_bridge::AppResources;
use cms_oauth_bridge::api::start_webserver;
use cms_oauth_bridge::config::load_config;
use rustls::crypto;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

fn initialize_tracing() {
    let default_directives = "cms_oauth_bridge=info,tower_http=info,hyper=warn";
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives));

    let registry = tracing_subscriber::registry().with(env_filter);
    let layer = fmt::layer().with_target(true).with_level(true);

    registry.with(layer).init();
}

#[tokio::main]
async fn main() -> color_eyre::eyre::Result<()> {
    color_eyre::install()?;

    // A missing .env is normal in production.
    let _ = dotenvy::dotenv();

    initialize_tracing();

    let config = load_config()?;

    // Install before the first TLS config is built.
    if crypto::aws_lc_rs::default_provider()
        .install_default()
        .is_err()
    {
        tracing::debug!("crypto provider already installed");
    }

    if config.client_id().is_none() || config.client_secret().is_none() {
        tracing::warn!("CLIENT_ID or CLIENT_SECRET is not set; /api/auth will answer 500");
    }
    if config.state_secret().is_none() {
        tracing::warn!("state_secret is not set; the OAuth state parameter is not verified on callback");
    }
    tracing::info!(
        public_url = config.public_url.as_deref().unwrap_or("<from request>"),
        scope = %config.scope,
        timeout_secs = config.request_timeout_secs,
        "configuration loaded"
    );

    let resources = AppResources::new(config);
    start_webserver(resources).await?;
    Ok(())
}
