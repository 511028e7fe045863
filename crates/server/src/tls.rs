//! Shared TLS client configuration for outbound provider calls.

use once_cell::sync::OnceCell;
use rustls::{ClientConfig, RootCertStore};
use std::sync::Arc;

/// Shared TLS configuration so the root store is only built once per process.
static TLS_CONFIG: OnceCell<Arc<ClientConfig>> = OnceCell::new();

/// Get the shared TLS client configuration, rooted in the bundled webpki roots.
pub fn get_shared_tls_config() -> Arc<ClientConfig> {
    TLS_CONFIG
        .get_or_init(|| {
            let mut root_cert_store = RootCertStore::empty();
            root_cert_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

            let config = ClientConfig::builder()
                .with_root_certificates(root_cert_store)
                .with_no_client_auth();

            Arc::new(config)
        })
        .clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shared_tls_config() {
        let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

        let config1 = get_shared_tls_config();
        let config2 = get_shared_tls_config();

        assert!(Arc::ptr_eq(&config1, &config2));
    }
}
