//! Shared utilities for integration tests.

#![allow(dead_code)]

use mock_http_server::{HttpConfig, HttpsConfig};

/// Initialize tracing output for a test run (once per process).
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mock_http_server=debug".into()),
        )
        .with_test_writer()
        .try_init();
}

/// An HTTP config bound to an OS-assigned localhost port.
pub fn http_config() -> HttpConfig {
    HttpConfig::new("localhost", 0)
}

/// An HTTPS config with a throwaway self-signed key pair.
pub fn https_config() -> HttpsConfig {
    let (key, cert) = tls_material();
    HttpsConfig::new("localhost", 0, key, cert)
}

/// Generate a self-signed key/cert PEM pair for localhost.
pub fn tls_material() -> (String, String) {
    let certified = rcgen::generate_simple_self_signed(vec!["localhost".to_string()])
        .expect("generate self-signed certificate");
    (
        certified.key_pair.serialize_pem(),
        certified.cert.pem(),
    )
}

/// A client that never reuses pooled connections between tests.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .expect("build http client")
}

/// A client that accepts the self-signed test certificate.
pub fn https_client() -> reqwest::Client {
    reqwest::Client::builder()
        .danger_accept_invalid_certs(true)
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .expect("build https client")
}

/// URL for a path on the server's HTTP port.
pub fn http_url(port: u16, path: &str) -> String {
    format!("http://localhost:{port}{path}")
}

/// URL for a path on the server's HTTPS port.
pub fn https_url(port: u16, path: &str) -> String {
    format!("https://localhost:{port}{path}")
}
