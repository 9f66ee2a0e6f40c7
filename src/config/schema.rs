//! Configuration schema definitions.
//!
//! All types derive Serde traits so configs can be embedded in test
//! fixtures or deserialized from files.

use serde::{Deserialize, Serialize};

/// Configuration for the plain-HTTP listener.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Host to bind (e.g. "localhost", "127.0.0.1").
    pub host: String,

    /// Port to bind. `0` lets the operating system assign one.
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 0,
        }
    }
}

impl HttpConfig {
    /// Create a config for the given host and port.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

/// Configuration for the HTTPS listener.
///
/// `key` and `cert` hold PEM-encoded material understood by the TLS layer.
/// Certificate management is out of scope; the caller supplies both.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HttpsConfig {
    /// Host to bind.
    pub host: String,

    /// Port to bind. `0` lets the operating system assign one.
    pub port: u16,

    /// PEM-encoded private key.
    pub key: String,

    /// PEM-encoded certificate chain.
    pub cert: String,
}

impl HttpsConfig {
    /// Create a config for the given host, port and PEM key material.
    pub fn new(
        host: impl Into<String>,
        port: u16,
        key: impl Into<String>,
        cert: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            key: key.into(),
            cert: cert.into(),
        }
    }
}
