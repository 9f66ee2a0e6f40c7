//! TLS termination from caller-supplied key material.

use std::sync::Arc;

use tokio_rustls::rustls::crypto::aws_lc_rs;
use tokio_rustls::rustls::pki_types::{CertificateDer, PrivateKeyDer};
use tokio_rustls::rustls::ServerConfig;
use tokio_rustls::TlsAcceptor;

use crate::net::ServerError;

/// PEM-encoded private key and certificate chain for one HTTPS engine.
#[derive(Debug, Clone)]
pub(crate) struct TlsMaterial {
    pub key: String,
    pub cert: String,
}

/// Build a TLS acceptor from PEM literals.
///
/// Invalid material is reported from `start` rather than at accept time, so
/// a misconfigured test fails before any request is issued.
pub(crate) fn build_acceptor(material: &TlsMaterial) -> Result<TlsAcceptor, ServerError> {
    let certs: Vec<CertificateDer<'static>> = rustls_pemfile::certs(&mut material.cert.as_bytes())
        .collect::<Result<_, _>>()
        .map_err(ServerError::TlsMaterial)?;

    let key: PrivateKeyDer<'static> = rustls_pemfile::private_key(&mut material.key.as_bytes())
        .map_err(ServerError::TlsMaterial)?
        .ok_or_else(|| {
            ServerError::TlsMaterial(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "no private key found in supplied PEM",
            ))
        })?;

    // Name the provider explicitly; relying on a process default breaks as
    // soon as a second rustls crypto backend lands in the dependency graph.
    let config = ServerConfig::builder_with_provider(Arc::new(aws_lc_rs::default_provider()))
        .with_safe_default_protocol_versions()
        .map_err(ServerError::Tls)?
        .with_no_client_auth()
        .with_single_cert(certs, key)
        .map_err(ServerError::Tls)?;

    Ok(TlsAcceptor::from(Arc::new(config)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn self_signed_material() -> TlsMaterial {
        let certified = rcgen::generate_simple_self_signed(vec!["localhost".to_string()]).unwrap();
        TlsMaterial {
            key: certified.key_pair.serialize_pem(),
            cert: certified.cert.pem(),
        }
    }

    #[test]
    fn accepts_self_signed_material() {
        let material = self_signed_material();
        build_acceptor(&material).unwrap();
    }

    #[test]
    fn rejects_material_without_a_key() {
        let material = self_signed_material();
        let broken = TlsMaterial {
            key: String::new(),
            cert: material.cert,
        };

        let err = build_acceptor(&broken).err().unwrap();
        assert!(matches!(err, ServerError::TlsMaterial(_)));
    }

    #[test]
    fn rejects_garbage_certificate() {
        let material = self_signed_material();
        let broken = TlsMaterial {
            key: material.key,
            cert: "not a certificate".to_string(),
        };

        let err = build_acceptor(&broken).err().unwrap();
        assert!(matches!(err, ServerError::Tls(_) | ServerError::TlsMaterial(_)));
    }
}
