//! TLS client configuration
//!
//! Two trust policies: verified against bundled and platform roots, or trust-all for
//! development against self-signed endpoints.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::{CryptoProvider, WebPkiSupportedAlgorithms};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{ClientConfig, DigitallySignedStruct, RootCertStore, SignatureScheme};

use crate::error::TlsError;

/// Certificate verification policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum TrustMode {
    /// Verify the certificate chain and hostname.
    #[default]
    Default,
    /// Accept any certificate for any hostname.
    ///
    /// **Insecure.** Intended only for development against self-signed servers.
    TrustAll,
}

/// Built TLS configurations, keyed by policy.
///
/// Owned by an executor so root stores are loaded once per executor rather than per
/// exchange.
#[derive(Debug, Default)]
pub struct TlsConfigCache {
    configs: Mutex<HashMap<(TrustMode, bool), Arc<ClientConfig>>>,
}

impl TlsConfigCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(
        &self,
        trust_mode: TrustMode,
        use_native_certs: bool,
    ) -> Result<Arc<ClientConfig>, TlsError> {
        let key = (trust_mode, use_native_certs);
        if let Ok(configs) = self.configs.lock() {
            if let Some(config) = configs.get(&key) {
                return Ok(Arc::clone(config));
            }
        }

        let config = Arc::new(client_config(trust_mode, use_native_certs)?);
        if let Ok(mut configs) = self.configs.lock() {
            configs.insert(key, Arc::clone(&config));
        }
        Ok(config)
    }
}

fn provider() -> Arc<CryptoProvider> {
    Arc::new(rustls::crypto::ring::default_provider())
}

/// Build a rustls client configuration for the given policy.
pub fn client_config(
    trust_mode: TrustMode,
    use_native_certs: bool,
) -> Result<ClientConfig, TlsError> {
    let provider = provider();
    let builder = ClientConfig::builder_with_provider(Arc::clone(&provider))
        .with_safe_default_protocol_versions()?;

    let mut config = match trust_mode {
        TrustMode::Default => builder
            .with_root_certificates(root_store(use_native_certs)?)
            .with_no_client_auth(),
        TrustMode::TrustAll => {
            tracing::warn!(
                target: "courier::tls",
                "Certificate verification disabled; trust-all mode is insecure"
            );
            builder
                .dangerous()
                .with_custom_certificate_verifier(Arc::new(TrustAllVerifier::new(&provider)))
                .with_no_client_auth()
        }
    };

    config.alpn_protocols = vec![b"http/1.1".to_vec()];
    Ok(config)
}

fn root_store(use_native_certs: bool) -> Result<RootCertStore, TlsError> {
    let mut root_store = RootCertStore::empty();
    root_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

    if use_native_certs {
        let cert_result = rustls_native_certs::load_native_certs();
        let (added, ignored) = root_store.add_parsable_certificates(cert_result.certs);
        for err in &cert_result.errors {
            tracing::warn!(target: "courier::tls", error = %err, "Certificate load error");
        }
        tracing::debug!(
            target: "courier::tls",
            added,
            ignored,
            total = root_store.len(),
            "Loaded system certificates"
        );
    }

    if root_store.is_empty() {
        return Err(TlsError::EmptyRootStore);
    }
    Ok(root_store)
}

/// Accepts every server certificate. Handshake signatures are not checked either.
#[derive(Debug)]
struct TrustAllVerifier {
    schemes: WebPkiSupportedAlgorithms,
}

impl TrustAllVerifier {
    fn new(provider: &CryptoProvider) -> Self {
        Self {
            schemes: provider.signature_verification_algorithms,
        }
    }
}

impl ServerCertVerifier for TrustAllVerifier {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.schemes.supported_schemes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_modes_build() {
        let cache = TlsConfigCache::new();
        let verified = cache.get(TrustMode::Default, false).unwrap();
        let trust_all = cache.get(TrustMode::TrustAll, false).unwrap();
        assert_eq!(verified.alpn_protocols, vec![b"http/1.1".to_vec()]);
        assert_eq!(trust_all.alpn_protocols, vec![b"http/1.1".to_vec()]);
    }

    #[test]
    fn configs_are_reused() {
        let cache = TlsConfigCache::new();
        let first = cache.get(TrustMode::TrustAll, false).unwrap();
        let second = cache.get(TrustMode::TrustAll, false).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }
}
