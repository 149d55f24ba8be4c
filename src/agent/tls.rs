//! TLS transport built from an optional root CA.

use std::fmt;

use aws_smithy_http_client::tls::{TlsContext, TrustStore};
use rustls::pki_types::{pem::PemObject, CertificateDer};
use rustls::RootCertStore;
use tracing::{debug, warn};

use super::error::TlsError;
use crate::TRACING_TARGET_TLS;

/// Trust configuration for connections made by the agent's HTTP client.
///
/// Native roots are always trusted; a supplied root CA is added on top.
pub struct TlsTransport {
    context: TlsContext,
    custom_roots: usize,
}

impl TlsTransport {
    /// Builds a transport from PEM encoded CA bytes.
    ///
    /// `None` or an empty slice yields system trust. Otherwise every PEM
    /// `CERTIFICATE` block must be a valid trust anchor, and at least one
    /// must be present.
    pub fn from_root_ca(root_ca: Option<&[u8]>) -> Result<Self, TlsError> {
        let pem = match root_ca {
            Some(pem) if !pem.is_empty() => pem,
            _ => {
                debug!(target: TRACING_TARGET_TLS, "No root CA supplied, using system trust");
                return Self::with_trust_store(TrustStore::default(), 0);
            }
        };

        let custom_roots = check_root_ca(pem)?;
        debug!(
            target: TRACING_TARGET_TLS,
            certificates = custom_roots,
            "Trusting supplied root CA"
        );

        let trust_store = TrustStore::default()
            .with_native_roots(true)
            .with_pem_certificate(pem.to_vec());
        Self::with_trust_store(trust_store, custom_roots)
    }

    fn with_trust_store(trust_store: TrustStore, custom_roots: usize) -> Result<Self, TlsError> {
        let context = TlsContext::builder()
            .with_trust_store(trust_store)
            .build()
            .map_err(|e| TlsError::Context(e.into()))?;
        Ok(Self {
            context,
            custom_roots,
        })
    }

    /// Number of certificates trusted in addition to the system roots.
    pub fn custom_root_count(&self) -> usize {
        self.custom_roots
    }

    pub fn has_custom_roots(&self) -> bool {
        self.custom_roots > 0
    }

    pub(crate) fn into_context(self) -> TlsContext {
        self.context
    }
}

impl fmt::Debug for TlsTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TlsTransport")
            .field("custom_roots", &self.custom_roots)
            .finish_non_exhaustive()
    }
}

/// Parses every certificate in `pem` into a scratch root store, returning
/// how many were accepted.
fn check_root_ca(pem: &[u8]) -> Result<usize, TlsError> {
    let mut store = RootCertStore::empty();

    for (index, cert) in CertificateDer::pem_slice_iter(pem).enumerate() {
        let cert = cert.map_err(|err| TlsError::Pem(format!("{err:?}")))?;
        store.add(cert).map_err(|source| {
            warn!(target: TRACING_TARGET_TLS, index, error = %source, "Rejected root CA certificate");
            TlsError::InvalidCertificate { index, source }
        })?;
    }

    if store.is_empty() {
        return Err(TlsError::NoCertificates);
    }

    Ok(store.len())
}
