//! Hostname verification, kept separate from chain validation

use std::fmt;
use std::sync::Arc;

use rustls::pki_types::{CertificateDer, ServerName};

/// Decides whether an end-entity certificate is valid for a hostname
pub trait HostnameVerifier: fmt::Debug + Send + Sync {
    fn verify(&self, hostname: &str, end_entity: &CertificateDer<'_>) -> bool;
}

/// RFC 6125 matching against the certificate's subject alternative names
///
/// Single-label wildcards only; the common name is never consulted. IP
/// literals match IP address SANs.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardHostnameVerifier;

impl HostnameVerifier for StandardHostnameVerifier {
    fn verify(&self, hostname: &str, end_entity: &CertificateDer<'_>) -> bool {
        let Ok(name) = ServerName::try_from(hostname) else {
            tracing::debug!(target: "tether::tls", hostname, "Hostname is not a valid DNS name or IP");
            return false;
        };
        let Ok(cert) = webpki::EndEntityCert::try_from(end_entity) else {
            return false;
        };
        cert.verify_is_valid_for_subject_name(&name).is_ok()
    }
}

/// Verifiers that weaken security
///
/// Nothing in here is used unless a caller names it explicitly.
pub mod danger {
    use super::*;

    /// Accepts every hostname
    ///
    /// Chain validation still runs. Only for test rigs that address a server by
    /// an IP or alias absent from its certificate.
    #[derive(Debug, Clone, Copy)]
    pub struct AcceptAnyHostname {
        _private: (),
    }

    impl AcceptAnyHostname {
        pub(crate) fn new() -> Self {
            Self { _private: () }
        }
    }

    impl HostnameVerifier for AcceptAnyHostname {
        fn verify(&self, _hostname: &str, _end_entity: &CertificateDer<'_>) -> bool {
            true
        }
    }
}

/// Hostname policy for a transport
#[derive(Debug, Clone)]
pub enum HostnameVerification {
    Standard,
    Custom(Arc<dyn HostnameVerifier>),
    Insecure(danger::AcceptAnyHostname),
}

impl Default for HostnameVerification {
    fn default() -> Self {
        HostnameVerification::Standard
    }
}

impl HostnameVerification {
    /// Disable hostname checks for every connection built with this policy
    ///
    /// A warning is logged whenever a transport is built with it.
    pub fn dangerously_accept_any() -> Self {
        HostnameVerification::Insecure(danger::AcceptAnyHostname::new())
    }

    pub fn custom(verifier: Arc<dyn HostnameVerifier>) -> Self {
        HostnameVerification::Custom(verifier)
    }

    pub fn is_insecure(&self) -> bool {
        matches!(self, HostnameVerification::Insecure(_))
    }

    pub(crate) fn verifier(&self) -> Arc<dyn HostnameVerifier> {
        match self {
            HostnameVerification::Standard => Arc::new(StandardHostnameVerifier),
            HostnameVerification::Custom(verifier) => Arc::clone(verifier),
            HostnameVerification::Insecure(verifier) => Arc::new(*verifier),
        }
    }
}
