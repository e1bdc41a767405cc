//! TLS-specific error types for credential loading, session setup and trust decisions

use std::fmt;

/// Why a credential or trust store could not be loaded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadFailure {
    /// The password does not open the store
    BadPassword,
    /// The bytes are truncated, tampered with, or hold the wrong PEM sections
    CorruptStore,
    /// The format tag or the store's format version is not understood
    UnsupportedFormat,
}

impl fmt::Display for LoadFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadFailure::BadPassword => f.write_str("bad password"),
            LoadFailure::CorruptStore => f.write_str("corrupt store"),
            LoadFailure::UnsupportedFormat => f.write_str("unsupported format"),
        }
    }
}

/// Store loading failed; fatal, no session can be built from this store
#[derive(Debug, Clone, thiserror::Error)]
#[error("certificate store load failed ({reason}): {detail}")]
pub struct CertificateLoadError {
    pub reason: LoadFailure,
    pub detail: String,
}

impl CertificateLoadError {
    pub(crate) fn bad_password(detail: impl Into<String>) -> Self {
        Self { reason: LoadFailure::BadPassword, detail: detail.into() }
    }

    pub(crate) fn corrupt(detail: impl Into<String>) -> Self {
        Self { reason: LoadFailure::CorruptStore, detail: detail.into() }
    }

    pub(crate) fn unsupported(detail: impl Into<String>) -> Self {
        Self { reason: LoadFailure::UnsupportedFormat, detail: detail.into() }
    }
}

/// Credential and trust chain could not be combined into a session configuration
#[derive(Debug, thiserror::Error)]
pub enum TlsSetupError {
    #[error("trust chain has no verifiers")]
    EmptyTrustChain,
    #[error("client certificate chain is empty")]
    EmptyCertificateChain,
    #[error("private key is not supported by the crypto provider: {0}")]
    UnsupportedKey(String),
    #[error("private key does not match the client certificate public key")]
    KeyMismatch,
    #[error("client certificate could not be parsed: {0}")]
    CertificateParsing(String),
    #[error("TLS configuration rejected: {0}")]
    Rejected(#[from] rustls::Error),
}

/// A presented certificate chain or hostname was not trusted
#[derive(Debug, Clone, thiserror::Error)]
pub enum TlsTrustError {
    #[error("no trust verifiers configured; refusing every certificate chain")]
    NoVerifiers,
    #[error("peer presented an empty certificate chain")]
    EmptyChain,
    #[error("certificate chain rejected by all {verifiers} verifier(s): {last_cause}")]
    Rejected { verifiers: usize, last_cause: String },
    #[error("certificate is not valid for hostname {hostname}")]
    HostnameMismatch { hostname: String },
}
