//! Ordered certificate chain verifiers with OR semantics
//!
//! A client often has to trust more than one CA at once: a public root set for
//! ordinary endpoints and a privately pinned CA for its own backend, or staging
//! and production roots during a rotation. Rather than merging them into a
//! single store, each set becomes its own verifier and a chain is accepted when
//! any one verifier accepts it.

use std::fmt;
use std::sync::Arc;

use rustls::DistinguishedName;
use rustls::pki_types::{CertificateDer, SignatureVerificationAlgorithm, UnixTime};

use super::errors::TlsTrustError;
use super::types::TrustAnchors;

/// Which side of the connection presented the chain
///
/// Selects the extended key usage the end-entity certificate must carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthType {
    Server,
    Client,
}

impl AuthType {
    fn key_usage(self) -> webpki::KeyUsage {
        match self {
            AuthType::Server => webpki::KeyUsage::server_auth(),
            AuthType::Client => webpki::KeyUsage::client_auth(),
        }
    }
}

/// A single source of trust
pub trait ChainVerifier: fmt::Debug + Send + Sync {
    /// Validate `chain` (end-entity first) at time `now`
    ///
    /// # Errors
    ///
    /// Returns `TlsTrustError` describing why the chain is not trusted.
    fn validate(
        &self,
        chain: &[CertificateDer<'_>],
        auth_type: AuthType,
        now: UnixTime,
    ) -> Result<(), TlsTrustError>;

    /// Subjects of the issuers this verifier accepts
    fn accepted_issuers(&self) -> Vec<DistinguishedName>;
}

/// Path-building verifier over one set of trust anchors
pub struct AnchorVerifier {
    anchors: TrustAnchors,
    algorithms: &'static [&'static dyn SignatureVerificationAlgorithm],
}

impl AnchorVerifier {
    pub fn new(anchors: TrustAnchors) -> Self {
        Self {
            anchors,
            algorithms: rustls::crypto::ring::default_provider().signature_verification_algorithms.all,
        }
    }

    pub fn anchors(&self) -> &TrustAnchors {
        &self.anchors
    }
}

impl fmt::Debug for AnchorVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnchorVerifier").field("anchors", &self.anchors.len()).finish()
    }
}

impl ChainVerifier for AnchorVerifier {
    fn validate(
        &self,
        chain: &[CertificateDer<'_>],
        auth_type: AuthType,
        now: UnixTime,
    ) -> Result<(), TlsTrustError> {
        let Some((end_entity, intermediates)) = chain.split_first() else {
            return Err(TlsTrustError::EmptyChain);
        };

        let cert = webpki::EndEntityCert::try_from(end_entity).map_err(|e| {
            TlsTrustError::Rejected { verifiers: 1, last_cause: format!("bad end-entity certificate: {e}") }
        })?;

        cert.verify_for_usage(
            self.algorithms,
            &self.anchors.roots.roots,
            intermediates,
            now,
            auth_type.key_usage(),
            None,
            None,
        )
        .map(|_| ())
        .map_err(|e| TlsTrustError::Rejected { verifiers: 1, last_cause: e.to_string() })
    }

    fn accepted_issuers(&self) -> Vec<DistinguishedName> {
        self.anchors.roots.subjects()
    }
}

/// Ordered set of verifiers
///
/// An empty chain of verifiers rejects everything.
#[derive(Debug, Clone, Default)]
pub struct TrustChain {
    verifiers: Vec<Arc<dyn ChainVerifier>>,
}

impl TrustChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a verifier for `anchors`; duplicates are kept
    pub fn add_verifier(&mut self, anchors: TrustAnchors) -> &mut Self {
        self.verifiers.push(Arc::new(AnchorVerifier::new(anchors)));
        self
    }

    /// Append an arbitrary verifier
    pub fn add_chain_verifier(&mut self, verifier: Arc<dyn ChainVerifier>) -> &mut Self {
        self.verifiers.push(verifier);
        self
    }

    pub fn len(&self) -> usize {
        self.verifiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.verifiers.is_empty()
    }

    /// Every verifier's accepted issuers, concatenated in insertion order
    pub fn accepted_issuers(&self) -> Vec<DistinguishedName> {
        self.verifiers.iter().flat_map(|v| v.accepted_issuers()).collect()
    }

    /// Accept `chain` if at least one verifier does
    ///
    /// # Errors
    ///
    /// - `NoVerifiers` when the chain is empty of verifiers
    /// - `EmptyChain` when no certificate was presented
    /// - `Rejected` carrying the last verifier's cause when all of them refuse
    pub fn validate(
        &self,
        chain: &[CertificateDer<'_>],
        auth_type: AuthType,
        now: UnixTime,
    ) -> Result<(), TlsTrustError> {
        if self.verifiers.is_empty() {
            tracing::warn!(target: "tether::tls", "Trust chain has no verifiers, rejecting");
            return Err(TlsTrustError::NoVerifiers);
        }
        if chain.is_empty() {
            return Err(TlsTrustError::EmptyChain);
        }

        let mut last_cause = String::new();
        for (index, verifier) in self.verifiers.iter().enumerate() {
            match verifier.validate(chain, auth_type, now) {
                Ok(()) => {
                    tracing::debug!(target: "tether::tls", verifier = index, "Certificate chain accepted");
                    return Ok(());
                }
                Err(TlsTrustError::Rejected { last_cause: cause, .. }) => last_cause = cause,
                Err(other) => last_cause = other.to_string(),
            }
        }

        Err(TlsTrustError::Rejected { verifiers: self.verifiers.len(), last_cause })
    }
}
