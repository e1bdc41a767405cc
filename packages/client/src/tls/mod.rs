//! Mutual TLS: pinned credential stores, trust chains and session configuration
//!
//! Startup flow: load the client identity and one or more trust stores with
//! [`CertificateStore`], collect the anchors into a [`TrustChain`], then let
//! [`SecureTransportFactory`] combine them into a [`TlsSessionConfig`] that
//! every connection shares.

pub(crate) mod certificate;
pub mod errors;
pub mod hostname;
pub mod sealed;
pub mod store;
pub mod transport;
pub mod trust_chain;
pub mod types;

pub use errors::{CertificateLoadError, LoadFailure, TlsSetupError, TlsTrustError};
pub use hostname::{HostnameVerification, HostnameVerifier, StandardHostnameVerifier, danger};
pub use sealed::seal;
pub use store::CertificateStore;
pub use transport::{SecureTransportFactory, TlsProtocol, TlsSessionConfig, TransportOptions};
pub use trust_chain::{AnchorVerifier, AuthType, ChainVerifier, TrustChain};
pub use types::{
    CredentialMaterial, KeyEncoding, PBKDF2_ITERATIONS, StoreFormat, StorePassword, TrustAnchors,
};
