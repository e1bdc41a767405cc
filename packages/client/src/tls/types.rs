//! Core types for credential and trust material

use std::fmt;
use std::str::FromStr;

use rustls::RootCertStore;
use rustls::pki_types::{
    CertificateDer, PrivateKeyDer, PrivatePkcs1KeyDer, PrivatePkcs8KeyDer, PrivateSec1KeyDer,
};
use zeroize::Zeroizing;

use super::errors::CertificateLoadError;

// PBKDF2 iteration count constant (OWASP 2024 minimum)
pub const PBKDF2_ITERATIONS: u32 = 600_000;

/// Password protecting a credential or trust store
///
/// The inner string is wiped when the value is dropped. Loading consumes the
/// password, so it lives no longer than the load call.
pub struct StorePassword(Zeroizing<String>);

impl StorePassword {
    pub fn new(password: impl Into<String>) -> Self {
        Self(Zeroizing::new(password.into()))
    }

    /// Password for plaintext stores
    pub fn empty() -> Self {
        Self(Zeroizing::new(String::new()))
    }

    pub(crate) fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<String> for StorePassword {
    fn from(password: String) -> Self {
        Self::new(password)
    }
}

impl From<&str> for StorePassword {
    fn from(password: &str) -> Self {
        Self::new(password)
    }
}

impl fmt::Debug for StorePassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("StorePassword(<redacted>)")
    }
}

/// On-disk layout of a credential or trust store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreFormat {
    /// Plaintext PEM bundle; requires an empty password
    Pem,
    /// PEM bundle sealed with PBKDF2-HMAC-SHA256 and AES-256-GCM
    Sealed,
}

impl StoreFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreFormat::Pem => "pem",
            StoreFormat::Sealed => "sealed",
        }
    }
}

impl FromStr for StoreFormat {
    type Err = CertificateLoadError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "pem" => Ok(StoreFormat::Pem),
            "sealed" => Ok(StoreFormat::Sealed),
            other => Err(CertificateLoadError::unsupported(format!(
                "store format '{other}' is not supported (expected 'pem' or 'sealed')"
            ))),
        }
    }
}

impl fmt::Display for StoreFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Encoding of a loaded private key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEncoding {
    Pkcs8,
    Pkcs1,
    Sec1,
}

/// Secure key material that zeroes on drop
pub struct SecureKeyMaterial {
    encoding: KeyEncoding,
    data: Zeroizing<Vec<u8>>,
}

impl SecureKeyMaterial {
    pub(crate) fn new(encoding: KeyEncoding, data: Vec<u8>) -> Self {
        Self { encoding, data: Zeroizing::new(data) }
    }

    pub fn encoding(&self) -> KeyEncoding {
        self.encoding
    }

    pub(crate) fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Copy into the DER wrapper rustls consumes
    pub(crate) fn to_key_der(&self) -> PrivateKeyDer<'static> {
        let bytes = self.data.to_vec();
        match self.encoding {
            KeyEncoding::Pkcs8 => PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(bytes)),
            KeyEncoding::Pkcs1 => PrivateKeyDer::Pkcs1(PrivatePkcs1KeyDer::from(bytes)),
            KeyEncoding::Sec1 => PrivateKeyDer::Sec1(PrivateSec1KeyDer::from(bytes)),
        }
    }
}

impl fmt::Debug for SecureKeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecureKeyMaterial")
            .field("encoding", &self.encoding)
            .field("data", &"<redacted>")
            .finish()
    }
}

/// Client certificate chain and private key from an identity store
///
/// Not `Clone`; moved into the transport factory.
#[derive(Debug)]
pub struct CredentialMaterial {
    pub(crate) chain: Vec<CertificateDer<'static>>,
    pub(crate) key: SecureKeyMaterial,
}

impl CredentialMaterial {
    /// Leaf certificate first, then any intermediates in store order
    pub fn certificate_chain(&self) -> &[CertificateDer<'static>] {
        &self.chain
    }

    pub fn leaf(&self) -> Option<&CertificateDer<'static>> {
        self.chain.first()
    }

    pub fn key_encoding(&self) -> KeyEncoding {
        self.key.encoding()
    }
}

/// CA certificates accepted as roots of trust
#[derive(Debug, Clone)]
pub struct TrustAnchors {
    pub(crate) roots: RootCertStore,
    pub(crate) certificates: Vec<CertificateDer<'static>>,
}

impl TrustAnchors {
    pub(crate) fn from_certificates(
        certificates: Vec<CertificateDer<'static>>,
    ) -> Result<Self, CertificateLoadError> {
        let mut roots = RootCertStore::empty();
        for (index, cert) in certificates.iter().enumerate() {
            roots.add(cert.clone()).map_err(|e| {
                CertificateLoadError::corrupt(format!(
                    "certificate {index} is not a usable trust anchor: {e}"
                ))
            })?;
        }
        Ok(Self { roots, certificates })
    }

    /// Mozilla's public root set as shipped by `webpki-roots`
    pub fn public_roots() -> Self {
        let mut roots = RootCertStore::empty();
        roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
        Self { roots, certificates: Vec::new() }
    }

    /// Roots from the platform certificate store
    ///
    /// Individual certificates the platform hands back but rustls cannot use
    /// are skipped with a warning; an empty result is an error.
    pub fn native() -> Result<Self, CertificateLoadError> {
        let result = rustls_native_certs::load_native_certs();
        for err in &result.errors {
            tracing::warn!("Platform certificate load error: {}", err);
        }

        let mut roots = RootCertStore::empty();
        let (added, ignored) = roots.add_parsable_certificates(result.certs.iter().cloned());
        if ignored > 0 {
            tracing::warn!("Skipped {} unparsable platform certificates", ignored);
        }
        if added == 0 {
            return Err(CertificateLoadError::corrupt(
                "platform certificate store has no usable roots",
            ));
        }

        tracing::debug!("Loaded {} platform certificates", added);
        Ok(Self { roots, certificates: result.certs })
    }

    pub fn len(&self) -> usize {
        self.roots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Source certificates, when the anchors came from certificates
    pub fn certificates(&self) -> &[CertificateDer<'static>] {
        &self.certificates
    }
}
