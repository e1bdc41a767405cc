//! Loading pinned client identity and trust anchors from store blobs

use std::io::BufReader;
use std::path::Path;

use rustls::pki_types::CertificateDer;
use rustls_pemfile::Item;
use zeroize::Zeroizing;

use super::errors::CertificateLoadError;
use super::sealed;
use super::types::{
    CredentialMaterial, KeyEncoding, SecureKeyMaterial, StoreFormat, StorePassword, TrustAnchors,
};

/// Loader for credential and trust stores
///
/// Stores are opaque byte blobs. The caller reads them from wherever they are
/// pinned (bundled asset, keychain export, disk); this type never touches the
/// network. Each call consumes its password, which is wiped on return.
pub struct CertificateStore;

/// Sections found in a decoded PEM bundle
struct StoreContents {
    certificates: Vec<CertificateDer<'static>>,
    keys: Vec<SecureKeyMaterial>,
}

impl CertificateStore {
    /// Load the client certificate chain and private key
    ///
    /// The store must hold at least one certificate (leaf first) and exactly
    /// one private key.
    ///
    /// # Errors
    ///
    /// `CertificateLoadError` with `BadPassword`, `CorruptStore` or
    /// `UnsupportedFormat`.
    pub fn load_identity(
        store: &[u8],
        password: StorePassword,
        format: StoreFormat,
    ) -> Result<CredentialMaterial, CertificateLoadError> {
        let StoreContents { certificates, mut keys } = read_store(store, password, format)?;

        if certificates.is_empty() {
            return Err(CertificateLoadError::corrupt("identity store contains no certificate"));
        }
        let key = match keys.len() {
            1 => keys.remove(0),
            0 => return Err(CertificateLoadError::corrupt("identity store contains no private key")),
            n => {
                return Err(CertificateLoadError::corrupt(format!(
                    "identity store contains {n} private keys, expected exactly one"
                )));
            }
        };

        tracing::debug!(
            target: "tether::tls",
            certificates = certificates.len(),
            key = ?key.encoding(),
            "Loaded client identity"
        );
        Ok(CredentialMaterial { chain: certificates, key })
    }

    /// Load the CA certificates a verifier should accept
    ///
    /// # Errors
    ///
    /// `CertificateLoadError` with `BadPassword`, `CorruptStore` or
    /// `UnsupportedFormat`. A trust store carrying a private key is corrupt.
    pub fn load_trust(
        store: &[u8],
        password: StorePassword,
        format: StoreFormat,
    ) -> Result<TrustAnchors, CertificateLoadError> {
        let StoreContents { certificates, keys } = read_store(store, password, format)?;

        if !keys.is_empty() {
            return Err(CertificateLoadError::corrupt("trust store must not contain private keys"));
        }
        if certificates.is_empty() {
            return Err(CertificateLoadError::corrupt("trust store contains no certificate"));
        }

        let anchors = TrustAnchors::from_certificates(certificates)?;
        tracing::debug!(target: "tether::tls", anchors = anchors.len(), "Loaded trust anchors");
        Ok(anchors)
    }

    /// Read `path` and delegate to [`CertificateStore::load_identity`]
    ///
    /// # Errors
    ///
    /// An unreadable file is reported as `CorruptStore`.
    pub fn load_identity_file(
        path: impl AsRef<Path>,
        password: StorePassword,
        format: StoreFormat,
    ) -> Result<CredentialMaterial, CertificateLoadError> {
        let bytes = read_file(path.as_ref())?;
        Self::load_identity(&bytes, password, format)
    }

    /// Read `path` and delegate to [`CertificateStore::load_trust`]
    ///
    /// # Errors
    ///
    /// An unreadable file is reported as `CorruptStore`.
    pub fn load_trust_file(
        path: impl AsRef<Path>,
        password: StorePassword,
        format: StoreFormat,
    ) -> Result<TrustAnchors, CertificateLoadError> {
        let bytes = read_file(path.as_ref())?;
        Self::load_trust(&bytes, password, format)
    }
}

fn read_file(path: &Path) -> Result<Zeroizing<Vec<u8>>, CertificateLoadError> {
    std::fs::read(path).map(Zeroizing::new).map_err(|e| {
        CertificateLoadError::corrupt(format!("failed to read store {}: {e}", path.display()))
    })
}

fn read_store(
    store: &[u8],
    password: StorePassword,
    format: StoreFormat,
) -> Result<StoreContents, CertificateLoadError> {
    match format {
        StoreFormat::Pem => {
            if !password.is_empty() {
                return Err(CertificateLoadError::bad_password(
                    "plaintext PEM store does not take a password",
                ));
            }
            drop(password);
            parse_pem(store)
        }
        StoreFormat::Sealed => {
            let plaintext = sealed::open(store, &password)?;
            drop(password);
            parse_pem(&plaintext)
        }
    }
}

fn parse_pem(pem: &[u8]) -> Result<StoreContents, CertificateLoadError> {
    let mut reader = BufReader::new(pem);
    let mut contents = StoreContents { certificates: Vec::new(), keys: Vec::new() };

    for item in rustls_pemfile::read_all(&mut reader) {
        let item = item
            .map_err(|e| CertificateLoadError::corrupt(format!("malformed PEM section: {e}")))?;
        match item {
            Item::X509Certificate(cert) => contents.certificates.push(cert),
            Item::Pkcs8Key(key) => contents
                .keys
                .push(SecureKeyMaterial::new(KeyEncoding::Pkcs8, key.secret_pkcs8_der().to_vec())),
            Item::Pkcs1Key(key) => contents
                .keys
                .push(SecureKeyMaterial::new(KeyEncoding::Pkcs1, key.secret_pkcs1_der().to_vec())),
            Item::Sec1Key(key) => contents
                .keys
                .push(SecureKeyMaterial::new(KeyEncoding::Sec1, key.secret_sec1_der().to_vec())),
            _ => tracing::debug!(target: "tether::tls", "Ignoring unrelated PEM section in store"),
        }
    }

    if contents.certificates.is_empty() && contents.keys.is_empty() {
        return Err(CertificateLoadError::corrupt("store contains no PEM sections"));
    }
    Ok(contents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tls::errors::LoadFailure;

    #[test]
    fn non_empty_password_on_pem_store_is_rejected() {
        let err = CertificateStore::load_trust(b"", StorePassword::new("secret"), StoreFormat::Pem)
            .unwrap_err();
        assert_eq!(err.reason, LoadFailure::BadPassword);
    }

    #[test]
    fn garbage_is_corrupt() {
        let err = CertificateStore::load_trust(
            b"definitely not pem",
            StorePassword::empty(),
            StoreFormat::Pem,
        )
        .unwrap_err();
        assert_eq!(err.reason, LoadFailure::CorruptStore);
    }

    #[test]
    fn foreign_format_tags_are_unsupported() {
        for tag in ["bks", "jks", "pkcs12", ""] {
            let err = tag.parse::<StoreFormat>().unwrap_err();
            assert_eq!(err.reason, LoadFailure::UnsupportedFormat, "tag {tag:?}");
        }
        assert_eq!("PEM".parse::<StoreFormat>().unwrap(), StoreFormat::Pem);
    }
}
