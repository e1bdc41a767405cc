//! Certificate inspection used by the static setup checks

use der::Decode;
use ring::rand::SystemRandom;
use ring::signature::{self, EcdsaKeyPair, Ed25519KeyPair, KeyPair, RsaKeyPair};
use rustls::pki_types::CertificateDer;
use rustls::sign::SigningKey;
use x509_cert::Certificate;
use x509_cert::spki::SubjectPublicKeyInfoOwned;

use super::errors::TlsSetupError;
use super::types::{KeyEncoding, SecureKeyMaterial};

/// Parse DER bytes into an X.509 certificate
pub(crate) fn parse(cert: &CertificateDer<'_>) -> Result<Certificate, TlsSetupError> {
    Certificate::from_der(cert.as_ref())
        .map_err(|e| TlsSetupError::CertificateParsing(format!("invalid DER: {e}")))
}

/// Subject distinguished name in RFC 4514 form, for logs
pub(crate) fn subject_name(cert: &Certificate) -> String {
    cert.tbs_certificate.subject.to_string()
}

/// Raw subject public key bits of a certificate
fn public_key_bits(cert: &Certificate) -> &[u8] {
    cert.tbs_certificate.subject_public_key_info.subject_public_key.raw_bytes()
}

/// Public key bits of the signing key the crypto provider loaded
fn signing_key_bits(signing_key: &dyn SigningKey) -> Result<Option<Vec<u8>>, TlsSetupError> {
    let Some(spki) = signing_key.public_key() else {
        return Ok(None);
    };
    let spki = SubjectPublicKeyInfoOwned::from_der(spki.as_ref())
        .map_err(|e| TlsSetupError::UnsupportedKey(format!("unreadable public key: {e}")))?;
    Ok(Some(spki.subject_public_key.raw_bytes().to_vec()))
}

/// Public key derived with ring, for providers that do not expose one
///
/// Returns `Ok(None)` for SEC1 keys, which carry no algorithm identifier that
/// ring can load on its own.
fn derive_public_key(key: &SecureKeyMaterial) -> Result<Option<Vec<u8>>, TlsSetupError> {
    let der = key.as_bytes();
    match key.encoding() {
        KeyEncoding::Pkcs8 => {
            let rng = SystemRandom::new();
            let ecdsa_algs = [
                &signature::ECDSA_P256_SHA256_ASN1_SIGNING,
                &signature::ECDSA_P384_SHA384_ASN1_SIGNING,
            ];
            for alg in ecdsa_algs {
                if let Ok(pair) = EcdsaKeyPair::from_pkcs8(alg, der, &rng) {
                    return Ok(Some(pair.public_key().as_ref().to_vec()));
                }
            }
            if let Ok(pair) = Ed25519KeyPair::from_pkcs8_maybe_unchecked(der) {
                return Ok(Some(pair.public_key().as_ref().to_vec()));
            }
            match RsaKeyPair::from_pkcs8(der) {
                Ok(pair) => Ok(Some(pair.public_key().as_ref().to_vec())),
                Err(e) => Err(TlsSetupError::UnsupportedKey(format!("PKCS#8 key rejected: {e}"))),
            }
        }
        KeyEncoding::Pkcs1 => RsaKeyPair::from_der(der)
            .map(|pair| Some(pair.public_key().as_ref().to_vec()))
            .map_err(|e| TlsSetupError::UnsupportedKey(format!("PKCS#1 key rejected: {e}"))),
        KeyEncoding::Sec1 => Ok(None),
    }
}

/// Fail unless the private key belongs to the leaf certificate
pub(crate) fn ensure_key_matches(
    leaf: &CertificateDer<'_>,
    signing_key: &dyn SigningKey,
    key: &SecureKeyMaterial,
) -> Result<(), TlsSetupError> {
    let cert = parse(leaf)?;

    let derived = match signing_key_bits(signing_key)? {
        Some(bits) => bits,
        None => match derive_public_key(key)? {
            Some(bits) => bits,
            None => {
                tracing::debug!(
                    target: "tether::tls",
                    "No public key available for SEC1 key; the handshake will surface a mismatch"
                );
                return Ok(());
            }
        },
    };

    if derived.as_slice() != public_key_bits(&cert) {
        tracing::debug!(
            target: "tether::tls",
            subject = %subject_name(&cert),
            "Client key does not match certificate"
        );
        return Err(TlsSetupError::KeyMismatch);
    }
    Ok(())
}
