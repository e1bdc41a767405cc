//! Password-sealed store format
//!
//! Layout: `[magic:4][version:1][iterations:4 BE][salt:32][nonce:12][ciphertext+tag]`.
//! The 53-byte header is bound as AES-256-GCM associated data, so editing the
//! iteration count or version is detected as tampering.

use ring::{aead, pbkdf2, rand};
use zeroize::Zeroizing;

use super::errors::CertificateLoadError;
use super::types::StorePassword;

const MAGIC: &[u8; 4] = b"TKS1";
const VERSION: u8 = 1;
const SALT_LEN: usize = 32;
const NONCE_LEN: usize = 12;
const HEADER_LEN: usize = 4 + 1 + 4 + SALT_LEN + NONCE_LEN;
const TAG_LEN: usize = 16;

/// Seal a PEM bundle with a password
///
/// Used when packaging pinned credentials at build time. `iterations` must be
/// non-zero; use [`super::types::PBKDF2_ITERATIONS`] for production stores.
///
/// # Errors
///
/// Returns `CertificateLoadError` with `UnsupportedFormat` if `iterations` is
/// zero, or `CorruptStore` if the system RNG or the cipher fails.
pub fn seal(
    plaintext: &[u8],
    password: &StorePassword,
    iterations: u32,
) -> Result<Vec<u8>, CertificateLoadError> {
    let Some(rounds) = std::num::NonZeroU32::new(iterations) else {
        return Err(CertificateLoadError::unsupported("PBKDF2 iteration count must be non-zero"));
    };

    let rng = rand::SystemRandom::new();
    let mut salt = [0u8; SALT_LEN];
    rand::SecureRandom::fill(&rng, &mut salt)
        .map_err(|_| CertificateLoadError::corrupt("failed to generate random salt"))?;
    let mut nonce_bytes = [0u8; NONCE_LEN];
    rand::SecureRandom::fill(&rng, &mut nonce_bytes)
        .map_err(|_| CertificateLoadError::corrupt("failed to generate random nonce"))?;

    let mut header = Vec::with_capacity(HEADER_LEN + plaintext.len() + TAG_LEN);
    header.extend_from_slice(MAGIC);
    header.push(VERSION);
    header.extend_from_slice(&iterations.to_be_bytes());
    header.extend_from_slice(&salt);
    header.extend_from_slice(&nonce_bytes);

    let key = derive_key(rounds, &salt, password)?;
    let nonce = aead::Nonce::assume_unique_for_key(nonce_bytes);

    let mut sealed = plaintext.to_vec();
    key.seal_in_place_append_tag(nonce, aead::Aad::from(&header[..]), &mut sealed)
        .map_err(|_| CertificateLoadError::corrupt("encryption failed"))?;

    header.extend_from_slice(&sealed);
    Ok(header)
}

/// Open a sealed store, returning the plaintext PEM bundle
///
/// # Errors
///
/// - `CorruptStore` if the data is truncated or does not start with the magic
/// - `UnsupportedFormat` if the version byte is unknown
/// - `BadPassword` if authentication fails; a tampered body is
///   indistinguishable from a wrong password and reported the same way
pub(crate) fn open(
    data: &[u8],
    password: &StorePassword,
) -> Result<Zeroizing<Vec<u8>>, CertificateLoadError> {
    if data.len() < HEADER_LEN + TAG_LEN {
        return Err(CertificateLoadError::corrupt(format!(
            "sealed store is {} bytes, shorter than the {} byte minimum",
            data.len(),
            HEADER_LEN + TAG_LEN
        )));
    }
    if &data[0..4] != MAGIC {
        return Err(CertificateLoadError::corrupt("sealed store magic mismatch"));
    }
    if data[4] != VERSION {
        return Err(CertificateLoadError::unsupported(format!(
            "sealed store version {} is not supported",
            data[4]
        )));
    }

    let mut iterations_bytes = [0u8; 4];
    iterations_bytes.copy_from_slice(&data[5..9]);
    let Some(rounds) = std::num::NonZeroU32::new(u32::from_be_bytes(iterations_bytes)) else {
        return Err(CertificateLoadError::corrupt("sealed store has zero PBKDF2 iterations"));
    };

    let salt = &data[9..9 + SALT_LEN];
    let mut nonce_array = [0u8; NONCE_LEN];
    nonce_array.copy_from_slice(&data[9 + SALT_LEN..HEADER_LEN]);
    let nonce = aead::Nonce::assume_unique_for_key(nonce_array);
    let header = &data[..HEADER_LEN];

    let key = derive_key(rounds, salt, password)?;

    let mut buffer = Zeroizing::new(data[HEADER_LEN..].to_vec());
    let plaintext_len = key
        .open_in_place(nonce, aead::Aad::from(header), &mut buffer[..])
        .map_err(|_| CertificateLoadError::bad_password("store authentication failed"))?
        .len();
    buffer.truncate(plaintext_len);

    Ok(buffer)
}

fn derive_key(
    rounds: std::num::NonZeroU32,
    salt: &[u8],
    password: &StorePassword,
) -> Result<aead::LessSafeKey, CertificateLoadError> {
    let mut key_bytes = Zeroizing::new([0u8; 32]);
    pbkdf2::derive(
        pbkdf2::PBKDF2_HMAC_SHA256,
        rounds,
        salt,
        password.as_bytes(),
        &mut key_bytes[..],
    );

    let key = aead::UnboundKey::new(&aead::AES_256_GCM, &key_bytes[..])
        .map_err(|_| CertificateLoadError::corrupt("failed to create decryption key"))?;
    Ok(aead::LessSafeKey::new(key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tls::errors::LoadFailure;

    const ROUNDS: u32 = 1_000;

    #[test]
    fn open_returns_sealed_plaintext() {
        let password = StorePassword::new("correct horse");
        let sealed = seal(b"-----BEGIN CERTIFICATE-----", &password, ROUNDS).unwrap();
        let opened = open(&sealed, &password).unwrap();
        assert_eq!(&opened[..], b"-----BEGIN CERTIFICATE-----");
    }

    #[test]
    fn wrong_password_is_bad_password() {
        let sealed = seal(b"payload", &StorePassword::new("right"), ROUNDS).unwrap();
        let err = open(&sealed, &StorePassword::new("wrong")).unwrap_err();
        assert_eq!(err.reason, LoadFailure::BadPassword);
    }

    #[test]
    fn edited_iteration_count_fails_authentication() {
        let password = StorePassword::new("pw");
        let mut sealed = seal(b"payload", &password, ROUNDS).unwrap();
        sealed[8] ^= 0x01;
        let err = open(&sealed, &password).unwrap_err();
        assert_eq!(err.reason, LoadFailure::BadPassword);
    }

    #[test]
    fn unknown_version_is_unsupported() {
        let password = StorePassword::new("pw");
        let mut sealed = seal(b"payload", &password, ROUNDS).unwrap();
        sealed[4] = 9;
        let err = open(&sealed, &password).unwrap_err();
        assert_eq!(err.reason, LoadFailure::UnsupportedFormat);
    }

    #[test]
    fn truncated_store_is_corrupt() {
        let err = open(b"TKS1\x01", &StorePassword::empty()).unwrap_err();
        assert_eq!(err.reason, LoadFailure::CorruptStore);
    }
}
