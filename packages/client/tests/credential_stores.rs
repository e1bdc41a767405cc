mod common;

use common::{TestCa, sealed};
use tether_client::tls::{
    CertificateStore, KeyEncoding, LoadFailure, StoreFormat, StorePassword,
};

#[test]
fn sealed_identity_opens_with_its_password() {
    let ca = TestCa::new("Identity CA");
    let leaf = ca.client("device-7");

    let credential = CertificateStore::load_identity(
        &leaf.sealed_identity("correct horse"),
        StorePassword::new("correct horse"),
        StoreFormat::Sealed,
    )
    .unwrap();

    assert_eq!(credential.certificate_chain().len(), 1);
    assert_eq!(credential.leaf(), Some(&leaf.cert_der));
    assert_eq!(credential.key_encoding(), KeyEncoding::Pkcs8);
}

#[test]
fn wrong_password_is_bad_password() {
    let ca = TestCa::new("Identity CA");
    let store = ca.client("device-7").sealed_identity("correct horse");

    let err = CertificateStore::load_identity(
        &store,
        StorePassword::new("battery staple"),
        StoreFormat::Sealed,
    )
    .unwrap_err();

    assert_eq!(err.reason, LoadFailure::BadPassword);
}

#[test]
fn trust_and_identity_passwords_are_independent() {
    let ca = TestCa::new("Trust CA");
    let trust = ca.sealed_trust("trust-pass");

    let anchors =
        CertificateStore::load_trust(&trust, StorePassword::new("trust-pass"), StoreFormat::Sealed)
            .unwrap();
    assert_eq!(anchors.len(), 1);

    let err =
        CertificateStore::load_trust(&trust, StorePassword::new("id-pass"), StoreFormat::Sealed)
            .unwrap_err();
    assert_eq!(err.reason, LoadFailure::BadPassword);
}

#[test]
fn truncated_sealed_store_is_corrupt() {
    let ca = TestCa::new("Trust CA");
    let trust = ca.sealed_trust("pw");

    let err = CertificateStore::load_trust(&trust[..20], StorePassword::new("pw"), StoreFormat::Sealed)
        .unwrap_err();
    assert_eq!(err.reason, LoadFailure::CorruptStore);
}

#[test]
fn trust_store_holding_a_key_is_corrupt() {
    let ca = TestCa::new("Trust CA");
    let leaf = ca.client("device-7");

    let err = CertificateStore::load_trust(
        leaf.identity_pem().as_bytes(),
        StorePassword::empty(),
        StoreFormat::Pem,
    )
    .unwrap_err();
    assert_eq!(err.reason, LoadFailure::CorruptStore);
}

#[test]
fn identity_without_key_is_corrupt() {
    let ca = TestCa::new("Identity CA");
    let leaf = ca.client("device-7");

    let err = CertificateStore::load_identity(
        &sealed(&leaf.cert_pem, "pw"),
        StorePassword::new("pw"),
        StoreFormat::Sealed,
    )
    .unwrap_err();
    assert_eq!(err.reason, LoadFailure::CorruptStore);
}

#[test]
fn identity_with_two_keys_is_corrupt() {
    let ca = TestCa::new("Identity CA");
    let first = ca.client("a");
    let second = ca.client("b");
    let pem = format!("{}{}", first.identity_pem(), second.key_pem);

    let err = CertificateStore::load_identity(pem.as_bytes(), StorePassword::empty(), StoreFormat::Pem)
        .unwrap_err();
    assert_eq!(err.reason, LoadFailure::CorruptStore);
}

#[test]
fn legacy_format_tags_are_unsupported() {
    for tag in ["bks", "jks", "pkcs12"] {
        let err = tag.parse::<StoreFormat>().unwrap_err();
        assert_eq!(err.reason, LoadFailure::UnsupportedFormat, "tag {tag}");
    }
    assert_eq!("Sealed".parse::<StoreFormat>().unwrap(), StoreFormat::Sealed);
}

#[test]
fn identity_file_round_trip() {
    let ca = TestCa::new("Identity CA");
    let leaf = ca.client("device-7");
    let path = std::env::temp_dir().join(format!("tether-identity-{}.sealed", std::process::id()));
    std::fs::write(&path, leaf.sealed_identity("pw")).unwrap();

    let loaded =
        CertificateStore::load_identity_file(&path, StorePassword::new("pw"), StoreFormat::Sealed);
    std::fs::remove_file(&path).unwrap();

    assert_eq!(loaded.unwrap().leaf(), Some(&leaf.cert_der));
}

#[test]
fn missing_file_is_corrupt() {
    let err = CertificateStore::load_trust_file(
        "/nonexistent/tether/trust.pem",
        StorePassword::empty(),
        StoreFormat::Pem,
    )
    .unwrap_err();
    assert_eq!(err.reason, LoadFailure::CorruptStore);
}
