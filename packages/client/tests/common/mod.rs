//! Certificate fixtures generated with rcgen for each test run

#![allow(dead_code)]

use rcgen::{
    BasicConstraints, CertificateParams, DistinguishedName, DnType, ExtendedKeyUsagePurpose, IsCa,
    Issuer, KeyPair,
};
use rustls::pki_types::{CertificateDer, PrivateKeyDer, PrivatePkcs8KeyDer};
use tether_client::tls::{
    CertificateStore, CredentialMaterial, StoreFormat, StorePassword, TrustAnchors, seal,
};

/// Low iteration count so sealing stays fast in tests
pub const TEST_ITERATIONS: u32 = 1_000;

/// A throwaway certificate authority
pub struct TestCa {
    pub pem: String,
    pub der: CertificateDer<'static>,
    issuer: Issuer<'static, KeyPair>,
}

/// A certificate issued by a [`TestCa`] together with its key
pub struct TestLeaf {
    pub cert_pem: String,
    pub key_pem: String,
    pub cert_der: CertificateDer<'static>,
    key_der: Vec<u8>,
}

impl TestCa {
    pub fn new(name: &str) -> Self {
        let mut params = CertificateParams::new(Vec::<String>::new()).expect("CA params");
        params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
        let mut dn = DistinguishedName::new();
        dn.push(DnType::OrganizationName, "Tether Tests");
        dn.push(DnType::CommonName, name);
        params.distinguished_name = dn;

        let key = KeyPair::generate().expect("CA key");
        let cert = params.clone().self_signed(&key).expect("self-signed CA");
        Self {
            pem: cert.pem(),
            der: CertificateDer::from(cert.der().to_vec()),
            issuer: Issuer::new(params, key),
        }
    }

    pub fn server(&self, names: &[&str]) -> TestLeaf {
        self.issue(names, ExtendedKeyUsagePurpose::ServerAuth)
    }

    pub fn client(&self, name: &str) -> TestLeaf {
        self.issue(&[name], ExtendedKeyUsagePurpose::ClientAuth)
    }

    fn issue(&self, names: &[&str], usage: ExtendedKeyUsagePurpose) -> TestLeaf {
        let names: Vec<String> = names.iter().map(|n| (*n).to_owned()).collect();
        let mut params = CertificateParams::new(names.clone()).expect("leaf params");
        params.distinguished_name.push(DnType::CommonName, names[0].as_str());
        params.extended_key_usages = vec![usage];

        let key = KeyPair::generate().expect("leaf key");
        let cert = params.signed_by(&key, &self.issuer).expect("signed leaf");
        TestLeaf {
            cert_pem: cert.pem(),
            key_pem: key.serialize_pem(),
            cert_der: CertificateDer::from(cert.der().to_vec()),
            key_der: key.serialize_der(),
        }
    }

    pub fn anchors(&self) -> TrustAnchors {
        CertificateStore::load_trust(self.pem.as_bytes(), StorePassword::empty(), StoreFormat::Pem)
            .expect("CA loads as trust store")
    }

    pub fn sealed_trust(&self, password: &str) -> Vec<u8> {
        sealed(&self.pem, password)
    }
}

impl TestLeaf {
    /// Certificate followed by key, as an identity store expects
    pub fn identity_pem(&self) -> String {
        format!("{}{}", self.cert_pem, self.key_pem)
    }

    pub fn sealed_identity(&self, password: &str) -> Vec<u8> {
        sealed(&self.identity_pem(), password)
    }

    pub fn credential(&self) -> CredentialMaterial {
        CertificateStore::load_identity(
            self.identity_pem().as_bytes(),
            StorePassword::empty(),
            StoreFormat::Pem,
        )
        .expect("identity loads")
    }

    pub fn key_der(&self) -> PrivateKeyDer<'static> {
        PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(self.key_der.clone()))
    }
}

pub fn sealed(pem: &str, password: &str) -> Vec<u8> {
    seal(pem.as_bytes(), &StorePassword::new(password), TEST_ITERATIONS).expect("seal")
}
