//! Mutual-TLS session configuration shared by every connection

use std::sync::Arc;
use std::time::Duration;

use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::{CryptoProvider, WebPkiSupportedAlgorithms};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{
    CertificateError, ClientConfig, DigitallySignedStruct, OtherError, SignatureScheme,
    SupportedProtocolVersion,
};
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tokio_rustls::client::TlsStream;

use super::certificate;
use super::errors::{TlsSetupError, TlsTrustError};
use super::hostname::{HostnameVerification, HostnameVerifier};
use super::trust_chain::{AuthType, TrustChain};
use super::types::CredentialMaterial;
use crate::error::{self, Error};

/// Default bound on TCP connect and on the TLS handshake
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Protocol versions offered in the ClientHello
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TlsProtocol {
    #[default]
    Tls12AndTls13,
    Tls13Only,
}

static TLS13_ONLY: &[&SupportedProtocolVersion] = &[&rustls::version::TLS13];

impl TlsProtocol {
    pub(crate) fn versions(self) -> &'static [&'static SupportedProtocolVersion] {
        match self {
            TlsProtocol::Tls12AndTls13 => rustls::ALL_VERSIONS,
            TlsProtocol::Tls13Only => TLS13_ONLY,
        }
    }
}

/// Transport knobs that do not come from the credential stores
#[derive(Debug, Clone)]
pub struct TransportOptions {
    pub connect_timeout: Duration,
    pub protocol: TlsProtocol,
    pub hostname: HostnameVerification,
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self {
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            protocol: TlsProtocol::default(),
            hostname: HostnameVerification::default(),
        }
    }
}

/// Builds immutable session configurations from pinned material
#[derive(Debug, Clone, Default)]
pub struct SecureTransportFactory {
    options: TransportOptions,
}

impl SecureTransportFactory {
    pub fn new(options: TransportOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &TransportOptions {
        &self.options
    }

    /// Combine the client identity and trust chain into a session config
    ///
    /// Everything that can be checked without a peer is checked here: the
    /// trust chain has verifiers, the key loads under the crypto provider and
    /// belongs to the leaf certificate, and rustls accepts the combination.
    ///
    /// # Errors
    ///
    /// Returns `TlsSetupError` describing the first incompatibility found.
    pub fn build(
        &self,
        credential: CredentialMaterial,
        trust_chain: TrustChain,
    ) -> Result<TlsSessionConfig, TlsSetupError> {
        if trust_chain.is_empty() {
            return Err(TlsSetupError::EmptyTrustChain);
        }
        let Some(leaf) = credential.leaf() else {
            return Err(TlsSetupError::EmptyCertificateChain);
        };

        let provider = Arc::new(rustls::crypto::ring::default_provider());
        let key_der = credential.key.to_key_der();
        let signing_key = provider
            .key_provider
            .load_private_key(key_der.clone_key())
            .map_err(|e| TlsSetupError::UnsupportedKey(e.to_string()))?;
        certificate::ensure_key_matches(leaf, signing_key.as_ref(), &credential.key)?;

        if self.options.hostname.is_insecure() {
            tracing::warn!(
                target: "tether::tls",
                "Hostname verification is DISABLED for this transport; any certificate chained to a trusted root will be accepted for any host"
            );
        }

        let verifier = Arc::new(TrustChainServerVerifier::new(
            trust_chain,
            self.options.hostname.verifier(),
            &provider,
        ));
        tracing::debug!(
            target: "tether::tls",
            verifiers = verifier.trust_chain.len(),
            accepted_issuers = verifier.trust_chain.accepted_issuers().len(),
            "Binding trust chain"
        );

        let mut config = ClientConfig::builder_with_provider(provider)
            .with_protocol_versions(self.options.protocol.versions())?
            .dangerous()
            .with_custom_certificate_verifier(verifier)
            .with_client_auth_cert(credential.chain.clone(), key_der)?;
        config.alpn_protocols = vec![b"http/1.1".to_vec()];

        tracing::info!(
            target: "tether::tls",
            protocol = ?self.options.protocol,
            chain_len = credential.chain.len(),
            "TLS session configuration built"
        );

        Ok(TlsSessionConfig {
            config: Arc::new(config),
            connect_timeout: self.options.connect_timeout,
        })
    }
}

/// Immutable, shareable mutual-TLS client configuration
///
/// Connections opened from the same config share no mutable state; each gets
/// its own handshake.
#[derive(Debug, Clone)]
pub struct TlsSessionConfig {
    config: Arc<ClientConfig>,
    connect_timeout: Duration,
}

impl TlsSessionConfig {
    pub fn client_config(&self) -> Arc<ClientConfig> {
        Arc::clone(&self.config)
    }

    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    /// Open a TCP connection and complete the mutual-TLS handshake
    ///
    /// # Errors
    ///
    /// - `Timeout` when connect or handshake exceeds the connect timeout
    /// - `Network` for socket failures
    /// - `TlsTrust` when the server chain or hostname is refused
    /// - `Handshake` for any other TLS failure, e.g. the server refusing our certificate
    pub async fn connect(&self, host: &str, port: u16) -> Result<TlsStream<TcpStream>, Error> {
        let server_name = ServerName::try_from(host.to_owned()).map_err(error::builder)?;

        tracing::debug!(target: "tether::tls", host, port, "Opening TLS connection");
        let tcp = tokio::time::timeout(self.connect_timeout, TcpStream::connect((host, port)))
            .await
            .map_err(|_| error::timeout("TCP connect", self.connect_timeout))?
            .map_err(error::network)?;
        tcp.set_nodelay(true).map_err(error::network)?;

        let connector = TlsConnector::from(Arc::clone(&self.config));
        let stream = tokio::time::timeout(self.connect_timeout, connector.connect(server_name, tcp))
            .await
            .map_err(|_| error::timeout("TLS handshake", self.connect_timeout))?
            .map_err(classify_handshake_error)?;

        tracing::debug!(target: "tether::tls", host, port, "TLS connection established");
        Ok(stream)
    }
}

fn classify_handshake_error(err: std::io::Error) -> Error {
    let Some(tls) = err.get_ref().and_then(|inner| inner.downcast_ref::<rustls::Error>()) else {
        return error::network(err);
    };

    match tls {
        rustls::Error::InvalidCertificate(CertificateError::Other(other)) => {
            match other.0.downcast_ref::<TlsTrustError>() {
                Some(trust) => error::tls_trust(trust.clone()),
                None => error::tls_trust(TlsTrustError::Rejected {
                    verifiers: 0,
                    last_cause: other.to_string(),
                }),
            }
        }
        rustls::Error::InvalidCertificate(cause) => error::tls_trust(TlsTrustError::Rejected {
            verifiers: 0,
            last_cause: cause.to_string(),
        }),
        other => error::handshake(other.clone()),
    }
}

/// rustls adapter running the trust chain and then the hostname check
#[derive(Debug)]
struct TrustChainServerVerifier {
    trust_chain: TrustChain,
    hostname: Arc<dyn HostnameVerifier>,
    algorithms: WebPkiSupportedAlgorithms,
}

impl TrustChainServerVerifier {
    fn new(
        trust_chain: TrustChain,
        hostname: Arc<dyn HostnameVerifier>,
        provider: &CryptoProvider,
    ) -> Self {
        Self { trust_chain, hostname, algorithms: provider.signature_verification_algorithms }
    }
}

fn reject(err: TlsTrustError) -> rustls::Error {
    rustls::Error::InvalidCertificate(CertificateError::Other(OtherError(Arc::new(err))))
}

impl ServerCertVerifier for TrustChainServerVerifier {
    fn verify_server_cert(
        &self,
        end_entity: &CertificateDer<'_>,
        intermediates: &[CertificateDer<'_>],
        server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        let mut presented = Vec::with_capacity(1 + intermediates.len());
        presented.push(end_entity.clone());
        presented.extend(intermediates.iter().cloned());

        if let Err(e) = self.trust_chain.validate(&presented, AuthType::Server, now) {
            tracing::debug!(target: "tether::tls", server = %server_name.to_str(), error = %e, "Server chain refused");
            return Err(reject(e));
        }

        let hostname = server_name.to_str();
        if !self.hostname.verify(&hostname, end_entity) {
            tracing::debug!(target: "tether::tls", server = %hostname, "Hostname mismatch");
            return Err(reject(TlsTrustError::HostnameMismatch { hostname: hostname.into_owned() }));
        }

        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls12_signature(message, cert, dss, &self.algorithms)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls13_signature(message, cert, dss, &self.algorithms)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.algorithms.supported_schemes()
    }
}

#[cfg(test)]
mod tests {
    use der::{Decode, Header, SliceReader};
    use rcgen::{CertificateParams, KeyPair};
    use x509_cert::spki::AlgorithmIdentifierOwned;

    use super::*;
    use crate::tls::types::{KeyEncoding, SecureKeyMaterial, TrustAnchors};

    /// The ECPrivateKey inside a PKCS#8 EC key
    fn sec1_from_pkcs8(pkcs8: &[u8]) -> Vec<u8> {
        let mut reader = SliceReader::new(pkcs8).unwrap();
        Header::decode(&mut reader).unwrap();
        u8::decode(&mut reader).unwrap();
        AlgorithmIdentifierOwned::decode(&mut reader).unwrap();
        der::asn1::OctetStringRef::decode(&mut reader).unwrap().as_bytes().to_vec()
    }

    fn sec1_credential(cert_key: &KeyPair, private_key: &KeyPair) -> (CredentialMaterial, TrustChain) {
        let cert = CertificateParams::new(vec!["device-7".to_owned()])
            .unwrap()
            .self_signed(cert_key)
            .unwrap();
        let cert_der = CertificateDer::from(cert.der().to_vec());
        let credential = CredentialMaterial {
            chain: vec![cert_der.clone()],
            key: SecureKeyMaterial::new(
                KeyEncoding::Sec1,
                sec1_from_pkcs8(&private_key.serialize_der()),
            ),
        };
        let mut chain = TrustChain::new();
        chain.add_verifier(TrustAnchors::from_certificates(vec![cert_der]).unwrap());
        (credential, chain)
    }

    #[test]
    fn protocol_versions_offered() {
        assert_eq!(TlsProtocol::Tls13Only.versions().len(), 1);
        assert_eq!(TlsProtocol::Tls13Only.versions()[0].version, rustls::ProtocolVersion::TLSv1_3);
        assert_eq!(TlsProtocol::Tls12AndTls13.versions().len(), 2);
    }

    #[test]
    fn sec1_key_is_matched_against_certificate() {
        let key = KeyPair::generate().unwrap();
        let (credential, chain) = sec1_credential(&key, &key);
        SecureTransportFactory::default().build(credential, chain).unwrap();
    }

    #[test]
    fn sec1_key_from_another_certificate_is_rejected() {
        let cert_key = KeyPair::generate().unwrap();
        let other_key = KeyPair::generate().unwrap();
        let (credential, chain) = sec1_credential(&cert_key, &other_key);

        let err = SecureTransportFactory::default().build(credential, chain).unwrap_err();
        assert!(matches!(err, TlsSetupError::KeyMismatch));
    }
}
