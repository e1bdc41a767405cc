//! Immutable client settings
//!
//! Everything the client needs at startup: where the backend lives, the pinned
//! identity and trust stores, and the retry and transport knobs. Every
//! constructor and `with_*` setter re-validates, so a `ClientSettings` value
//! that exists is always usable.

use std::fmt;
use std::time::Duration;

use bytes::Bytes;
use url::Url;

use tether_client::config::{ConfigResult, ConfigValidator, ConfigurationError, Validator};
use tether_client::retry::RetryPolicy;
use tether_client::tls::{
    CertificateLoadError, CertificateStore, CredentialMaterial, StoreFormat, StorePassword,
    TransportOptions, TrustAnchors,
};

/// One password-protected credential or trust blob
///
/// Not `Clone`: loading consumes the source, and its password is wiped with it.
///
/// ```compile_fail
/// fn duplicate<T: Clone>(_: &T) {}
/// let source = tether::StoreSource::new(
///     &b"pem"[..],
///     tether::StorePassword::empty(),
///     tether::StoreFormat::Pem,
/// );
/// duplicate(&source);
/// ```
pub struct StoreSource {
    bytes: Bytes,
    password: StorePassword,
    format: StoreFormat,
}

impl StoreSource {
    pub fn new(bytes: impl Into<Bytes>, password: StorePassword, format: StoreFormat) -> Self {
        Self { bytes: bytes.into(), password, format }
    }

    /// Build from a format tag such as `"sealed"`
    ///
    /// # Errors
    ///
    /// `UnsupportedFormat` for tags other than `pem` and `sealed`.
    pub fn with_tag(
        bytes: impl Into<Bytes>,
        password: StorePassword,
        tag: &str,
    ) -> Result<Self, CertificateLoadError> {
        Ok(Self::new(bytes, password, tag.parse()?))
    }

    pub fn format(&self) -> StoreFormat {
        self.format
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub(crate) fn load_identity(self) -> Result<CredentialMaterial, CertificateLoadError> {
        CertificateStore::load_identity(&self.bytes, self.password, self.format)
    }

    pub(crate) fn load_trust(self) -> Result<TrustAnchors, CertificateLoadError> {
        CertificateStore::load_trust(&self.bytes, self.password, self.format)
    }
}

impl fmt::Debug for StoreSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreSource")
            .field("format", &self.format)
            .field("len", &self.bytes.len())
            .finish_non_exhaustive()
    }
}

/// Validated client configuration
///
/// Consumed by [`Tether::connect`](crate::Tether::connect); the store sources
/// and their passwords do not outlive startup.
#[derive(Debug)]
pub struct ClientSettings {
    pub(crate) base_url: Url,
    pub(crate) identity: StoreSource,
    pub(crate) trust: Vec<StoreSource>,
    pub(crate) extra_anchors: Vec<TrustAnchors>,
    pub(crate) retry: RetryPolicy,
    pub(crate) transport: TransportOptions,
}

impl ClientSettings {
    /// # Errors
    ///
    /// - `InvalidUrl` unless `base_url` is an absolute https URL with a host
    /// - `InvalidParameter` for an empty identity blob, an empty trust blob,
    ///   or no trust sources at all
    pub fn new(
        base_url: impl AsRef<str>,
        identity: StoreSource,
        trust: Vec<StoreSource>,
    ) -> ConfigResult<Self> {
        let base_url = parse_base_url(base_url.as_ref())?;
        let settings = Self {
            base_url,
            identity,
            trust,
            extra_anchors: Vec::new(),
            retry: RetryPolicy::default(),
            transport: TransportOptions::default(),
        };
        settings.validate()?;
        Ok(settings)
    }

    /// Retry policy applied to requests that do not set their own
    ///
    /// # Errors
    ///
    /// Propagates the policy's own validation.
    pub fn with_retry(mut self, retry: RetryPolicy) -> ConfigResult<Self> {
        self.retry = retry;
        self.validate()?;
        Ok(self)
    }

    /// # Errors
    ///
    /// `InvalidTimeout` for a zero or excessive connect timeout.
    pub fn with_transport(mut self, transport: TransportOptions) -> ConfigResult<Self> {
        self.transport = transport;
        self.validate()?;
        Ok(self)
    }

    /// Trust `anchors` in addition to the configured trust stores
    ///
    /// Typical use is [`TrustAnchors::public_roots`] next to a pinned private CA.
    ///
    /// # Errors
    ///
    /// `InvalidParameter` for an empty anchor set.
    pub fn with_extra_anchors(mut self, anchors: TrustAnchors) -> ConfigResult<Self> {
        self.extra_anchors.push(anchors);
        self.validate()?;
        Ok(self)
    }

    /// # Errors
    ///
    /// `InvalidTimeout` for a zero or excessive timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> ConfigResult<Self> {
        self.transport.connect_timeout = timeout;
        self.validate()?;
        Ok(self)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn identity(&self) -> &StoreSource {
        &self.identity
    }

    pub fn trust(&self) -> &[StoreSource] {
        &self.trust
    }

    pub fn extra_anchors(&self) -> &[TrustAnchors] {
        &self.extra_anchors
    }

    pub fn retry(&self) -> &RetryPolicy {
        &self.retry
    }

    pub fn transport(&self) -> &TransportOptions {
        &self.transport
    }
}

impl Validator for ClientSettings {
    fn validate(&self) -> ConfigResult<()> {
        ConfigValidator::validate_https_url(&self.base_url, "base_url")?;
        ConfigValidator::validate_timeout(self.transport.connect_timeout, "connect_timeout")?;
        self.retry.validate()?;

        if self.identity.is_empty() {
            return Err(ConfigurationError::InvalidParameter("identity store is empty".into()));
        }
        if let Some(index) = self.trust.iter().position(StoreSource::is_empty) {
            return Err(ConfigurationError::InvalidParameter(format!(
                "trust store {index} is empty"
            )));
        }
        if self.extra_anchors.iter().any(TrustAnchors::is_empty) {
            return Err(ConfigurationError::InvalidParameter("extra trust anchors are empty".into()));
        }
        if self.trust.is_empty() && self.extra_anchors.is_empty() {
            return Err(ConfigurationError::InvalidParameter(
                "at least one trust store or anchor set is required".into(),
            ));
        }
        Ok(())
    }
}

/// Parse and normalize so relative joins append to the base path
fn parse_base_url(raw: &str) -> ConfigResult<Url> {
    let mut url = Url::parse(raw)
        .map_err(|e| ConfigurationError::InvalidUrl(format!("base_url '{raw}': {e}")))?;
    if url.query().is_some() || url.fragment().is_some() {
        return Err(ConfigurationError::InvalidUrl(
            "base_url must not carry a query or fragment".into(),
        ));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}
