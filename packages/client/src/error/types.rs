use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

use http::StatusCode;

use crate::tls::errors::LoadFailure;

/// A Result alias where the Err case is `tether_client::Error`.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while setting up the client or running a request.
#[derive(Clone)]
pub struct Error {
    pub inner: Box<Inner>,
}

/// Clones share the source, so a cloned error keeps its full cause chain.
#[derive(Clone)]
pub struct Inner {
    pub kind: Kind,
    pub source: Option<Arc<dyn StdError + Send + Sync>>,
    pub url: Option<url::Url>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Kind {
    /// Credential or trust store could not be opened
    CertificateLoad(LoadFailure),
    /// Credential and trust chain could not form a TLS configuration
    TlsSetup,
    /// The peer's certificate chain or hostname was refused
    TlsTrust,
    /// TLS handshake failed for a reason other than trust
    Handshake,
    /// Multipart body could not be built
    Encoding,
    /// Connect, reset or other transport I/O failure
    Network,
    /// Connect, handshake or exchange exceeded the attempt timeout
    Timeout,
    /// Server answered with a non-success status
    Status(StatusCode),
    /// Response body could not be decoded
    Decode,
    /// Request was cancelled before it completed
    Cancelled,
    /// A request was issued before a TLS session was installed
    NotInitialized,
    /// Invalid request or client configuration
    Builder,
    /// Retry policy gave up; the source is the last attempt's error
    RetriesExhausted { attempts: u32 },
}

impl Error {
    pub fn new(kind: Kind) -> Error {
        Error { inner: Box::new(Inner { kind, source: None, url: None }) }
    }

    #[must_use = "Error builder methods return a new Error and should be used"]
    pub fn with<E: Into<Box<dyn StdError + Send + Sync>>>(mut self, source: E) -> Error {
        let source: Box<dyn StdError + Send + Sync> = source.into();
        self.inner.source = Some(Arc::from(source));
        self
    }

    #[must_use]
    pub fn with_url(mut self, url: url::Url) -> Self {
        self.inner.url = Some(url);
        self
    }

    #[must_use]
    pub fn kind(&self) -> &Kind {
        &self.inner.kind
    }

    /// Get the URL associated with this error, if any
    #[must_use]
    pub fn url(&self) -> Option<&url::Url> {
        self.inner.url.as_ref()
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut f = f.debug_struct("tether_client::Error");

        f.field("kind", &self.inner.kind);

        if let Some(ref source) = self.inner.source {
            f.field("source", source);
        }

        if let Some(ref url) = self.inner.url {
            f.field("url", url);
        }

        f.finish()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.inner.kind {
            Kind::CertificateLoad(reason) => write!(f, "certificate store load failed ({reason})")?,
            Kind::TlsSetup => f.write_str("TLS session setup failed")?,
            Kind::TlsTrust => f.write_str("peer certificate not trusted")?,
            Kind::Handshake => f.write_str("TLS handshake failed")?,
            Kind::Encoding => f.write_str("multipart encoding error")?,
            Kind::Network => f.write_str("network error")?,
            Kind::Timeout => f.write_str("request timeout")?,
            Kind::Status(code) => {
                let prefix = if code.is_client_error() {
                    "HTTP status client error"
                } else if code.is_server_error() {
                    "HTTP status server error"
                } else {
                    "unexpected HTTP status"
                };
                write!(f, "{prefix} ({code})")?;
            }
            Kind::Decode => f.write_str("error decoding response body")?,
            Kind::Cancelled => f.write_str("request cancelled")?,
            Kind::NotInitialized => f.write_str("TLS session not installed")?,
            Kind::Builder => f.write_str("builder error")?,
            Kind::RetriesExhausted { attempts } => {
                write!(f, "retries exhausted after {attempts} attempt(s)")?;
            }
        }

        if let Some(ref url) = self.inner.url {
            write!(f, " for url ({url})")?;
        }
        Ok(())
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.inner.source.as_ref().map(|err| &**err as &(dyn StdError + 'static))
    }
}
