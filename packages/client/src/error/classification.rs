use std::error::Error as StdError;

use http::StatusCode;

use super::types::{Error, Kind};
use crate::tls::errors::{LoadFailure, TlsTrustError};

impl Error {
    /// Returns true for transport failures worth another attempt.
    ///
    /// Status errors are not included; whether a status is transient is the
    /// retry policy's decision.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self.inner.kind, Kind::Network | Kind::Timeout)
    }

    /// Returns true if the retry policy gave up on this request.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        matches!(self.inner.kind, Kind::RetriesExhausted { .. })
    }

    /// Number of attempts made before the retry policy gave up.
    #[must_use]
    pub fn attempts(&self) -> Option<u32> {
        match self.inner.kind {
            Kind::RetriesExhausted { attempts } => Some(attempts),
            _ => None,
        }
    }

    /// Returns the status code, if the error was generated from a response.
    ///
    /// Looks through an exhausted-retries wrapper to the last attempt.
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        match self.inner.kind {
            Kind::Status(code) => Some(code),
            Kind::RetriesExhausted { .. } => self.last_attempt().and_then(Error::status),
            _ => None,
        }
    }

    /// The error of the final attempt when retries were exhausted.
    #[must_use]
    pub fn last_attempt(&self) -> Option<&Error> {
        match self.inner.kind {
            Kind::RetriesExhausted { .. } => self.source()?.downcast_ref::<Error>(),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self.inner.kind, Kind::Timeout)
    }

    #[must_use]
    pub fn is_network(&self) -> bool {
        matches!(self.inner.kind, Kind::Network)
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self.inner.kind, Kind::Cancelled)
    }

    #[must_use]
    pub fn is_not_initialized(&self) -> bool {
        matches!(self.inner.kind, Kind::NotInitialized)
    }

    #[must_use]
    pub fn is_builder(&self) -> bool {
        matches!(self.inner.kind, Kind::Builder)
    }

    #[must_use]
    pub fn is_encoding(&self) -> bool {
        matches!(self.inner.kind, Kind::Encoding)
    }

    #[must_use]
    pub fn is_decode(&self) -> bool {
        matches!(self.inner.kind, Kind::Decode)
    }

    #[must_use]
    pub fn is_tls_setup(&self) -> bool {
        matches!(self.inner.kind, Kind::TlsSetup)
    }

    #[must_use]
    pub fn is_tls_trust(&self) -> bool {
        matches!(self.inner.kind, Kind::TlsTrust)
    }

    /// Why a store failed to load, for certificate load errors.
    #[must_use]
    pub fn load_failure(&self) -> Option<LoadFailure> {
        match self.inner.kind {
            Kind::CertificateLoad(reason) => Some(reason),
            _ => None,
        }
    }

    /// The trust decision behind a `TlsTrust` error.
    #[must_use]
    pub fn trust_error(&self) -> Option<&TlsTrustError> {
        match self.inner.kind {
            Kind::TlsTrust => self.source()?.downcast_ref::<TlsTrustError>(),
            Kind::RetriesExhausted { .. } => self.last_attempt()?.trust_error(),
            _ => None,
        }
    }
}
