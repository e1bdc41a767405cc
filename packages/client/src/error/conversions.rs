use http::header::{InvalidHeaderName, InvalidHeaderValue};

use super::types::{Error, Kind};
use crate::config::validation::ConfigurationError;
use crate::multipart::errors::EncodingError;
use crate::tls::errors::{CertificateLoadError, TlsSetupError, TlsTrustError};

impl From<CertificateLoadError> for Error {
    fn from(error: CertificateLoadError) -> Self {
        Error::new(Kind::CertificateLoad(error.reason)).with(error)
    }
}

impl From<TlsSetupError> for Error {
    fn from(error: TlsSetupError) -> Self {
        Error::new(Kind::TlsSetup).with(error)
    }
}

impl From<TlsTrustError> for Error {
    fn from(error: TlsTrustError) -> Self {
        super::constructors::tls_trust(error)
    }
}

impl From<EncodingError> for Error {
    fn from(error: EncodingError) -> Self {
        Error::new(Kind::Encoding).with(error)
    }
}

impl From<ConfigurationError> for Error {
    fn from(error: ConfigurationError) -> Self {
        Error::new(Kind::Builder).with(error)
    }
}

impl From<InvalidHeaderName> for Error {
    fn from(error: InvalidHeaderName) -> Self {
        Error::new(Kind::Builder).with(error)
    }
}

impl From<InvalidHeaderValue> for Error {
    fn from(error: InvalidHeaderValue) -> Self {
        Error::new(Kind::Builder).with(error)
    }
}

impl From<url::ParseError> for Error {
    fn from(error: url::ParseError) -> Self {
        Error::new(Kind::Builder).with(error)
    }
}

impl From<http::Error> for Error {
    fn from(error: http::Error) -> Self {
        Error::new(Kind::Builder).with(error)
    }
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Error::new(Kind::Decode).with(error)
    }
}
