use std::time::Duration;

use http::StatusCode;

use super::helpers::OperationCancelled;
use super::types::{Error, Kind};
use crate::tls::errors::TlsTrustError;

pub(crate) type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Creates an `Error` for a builder error.
pub fn builder<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::Builder).with(e.into())
}

/// Creates an `Error` for a transport failure.
pub fn network<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::Network).with(e.into())
}

/// Creates an `Error` for an operation that ran past `after`.
pub fn timeout(operation: &str, after: Duration) -> Error {
    Error::new(Kind::Timeout).with(format!("{operation} timed out after {}ms", after.as_millis()))
}

/// Creates an `Error` for a refused certificate chain or hostname.
pub fn tls_trust(e: TlsTrustError) -> Error {
    Error::new(Kind::TlsTrust).with(e)
}

/// Creates an `Error` for a handshake failure unrelated to trust.
pub fn handshake<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::Handshake).with(e.into())
}

/// Creates an `Error` for a non-success response status.
pub fn status_code(url: url::Url, status: StatusCode) -> Error {
    Error::new(Kind::Status(status)).with_url(url)
}

/// Creates an `Error` for a decode error.
pub fn decode<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::Decode).with(e.into())
}

/// Creates an `Error` for a cancelled request.
pub fn cancelled() -> Error {
    Error::new(Kind::Cancelled).with(OperationCancelled)
}

/// Creates an `Error` for a request issued before a session was installed.
pub fn not_initialized() -> Error {
    Error::new(Kind::NotInitialized)
}

/// Wraps the last attempt's error once the retry policy gives up.
pub fn retries_exhausted(attempts: u32, last: Error) -> Error {
    let url = last.url().cloned();
    let err = Error::new(Kind::RetriesExhausted { attempts }).with(last);
    match url {
        Some(url) => err.with_url(url),
        None => err,
    }
}
