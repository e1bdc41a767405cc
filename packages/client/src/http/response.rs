//! Buffered API responses

use bytes::Bytes;
use http::{HeaderMap, StatusCode};
use serde::de::DeserializeOwned;
use url::Url;

use crate::error::{self, Error};

/// Fully buffered response from the backend
#[derive(Debug, Clone)]
pub struct ApiResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
    url: Url,
}

impl ApiResponse {
    pub fn new(status: StatusCode, headers: HeaderMap, body: Bytes, url: Url) -> Self {
        Self { status, headers, body, url }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn bytes(&self) -> &Bytes {
        &self.body
    }

    pub fn into_bytes(self) -> Bytes {
        self.body
    }

    /// Body as UTF-8 text
    ///
    /// # Errors
    ///
    /// Decode error if the body is not valid UTF-8.
    pub fn text(&self) -> Result<String, Error> {
        String::from_utf8(self.body.to_vec())
            .map_err(|e| error::decode(e).with_url(self.url.clone()))
    }

    /// Deserialize a JSON object, array or scalar
    ///
    /// # Errors
    ///
    /// Decode error if the body is not JSON of the expected shape.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, Error> {
        serde_json::from_slice(&self.body).map_err(|e| error::decode(e).with_url(self.url.clone()))
    }

    /// Turn a non-success status into an error
    ///
    /// # Errors
    ///
    /// `Status` error carrying the code and URL.
    pub fn error_for_status(self) -> Result<Self, Error> {
        if self.status.is_success() {
            Ok(self)
        } else {
            Err(error::status_code(self.url, self.status))
        }
    }
}
