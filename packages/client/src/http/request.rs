//! Data-first request description
//!
//! A [`RequestSpec`] is plain data: one executor runs every verb, so there are
//! no per-verb request types.

use std::fmt;

use bytes::Bytes;
use http::HeaderMap;
use url::Url;

use crate::error::{self, Error};
use crate::multipart::EncodedMultipart;
use crate::retry::RetryPolicy;

/// Verbs the backend API uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_http(self) -> http::Method {
        match self {
            Method::Get => http::Method::GET,
            Method::Post => http::Method::POST,
            Method::Put => http::Method::PUT,
            Method::Delete => http::Method::DELETE,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_http().as_str())
    }
}

/// Request payload
#[derive(Debug, Clone, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    /// `application/x-www-form-urlencoded` parameters, in order
    Form(Vec<(String, String)>),
    /// Opaque bytes sent as-is
    Bytes(Bytes),
    /// Pre-encoded `multipart/form-data`
    Multipart(EncodedMultipart),
}

impl RequestBody {
    /// Serialize into the bytes written on the wire
    ///
    /// # Errors
    ///
    /// Builder error if form parameters cannot be urlencoded.
    pub fn to_bytes(&self) -> Result<Bytes, Error> {
        match self {
            RequestBody::Empty => Ok(Bytes::new()),
            RequestBody::Form(params) => serde_urlencoded::to_string(params)
                .map(Bytes::from)
                .map_err(error::builder),
            RequestBody::Bytes(bytes) => Ok(bytes.clone()),
            RequestBody::Multipart(encoded) => Ok(encoded.body.clone()),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            RequestBody::Empty => true,
            RequestBody::Form(params) => params.is_empty(),
            RequestBody::Bytes(bytes) => bytes.is_empty(),
            RequestBody::Multipart(encoded) => encoded.body.is_empty(),
        }
    }
}

/// Everything needed to run one request
#[derive(Debug, Clone)]
pub struct RequestSpec {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: RequestBody,
    /// Dispatch tag used for bulk cancellation
    pub tag: Option<String>,
    pub retry: RetryPolicy,
}

impl RequestSpec {
    /// Assemble the wire request for one attempt
    ///
    /// The body is rebuilt from shared `Bytes`, so repeated attempts do not
    /// copy the payload.
    ///
    /// # Errors
    ///
    /// Builder error if the URL has no host or the request cannot be assembled.
    pub fn to_http(&self) -> Result<http::Request<Bytes>, Error> {
        let Some(host) = self.url.host_str() else {
            return Err(error::builder("request URL has no host").with_url(self.url.clone()));
        };
        let authority = match self.url.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_owned(),
        };
        let path = match self.url.query() {
            Some(query) => format!("{}?{query}", self.url.path()),
            None => self.url.path().to_owned(),
        };

        let mut request = http::Request::builder()
            .method(self.method.as_http())
            .uri(path)
            .body(self.body.to_bytes()?)
            .map_err(|e| error::builder(e).with_url(self.url.clone()))?;

        *request.headers_mut() = self.headers.clone();
        request.headers_mut().insert(
            http::header::HOST,
            http::HeaderValue::try_from(authority).map_err(error::builder)?,
        );
        Ok(request)
    }
}
