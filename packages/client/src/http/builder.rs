//! Request construction with the backend's default headers
//!
//! Every request starts with `Authorization: Bearer …` (unless it is the
//! authentication request itself), `Accept: application/json` and a
//! urlencoded `Content-Type`. Caller-supplied headers replace that set
//! wholesale; nothing is merged.

use bytes::Bytes;
use http::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use url::Url;

use super::request::{Method, RequestBody, RequestSpec};
use crate::auth::{AuthContext, AuthProvider};
use crate::error::{self, Error};
use crate::multipart::{self, EncodedMultipart, MultipartPart};
use crate::retry::RetryPolicy;

const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";
const APPLICATION_JSON: &str = "application/json";

/// Builder for a [`RequestSpec`]
///
/// Errors are collected and reported by [`RequestBuilder::build`], so calls
/// chain without intermediate `?`.
#[derive(Debug)]
pub struct RequestBuilder {
    method: Method,
    url: Url,
    headers: HeaderMap,
    body: RequestBody,
    tag: Option<String>,
    retry: RetryPolicy,
    error: Option<Error>,
}

/// Default headers for a request made with `auth`
///
/// # Errors
///
/// Propagates a failure to render the credential as a header.
pub fn default_headers(auth: &AuthContext) -> Result<HeaderMap, Error> {
    let mut headers = HeaderMap::with_capacity(3);
    auth.apply_auth(&mut headers)?;
    headers.insert(ACCEPT, HeaderValue::from_static(APPLICATION_JSON));
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(FORM_URLENCODED));
    Ok(headers)
}

impl RequestBuilder {
    pub fn new(method: Method, url: Url, auth: &AuthContext) -> Self {
        let (headers, error) = match default_headers(auth) {
            Ok(headers) => (headers, None),
            Err(e) => (HeaderMap::new(), Some(e)),
        };
        Self {
            method,
            url,
            headers,
            body: RequestBody::Empty,
            tag: None,
            retry: RetryPolicy::default(),
            error,
        }
    }

    pub fn get(url: Url, auth: &AuthContext) -> Self {
        Self::new(Method::Get, url, auth)
    }

    pub fn post(url: Url, auth: &AuthContext) -> Self {
        Self::new(Method::Post, url, auth)
    }

    pub fn put(url: Url, auth: &AuthContext) -> Self {
        Self::new(Method::Put, url, auth)
    }

    pub fn delete(url: Url, auth: &AuthContext) -> Self {
        Self::new(Method::Delete, url, auth)
    }

    /// Login-style POST of form parameters, sent without a bearer token
    pub fn auth_request<K, V>(url: Url, params: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self::new(Method::Post, url, &AuthContext::anonymous()).form(params)
    }

    /// Replace every header, defaults included
    #[must_use]
    pub fn headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Set one header on top of the current set
    #[must_use]
    pub fn header<K, V>(mut self, name: K, value: V) -> Self
    where
        HeaderName: TryFrom<K>,
        <HeaderName as TryFrom<K>>::Error: Into<http::Error>,
        HeaderValue: TryFrom<V>,
        <HeaderValue as TryFrom<V>>::Error: Into<http::Error>,
    {
        if self.error.is_some() {
            return self;
        }
        match (HeaderName::try_from(name), HeaderValue::try_from(value)) {
            (Ok(name), Ok(value)) => {
                self.headers.insert(name, value);
            }
            (Err(e), _) => self.error = Some(error::builder(Into::<http::Error>::into(e))),
            (_, Err(e)) => self.error = Some(error::builder(Into::<http::Error>::into(e))),
        }
        self
    }

    /// Append query parameters to the URL
    #[must_use]
    pub fn query<K, V>(mut self, params: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        self.url.query_pairs_mut().extend_pairs(params);
        self
    }

    /// Urlencoded form body
    #[must_use]
    pub fn form<K, V>(mut self, params: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.body =
            RequestBody::Form(params.into_iter().map(|(k, v)| (k.into(), v.into())).collect());
        self
    }

    /// Raw body; the content type is whatever the headers say
    #[must_use]
    pub fn bytes(mut self, body: impl Into<Bytes>) -> Self {
        self.body = RequestBody::Bytes(body.into());
        self
    }

    /// Pre-encoded multipart body
    ///
    /// Its `Content-Type` replaces the one in the header set at build time.
    #[must_use]
    pub fn multipart(mut self, encoded: EncodedMultipart) -> Self {
        self.body = RequestBody::Multipart(encoded);
        self
    }

    /// Upload already-compressed JPEG bytes as the `media` part
    #[must_use]
    pub fn upload_image(self, jpeg: impl Into<Bytes>) -> Self {
        self.parts(vec![MultipartPart::media_jpeg(jpeg)])
    }

    /// Encode `parts` into the body
    #[must_use]
    pub fn parts(mut self, parts: Vec<MultipartPart>) -> Self {
        match multipart::encode(&parts) {
            Ok(encoded) => self.multipart(encoded),
            Err(e) => {
                self.error.get_or_insert(e.into());
                self
            }
        }
    }

    #[must_use]
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    #[must_use]
    pub fn retry(mut self, policy: RetryPolicy) -> Self {
        self.retry = policy;
        self
    }

    /// # Errors
    ///
    /// The first error recorded while building: an invalid header, an
    /// unusable bearer token or a multipart encoding failure.
    pub fn build(self) -> Result<RequestSpec, Error> {
        if let Some(err) = self.error {
            return Err(err.with_url(self.url));
        }

        let mut headers = self.headers;
        if let RequestBody::Multipart(encoded) = &self.body {
            let value = HeaderValue::try_from(encoded.content_type.as_str()).map_err(error::builder)?;
            headers.insert(CONTENT_TYPE, value);
        }

        Ok(RequestSpec {
            method: self.method,
            url: self.url,
            headers,
            body: self.body,
            tag: self.tag,
            retry: self.retry,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::header::AUTHORIZATION;

    fn url() -> Url {
        Url::parse("https://api.example.test/v1/items").unwrap()
    }

    #[test]
    fn bearer_requests_carry_the_default_headers() {
        let auth = AuthContext::bearer("tok").unwrap();
        let spec = RequestBuilder::get(url(), &auth).build().unwrap();

        assert_eq!(spec.headers[AUTHORIZATION], "Bearer tok");
        assert_eq!(spec.headers[ACCEPT], APPLICATION_JSON);
        assert_eq!(spec.headers[CONTENT_TYPE], FORM_URLENCODED);
        assert_eq!(spec.headers.len(), 3);
    }

    #[test]
    fn auth_request_has_no_authorization_header() {
        let spec = RequestBuilder::auth_request(url(), [("username", "u"), ("password", "p")])
            .build()
            .unwrap();

        assert_eq!(spec.method, Method::Post);
        assert!(!spec.headers.contains_key(AUTHORIZATION));
        assert_eq!(spec.headers[ACCEPT], APPLICATION_JSON);
        assert_eq!(spec.body.to_bytes().unwrap(), "username=u&password=p");
    }

    #[test]
    fn caller_headers_replace_defaults_entirely() {
        let auth = AuthContext::bearer("tok").unwrap();
        let mut custom = HeaderMap::new();
        custom.insert("x-trace", HeaderValue::from_static("1"));

        let spec = RequestBuilder::put(url(), &auth).headers(custom).build().unwrap();

        assert_eq!(spec.headers.len(), 1);
        assert!(!spec.headers.contains_key(AUTHORIZATION));
    }

    #[test]
    fn image_upload_sets_multipart_content_type() {
        let auth = AuthContext::bearer("tok").unwrap();
        let spec = RequestBuilder::post(url(), &auth)
            .upload_image(vec![0xFF, 0xD8, 0xFF, 0xD9])
            .tag("uploads")
            .build()
            .unwrap();

        let RequestBody::Multipart(encoded) = &spec.body else {
            panic!("expected multipart body");
        };
        assert_eq!(spec.headers[CONTENT_TYPE], encoded.content_type.as_str());
        assert_eq!(spec.headers[AUTHORIZATION], "Bearer tok");
        assert_eq!(spec.tag.as_deref(), Some("uploads"));
    }

    #[test]
    fn invalid_header_surfaces_at_build() {
        let err = RequestBuilder::get(url(), &AuthContext::anonymous())
            .header("x-bad", "line\nbreak")
            .build()
            .unwrap_err();
        assert!(err.is_builder());
    }

    #[test]
    fn spec_renders_origin_form_request() {
        let spec = RequestBuilder::delete(url(), &AuthContext::anonymous())
            .query([("id", "7")])
            .build()
            .unwrap();
        let request = spec.to_http().unwrap();

        assert_eq!(request.method(), http::Method::DELETE);
        assert_eq!(request.uri(), "/v1/items?id=7");
        assert_eq!(request.headers()[http::header::HOST], "api.example.test");
    }
}
