//! Bearer token authentication

use std::fmt;

use http::{HeaderMap, HeaderValue};

use crate::error::{self, Error};

/// Authentication provider trait for different auth types
pub trait AuthProvider: Send + Sync {
    /// Apply authentication to headers
    ///
    /// # Errors
    ///
    /// Returns a builder error if the credential cannot be expressed as a header.
    fn apply_auth(&self, headers: &mut HeaderMap) -> Result<(), Error>;

    /// Get authentication method name
    fn auth_type(&self) -> &'static str;
}

/// Bearer token, validated and marked sensitive up front
#[derive(Clone)]
pub struct BearerToken {
    header: HeaderValue,
}

impl BearerToken {
    /// # Errors
    ///
    /// Builder error for an empty token or one containing bytes not allowed
    /// in a header value.
    pub fn new(token: impl AsRef<str>) -> Result<Self, Error> {
        let token = token.as_ref().trim();
        if token.is_empty() {
            return Err(error::builder("bearer token is empty"));
        }
        let mut header = HeaderValue::try_from(format!("Bearer {token}"))
            .map_err(|e| error::builder(format!("invalid bearer token: {e}")))?;
        header.set_sensitive(true);
        Ok(Self { header })
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BearerToken(<redacted>)")
    }
}

impl AuthProvider for BearerToken {
    fn apply_auth(&self, headers: &mut HeaderMap) -> Result<(), Error> {
        headers.insert(http::header::AUTHORIZATION, self.header.clone());
        Ok(())
    }

    fn auth_type(&self) -> &'static str {
        "Bearer"
    }
}

/// Credentials for the requests built from it
///
/// Passed explicitly to request construction; there is no process-wide token.
#[derive(Debug, Clone, Default)]
pub struct AuthContext {
    bearer: Option<BearerToken>,
}

impl AuthContext {
    /// No credentials; only the authentication request itself uses this
    pub fn anonymous() -> Self {
        Self { bearer: None }
    }

    /// # Errors
    ///
    /// See [`BearerToken::new`].
    pub fn bearer(token: impl AsRef<str>) -> Result<Self, Error> {
        Ok(Self { bearer: Some(BearerToken::new(token)?) })
    }

    pub fn is_authenticated(&self) -> bool {
        self.bearer.is_some()
    }
}

impl AuthProvider for AuthContext {
    fn apply_auth(&self, headers: &mut HeaderMap) -> Result<(), Error> {
        match &self.bearer {
            Some(token) => token.apply_auth(headers),
            None => Ok(()),
        }
    }

    fn auth_type(&self) -> &'static str {
        match &self.bearer {
            Some(token) => token.auth_type(),
            None => "None",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_header_is_sensitive() {
        let mut headers = HeaderMap::new();
        AuthContext::bearer("abc123").unwrap().apply_auth(&mut headers).unwrap();
        let value = &headers[http::header::AUTHORIZATION];
        assert_eq!(value, "Bearer abc123");
        assert!(value.is_sensitive());
    }

    #[test]
    fn token_debug_output_is_redacted() {
        let ctx = AuthContext::bearer("top-secret").unwrap();
        assert!(!format!("{ctx:?}").contains("top-secret"));
    }

    #[test]
    fn rejects_empty_and_multiline_tokens() {
        assert!(BearerToken::new("   ").is_err());
        assert!(BearerToken::new("abc\r\nX-Evil: 1").is_err());
    }

    #[test]
    fn anonymous_context_adds_nothing() {
        let mut headers = HeaderMap::new();
        AuthContext::anonymous().apply_auth(&mut headers).unwrap();
        assert!(headers.is_empty());
    }
}
