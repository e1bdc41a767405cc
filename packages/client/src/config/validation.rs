//! Configuration validation
//!
//! Shared checks for timeouts, ranges and endpoint URLs used by the retry
//! policy, the transport options and the client settings.

use std::time::Duration;

/// Configuration validation result type
pub type ConfigResult<T> = Result<T, ConfigurationError>;

/// Configuration error types
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigurationError {
    #[error("Invalid timeout value: {0}")]
    InvalidTimeout(String),

    #[error("Invalid endpoint URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid configuration parameter: {0}")]
    InvalidParameter(String),

    #[error("Configuration conflict: {0}")]
    Conflict(String),
}

/// Configuration validation trait
pub trait Validator {
    /// Validates the configuration settings
    ///
    /// # Errors
    ///
    /// Returns a `ConfigurationError` variant if any validation fails:
    /// - `InvalidTimeout` - if timeout values are zero or exceed limits
    /// - `InvalidUrl` - if an endpoint is not an absolute https URL
    /// - `InvalidParameter` - if parameters are outside valid ranges
    /// - `Conflict` - if configuration settings conflict with each other
    fn validate(&self) -> ConfigResult<()>;
}

/// Common configuration validation utilities
pub struct ConfigValidator;

impl ConfigValidator {
    /// Longest timeout any setting may carry
    pub const MAX_TIMEOUT: Duration = Duration::from_secs(3600);

    /// Validate timeout duration
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::InvalidTimeout` if:
    /// - The timeout duration is zero
    /// - The timeout duration exceeds 1 hour (3600 seconds)
    pub fn validate_timeout(timeout: Duration, name: &str) -> ConfigResult<()> {
        if timeout.is_zero() {
            return Err(ConfigurationError::InvalidTimeout(format!("{name} cannot be zero")));
        }

        if timeout > Self::MAX_TIMEOUT {
            return Err(ConfigurationError::InvalidTimeout(format!("{name} cannot exceed 1 hour")));
        }

        Ok(())
    }

    /// Validate numeric range
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::InvalidParameter` if the value is outside
    /// the specified range [min, max] (inclusive).
    pub fn validate_range<T>(value: T, min: T, max: T, name: &str) -> ConfigResult<()>
    where
        T: PartialOrd + std::fmt::Display + Copy,
    {
        if value < min || value > max {
            return Err(ConfigurationError::InvalidParameter(format!(
                "{name} must be between {min} and {max}, got {value}"
            )));
        }

        Ok(())
    }

    /// Validate an endpoint URL for mutual-TLS traffic
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::InvalidUrl` unless the URL is absolute,
    /// uses `https` and names a host.
    pub fn validate_https_url(url: &url::Url, name: &str) -> ConfigResult<()> {
        if url.scheme() != "https" {
            return Err(ConfigurationError::InvalidUrl(format!(
                "{name} must use https, got {}",
                url.scheme()
            )));
        }
        if url.host_str().is_none_or(str::is_empty) {
            return Err(ConfigurationError::InvalidUrl(format!("{name} has no host")));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeouts_must_be_positive_and_bounded() {
        assert!(ConfigValidator::validate_timeout(Duration::ZERO, "t").is_err());
        assert!(ConfigValidator::validate_timeout(Duration::from_secs(7200), "t").is_err());
        assert!(ConfigValidator::validate_timeout(Duration::from_secs(30), "t").is_ok());
    }

    #[test]
    fn plain_http_endpoints_are_refused() {
        let url = url::Url::parse("http://api.example.test").unwrap();
        assert!(matches!(
            ConfigValidator::validate_https_url(&url, "base_url"),
            Err(ConfigurationError::InvalidUrl(_))
        ));
    }
}
