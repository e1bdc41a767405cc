//! # tether
//!
//! Mutual-TLS HTTP client for a single pinned backend.
//!
//! ```no_run
//! use tether::{AuthContext, ClientSettings, StoreFormat, StorePassword, StoreSource, Tether};
//!
//! # async fn run(identity: Vec<u8>, trust: Vec<u8>) -> Result<(), tether::Error> {
//! let settings = ClientSettings::new(
//!     "https://api.example.com/v1",
//!     StoreSource::new(identity, StorePassword::new("id-pass"), StoreFormat::Sealed),
//!     vec![StoreSource::new(trust, StorePassword::new("trust-pass"), StoreFormat::Sealed)],
//! )?;
//! let tether = Tether::connect(settings)?;
//!
//! let login = tether.auth("oauth/token", [("username", "ada"), ("password", "…")])?.build()?;
//! let token: serde_json::Value = tether.send(&login).await?.json()?;
//!
//! let auth = AuthContext::bearer(token["access_token"].as_str().unwrap_or_default())?;
//! let spec = tether.upload_image("photos", &auth, std::fs::read("cat.jpg").unwrap_or_default())?
//!     .tag("uploads")
//!     .build()?;
//! let handle = tether.dispatch(spec);
//! handle.join().await?;
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(clippy::all)]

pub mod client;
pub mod settings;

pub use client::Tether;
pub use settings::{ClientSettings, StoreSource};

pub use tether_client::auth::AuthContext;
pub use tether_client::dispatch::DispatchHandle;
pub use tether_client::error::{Error, Result};
pub use tether_client::http::{ApiResponse, Method, RequestBuilder, RequestSpec};
pub use tether_client::multipart::{DEFAULT_JPEG_QUALITY, MultipartPart};
pub use tether_client::retry::RetryPolicy;
pub use tether_client::tls::{
    HostnameVerification, StoreFormat, StorePassword, TlsProtocol, TransportOptions, TrustAnchors,
};
