//! # tether_client
//!
//! Mutual-TLS HTTP client core for talking to a single pinned backend.
//!
//! - **Credential stores**: client identity and trust anchors loaded from
//!   password-protected PEM bundles ([`tls::CertificateStore`])
//! - **Trust chains**: ordered verifiers where any one accepting is enough,
//!   failing closed when empty ([`tls::TrustChain`])
//! - **Hostname verification** on by default; disabling it requires
//!   [`tls::hostname::danger`]
//! - **Multipart encoding** with collision-checked boundaries
//!   ([`multipart::MultipartEncoder`])
//! - **Bounded retry** with deterministic backoff and cancellation
//!   ([`retry::RetryPolicy`])
//! - **Tagged dispatch** with cancel-by-tag ([`dispatch::Dispatcher`])
//!
//! ## Usage
//!
//! ```no_run
//! use tether_client::prelude::*;
//!
//! # async fn run(identity: &[u8], trust: &[u8]) -> Result<()> {
//! let credential = CertificateStore::load_identity(identity, StorePassword::new("id-pass"), StoreFormat::Sealed)?;
//! let anchors = CertificateStore::load_trust(trust, StorePassword::new("trust-pass"), StoreFormat::Sealed)?;
//!
//! let mut chain = TrustChain::new();
//! chain.add_verifier(anchors);
//! let session = SecureTransportFactory::default().build(credential, chain)?;
//!
//! let client = HttpClient::new();
//! client.install_session(session);
//!
//! let auth = AuthContext::bearer("token")?;
//! let url = Url::parse("https://api.example.com/v1/profile")?;
//! let response = client.execute(&RequestBuilder::get(url, &auth).build()?).await?;
//! println!("{}", response.text()?);
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(clippy::all)]

pub mod auth;
pub mod client;
pub mod config;
pub mod crypto;
pub mod dispatch;
pub mod error;
pub mod http;
pub mod multipart;
pub mod prelude;
pub mod retry;
pub mod tls;

pub use client::HttpClient;
pub use dispatch::{DispatchHandle, Dispatcher};
pub use error::{Error, Result};
