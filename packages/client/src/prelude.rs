//! Types needed for everyday use

pub use crate::auth::AuthContext;
pub use crate::client::{HttpClient, Transport};
pub use crate::dispatch::{DispatchHandle, Dispatcher};
pub use crate::error::{Error, Result};
pub use crate::http::{ApiResponse, Method, RequestBuilder, RequestSpec};
pub use crate::multipart::{EncodedMultipart, MultipartEncoder, MultipartPart};
pub use crate::retry::RetryPolicy;
pub use crate::tls::{
    CertificateStore, HostnameVerification, SecureTransportFactory, StoreFormat, StorePassword,
    TlsSessionConfig, TransportOptions, TrustAnchors, TrustChain,
};

pub use ::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
pub use url::Url;
