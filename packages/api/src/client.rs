//! The `Tether` client: one-shot startup and a request factory

use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;
use tokio_util::sync::CancellationToken;
use url::Url;

use tether_client::auth::AuthContext;
use tether_client::client::{HttpClient, HyperTransport, Transport};
use tether_client::dispatch::{DispatchHandle, Dispatcher};
use tether_client::error::{self, Error};
use tether_client::http::{ApiResponse, Method, RequestBuilder, RequestSpec};
use tether_client::multipart::{self, MultipartPart};
use tether_client::retry::{RetryOutcome, RetryPolicy};
use tether_client::tls::{SecureTransportFactory, TransportOptions, TrustChain};

use crate::settings::{ClientSettings, StoreSource};

/// Mutual-TLS client for one backend
///
/// Built once from [`ClientSettings`]; afterwards every request shares the
/// same TLS session configuration. The store sources are consumed at startup.
#[derive(Debug)]
pub struct Tether<T: Transport = HyperTransport> {
    base_url: Url,
    retry: RetryPolicy,
    transport: TransportOptions,
    trust_chain: TrustChain,
    dispatcher: Dispatcher<T>,
}

impl Tether<HyperTransport> {
    /// Load the stores, build the session and install it
    ///
    /// # Errors
    ///
    /// `CertificateLoad` when a store cannot be opened, `TlsSetup` when the
    /// identity and trust chain cannot be combined.
    pub fn connect(settings: ClientSettings) -> Result<Self, Error> {
        Self::connect_with_transport(settings, HyperTransport)
    }
}

impl<T: Transport> Tether<T> {
    /// [`connect`](Tether::connect) over a caller-supplied transport
    ///
    /// # Errors
    ///
    /// See [`Tether::connect`].
    pub fn connect_with_transport(settings: ClientSettings, transport: T) -> Result<Self, Error> {
        let ClientSettings { base_url, identity, trust, extra_anchors, retry, transport: options } =
            settings;

        let mut trust_chain = TrustChain::new();
        for (index, source) in trust.into_iter().enumerate() {
            let anchors = source.load_trust()?;
            tracing::debug!(target: "tether::client", index, anchors = anchors.len(), "Trust store loaded");
            trust_chain.add_verifier(anchors);
        }
        for anchors in extra_anchors {
            trust_chain.add_verifier(anchors);
        }

        let client = HttpClient::with_transport(transport);
        install(&client, &options, identity, trust_chain.clone())?;

        tracing::info!(
            target: "tether::client",
            base_url = %base_url,
            verifiers = trust_chain.len(),
            "Client ready"
        );
        Ok(Self {
            dispatcher: Dispatcher::new(Arc::new(client)),
            base_url,
            retry,
            transport: options,
            trust_chain,
        })
    }

    /// Replace the client identity, keeping the trust chain
    ///
    /// Requests already connected finish on the old session.
    ///
    /// # Errors
    ///
    /// See [`Tether::connect`]. On error the previous session stays installed.
    pub fn rotate_identity(&self, identity: StoreSource) -> Result<(), Error> {
        install(self.client(), &self.transport, identity, self.trust_chain.clone())
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn retry(&self) -> &RetryPolicy {
        &self.retry
    }

    pub fn transport(&self) -> &TransportOptions {
        &self.transport
    }

    pub fn client(&self) -> &HttpClient<T> {
        self.dispatcher.client()
    }

    pub fn dispatcher(&self) -> &Dispatcher<T> {
        &self.dispatcher
    }

    /// Resolve `path` against the base URL
    ///
    /// A leading `/` is ignored, so `"/users"` and `"users"` both land under
    /// the base path. The result must keep the base origin and stay under the
    /// base path.
    ///
    /// # Errors
    ///
    /// Builder error when `path` does not form a valid URL, or when it names
    /// another origin or climbs above the base path.
    pub fn url(&self, path: &str) -> Result<Url, Error> {
        let url = self.base_url.join(path.trim_start_matches('/'))?;
        if url.origin() != self.base_url.origin() || !url.path().starts_with(self.base_url.path()) {
            tracing::warn!(target: "tether::client", path, "Path resolves outside the base URL - rejecting");
            return Err(error::builder(format!("path {path:?} resolves outside {}", self.base_url))
                .with_url(url));
        }
        Ok(url)
    }

    /// Request builder with the default headers and retry policy
    ///
    /// # Errors
    ///
    /// See [`Tether::url`].
    pub fn request(
        &self,
        method: Method,
        path: &str,
        auth: &AuthContext,
    ) -> Result<RequestBuilder, Error> {
        Ok(RequestBuilder::new(method, self.url(path)?, auth).retry(self.retry.clone()))
    }

    /// # Errors
    ///
    /// See [`Tether::url`].
    pub fn get(&self, path: &str, auth: &AuthContext) -> Result<RequestBuilder, Error> {
        self.request(Method::Get, path, auth)
    }

    /// # Errors
    ///
    /// See [`Tether::url`].
    pub fn post(&self, path: &str, auth: &AuthContext) -> Result<RequestBuilder, Error> {
        self.request(Method::Post, path, auth)
    }

    /// # Errors
    ///
    /// See [`Tether::url`].
    pub fn put(&self, path: &str, auth: &AuthContext) -> Result<RequestBuilder, Error> {
        self.request(Method::Put, path, auth)
    }

    /// # Errors
    ///
    /// See [`Tether::url`].
    pub fn delete(&self, path: &str, auth: &AuthContext) -> Result<RequestBuilder, Error> {
        self.request(Method::Delete, path, auth)
    }

    /// Form POST without a bearer token, for obtaining one
    ///
    /// # Errors
    ///
    /// See [`Tether::url`].
    pub fn auth<K, V>(
        &self,
        path: &str,
        params: impl IntoIterator<Item = (K, V)>,
    ) -> Result<RequestBuilder, Error>
    where
        K: Into<String>,
        V: Into<String>,
    {
        Ok(RequestBuilder::auth_request(self.url(path)?, params)
            .retry(self.retry.clone()))
    }

    /// POST already-compressed JPEG bytes as the `media` part
    ///
    /// # Errors
    ///
    /// See [`Tether::url`].
    pub fn upload_image(
        &self,
        path: &str,
        auth: &AuthContext,
        jpeg: impl Into<Bytes>,
    ) -> Result<RequestBuilder, Error> {
        Ok(self.post(path, auth)?.upload_image(jpeg))
    }

    /// Compress the image at `file` to JPEG at `quality` and POST it
    ///
    /// # Errors
    ///
    /// `Encoding` when the file cannot be read or decoded.
    pub fn upload_image_file(
        &self,
        path: &str,
        auth: &AuthContext,
        file: impl AsRef<Path>,
        quality: u8,
    ) -> Result<RequestBuilder, Error> {
        let jpeg = multipart::jpeg_from_file(file, quality)?;
        self.upload_image(path, auth, jpeg)
    }

    /// POST arbitrary parts as `multipart/form-data`
    ///
    /// # Errors
    ///
    /// See [`Tether::url`]. Encoding failures surface from `build`.
    pub fn upload_parts(
        &self,
        path: &str,
        auth: &AuthContext,
        parts: Vec<MultipartPart>,
    ) -> Result<RequestBuilder, Error> {
        Ok(self.post(path, auth)?.parts(parts))
    }

    /// Execute `spec` and wait for the result
    ///
    /// # Errors
    ///
    /// The last error once the retry policy gives up, or the first error it
    /// does not retry.
    pub async fn send(&self, spec: &RequestSpec) -> Result<ApiResponse, Error> {
        self.client().execute(spec).await
    }

    /// Execute `spec` and return the retry history alongside the result
    pub async fn send_with_cancel(
        &self,
        spec: &RequestSpec,
        cancel: CancellationToken,
    ) -> RetryOutcome<ApiResponse> {
        self.client().execute_with_cancel(spec, cancel).await
    }

    /// Run `spec` in the background
    pub fn dispatch(&self, spec: RequestSpec) -> DispatchHandle {
        self.dispatcher.dispatch(spec)
    }

    /// Run `spec` in the background and hand the result to `callback`
    pub fn dispatch_with<F>(&self, spec: RequestSpec, callback: F) -> CancellationToken
    where
        F: FnOnce(Result<ApiResponse, Error>) + Send + 'static,
    {
        self.dispatcher.dispatch_with(spec, callback)
    }

    /// Cancel every pending request tagged `tag`; returns how many there were
    pub fn cancel_tag(&self, tag: &str) -> usize {
        self.dispatcher.cancel_tag(tag)
    }
}

fn install<T: Transport>(
    client: &HttpClient<T>,
    options: &TransportOptions,
    identity: StoreSource,
    trust_chain: TrustChain,
) -> Result<(), Error> {
    let credential = identity.load_identity()?;
    let factory = SecureTransportFactory::new(options.clone());
    let session = factory.build(credential, trust_chain).map_err(Error::from)?;
    client.install_session(session);
    Ok(())
}
