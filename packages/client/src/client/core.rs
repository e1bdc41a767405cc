//! Request executor bound to an installed TLS session

use std::sync::{Arc, PoisonError, RwLock};
use std::time::Instant;

use tokio_util::sync::CancellationToken;

use super::stats::ClientStats;
use super::transport::{HyperTransport, Transport};
use crate::error::{self, Error};
use crate::http::{ApiResponse, RequestSpec};
use crate::retry::{RetryExecutor, RetryOutcome, RetryState};
use crate::tls::TlsSessionConfig;

/// Executes [`RequestSpec`]s over the installed mutual-TLS session
///
/// The session is read once per attempt. Installing a new one affects the
/// next attempt of every request; attempts already connected keep theirs.
#[derive(Debug)]
pub struct HttpClient<T: Transport = HyperTransport> {
    session: RwLock<Option<Arc<TlsSessionConfig>>>,
    transport: T,
    stats: ClientStats,
}

impl Default for HttpClient<HyperTransport> {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient<HyperTransport> {
    /// Client with no session; requests fail with `NotInitialized` until
    /// [`install_session`](Self::install_session) is called
    pub fn new() -> Self {
        Self::with_transport(HyperTransport)
    }
}

impl<T: Transport> HttpClient<T> {
    pub fn with_transport(transport: T) -> Self {
        Self { session: RwLock::new(None), transport, stats: ClientStats::new() }
    }

    /// Swap in a new session configuration
    pub fn install_session(&self, session: TlsSessionConfig) {
        let previous = self
            .session
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(Arc::new(session));
        tracing::info!(target: "tether::client", replaced = previous.is_some(), "TLS session installed");
    }

    pub fn is_initialized(&self) -> bool {
        self.session.read().unwrap_or_else(PoisonError::into_inner).is_some()
    }

    /// Current session
    ///
    /// # Errors
    ///
    /// `NotInitialized` before the first [`install_session`](Self::install_session).
    pub fn session(&self) -> Result<Arc<TlsSessionConfig>, Error> {
        self.session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or_else(error::not_initialized)
    }

    pub fn stats(&self) -> &ClientStats {
        &self.stats
    }

    /// Run `spec` under its retry policy
    ///
    /// # Errors
    ///
    /// See [`execute_with_cancel`](Self::execute_with_cancel).
    pub async fn execute(&self, spec: &RequestSpec) -> Result<ApiResponse, Error> {
        self.execute_with_cancel(spec, CancellationToken::new()).await.into_result()
    }

    /// Run `spec` under its retry policy until success, a permanent failure,
    /// exhaustion or `cancel`
    ///
    /// A non-2xx response is a `Status` error; it is retried only when the
    /// policy lists the status as transient.
    pub async fn execute_with_cancel(
        &self,
        spec: &RequestSpec,
        cancel: CancellationToken,
    ) -> RetryOutcome<ApiResponse> {
        if !self.is_initialized() {
            return RetryOutcome { result: Err(error::not_initialized()), state: RetryState::new() };
        }

        let executor = RetryExecutor::new(spec.retry.clone()).with_cancellation(cancel);
        let outcome = executor.run(|attempt| self.attempt(spec, attempt)).await;
        if let Err(e) = &outcome.result {
            tracing::debug!(
                target: "tether::client",
                method = %spec.method,
                url = %spec.url,
                attempts = outcome.state.attempts_made(),
                error = %e,
                "Request failed"
            );
        }
        outcome
    }

    async fn attempt(&self, spec: &RequestSpec, attempt: u32) -> Result<ApiResponse, Error> {
        let session = self.session()?;
        let request = spec.to_http()?;
        let started = Instant::now();
        self.stats.record_request(request.body().len());

        let response = match self.transport.send(&session, &spec.url, request).await {
            Ok(response) => response,
            Err(e) => {
                self.stats.record_failure();
                return Err(e.with_url(spec.url.clone()));
            }
        };

        let (parts, body) = response.into_parts();
        tracing::debug!(
            target: "tether::client",
            method = %spec.method,
            url = %spec.url,
            attempt,
            status = parts.status.as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Response received"
        );

        if !parts.status.is_success() {
            self.stats.record_failure();
            return Err(error::status_code(spec.url.clone(), parts.status));
        }
        self.stats.record_success(body.len());
        Ok(ApiResponse::new(parts.status, parts.headers, body, spec.url.clone()))
    }
}
