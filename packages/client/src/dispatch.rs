//! Background request dispatch with cancel-by-tag
//!
//! Each dispatched request runs on its own tokio task under a child of its
//! tag's cancellation token. Cancelling the tag cancels the parent, which
//! reaches attempts in flight and requests sleeping in backoff alike.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::client::{HttpClient, HyperTransport, Transport};
use crate::error::{self, Error};
use crate::http::{ApiResponse, RequestSpec};

#[derive(Debug)]
struct TagEntry {
    token: CancellationToken,
    pending: usize,
    generation: u64,
}

/// Spawns requests and tracks them by tag
#[derive(Debug)]
pub struct Dispatcher<T: Transport = HyperTransport> {
    client: Arc<HttpClient<T>>,
    tags: Arc<DashMap<String, TagEntry>>,
    generations: Arc<AtomicU64>,
}

impl<T: Transport> Clone for Dispatcher<T> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
            tags: Arc::clone(&self.tags),
            generations: Arc::clone(&self.generations),
        }
    }
}

/// Handle to one dispatched request
#[derive(Debug)]
pub struct DispatchHandle {
    join: JoinHandle<Result<ApiResponse, Error>>,
    token: CancellationToken,
}

impl DispatchHandle {
    /// Cancel this request only
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Wait for the request to finish
    ///
    /// # Errors
    ///
    /// The request's own error, or `Cancelled` if the task was aborted.
    pub async fn join(self) -> Result<ApiResponse, Error> {
        match self.join.await {
            Ok(result) => result,
            Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
            Err(_) => Err(error::cancelled()),
        }
    }
}

impl<T: Transport> Dispatcher<T> {
    pub fn new(client: Arc<HttpClient<T>>) -> Self {
        Self { client, tags: Arc::new(DashMap::new()), generations: Arc::new(AtomicU64::new(0)) }
    }

    pub fn client(&self) -> &Arc<HttpClient<T>> {
        &self.client
    }

    /// Spawn `spec` on the runtime
    ///
    /// Must be called from within a tokio runtime.
    pub fn dispatch(&self, spec: RequestSpec) -> DispatchHandle {
        let registration = spec.tag.clone().map(|tag| self.register(tag));
        let token = match &registration {
            Some((_, parent, _)) => parent.child_token(),
            None => CancellationToken::new(),
        };

        let client = Arc::clone(&self.client);
        let tags = Arc::clone(&self.tags);
        let request_token = token.clone();
        let join = tokio::spawn(async move {
            let result = client.execute_with_cancel(&spec, request_token).await.into_result();
            if let Some((tag, _, generation)) = registration {
                release(&tags, &tag, generation);
            }
            result
        });

        DispatchHandle { join, token }
    }

    /// Spawn `spec` and hand its result to `callback` when it finishes
    ///
    /// The callback also runs, with a `Cancelled` error, when the request is
    /// cancelled.
    pub fn dispatch_with<F>(&self, spec: RequestSpec, callback: F) -> CancellationToken
    where
        F: FnOnce(Result<ApiResponse, Error>) + Send + 'static,
    {
        let handle = self.dispatch(spec);
        let token = handle.token.clone();
        tokio::spawn(async move {
            callback(handle.join().await);
        });
        token
    }

    /// Cancel every pending request dispatched with `tag`
    ///
    /// Returns how many requests were pending. Requests dispatched with the
    /// same tag afterwards are unaffected.
    pub fn cancel_tag(&self, tag: &str) -> usize {
        let Some((_, entry)) = self.tags.remove(tag) else {
            return 0;
        };
        entry.token.cancel();
        tracing::info!(target: "tether::dispatch", tag, pending = entry.pending, "Cancelled tagged requests");
        entry.pending
    }

    /// Requests dispatched with `tag` that have not finished
    pub fn pending(&self, tag: &str) -> usize {
        self.tags.get(tag).map_or(0, |entry| entry.pending)
    }

    fn register(&self, tag: String) -> (String, CancellationToken, u64) {
        let mut entry = self.tags.entry(tag.clone()).or_insert_with(|| TagEntry {
            token: CancellationToken::new(),
            pending: 0,
            generation: self.generations.fetch_add(1, Ordering::Relaxed),
        });
        entry.pending += 1;
        let token = entry.token.clone();
        let generation = entry.generation;
        drop(entry);
        (tag, token, generation)
    }
}

fn release(tags: &DashMap<String, TagEntry>, tag: &str, generation: u64) {
    tags.remove_if_mut(tag, |_, entry| {
        if entry.generation != generation {
            return false;
        }
        entry.pending = entry.pending.saturating_sub(1);
        entry.pending == 0
    });
}
