//! Deferred, cancellable search scheduling for keystroke-driven callers.
//!
//! Only the *scheduling* is cancellable: once the delay has elapsed the
//! search runs to completion and a late `cancel()` does nothing.

use std::future::IntoFuture;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use futures::future::BoxFuture;
use parking_lot::Mutex;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use super::query::{SearchClient, SearchError};
use crate::model::types::{SearchOptions, SearchResult};

/// Cloneable trigger that cancels one pending search before it fires.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    tx: Arc<Mutex<Option<oneshot::Sender<()>>>>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        if let Some(tx) = self.tx.lock().take() {
            // Err means the timer already fired; nothing to cancel.
            let _ = tx.send(());
        }
    }
}

/// A search scheduled to run after a delay.
///
/// Resolve it with [`PendingSearch::wait`] or by awaiting it directly.
/// Dropping every handle to a search that has not fired yet suppresses it.
#[derive(Debug)]
pub struct PendingSearch {
    cancel: CancelHandle,
    task: JoinHandle<Result<SearchResult, SearchError>>,
}

impl PendingSearch {
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// The search result, or [`SearchError::Cancelled`] if it was cancelled before firing.
    pub async fn wait(self) -> Result<SearchResult, SearchError> {
        self.task
            .await
            .map_err(|err| SearchError::Task(err.to_string()))?
    }
}

impl IntoFuture for PendingSearch {
    type Output = Result<SearchResult, SearchError>;
    type IntoFuture = BoxFuture<'static, Self::Output>;

    fn into_future(self) -> Self::IntoFuture {
        self.wait().boxed()
    }
}

impl SearchClient {
    /// Schedule `options` after the configured debounce delay.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn debounced_search(&self, options: SearchOptions) -> PendingSearch {
        self.debounced_search_after(options, self.settings().debounce)
    }

    /// Schedule `options` to run after `delay`.
    ///
    /// Store failures during the deferred run degrade to an empty result,
    /// exactly like [`SearchClient::search`].
    pub fn debounced_search_after(&self, options: SearchOptions, delay: Duration) -> PendingSearch {
        let (tx, mut rx) = oneshot::channel::<()>();
        let client = self.clone();

        let task = tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = &mut rx => {
                    tracing::debug!(query = %options.query, "debounced search cancelled");
                    return Err(SearchError::Cancelled);
                }
                _ = tokio::time::sleep(delay) => {}
            }
            drop(rx);
            Ok(client.search(options).await)
        });

        PendingSearch {
            cancel: CancelHandle {
                tx: Arc::new(Mutex::new(Some(tx))),
            },
            task,
        }
    }
}

/// Keeps at most one search pending: scheduling a new one cancels the previous.
#[derive(Debug)]
pub struct Debouncer {
    client: SearchClient,
    delay: Duration,
    current: Mutex<Option<CancelHandle>>,
}

impl Debouncer {
    pub fn new(client: SearchClient) -> Self {
        let delay = client.settings().debounce;
        Self::with_delay(client, delay)
    }

    pub fn with_delay(client: SearchClient, delay: Duration) -> Self {
        Self {
            client,
            delay,
            current: Mutex::new(None),
        }
    }

    /// Schedule `options`, superseding whatever was still waiting.
    pub fn schedule(&self, options: SearchOptions) -> PendingSearch {
        let pending = self.client.debounced_search_after(options, self.delay);
        if let Some(previous) = self.current.lock().replace(pending.cancel_handle()) {
            previous.cancel();
        }
        pending
    }

    pub fn cancel(&self) {
        if let Some(current) = self.current.lock().take() {
            current.cancel();
        }
    }
}
