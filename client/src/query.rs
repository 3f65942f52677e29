use std::sync::{Arc, Mutex, PoisonError};
use tokio::{sync::watch, task::JoinHandle};
use tracing::error;

use crate::cache::{QueryKey, QueryState, Refetch, Subscription};
use crate::{classify, ClientError, Notifier};

#[derive(Debug, Clone)]
pub struct QueryOptions {
    /// Overrides the key derived from the request.
    pub key: Option<QueryKey>,
    pub enabled: bool,
    /// Keeps failures of this query out of the notifier.
    pub mute_errors: bool,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            key: None,
            enabled: true,
            mute_errors: false,
        }
    }
}

impl QueryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key(mut self, key: QueryKey) -> Self {
        self.key = Some(key);
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn mute_errors(mut self, mute: bool) -> Self {
        self.mute_errors = mute;
        self
    }
}

/// Reports each distinct error of a query exactly once. Identity is the
/// `Arc` pointer; the last seen error is kept alive so its address cannot be
/// reused by a later one.
struct ErrorWatch {
    key: QueryKey,
    mute: bool,
    notifier: Arc<dyn Notifier>,
    last_seen: Mutex<Option<Arc<ClientError>>>,
}

impl ErrorWatch {
    fn observe(&self, error: Option<Arc<ClientError>>) {
        let Some(error) = error else {
            return;
        };
        {
            let mut last_seen = self.last_seen.lock().unwrap_or_else(PoisonError::into_inner);
            if last_seen.as_ref().is_some_and(|seen| Arc::ptr_eq(seen, &error)) {
                return;
            }
            *last_seen = Some(error.clone());
        }

        error!(key = %self.key, error = %error, muted = self.mute, "query failed");
        if !self.mute {
            self.notifier.notify(&classify(&error));
        }
    }
}

/// A cached read bound to one request. Failures are reported to the
/// notifier as a side effect of state changes, whether or not the caller
/// reads the state.
pub struct Query<T> {
    key: QueryKey,
    state: watch::Receiver<QueryState<T>>,
    refetch: Refetch,
    errors: Arc<ErrorWatch>,
    observer: JoinHandle<()>,
}

impl<T> Query<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub(crate) fn new(
        key: QueryKey,
        subscription: Subscription<T>,
        notifier: Arc<dyn Notifier>,
        mute: bool,
    ) -> Self {
        let errors = Arc::new(ErrorWatch {
            key: key.clone(),
            mute,
            notifier,
            last_seen: Mutex::new(None),
        });

        let mut updates = subscription.state.clone();
        let observer = {
            let errors = errors.clone();
            tokio::spawn(async move {
                loop {
                    let error = updates.borrow_and_update().error.clone();
                    errors.observe(error);
                    if updates.changed().await.is_err() {
                        break;
                    }
                }
            })
        };

        Self {
            key,
            state: subscription.state,
            refetch: subscription.refetch,
            errors,
            observer,
        }
    }

    pub fn key(&self) -> &QueryKey {
        &self.key
    }

    pub fn state(&self) -> QueryState<T> {
        let state = self.state.borrow().clone();
        self.errors.observe(state.error.clone());
        state
    }

    pub fn data(&self) -> Option<T> {
        self.state().data
    }

    pub fn error(&self) -> Option<Arc<ClientError>> {
        self.state().error
    }

    pub fn is_error(&self) -> bool {
        self.state().is_error()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().is_loading
    }

    /// Waits until the query holds data or an error and is not loading.
    pub async fn settled(&mut self) -> QueryState<T> {
        let settled = self
            .state
            .wait_for(|state| state.is_settled())
            .await
            .map(|state| QueryState::clone(&state))
            .ok();
        let state = settled.unwrap_or_else(|| self.state.borrow().clone());
        self.errors.observe(state.error.clone());
        state
    }

    /// Waits for the next state change. `None` once the cache closed the
    /// channel.
    pub async fn changed(&mut self) -> Option<QueryState<T>> {
        self.state.changed().await.ok()?;
        let state = self.state.borrow_and_update().clone();
        self.errors.observe(state.error.clone());
        Some(state)
    }

    pub async fn refetch(&mut self) -> QueryState<T> {
        (self.refetch)().await;
        let state = self.state.borrow_and_update().clone();
        self.errors.observe(state.error.clone());
        state
    }
}

impl<T> Drop for Query<T> {
    fn drop(&mut self) {
        self.observer.abort();
    }
}
