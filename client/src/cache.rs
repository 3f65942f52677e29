use conduit_types::ApiRequest;
use futures::future::{BoxFuture, FutureExt};
use serde_json::Value;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::watch;
use tracing::{debug, trace};

use crate::{ClientError, Result};

pub type Fetcher<T> = Arc<dyn Fn() -> BoxFuture<'static, Result<T>> + Send + Sync>;
pub type Refetch = Arc<dyn Fn() -> BoxFuture<'static, ()> + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey(String);

impl QueryKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// `[method, endpoint, [[name, value], ..], body]` as compact JSON.
impl From<&ApiRequest> for QueryKey {
    fn from(request: &ApiRequest) -> Self {
        let params = request
            .params
            .iter()
            .map(|(name, value)| Value::from(vec![name.as_str(), value.as_str()]))
            .collect();
        let key = Value::Array(vec![
            Value::from(request.method.to_string()),
            Value::from(request.endpoint.as_str()),
            Value::Array(params),
            request.body.clone().unwrap_or(Value::Null),
        ]);
        Self(key.to_string())
    }
}

/// Reactive state of one cached query. A failed refetch keeps the last
/// successful `data`; every failure gets a fresh `Arc`, so observers can
/// tell one occurrence from the next by pointer.
#[derive(Debug, Clone)]
pub struct QueryState<T> {
    pub data: Option<T>,
    pub error: Option<Arc<ClientError>>,
    pub is_loading: bool,
}

impl<T> Default for QueryState<T> {
    fn default() -> Self {
        Self {
            data: None,
            error: None,
            is_loading: false,
        }
    }
}

impl<T> QueryState<T> {
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    pub fn is_settled(&self) -> bool {
        !self.is_loading && (self.data.is_some() || self.error.is_some())
    }
}

pub struct Subscription<T> {
    pub state: watch::Receiver<QueryState<T>>,
    pub refetch: Refetch,
}

/// Storage and scheduling for queries. Implementations own the fetch policy;
/// callers only hand over a fetcher and read the published state.
pub trait QueryCache: Send + Sync {
    fn watch<T>(&self, key: &QueryKey, fetcher: Fetcher<T>, enabled: bool) -> Subscription<T>
    where
        T: Clone + Send + Sync + 'static;
}

struct Entry {
    sender: Box<dyn Any + Send + Sync>,
    refetch: Refetch,
}

/// In-process cache: one entry per key, fetched on first enabled watch and
/// again only on explicit refetch. Must be used from within a tokio runtime.
#[derive(Clone, Default)]
pub struct LocalCache {
    entries: Arc<Mutex<HashMap<QueryKey, Entry>>>,
}

impl LocalCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refetches the entry for `key`, returning false if there is none.
    pub async fn refetch(&self, key: &QueryKey) -> bool {
        let refetch = self.lock().get(key).map(|entry| entry.refetch.clone());
        match refetch {
            Some(refetch) => {
                refetch().await;
                true
            }
            None => false,
        }
    }

    /// Drops the entry for `key`. Existing subscribers keep their last state.
    pub fn invalidate(&self, key: &QueryKey) -> bool {
        debug!(key = %key, "invalidate query");
        self.lock().remove(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<QueryKey, Entry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl QueryCache for LocalCache {
    fn watch<T>(&self, key: &QueryKey, fetcher: Fetcher<T>, enabled: bool) -> Subscription<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        let mut entries = self.lock();

        if let Some(entry) = entries.get(key) {
            if let Some(sender) = entry.sender.downcast_ref::<Arc<watch::Sender<QueryState<T>>>>() {
                let idle = {
                    let state = sender.borrow();
                    !state.is_loading && state.data.is_none() && state.error.is_none()
                };
                let refetch = entry.refetch.clone();
                let state = sender.subscribe();
                drop(entries);

                if enabled && idle {
                    tokio::spawn(refetch());
                } else {
                    trace!(key = %key, "query served from cache");
                }
                return Subscription { state, refetch };
            }
            debug!(key = %key, "replace cached query of a different type");
        }

        let (sender, state) = watch::channel(QueryState::default());
        let sender = Arc::new(sender);
        let refetch = refetcher(key.clone(), sender.clone(), fetcher);
        entries.insert(
            key.clone(),
            Entry {
                sender: Box::new(sender),
                refetch: refetch.clone(),
            },
        );
        drop(entries);

        if enabled {
            tokio::spawn(refetch());
        }
        Subscription { state, refetch }
    }
}

fn refetcher<T>(
    key: QueryKey,
    sender: Arc<watch::Sender<QueryState<T>>>,
    fetcher: Fetcher<T>,
) -> Refetch
where
    T: Send + Sync + 'static,
{
    Arc::new(move || {
        let key = key.clone();
        let sender = sender.clone();
        let fetch = fetcher();
        async move {
            debug!(key = %key, "fetch query");
            sender.send_modify(|state| state.is_loading = true);
            let result = fetch.await;
            sender.send_modify(|state| {
                state.is_loading = false;
                match result {
                    Ok(data) => {
                        state.data = Some(data);
                        state.error = None;
                    }
                    Err(err) => state.error = Some(Arc::new(err)),
                }
            });
            trace!(key = %key, "fetch query done");
        }
        .boxed()
    })
}
