mod base_url;
pub mod cache;
mod classify;
mod error;
pub mod mutation;
mod notify;
pub mod query;

pub use base_url::{BaseUrlProvider, EnvBaseUrl};
pub use cache::{LocalCache, QueryCache, QueryKey, QueryState};
pub use classify::{
    classify, classify_payload, is_rate_limited, RATE_LIMITED, UNKNOWN_ERROR, UPSTREAM_ERROR,
};
pub use error::{ClientError, Result};
pub use mutation::{Mutation, MutationOptions};
pub use notify::{Notifier, TracingNotifier};
pub use query::{Query, QueryOptions};

use cache::Fetcher;
use conduit_types::{ApiRequest, Envelope, Method};
use futures::FutureExt;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::sync::Arc;

#[derive(Clone)]
pub struct Client {
    http: reqwest::Client,
    base_url: Arc<dyn BaseUrlProvider>,
    notifier: Arc<dyn Notifier>,
}

impl Client {
    pub fn new(base_url: String) -> Self {
        Self::with_provider(Arc::new(base_url))
    }

    pub fn with_provider(base_url: Arc<dyn BaseUrlProvider>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url,
            notifier: Arc::new(TracingNotifier),
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_http(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    /// Issues exactly one HTTP call and unwraps the response envelope.
    ///
    /// Non-2xx responses surface as [`ClientError::Http`] with the raw body,
    /// an `{"error": ...}` envelope (or no envelope at all) as
    /// [`ClientError::Server`]. Nothing is retried or logged here.
    pub async fn execute<T: DeserializeOwned>(&self, request: &ApiRequest) -> Result<T> {
        let url = format!("{}{}", self.base_url.base_url()?, request.endpoint);
        let mut builder = self.http.request(to_reqwest_method(request.method), &url);
        if !request.params.is_empty() {
            builder = builder.query(&request.params);
        }
        if let Some(body) = request.body.as_ref().filter(|body| !body.is_null()) {
            builder = builder.json(body);
        }

        let response = builder.send().await?;

        if !response.status().is_success() {
            return Err(ClientError::Http {
                status: response.status().as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        let text = response.text().await?;
        let body = match serde_json::from_str(&text) {
            Ok(body) => body,
            Err(_) => Value::String(text),
        };

        match Envelope::from_value(body) {
            Envelope::Data(data) => serde_json::from_value(data)
                .map_err(|e| ClientError::Deserialization(e.to_string())),
            Envelope::Error(message) => Err(ClientError::Server(message)),
        }
    }

    /// Builds a mutation whose failures go to this client's notifier unless
    /// `options` brings its own `on_error`, which then replaces it.
    pub fn mutation<V, T>(
        &self,
        method: Method,
        endpoint: impl Into<String>,
        options: MutationOptions<V, T>,
    ) -> Mutation<V, T>
    where
        V: Serialize + 'static,
        T: DeserializeOwned + 'static,
    {
        let defaults = notify_on_error(self.notifier.clone());
        Mutation::new(
            self.clone(),
            method,
            endpoint.into(),
            MutationOptions::merge(defaults, options),
        )
    }

    /// Registers `request` with `cache` and returns a handle that reports
    /// the query's failures to this client's notifier.
    pub fn query<T, C>(&self, cache: &C, request: ApiRequest, options: QueryOptions) -> Query<T>
    where
        T: DeserializeOwned + Clone + Send + Sync + 'static,
        C: QueryCache,
    {
        let key = options.key.unwrap_or_else(|| QueryKey::from(&request));
        let subscription = cache.watch(&key, fetcher(self.clone(), request), options.enabled);
        Query::new(key, subscription, self.notifier.clone(), options.mute_errors)
    }
}

fn notify_on_error<V: 'static, T: 'static>(notifier: Arc<dyn Notifier>) -> MutationOptions<V, T> {
    MutationOptions::new().on_error(move |err: &ClientError, _: &V| notifier.notify(&classify(err)))
}

fn fetcher<T>(client: Client, request: ApiRequest) -> Fetcher<T>
where
    T: DeserializeOwned + Send + 'static,
{
    let request = Arc::new(request);
    Arc::new(move || {
        let client = client.clone();
        let request = request.clone();
        async move { client.execute(&request).await }.boxed()
    })
}

fn to_reqwest_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Patch => reqwest::Method::PATCH,
        Method::Delete => reqwest::Method::DELETE,
    }
}
