use conduit_types::{ApiRequest, Method};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use tracing::debug;

use crate::{Client, ClientError, Result};

pub type SuccessCallback<V, T> = Arc<dyn Fn(&T, &V) + Send + Sync>;
pub type ErrorCallback<V> = Arc<dyn Fn(&ClientError, &V) + Send + Sync>;

/// Lifecycle hooks of a mutation. Every slot is optional; see
/// [`MutationOptions::merge`] for how caller hooks combine with defaults.
pub struct MutationOptions<V, T> {
    pub on_success: Option<SuccessCallback<V, T>>,
    pub on_error: Option<ErrorCallback<V>>,
}

impl<V, T> Default for MutationOptions<V, T> {
    fn default() -> Self {
        Self {
            on_success: None,
            on_error: None,
        }
    }
}

impl<V, T> Clone for MutationOptions<V, T> {
    fn clone(&self) -> Self {
        Self {
            on_success: self.on_success.clone(),
            on_error: self.on_error.clone(),
        }
    }
}

impl<V, T> MutationOptions<V, T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_success<F>(mut self, callback: F) -> Self
    where
        F: Fn(&T, &V) + Send + Sync + 'static,
    {
        self.on_success = Some(Arc::new(callback));
        self
    }

    pub fn on_error<F>(mut self, callback: F) -> Self
    where
        F: Fn(&ClientError, &V) + Send + Sync + 'static,
    {
        self.on_error = Some(Arc::new(callback));
        self
    }

    /// Slot-wise merge where `overrides` wins. A hook set in `overrides`
    /// replaces the default hook entirely, the two are never chained.
    pub fn merge(defaults: Self, overrides: Self) -> Self {
        Self {
            on_success: overrides.on_success.or(defaults.on_success),
            on_error: overrides.on_error.or(defaults.on_error),
        }
    }
}

/// A one-shot write against a fixed endpoint. The variables passed to
/// [`Mutation::mutate`] become the JSON request body.
pub struct Mutation<V, T> {
    client: Client,
    method: Method,
    endpoint: String,
    options: MutationOptions<V, T>,
}

impl<V, T> Mutation<V, T>
where
    V: Serialize,
    T: DeserializeOwned,
{
    pub(crate) fn new(
        client: Client,
        method: Method,
        endpoint: String,
        options: MutationOptions<V, T>,
    ) -> Self {
        Self {
            client,
            method,
            endpoint,
            options,
        }
    }

    /// Runs the mutation once. Failures are reported through `on_error`
    /// and resolve to `None`.
    pub async fn mutate(&self, variables: V) -> Option<T> {
        self.try_mutate(variables).await.ok()
    }

    /// Like [`Mutation::mutate`], but also hands the error back.
    pub async fn try_mutate(&self, variables: V) -> Result<T> {
        let result = self.send(&variables).await;
        match &result {
            Ok(data) => {
                if let Some(on_success) = &self.options.on_success {
                    on_success(data, &variables);
                }
            }
            Err(err) => {
                debug!(
                    method = %self.method,
                    endpoint = %self.endpoint,
                    error = %err,
                    "mutation failed"
                );
                if let Some(on_error) = &self.options.on_error {
                    on_error(err, &variables);
                }
            }
        }
        result
    }

    async fn send(&self, variables: &V) -> Result<T> {
        let body = serde_json::to_value(variables)
            .map_err(|e| ClientError::Serialization(e.to_string()))?;
        let request = ApiRequest::new(self.method, self.endpoint.clone()).with_body(body);
        self.client.execute(&request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn merge_prefers_caller_hooks() {
        let calls = Arc::new(Mutex::new(Vec::new()));

        let default_calls = calls.clone();
        let defaults = MutationOptions::<(), ()>::new()
            .on_error(move |_, _| default_calls.lock().unwrap().push("default"));
        let caller_calls = calls.clone();
        let caller = MutationOptions::<(), ()>::new()
            .on_error(move |_, _| caller_calls.lock().unwrap().push("caller"));

        let merged = MutationOptions::merge(defaults, caller);
        let on_error = merged.on_error.unwrap();
        on_error(&ClientError::Server("boom".to_string()), &());

        assert_eq!(*calls.lock().unwrap(), vec!["caller"]);
        assert!(merged.on_success.is_none());
    }

    #[test]
    fn merge_keeps_defaults_for_unset_slots() {
        let defaults = MutationOptions::<(), ()>::new().on_error(|_, _| {});
        let caller = MutationOptions::<(), ()>::new().on_success(|_, _| {});

        let merged = MutationOptions::merge(defaults, caller);
        assert!(merged.on_error.is_some());
        assert!(merged.on_success.is_some());
    }
}
