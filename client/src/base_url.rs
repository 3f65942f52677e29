use crate::{ClientError, Result};

/// Resolves the server root url. Called once per request, so a provider may
/// pick up configuration changes between calls.
pub trait BaseUrlProvider: Send + Sync {
    fn base_url(&self) -> Result<String>;
}

impl BaseUrlProvider for String {
    fn base_url(&self) -> Result<String> {
        Ok(self.clone())
    }
}

/// Reads the base url from an environment variable on every call.
#[derive(Debug, Clone)]
pub struct EnvBaseUrl {
    var: String,
}

impl EnvBaseUrl {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl BaseUrlProvider for EnvBaseUrl {
    fn base_url(&self) -> Result<String> {
        std::env::var(&self.var)
            .map_err(|e| ClientError::BaseUrl(format!("{}: {}", self.var, e)))
    }
}
