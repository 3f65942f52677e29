use serde_json::{json, Value};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("HTTP error {status}: {message}")]
    Http { status: u16, message: String },

    /// The server answered with an `{"error": ...}` envelope, or with a body
    /// that is not an envelope at all.
    #[error("Server error: {0}")]
    Server(String),

    #[error("Failed to deserialize response: {0}")]
    Deserialization(String),

    #[error("Failed to serialize request: {0}")]
    Serialization(String),

    #[error("Base url unavailable: {0}")]
    BaseUrl(String),
}

impl ClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Http { status, .. } => Some(*status),
            ClientError::Request(err) => err.status().map(|status| status.as_u16()),
            _ => None,
        }
    }

    /// The raw error payload the server sent, as the classifier sees it.
    /// A declared failure is rebuilt as its `{"error": ...}` envelope.
    /// Errors that never produced a response body yield `Value::Null`.
    pub fn payload(&self) -> Value {
        match self {
            ClientError::Http { message, .. } => serde_json::from_str(message)
                .unwrap_or_else(|_| Value::String(message.clone())),
            ClientError::Server(message) => json!({ "error": message }),
            ClientError::Request(_)
            | ClientError::Deserialization(_)
            | ClientError::Serialization(_)
            | ClientError::BaseUrl(_) => Value::Null,
        }
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
