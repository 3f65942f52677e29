//! Turns any failure into the single line shown to the user.
//!
//! The server forwards errors from the Anilist API verbatim inside its
//! `{"error": ...}` envelope, sometimes as a JSON document carrying a
//! `graphqlErrors` list. Classification is driven by body content only,
//! status codes are never inspected.

use serde_json::Value;

use crate::ClientError;

pub const UNKNOWN_ERROR: &str = "Unknown error";
pub const RATE_LIMITED: &str = "Anilist: Too many requests, please wait a moment and try again";
pub const UPSTREAM_ERROR: &str = "Anilist error";

const RATE_LIMIT_MARKER: &str = "Too many requests";

pub fn classify(error: &ClientError) -> String {
    classify_payload(&error.payload())
}

pub fn classify_payload(payload: &Value) -> String {
    if let Value::String(raw) = payload {
        return format!("Server Error{raw}");
    }

    let message = match payload.get("error").and_then(Value::as_str) {
        Some(message) if !message.is_empty() => message,
        _ => return UNKNOWN_ERROR.to_string(),
    };

    if is_rate_limited(message) {
        return RATE_LIMITED.to_string();
    }

    match serde_json::from_str::<Value>(message) {
        Ok(upstream) => match first_upstream_message(&upstream) {
            Some(detail) => format!("{UPSTREAM_ERROR}: {detail}"),
            None => UPSTREAM_ERROR.to_string(),
        },
        Err(_) => format!("Error: {message}"),
    }
}

/// The upstream has no rate-limit code, only this phrase in its message.
pub fn is_rate_limited(message: &str) -> bool {
    message.contains(RATE_LIMIT_MARKER)
}

fn first_upstream_message(upstream: &Value) -> Option<&str> {
    upstream
        .get("graphqlErrors")?
        .as_array()?
        .first()?
        .get("message")?
        .as_str()
}
