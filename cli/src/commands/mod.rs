use std::fmt;

pub mod config;
pub mod get;
pub mod send;

/// A failure the client notifier already showed to the user. Carries no
/// message so `main` only sets the exit code.
#[derive(Debug)]
pub struct Reported;

impl fmt::Display for Reported {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("request failed")
    }
}

impl std::error::Error for Reported {}

/// Parses a `KEY=VALUE` query parameter.
pub fn parse_param(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("invalid parameter '{s}', expected KEY=VALUE")),
    }
}
