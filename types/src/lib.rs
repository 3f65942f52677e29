use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;
use strum_macros::Display;
use thiserror::Error;

pub const NO_RESPONSE: &str = "No response from the server";

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Display, Eq, PartialEq, Hash)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid method '{0}'. Valid options: GET, POST, PUT, PATCH, DELETE")]
pub struct MethodParseError(String);

impl FromStr for Method {
    type Err = MethodParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "PATCH" => Ok(Self::Patch),
            "DELETE" => Ok(Self::Delete),
            _ => Err(MethodParseError(s.to_string())),
        }
    }
}

/// A single call against the server: an endpoint path relative to the base
/// url, plus the method, an optional JSON body and query parameters.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ApiRequest {
    pub endpoint: String,
    pub method: Method,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<(String, String)>,
}

impl ApiRequest {
    pub fn new(method: Method, endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            method,
            body: None,
            params: Vec::new(),
        }
    }

    pub fn get(endpoint: impl Into<String>) -> Self {
        Self::new(Method::Get, endpoint)
    }

    pub fn post(endpoint: impl Into<String>) -> Self {
        Self::new(Method::Post, endpoint)
    }

    pub fn put(endpoint: impl Into<String>) -> Self {
        Self::new(Method::Put, endpoint)
    }

    pub fn patch(endpoint: impl Into<String>) -> Self {
        Self::new(Method::Patch, endpoint)
    }

    pub fn delete(endpoint: impl Into<String>) -> Self {
        Self::new(Method::Delete, endpoint)
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_json<B: Serialize>(self, body: &B) -> Result<Self, serde_json::Error> {
        Ok(self.with_body(serde_json::to_value(body)?))
    }

    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((name.into(), value.into()));
        self
    }
}

/// Outcome of a decoded response body. The server answers either
/// `{"data": ...}` or `{"error": "..."}`; anything else is reported as
/// [`NO_RESPONSE`].
#[derive(Clone, Debug, PartialEq)]
pub enum Envelope {
    Data(Value),
    Error(String),
}

impl Envelope {
    pub fn from_value(body: Value) -> Self {
        let Value::Object(mut fields) = body else {
            return Envelope::Error(NO_RESPONSE.to_string());
        };
        if let Some(Value::String(message)) = fields.remove("error") {
            return Envelope::Error(message);
        }
        match fields.remove("data") {
            Some(data) => Envelope::Data(data),
            None => Envelope::Error(NO_RESPONSE.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn method_displays_upper_case() {
        assert_eq!(Method::Get.to_string(), "GET");
        assert_eq!(Method::Patch.to_string(), "PATCH");
        assert_eq!(serde_json::to_value(Method::Delete).unwrap(), json!("DELETE"));
    }

    #[test]
    fn method_parses_any_case() {
        assert_eq!("post".parse::<Method>().unwrap(), Method::Post);
        assert_eq!("Put".parse::<Method>().unwrap(), Method::Put);
        assert!("HEAD".parse::<Method>().is_err());
    }

    #[test]
    fn request_builders_collect_params_and_body() {
        let request = ApiRequest::post("/lists")
            .with_param("page", "2")
            .with_json(&json!({ "name": "watching" }))
            .unwrap();

        assert_eq!(request.method, Method::Post);
        assert_eq!(request.endpoint, "/lists");
        assert_eq!(request.params, vec![("page".to_string(), "2".to_string())]);
        assert_eq!(request.body, Some(json!({ "name": "watching" })));
    }

    #[test]
    fn data_envelope_decodes_any_payload() {
        for payload in [
            json!(null),
            json!([1, 2, 3]),
            json!({ "nested": { "id": 7 } }),
            json!("text"),
        ] {
            let envelope = Envelope::from_value(json!({ "data": payload.clone() }));
            assert_eq!(envelope, Envelope::Data(payload));
        }
    }

    #[test]
    fn error_envelope_decodes_message() {
        let envelope = Envelope::from_value(json!({ "error": "list not found" }));
        assert_eq!(envelope, Envelope::Error("list not found".to_string()));
    }

    #[test]
    fn error_field_wins_over_data() {
        let envelope = Envelope::from_value(json!({ "error": "boom", "data": 1 }));
        assert_eq!(envelope, Envelope::Error("boom".to_string()));
    }

    #[test]
    fn non_string_error_falls_through_to_data() {
        let envelope = Envelope::from_value(json!({ "error": 500, "data": "ok" }));
        assert_eq!(envelope, Envelope::Data(json!("ok")));
    }

    #[test]
    fn unrecognized_shapes_mean_no_response() {
        for body in [
            json!({}),
            json!(42),
            json!(null),
            json!("plain string"),
            json!({ "error": 1 }),
        ] {
            let envelope = Envelope::from_value(body);
            assert_eq!(envelope, Envelope::Error(NO_RESPONSE.to_string()));
        }
    }
}
