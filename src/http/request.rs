//! Request descriptor and response types
//!
//! `ApiRequest` is built fresh for every call and handed to a `Transport`.
//! `ApiResponse` is what comes back: the status and the body already parsed.

use crate::types::{JsonValue, Method, Params};
use reqwest::header::AUTHORIZATION;
use std::collections::BTreeMap;
use url::Url;

/// Error code an API returns when the bearer token is no longer accepted
pub const EXPIRED_TOKEN_ERROR: &str = "invalid_grant";

/// Request body
#[derive(Debug, Clone, Default, PartialEq)]
pub enum RequestBody {
    /// No body
    #[default]
    Empty,
    /// JSON body
    Json(JsonValue),
    /// Form-encoded body (token endpoint)
    Form(Vec<(String, String)>),
}

/// Everything needed to send one HTTP request
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    /// HTTP method
    pub method: Method,
    /// Full URL without query
    pub url: Url,
    /// Header name to value
    pub headers: BTreeMap<String, String>,
    /// Query parameters
    pub query: Params,
    /// Request body
    pub body: RequestBody,
}

impl ApiRequest {
    /// Create a request with no headers, query or body
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: BTreeMap::new(),
            query: Params::new(),
            body: RequestBody::Empty,
        }
    }

    /// Add a header
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Replace the query parameters
    #[must_use]
    pub fn query(mut self, params: Params) -> Self {
        self.query = params;
        self
    }

    /// Set JSON body
    #[must_use]
    pub fn json(mut self, body: JsonValue) -> Self {
        self.body = RequestBody::Json(body);
        self
    }

    /// Set form body
    #[must_use]
    pub fn form<K, V>(mut self, fields: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.body = RequestBody::Form(
            fields
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        );
        self
    }

    /// Set bearer authorization
    #[must_use]
    pub fn bearer(mut self, token: &str) -> Self {
        self.set_bearer(token);
        self
    }

    /// Replace the bearer authorization in place
    pub fn set_bearer(&mut self, token: &str) {
        self.headers
            .insert(AUTHORIZATION.as_str().to_string(), format!("Bearer {token}"));
    }

    /// Current bearer token, if any
    pub fn bearer_token(&self) -> Option<&str> {
        self.headers
            .get(AUTHORIZATION.as_str())
            .and_then(|value| value.strip_prefix("Bearer "))
    }
}

/// Status and parsed body of a completed request
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    /// HTTP status code
    pub status: u16,
    /// Parsed body, see [`ApiResponse::from_text`]
    pub body: JsonValue,
}

impl ApiResponse {
    /// Create a response
    pub fn new(status: u16, body: JsonValue) -> Self {
        Self { status, body }
    }

    /// Build a response from raw body text.
    ///
    /// JSON text is parsed; anything else is kept as a string value and an
    /// empty body becomes `null`.
    pub fn from_text(status: u16, text: &str) -> Self {
        let body = if text.trim().is_empty() {
            JsonValue::Null
        } else {
            serde_json::from_str(text).unwrap_or_else(|_| JsonValue::String(text.to_string()))
        };
        Self { status, body }
    }

    /// Status below 400
    pub fn is_success(&self) -> bool {
        self.status < 400
    }

    /// `error` code from the body. A string body is parsed as JSON first.
    pub fn error_code(&self) -> Option<String> {
        match &self.body {
            JsonValue::Object(map) => map.get("error").and_then(|e| e.as_str()).map(String::from),
            JsonValue::String(text) => serde_json::from_str::<JsonValue>(text)
                .ok()
                .and_then(|parsed| parsed.get("error")?.as_str().map(String::from)),
            _ => None,
        }
    }

    /// A 401 whose error code says the bearer token was rejected as expired
    pub fn is_expired_token(&self) -> bool {
        self.status == 401 && self.error_code().as_deref() == Some(EXPIRED_TOKEN_ERROR)
    }

    /// The `result` member of the body, `null` if missing
    pub fn result(&self) -> &JsonValue {
        self.body.get("result").unwrap_or(&JsonValue::Null)
    }

    /// Consume the response, keeping only the `result` member
    pub fn into_result(self) -> JsonValue {
        match self.body {
            JsonValue::Object(mut map) => map.remove("result").unwrap_or(JsonValue::Null),
            _ => JsonValue::Null,
        }
    }
}
