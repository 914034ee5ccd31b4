//! Error types for the OAuth REST client
//!
//! This module defines the error hierarchy for the entire crate.
//! All public APIs return `Result<T, Error>` where Error is defined here.

use crate::types::JsonValue;
use std::sync::Arc;
use thiserror::Error;

/// The main error type for the OAuth REST client
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    /// Settings are present but unusable
    #[error("Configuration error: {message}")]
    Config {
        /// What is wrong
        message: String,
    },

    /// A setting needed by the current operation is not set
    #[error("Missing required setting: {setting}")]
    MissingSetting {
        /// camelCase setting name
        setting: String,
    },

    /// Settings document is not valid YAML
    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    /// Settings document is not valid JSON
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Base URL or token endpoint does not parse
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ============================================================================
    // Request Errors
    // ============================================================================
    /// An item operation was called with an empty id
    #[error("An id is required to address a '{resource}' item")]
    MissingId {
        /// Resource the item belongs to
        resource: String,
    },

    /// Network-level failure
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Response with status 400 or above
    #[error("HTTP {status}: {body}")]
    HttpStatus {
        /// Response status
        status: u16,
        /// Parsed response body
        body: JsonValue,
    },

    /// Response body does not have the expected shape
    #[error("Failed to decode response: {message}")]
    Decode {
        /// What did not decode
        message: String,
    },

    // ============================================================================
    // Token Errors
    // ============================================================================
    /// Token endpoint answered without a usable access token
    #[error("Invalid token response: {body}")]
    InvalidTokenResponse {
        /// Offending response body
        body: String,
    },

    /// Failure while acquiring tokens. Shared because every caller waiting on
    /// the same in-flight acquisition receives the same cause.
    #[error("Token acquisition failed: {0}")]
    TokenAcquisition(#[source] Arc<Error>),

    // ============================================================================
    // I/O Errors
    // ============================================================================
    /// Reading a settings file failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ============================================================================
    // Generic Errors
    // ============================================================================
    /// Anything else, with context
    #[error("{0}")]
    Other(String),

    /// Error raised by caller-supplied code
    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a missing setting error
    pub fn missing_setting(setting: impl Into<String>) -> Self {
        Self::MissingSetting {
            setting: setting.into(),
        }
    }

    /// Create a missing id error
    pub fn missing_id(resource: impl Into<String>) -> Self {
        Self::MissingId {
            resource: resource.into(),
        }
    }

    /// Create an HTTP status error
    pub fn http_status(status: u16, body: impl Into<JsonValue>) -> Self {
        Self::HttpStatus {
            status,
            body: body.into(),
        }
    }

    /// Create a decode error
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Create an invalid token response error
    pub fn invalid_token_response(body: impl Into<String>) -> Self {
        Self::InvalidTokenResponse { body: body.into() }
    }

    /// HTTP status carried by this error, looking through token acquisition
    pub fn status(&self) -> Option<u16> {
        match self.root_cause() {
            Error::HttpStatus { status, .. } => Some(*status),
            Error::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Strip `TokenAcquisition` wrappers down to the underlying failure
    pub fn root_cause(&self) -> &Error {
        match self {
            Error::TokenAcquisition(inner) => inner.root_cause(),
            other => other,
        }
    }
}

/// Result type alias for the OAuth REST client
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", message.into(), inner))
        })
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", f(), inner))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_error_display() {
        let err = Error::config("test message");
        assert_eq!(err.to_string(), "Configuration error: test message");

        let err = Error::missing_setting("clientId");
        assert_eq!(err.to_string(), "Missing required setting: clientId");

        let err = Error::http_status(404, json!({"error": "not_found"}));
        assert_eq!(err.to_string(), r#"HTTP 404: {"error":"not_found"}"#);

        let err = Error::missing_id("items");
        assert_eq!(
            err.to_string(),
            "An id is required to address a 'items' item"
        );
    }

    #[test]
    fn test_root_cause_unwraps_acquisition() {
        let inner = Error::http_status(401, json!({"error": "invalid_client"}));
        let err = Error::TokenAcquisition(Arc::new(Error::TokenAcquisition(Arc::new(inner))));

        assert!(matches!(
            err.root_cause(),
            Error::HttpStatus { status: 401, .. }
        ));
        assert_eq!(err.status(), Some(401));
        assert_eq!(Error::config("x").status(), None);
    }

    #[test]
    fn test_result_context() {
        let result: Result<()> = Err(Error::config("inner"));
        let with_context = result.context("outer");
        assert!(with_context
            .unwrap_err()
            .to_string()
            .contains("outer: Configuration error: inner"));
    }
}
