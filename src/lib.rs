// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]

//! # OAuth REST Client
//!
//! An OAuth2-authenticated client for resource-oriented REST APIs.
//!
//! ## Features
//!
//! - **Token caching**: one token acquisition shared by all concurrent requests
//! - **Grants**: client credentials, password, JWT bearer, refresh token, custom
//! - **Expired-token retry**: a rejected token is refreshed and the request resent once
//! - **Pagination**: `index_all` fetches every page of an offset/limit collection
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use oauth_rest_client::{Client, Params, Result};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let client = Client::new("https://api.example.com/v1", "client-id", "client-secret")?;
//!
//!     let item = client.get_result("items", "42", &Params::new()).await?;
//!     let all = client.index_all("items", &Params::new()).await?;
//!     let created = client.post("items", &json!({"name": "x"})).await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                           Client                             │
//! │  get · index · index_all · post · put · delete · set_tokens  │
//! └──────────────────────────────────────────────────────────────┘
//!                               │
//! ┌──────────────┬──────────────┴─────────┬─────────────────────┐
//! │   Settings   │    Token Provider      │  Request Executor   │
//! ├──────────────┼────────────────────────┼─────────────────────┤
//! │ base URL     │ single-flight slot     │ bearer header       │
//! │ token path   │ grant strategies       │ 401 invalid_grant   │
//! │ maxLimit     │ refresh persistence    │   → refresh + resend│
//! └──────────────┴────────────────────────┴─────────────────────┘
//!                               │
//!                          Transport (reqwest)
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types for the client
pub mod error;

/// Common types and type aliases
pub mod types;

/// Client settings
pub mod config;

/// Token grants and the token provider
pub mod auth;

/// Request types, transport and executor
pub mod http;

/// Offset/limit pagination
pub mod pagination;

/// Client facade
pub mod client;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

pub use auth::{fetcher_fn, FetchContext, Grant, TokenFetcher, TokenState};
pub use client::{Client, ClientBuilder};
pub use config::ClientSettings;
pub use http::{ApiRequest, ApiResponse, ReqwestTransport, Transport};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
