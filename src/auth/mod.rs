//! Authentication module
//!
//! Supports: client credentials, resource-owner password, JWT bearer, refresh
//! token, and caller-supplied token fetchers.
//!
//! The `TokenProvider` owns the token cache of one client and guarantees that
//! concurrent requests share a single token acquisition.

mod grants;
mod provider;
mod types;

pub use grants::{
    client_credentials_token, jwt_token, parse_token_response, password_token,
    refresh_token_grant, scoped_token,
};
pub use provider::TokenProvider;
pub use types::{fetcher_fn, FetchContext, FnFetcher, Grant, TokenFetcher, TokenState};
