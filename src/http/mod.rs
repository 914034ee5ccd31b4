//! HTTP module
//!
//! Request/response types, the transport seam, and the executor that turns
//! resource operations into authenticated requests.
//!
//! # Features
//!
//! - **Transport**: pluggable `send(request) -> response`, reqwest by default
//! - **Bearer auth**: every resource request carries the provider's access token
//! - **Expired-token retry**: one refresh and resend on `401 invalid_grant`

mod executor;
mod request;
mod transport;

pub use executor::RequestExecutor;
pub use request::{ApiRequest, ApiResponse, RequestBody, EXPIRED_TOKEN_ERROR};
pub use transport::{ReqwestTransport, Transport};
