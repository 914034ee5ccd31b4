//! HTTP transport
//!
//! The client only needs one capability from the network: send a request and
//! get a response back. `Transport` is that seam; `ReqwestTransport` is the
//! implementation used unless the caller supplies another one.

use super::request::{ApiRequest, ApiResponse, RequestBody};
use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// Sends one request and returns its response.
///
/// Implementations report network-level failures as errors; HTTP error
/// statuses are ordinary responses.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send `request` and return the response, whatever its status
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse>;
}

/// Transport backed by a `reqwest::Client`
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Create a transport with a default client
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(format!("oauth-rest-client/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(Error::Http)?;
        Ok(Self { client })
    }

    /// Create a transport whose requests time out after `timeout`
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(format!("oauth-rest-client/{}", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(Error::Http)?;
        Ok(Self { client })
    }

    /// Wrap an existing client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// Get the underlying reqwest client
    pub fn inner(&self) -> &Client {
        &self.client
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse> {
        let mut req = self
            .client
            .request(request.method.into(), request.url.clone());

        for (key, value) in &request.headers {
            req = req.header(key.as_str(), value.as_str());
        }

        if !request.query.is_empty() {
            req = req.query(&request.query);
        }

        match &request.body {
            RequestBody::Empty => {}
            RequestBody::Json(body) => req = req.json(body),
            RequestBody::Form(fields) => req = req.form(fields),
        }

        let response = req.send().await.map_err(Error::Http)?;
        let status = response.status().as_u16();
        let text = response.text().await.map_err(Error::Http)?;

        debug!("{} {} -> {}", request.method, request.url.path(), status);
        Ok(ApiResponse::from_text(status, &text))
    }
}
