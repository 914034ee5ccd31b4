//! Request executor
//!
//! Builds authenticated requests for the resource operations and sends them.
//! When the API rejects the bearer token as expired, the executor drops the
//! cached token, acquires a new one and resends the same request once. The
//! outcome of that resend is final.

use super::request::{ApiRequest, ApiResponse};
use super::transport::Transport;
use crate::auth::TokenProvider;
use crate::config::ClientSettings;
use crate::error::{Error, Result};
use crate::types::{JsonValue, Method, Params};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Sends authenticated resource requests for one client
#[derive(Clone)]
pub struct RequestExecutor {
    transport: Arc<dyn Transport>,
    provider: Arc<TokenProvider>,
    settings: Arc<RwLock<ClientSettings>>,
}

impl RequestExecutor {
    /// Create an executor sharing the client's transport, provider and settings
    pub fn new(
        transport: Arc<dyn Transport>,
        provider: Arc<TokenProvider>,
        settings: Arc<RwLock<ClientSettings>>,
    ) -> Self {
        Self {
            transport,
            provider,
            settings,
        }
    }

    /// GET one item
    pub async fn get(&self, resource: &str, id: &str, params: &Params) -> Result<ApiResponse> {
        let request = self
            .build(Method::GET, resource, Some(require_id(resource, id)?))
            .await?
            .query(params.clone());
        self.execute(request).await
    }

    /// GET a collection
    pub async fn index(&self, resource: &str, params: &Params) -> Result<ApiResponse> {
        let request = self
            .build(Method::GET, resource, None)
            .await?
            .query(params.clone());
        self.execute(request).await
    }

    /// POST a new item to a collection
    pub async fn post(&self, resource: &str, body: &JsonValue) -> Result<ApiResponse> {
        let request = self
            .build(Method::POST, resource, None)
            .await?
            .json(body.clone());
        self.execute(request).await
    }

    /// PUT (replace) one item
    pub async fn put(&self, resource: &str, id: &str, body: &JsonValue) -> Result<ApiResponse> {
        let request = self
            .build(Method::PUT, resource, Some(require_id(resource, id)?))
            .await?
            .json(body.clone());
        self.execute(request).await
    }

    /// DELETE one item
    pub async fn delete(&self, resource: &str, id: &str) -> Result<ApiResponse> {
        let request = self
            .build(Method::DELETE, resource, Some(require_id(resource, id)?))
            .await?;
        self.execute(request).await
    }

    /// DELETE on a collection, selecting items by the JSON body
    pub async fn delete_by_params(&self, resource: &str, body: &JsonValue) -> Result<ApiResponse> {
        let request = self
            .build(Method::DELETE, resource, None)
            .await?
            .json(body.clone());
        self.execute(request).await
    }

    /// Send a prepared request with a bearer token, retrying once on an
    /// expired-token rejection
    pub async fn execute(&self, mut request: ApiRequest) -> Result<ApiResponse> {
        let tokens = self.provider.get_tokens().await?;
        request.set_bearer(&tokens.access_token);

        debug!("{} {}", request.method, request.url.path());
        let response = self.transport.send(&request).await?;

        if !response.is_expired_token() {
            return check_status(response);
        }

        warn!(
            "Access token rejected for {} {}, refreshing and retrying once",
            request.method,
            request.url.path()
        );
        self.provider.invalidate(&tokens.access_token).await;
        let tokens = self.provider.get_tokens().await?;
        request.set_bearer(&tokens.access_token);

        let retry = self.transport.send(&request).await?;
        check_status(retry)
    }

    async fn build(&self, method: Method, resource: &str, id: Option<&str>) -> Result<ApiRequest> {
        let url = self.settings.read().await.url_for(resource, id)?;
        Ok(ApiRequest::new(method, url).header("Accept", "application/json"))
    }
}

impl std::fmt::Debug for RequestExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestExecutor")
            .field("provider", &self.provider)
            .finish_non_exhaustive()
    }
}

fn require_id<'a>(resource: &str, id: &'a str) -> Result<&'a str> {
    if id.trim().is_empty() {
        return Err(Error::missing_id(resource));
    }
    Ok(id)
}

fn check_status(response: ApiResponse) -> Result<ApiResponse> {
    if response.is_success() {
        Ok(response)
    } else {
        Err(Error::http_status(response.status, response.body))
    }
}
