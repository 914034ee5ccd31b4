//! Client facade
//!
//! `Client` ties one set of settings to a token provider, a request executor
//! and the pagination aggregator. Cloning a client is cheap; clones share the
//! same settings and token cache.

use crate::auth::{Grant, TokenFetcher, TokenProvider, TokenState};
use crate::config::ClientSettings;
use crate::error::Result;
use crate::http::{ApiResponse, ReqwestTransport, RequestExecutor, Transport};
use crate::pagination;
use crate::types::{JsonValue, Params};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Authenticated client for one REST API
#[derive(Clone, Debug)]
pub struct Client {
    settings: Arc<RwLock<ClientSettings>>,
    provider: Arc<TokenProvider>,
    executor: RequestExecutor,
}

impl Client {
    /// Client using the client-credentials grant
    pub fn new(
        url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Result<Self> {
        let mut settings = ClientSettings::new(url);
        settings.set_client_credentials(client_id, client_secret);
        Self::builder_with_settings(settings)
            .grant(Grant::ClientCredentials)
            .build()
    }

    /// Client whose tokens come from a caller-supplied fetcher
    pub fn with_fetcher(url: impl Into<String>, fetcher: impl TokenFetcher + 'static) -> Result<Self> {
        Self::builder(url).grant(Grant::custom(fetcher)).build()
    }

    /// Start building a client for a base URL
    pub fn builder(url: impl Into<String>) -> ClientBuilder {
        Self::builder_with_settings(ClientSettings::new(url))
    }

    /// Start building a client from complete settings
    pub fn builder_with_settings(settings: ClientSettings) -> ClientBuilder {
        ClientBuilder {
            settings,
            grant: None,
            transport: None,
        }
    }

    // ------------------------------------------------------------------------
    // Resource operations
    // ------------------------------------------------------------------------

    /// GET one item
    pub async fn get(&self, resource: &str, id: &str, params: &Params) -> Result<ApiResponse> {
        self.executor.get(resource, id, params).await
    }

    /// GET one item and return its `result` member
    pub async fn get_result(&self, resource: &str, id: &str, params: &Params) -> Result<JsonValue> {
        self.get(resource, id, params)
            .await
            .map(ApiResponse::into_result)
    }

    /// GET one page of a collection
    pub async fn index(&self, resource: &str, params: &Params) -> Result<ApiResponse> {
        self.executor.index(resource, params).await
    }

    /// GET every item of a collection across all pages
    pub async fn index_all(&self, resource: &str, params: &Params) -> Result<Vec<JsonValue>> {
        let max_limit = self.settings.read().await.max_limit;
        pagination::index_all(&self.executor, resource, params, max_limit).await
    }

    /// POST a new item
    pub async fn post(&self, resource: &str, body: &JsonValue) -> Result<ApiResponse> {
        self.executor.post(resource, body).await
    }

    /// PUT (replace) one item
    pub async fn put(&self, resource: &str, id: &str, body: &JsonValue) -> Result<ApiResponse> {
        self.executor.put(resource, id, body).await
    }

    /// DELETE one item
    pub async fn delete(&self, resource: &str, id: &str) -> Result<ApiResponse> {
        self.executor.delete(resource, id).await
    }

    /// DELETE the items of a collection selected by `body`
    pub async fn delete_by_params(&self, resource: &str, body: &JsonValue) -> Result<ApiResponse> {
        self.executor.delete_by_params(resource, body).await
    }

    // ------------------------------------------------------------------------
    // Tokens
    // ------------------------------------------------------------------------

    /// Current tokens, acquiring them if needed
    pub async fn get_tokens(&self) -> Result<TokenState> {
        self.provider.get_tokens().await
    }

    /// Use tokens obtained elsewhere
    pub async fn set_tokens(&self, tokens: TokenState) -> Result<()> {
        self.provider.set_tokens(tokens).await
    }

    /// Forget cached tokens and the stored refresh token
    pub async fn logout(&self) {
        self.provider.reset().await;
        self.settings.write().await.refresh_token = None;
        debug!("Client tokens cleared");
    }

    // ------------------------------------------------------------------------
    // Settings
    // ------------------------------------------------------------------------

    /// Snapshot of the current settings
    pub async fn settings(&self) -> ClientSettings {
        self.settings.read().await.clone()
    }

    /// Change settings in place.
    ///
    /// Do not change credentials while requests are in flight; a running token
    /// acquisition keeps the values it started with.
    pub async fn update_settings<F>(&self, f: F)
    where
        F: FnOnce(&mut ClientSettings),
    {
        f(&mut *self.settings.write().await);
    }
}

/// Builder for [`Client`]
#[must_use]
pub struct ClientBuilder {
    settings: ClientSettings,
    grant: Option<Grant>,
    transport: Option<Arc<dyn Transport>>,
}

impl ClientBuilder {
    /// Bind a grant strategy
    pub fn grant(mut self, grant: Grant) -> Self {
        self.grant = Some(grant);
        self
    }

    /// Use a custom transport
    pub fn transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    /// Adjust the settings before building
    pub fn configure<F>(mut self, f: F) -> Self
    where
        F: FnOnce(&mut ClientSettings),
    {
        f(&mut self.settings);
        self
    }

    /// Validate the settings and build the client.
    ///
    /// Without an explicit grant, client id and secret in the settings bind
    /// the client-credentials grant; otherwise only JWT material can produce
    /// tokens.
    pub fn build(self) -> Result<Client> {
        self.settings.validate()?;

        let grant = self.grant.or_else(|| {
            (self.settings.client_id.is_some() && self.settings.client_secret.is_some())
                .then_some(Grant::ClientCredentials)
        });
        let transport: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::new()?),
        };

        let settings = Arc::new(RwLock::new(self.settings));
        let provider = Arc::new(TokenProvider::new(
            grant,
            Arc::clone(&transport),
            Arc::clone(&settings),
        ));
        let executor = RequestExecutor::new(transport, Arc::clone(&provider), Arc::clone(&settings));

        Ok(Client {
            settings,
            provider,
            executor,
        })
    }
}
