//! Token and grant types

use super::grants;
use crate::config::ClientSettings;
use crate::error::{Error, Result};
use crate::http::Transport;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use url::Url;

/// Tokens held by a client
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenState {
    /// Bearer token attached to every resource request
    pub access_token: String,
    /// Refresh token returned by the last grant, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// JWT the access token was obtained with, for the JWT-bearer grant
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jwt: Option<String>,
}

impl TokenState {
    /// Tokens with only an access token
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: None,
            jwt: None,
        }
    }

    /// Attach a refresh token
    #[must_use]
    pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
        self.refresh_token = Some(refresh_token.into());
        self
    }

    /// Attach the JWT used to obtain these tokens
    #[must_use]
    pub fn with_jwt(mut self, jwt: impl Into<String>) -> Self {
        self.jwt = Some(jwt.into());
        self
    }
}

impl fmt::Debug for TokenState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |value: &Option<String>| value.as_ref().map(|_| "<redacted>");
        f.debug_struct("TokenState")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &redact(&self.refresh_token))
            .field("jwt", &redact(&self.jwt))
            .finish()
    }
}

/// What a token fetcher gets to work with
#[derive(Clone, Copy)]
pub struct FetchContext<'a> {
    /// Transport to reach the token endpoint
    pub transport: &'a dyn Transport,
    /// Resolved token endpoint URL
    pub token_url: &'a Url,
    /// Snapshot of the client settings at the start of the fetch
    pub settings: &'a ClientSettings,
}

impl FetchContext<'_> {
    /// Stored refresh token, if any
    pub fn refresh_token(&self) -> Option<&str> {
        self.settings
            .refresh_token
            .as_deref()
            .filter(|token| !token.is_empty())
    }
}

/// Produces tokens on demand
#[async_trait]
pub trait TokenFetcher: Send + Sync {
    /// Obtain a fresh set of tokens
    async fn fetch(&self, ctx: FetchContext<'_>) -> Result<TokenState>;
}

/// Token fetcher built from an async closure.
///
/// The closure receives the stored refresh token so it can choose between a
/// refresh and a full grant.
pub struct FnFetcher<F>(F);

/// Adapt an async closure into a [`TokenFetcher`]
pub fn fetcher_fn<F, Fut>(f: F) -> FnFetcher<F>
where
    F: Fn(Option<String>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<TokenState>> + Send,
{
    FnFetcher(f)
}

#[async_trait]
impl<F, Fut> TokenFetcher for FnFetcher<F>
where
    F: Fn(Option<String>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<TokenState>> + Send,
{
    async fn fetch(&self, ctx: FetchContext<'_>) -> Result<TokenState> {
        (self.0)(ctx.refresh_token().map(String::from)).await
    }
}

/// Grant strategy bound to a client at construction.
///
/// Client id and secret come from the settings. The JWT-bearer grant is not
/// listed here: it is chosen from settings whenever its material is present.
#[derive(Clone)]
pub enum Grant {
    /// `client_credentials`; uses the refresh grant once a refresh token is stored
    ClientCredentials,
    /// Resource-owner `password`; uses the refresh grant once a refresh token is stored
    Password {
        /// Resource owner username
        username: String,
        /// Resource owner password
        password: String,
    },
    /// `refresh_token` only; a refresh token must be stored in settings
    RefreshToken,
    /// Caller-supplied fetcher for custom grant flows
    Custom(Arc<dyn TokenFetcher>),
}

impl Grant {
    /// Resource-owner password grant
    pub fn password(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self::Password {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Custom fetcher grant
    pub fn custom(fetcher: impl TokenFetcher + 'static) -> Self {
        Self::Custom(Arc::new(fetcher))
    }

    /// Short name used in logs
    pub fn name(&self) -> &'static str {
        match self {
            Grant::ClientCredentials => "client_credentials",
            Grant::Password { .. } => "password",
            Grant::RefreshToken => "refresh_token",
            Grant::Custom(_) => "custom",
        }
    }
}

impl fmt::Debug for Grant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Grant::Password { username, .. } => f
                .debug_struct("Password")
                .field("username", username)
                .finish_non_exhaustive(),
            other => f.write_str(other.name()),
        }
    }
}

#[async_trait]
impl TokenFetcher for Grant {
    async fn fetch(&self, ctx: FetchContext<'_>) -> Result<TokenState> {
        let owner = match self {
            Grant::Custom(fetcher) => return fetcher.fetch(ctx).await,
            Grant::Password { username, password } => Some((username.as_str(), password.as_str())),
            Grant::ClientCredentials | Grant::RefreshToken => None,
        };

        let settings = ctx.settings;
        let client_id = settings.require_client_id()?;
        let client_secret = settings.require_client_secret()?;

        if let Some(refresh_token) = ctx.refresh_token() {
            return grants::refresh_token_grant(
                ctx.transport,
                ctx.token_url,
                client_id,
                client_secret,
                refresh_token,
            )
            .await;
        }
        if matches!(self, Grant::RefreshToken) {
            return Err(Error::missing_setting("refreshToken"));
        }

        let scope = settings.scope.as_deref().filter(|s| !s.is_empty());
        match (owner, scope) {
            (None, None) => {
                grants::client_credentials_token(
                    ctx.transport,
                    ctx.token_url,
                    client_id,
                    client_secret,
                )
                .await
            }
            (None, Some(scope)) => {
                grants::scoped_token(
                    ctx.transport,
                    ctx.token_url,
                    "client_credentials",
                    &[("client_id", client_id), ("client_secret", client_secret)],
                    scope,
                )
                .await
            }
            (Some((username, password)), None) => {
                grants::password_token(
                    ctx.transport,
                    ctx.token_url,
                    client_id,
                    client_secret,
                    username,
                    password,
                )
                .await
            }
            (Some((username, password)), Some(scope)) => {
                grants::scoped_token(
                    ctx.transport,
                    ctx.token_url,
                    "password",
                    &[
                        ("client_id", client_id),
                        ("client_secret", client_secret),
                        ("username", username),
                        ("password", password),
                    ],
                    scope,
                )
                .await
            }
        }
    }
}
