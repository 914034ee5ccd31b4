//! Client settings
//!
//! `ClientSettings` holds everything one client needs to talk to an API:
//! where it lives, where tokens come from, how large a page may be, and the
//! credential material used by the token grants.
//!
//! Settings can be built in code or loaded from YAML/JSON documents with
//! camelCase keys:
//!
//! ```yaml
//! url: https://api.example.com/v1
//! tokenEndpoint: token
//! maxLimit: 200
//! clientId: my-client
//! clientSecret: my-secret
//! ```

use crate::error::{Error, Result, ResultExt};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use url::Url;

/// Default token endpoint path, relative to the base URL
pub const DEFAULT_TOKEN_ENDPOINT: &str = "token";

/// Default page size used by `index_all`
pub const DEFAULT_MAX_LIMIT: u32 = 500;

// ============================================================================
// Settings
// ============================================================================

/// Per-client configuration
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientSettings {
    /// Base URL every resource path is appended to
    pub url: String,

    /// Token endpoint, relative to `url` or absolute
    #[serde(default = "default_token_endpoint")]
    pub token_endpoint: String,

    /// Page size for paginated index calls
    #[serde(default = "default_max_limit")]
    pub max_limit: u32,

    /// OAuth2 client id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,

    /// OAuth2 client secret
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,

    /// Scope requested by the client-credentials and password grants
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,

    /// Refresh token persisted from the last successful grant
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    /// Signed JWT for the JWT-bearer grant
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jwt: Option<String>,

    /// Application name sent with the JWT-bearer grant
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_name: Option<String>,

    /// Organization id sent with the JWT-bearer grant
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub org_id: Option<String>,
}

fn default_token_endpoint() -> String {
    DEFAULT_TOKEN_ENDPOINT.to_string()
}

fn default_max_limit() -> u32 {
    DEFAULT_MAX_LIMIT
}

/// JWT-bearer grant material, present only when all three parts are set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JwtCredentials<'a> {
    /// Signed JWT
    pub jwt: &'a str,
    /// Application name
    pub app_name: &'a str,
    /// Organization id
    pub org_id: &'a str,
}

impl ClientSettings {
    /// Create settings for a base URL with defaults for everything else
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            token_endpoint: default_token_endpoint(),
            max_limit: DEFAULT_MAX_LIMIT,
            client_id: None,
            client_secret: None,
            scope: None,
            refresh_token: None,
            jwt: None,
            app_name: None,
            org_id: None,
        }
    }

    /// Parse settings from a YAML document
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let settings: Self = serde_yaml::from_str(yaml)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Parse settings from a JSON document
    pub fn from_json_str(json: &str) -> Result<Self> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a `.json`, `.yaml` or `.yml` file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file '{}'", path.display()))?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json_str(&content),
            _ => Self::from_yaml_str(&content),
        }
    }

    /// Check the settings are usable
    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(Error::missing_setting("url"));
        }
        self.base_url()?;
        if self.token_endpoint.trim().is_empty() {
            return Err(Error::missing_setting("tokenEndpoint"));
        }
        if self.max_limit == 0 {
            return Err(Error::config("maxLimit must be greater than zero"));
        }
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Setters
    // ------------------------------------------------------------------------

    /// Set the base URL
    pub fn set_url(&mut self, url: impl Into<String>) -> &mut Self {
        self.url = url.into();
        self
    }

    /// Set the token endpoint, relative or absolute
    pub fn set_token_endpoint(&mut self, endpoint: impl Into<String>) -> &mut Self {
        self.token_endpoint = endpoint.into();
        self
    }

    /// Set the `index_all` page size
    pub fn set_max_limit(&mut self, max_limit: u32) -> &mut Self {
        self.max_limit = max_limit;
        self
    }

    /// Set client id and secret
    pub fn set_client_credentials(
        &mut self,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> &mut Self {
        self.client_id = Some(client_id.into());
        self.client_secret = Some(client_secret.into());
        self
    }

    /// Set the requested scope
    pub fn set_scope(&mut self, scope: impl Into<String>) -> &mut Self {
        self.scope = Some(scope.into());
        self
    }

    /// Store a refresh token for the next acquisition
    pub fn set_refresh_token(&mut self, refresh_token: impl Into<String>) -> &mut Self {
        self.refresh_token = Some(refresh_token.into());
        self
    }

    /// Configure the JWT-bearer grant. Once set, it takes precedence over the
    /// grant bound at construction.
    pub fn set_jwt(
        &mut self,
        jwt: impl Into<String>,
        app_name: impl Into<String>,
        org_id: impl Into<String>,
    ) -> &mut Self {
        self.jwt = Some(jwt.into());
        self.app_name = Some(app_name.into());
        self.org_id = Some(org_id.into());
        self
    }

    /// Remove all JWT-bearer grant material
    pub fn clear_jwt(&mut self) -> &mut Self {
        self.jwt = None;
        self.app_name = None;
        self.org_id = None;
        self
    }

    // ------------------------------------------------------------------------
    // Derived values
    // ------------------------------------------------------------------------

    /// JWT grant material if `jwt`, `app_name` and `org_id` are all non-empty
    pub fn jwt_credentials(&self) -> Option<JwtCredentials<'_>> {
        fn non_empty(value: &Option<String>) -> Option<&str> {
            value.as_deref().filter(|v| !v.is_empty())
        }
        Some(JwtCredentials {
            jwt: non_empty(&self.jwt)?,
            app_name: non_empty(&self.app_name)?,
            org_id: non_empty(&self.org_id)?,
        })
    }

    /// Client id, or a missing setting error
    pub fn require_client_id(&self) -> Result<&str> {
        self.client_id
            .as_deref()
            .ok_or_else(|| Error::missing_setting("clientId"))
    }

    /// Client secret, or a missing setting error
    pub fn require_client_secret(&self) -> Result<&str> {
        self.client_secret
            .as_deref()
            .ok_or_else(|| Error::missing_setting("clientSecret"))
    }

    /// Parsed base URL
    pub fn base_url(&self) -> Result<Url> {
        let url = Url::parse(self.url.trim())?;
        if url.cannot_be_a_base() {
            return Err(Error::config(format!(
                "Base URL '{}' cannot have path segments",
                self.url
            )));
        }
        Ok(url)
    }

    /// URL for a resource collection, or for one item when `id` is given.
    ///
    /// The resource may contain `/` to address nested collections; the id is
    /// always a single, percent-encoded path segment.
    pub fn url_for(&self, resource: &str, id: Option<&str>) -> Result<Url> {
        let mut url = self.base_url()?;
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|()| Error::config("Base URL cannot have path segments"))?;
            segments.pop_if_empty();
            segments.extend(resource.split('/').filter(|s| !s.is_empty()));
            if let Some(id) = id.filter(|id| !id.is_empty()) {
                segments.push(id);
            }
        }
        Ok(url)
    }

    /// Token endpoint URL
    pub fn token_url(&self) -> Result<Url> {
        let endpoint = self.token_endpoint.trim();
        if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
            return Ok(Url::parse(endpoint)?);
        }
        self.url_for(endpoint, None)
    }
}

impl std::fmt::Debug for ClientSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redact = |value: &Option<String>| value.as_ref().map(|_| "<redacted>");
        f.debug_struct("ClientSettings")
            .field("url", &self.url)
            .field("token_endpoint", &self.token_endpoint)
            .field("max_limit", &self.max_limit)
            .field("client_id", &self.client_id)
            .field("client_secret", &redact(&self.client_secret))
            .field("scope", &self.scope)
            .field("refresh_token", &redact(&self.refresh_token))
            .field("jwt", &redact(&self.jwt))
            .field("app_name", &self.app_name)
            .field("org_id", &self.org_id)
            .finish()
    }
}
