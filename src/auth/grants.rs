//! OAuth2 grant requests
//!
//! Each function POSTs one form to the token endpoint and parses the tokens
//! out of the response. None of them cache anything; that is the provider's job.

use super::types::TokenState;
use crate::error::{Error, Result};
use crate::http::{ApiRequest, ApiResponse, Transport};
use crate::types::{JsonValue, Method};
use url::Url;

/// Obtain tokens with the `client_credentials` grant
pub async fn client_credentials_token(
    transport: &dyn Transport,
    token_url: &Url,
    client_id: &str,
    client_secret: &str,
) -> Result<TokenState> {
    let form = [
        ("grant_type", "client_credentials"),
        ("client_id", client_id),
        ("client_secret", client_secret),
    ];
    request_token(transport, token_url, &form, None).await
}

/// Obtain tokens with the resource-owner `password` grant
pub async fn password_token(
    transport: &dyn Transport,
    token_url: &Url,
    client_id: &str,
    client_secret: &str,
    username: &str,
    password: &str,
) -> Result<TokenState> {
    let form = [
        ("grant_type", "password"),
        ("client_id", client_id),
        ("client_secret", client_secret),
        ("username", username),
        ("password", password),
    ];
    request_token(transport, token_url, &form, None).await
}

/// Exchange a JWT for tokens.
///
/// The JWT travels as the bearer of the token request itself and is carried
/// over into the returned state.
pub async fn jwt_token(
    transport: &dyn Transport,
    token_url: &Url,
    jwt: &str,
    app_name: &str,
    org_id: &str,
) -> Result<TokenState> {
    let form = [
        ("grant_type", "jwt"),
        ("app_name", app_name),
        ("org_id", org_id),
    ];
    let tokens = request_token(transport, token_url, &form, Some(jwt)).await?;
    Ok(tokens.with_jwt(jwt))
}

/// Obtain tokens with any grant type plus a requested scope
pub async fn scoped_token(
    transport: &dyn Transport,
    token_url: &Url,
    grant_type: &str,
    fields: &[(&str, &str)],
    scope: &str,
) -> Result<TokenState> {
    let mut form = Vec::with_capacity(fields.len() + 2);
    form.push(("grant_type", grant_type));
    form.extend_from_slice(fields);
    form.push(("scope", scope));
    request_token(transport, token_url, &form, None).await
}

/// Trade a refresh token for new tokens
pub async fn refresh_token_grant(
    transport: &dyn Transport,
    token_url: &Url,
    client_id: &str,
    client_secret: &str,
    refresh_token: &str,
) -> Result<TokenState> {
    let form = [
        ("grant_type", "refresh_token"),
        ("client_id", client_id),
        ("client_secret", client_secret),
        ("refresh_token", refresh_token),
    ];
    request_token(transport, token_url, &form, None).await
}

async fn request_token(
    transport: &dyn Transport,
    token_url: &Url,
    form: &[(&str, &str)],
    bearer: Option<&str>,
) -> Result<TokenState> {
    let mut request = ApiRequest::new(Method::POST, token_url.clone())
        .header("Accept", "application/json")
        .form(form.iter().copied());
    if let Some(token) = bearer {
        request.set_bearer(token);
    }

    let response = transport.send(&request).await?;
    if !response.is_success() {
        return Err(Error::http_status(response.status, response.body));
    }
    parse_token_response(&response)
}

/// Pull `access_token` and `refresh_token` out of a token endpoint response
pub fn parse_token_response(response: &ApiResponse) -> Result<TokenState> {
    let access_token = response
        .body
        .get("access_token")
        .and_then(JsonValue::as_str)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| Error::invalid_token_response(response.body.to_string()))?;

    let refresh_token = response
        .body
        .get("refresh_token")
        .and_then(JsonValue::as_str)
        .filter(|token| !token.is_empty())
        .map(String::from);

    Ok(TokenState {
        access_token: access_token.to_string(),
        refresh_token,
        jwt: None,
    })
}
