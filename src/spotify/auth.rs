use rand::{Rng, distr::Alphanumeric};
use reqwest::{Client, Url};

use crate::{config::SpotifyConfig, error::AuthError, types::Token};

const STATE_LENGTH: usize = 32;

/// Random value for the OAuth `state` parameter.
pub fn generate_state() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(STATE_LENGTH)
        .map(char::from)
        .collect()
}

/// Builds the URL the user is sent to in order to grant access.
///
/// Offline access is requested so that Spotify hands out a refresh token
/// along with the access token.
pub fn authorize_url(config: &SpotifyConfig, state: &str) -> Result<String, AuthError> {
    let url = Url::parse_with_params(
        &config.auth_url,
        &[
            ("client_id", config.client_id.as_str()),
            ("response_type", "code"),
            ("redirect_uri", config.redirect_uri.as_str()),
            ("scope", config.scope.as_str()),
            ("state", state),
            ("access_type", "offline"),
        ],
    )
    .map_err(|e| AuthError::AuthorizeUrl(e.to_string()))?;

    Ok(url.into())
}

/// Exchanges an authorization code for a token at the accounts service.
pub async fn exchange_code(
    http: &Client,
    config: &SpotifyConfig,
    code: &str,
) -> Result<Token, AuthError> {
    let res = http
        .post(&config.token_url)
        .basic_auth(&config.client_id, Some(&config.client_secret))
        .form(&[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", config.redirect_uri.as_str()),
        ])
        .send()
        .await
        .map_err(|e| AuthError::TokenExchange(e.to_string()))?;

    let status = res.status();
    let body = res
        .text()
        .await
        .map_err(|e| AuthError::TokenExchange(e.to_string()))?;
    if !status.is_success() {
        return Err(AuthError::TokenExchange(format!(
            "unexpected status code {}: {}",
            status, body
        )));
    }

    serde_json::from_str(&body)
        .map_err(|e| AuthError::TokenExchange(format!("malformed token payload: {}", e)))
}
