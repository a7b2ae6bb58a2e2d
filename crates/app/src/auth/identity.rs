//! Identity provider userinfo client.

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use thiserror::Error;

/// Configuration for reaching the identity provider.
#[derive(Debug, Clone)]
pub struct IdentityConfig {
    /// OpenID Connect userinfo endpoint, e.g. `"https://id.example.com/oauth/userinfo"`.
    pub userinfo_url: String,
}

/// Claims returned by the userinfo endpoint for a valid access token.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IdentityClaims {
    #[serde(rename = "sub")]
    pub subject: String,

    #[serde(default)]
    pub email: String,

    #[serde(default)]
    pub name: Option<String>,
}

/// HTTP client resolving bearer tokens to identity-provider subjects.
#[derive(Debug, Clone)]
pub struct IdentityClient {
    config: IdentityConfig,
    http: Client,
}

impl IdentityClient {
    #[must_use]
    pub fn new(config: IdentityConfig) -> Self {
        Self {
            config,
            http: Client::new(),
        }
    }

    /// Fetch the claims for `bearer_token`.
    ///
    /// Returns `Ok(None)` when the provider rejects the token.
    ///
    /// # Errors
    ///
    /// Returns an error on HTTP failure or an unexpected response.
    pub async fn userinfo(
        &self,
        bearer_token: &str,
    ) -> Result<Option<IdentityClaims>, IdentityError> {
        let response = self
            .http
            .get(&self.config.userinfo_url)
            .bearer_auth(bearer_token)
            .send()
            .await?;

        let status = response.status();

        if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            return Ok(None);
        }

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();

            return Err(IdentityError::UnexpectedResponse(format!(
                "userinfo request failed with status {status}: {text}"
            )));
        }

        let claims: IdentityClaims = response.json().await?;

        if claims.subject.is_empty() {
            return Err(IdentityError::UnexpectedResponse(
                "userinfo response carried an empty subject".to_string(),
            ));
        }

        Ok(Some(claims))
    }
}

/// Errors that can occur when communicating with the identity provider.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// An HTTP transport or serialization error occurred.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider returned a non-2xx response or unexpected body.
    #[error("unexpected response from identity provider: {0}")]
    UnexpectedResponse(String),
}
