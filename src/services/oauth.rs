//! GitHub login
//!
//! Implements the authorization-code flow: redirect to GitHub, exchange the
//! returned code for an access token, then read the user's profile.

use serde::Deserialize;
use std::time::Duration;

use super::user::ProviderProfile;
use crate::config::GithubConfig;

pub const PROVIDER: &str = "github";

const AUTHORIZE_URL: &str = "https://github.com/login/oauth/authorize";
const TOKEN_URL: &str = "https://github.com/login/oauth/access_token";
const API_URL: &str = "https://api.github.com";

/// Error type for the login flow
#[derive(Debug, thiserror::Error)]
pub enum OAuthError {
    #[error("GitHub request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// GitHub answered but refused the exchange
    #[error("GitHub rejected the login: {0}")]
    Rejected(String),
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GithubUser {
    id: i64,
    login: String,
    name: Option<String>,
    email: Option<String>,
}

impl From<GithubUser> for ProviderProfile {
    fn from(user: GithubUser) -> Self {
        // private emails come back as null
        let email = user
            .email
            .filter(|e| !e.trim().is_empty())
            .unwrap_or_else(|| format!("{}@users.noreply.github.com", user.login));
        ProviderProfile {
            provider: PROVIDER.to_string(),
            provider_id: user.id.to_string(),
            name: user.name.unwrap_or_default(),
            nickname: user.login,
            email,
        }
    }
}

/// GitHub OAuth application client
pub struct GithubOAuth {
    client: reqwest::Client,
    config: GithubConfig,
    token_url: String,
    api_url: String,
}

impl GithubOAuth {
    pub fn new(config: GithubConfig) -> Result<Self, OAuthError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("quillpad/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(15))
            .build()?;
        Ok(Self {
            client,
            config,
            token_url: TOKEN_URL.to_string(),
            api_url: API_URL.to_string(),
        })
    }

    /// URL the browser is sent to; `state` comes back on the callback
    pub fn authorize_url(&self, state: &str) -> String {
        format!(
            "{}?client_id={}&redirect_uri={}&scope={}&state={}",
            AUTHORIZE_URL,
            urlencoding::encode(&self.config.client_id),
            urlencoding::encode(&self.config.callback_url),
            urlencoding::encode("read:user user:email"),
            urlencoding::encode(state),
        )
    }

    async fn exchange_code(&self, code: &str) -> Result<String, OAuthError> {
        let response: TokenResponse = self
            .client
            .post(&self.token_url)
            .header(reqwest::header::ACCEPT, "application/json")
            .form(&[
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("code", code),
                ("redirect_uri", self.config.callback_url.as_str()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        match response.access_token {
            Some(token) if !token.is_empty() => Ok(token),
            _ => Err(OAuthError::Rejected(
                response
                    .error_description
                    .or(response.error)
                    .unwrap_or_else(|| "no access token returned".to_string()),
            )),
        }
    }

    async fn fetch_profile(&self, token: &str) -> Result<ProviderProfile, OAuthError> {
        let user: GithubUser = self
            .client
            .get(format!("{}/user", self.api_url))
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .bearer_auth(token)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(user.into())
    }

    /// Turn a callback `code` into the caller's GitHub identity
    pub async fn complete(&self, code: &str) -> Result<ProviderProfile, OAuthError> {
        let token = self.exchange_code(code).await?;
        self.fetch_profile(&token).await
    }
}
