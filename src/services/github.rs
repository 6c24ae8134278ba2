// src/services/github.rs

use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, RedirectUrl, Scope,
    TokenResponse, TokenUrl, basic::BasicClient, reqwest::async_http_client,
};
use reqwest::header;
use serde::Deserialize;

use crate::{config::Config, error::AppError};

const AUTHORIZE_URL: &str = "https://github.com/login/oauth/authorize";
const TOKEN_URL: &str = "https://github.com/login/oauth/access_token";
const USER_URL: &str = "https://api.github.com/user";

/// The fields of `GET /user` we keep.
#[derive(Debug, Clone, Deserialize)]
pub struct GithubUser {
    pub id: i64,
    pub login: String,
    pub email: Option<String>,
    pub avatar_url: Option<String>,
}

/// GitHub OAuth app (authorization code flow).
pub struct GithubOAuth {
    client: BasicClient,
    http: reqwest::Client,
}

impl GithubOAuth {
    /// `Ok(None)` when the OAuth app is not configured.
    pub fn from_config(config: &Config) -> Result<Option<Self>, AppError> {
        let (Some(client_id), Some(client_secret)) =
            (&config.github_client_id, &config.github_client_secret)
        else {
            tracing::info!("GitHub OAuth not configured; GitHub login disabled");
            return Ok(None);
        };

        let invalid = |e: oauth2::url::ParseError| AppError::InternalServerError(e.to_string());
        let redirect = format!(
            "{}/api/auth/github/callback",
            config.public_url.trim_end_matches('/')
        );

        let client = BasicClient::new(
            ClientId::new(client_id.clone()),
            Some(ClientSecret::new(client_secret.clone())),
            AuthUrl::new(AUTHORIZE_URL.to_string()).map_err(invalid)?,
            Some(TokenUrl::new(TOKEN_URL.to_string()).map_err(invalid)?),
        )
        .set_redirect_uri(RedirectUrl::new(redirect).map_err(invalid)?);

        let http = reqwest::Client::builder()
            .user_agent(concat!("quiz-backend/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AppError::InternalServerError(e.to_string()))?;

        Ok(Some(Self { client, http }))
    }

    /// Authorization URL plus the CSRF state the callback must echo.
    pub fn authorize_url(&self) -> (String, String) {
        let (url, csrf) = self
            .client
            .authorize_url(CsrfToken::new_random)
            .add_scope(Scope::new("read:user".to_string()))
            .add_scope(Scope::new("user:email".to_string()))
            .url();

        (url.to_string(), csrf.secret().clone())
    }

    /// Trades the callback's code for an access token.
    pub async fn exchange_code(&self, code: String) -> Result<String, AppError> {
        let token = self
            .client
            .exchange_code(AuthorizationCode::new(code))
            .request_async(async_http_client)
            .await
            .map_err(|e| {
                tracing::error!("GitHub token exchange failed: {:?}", e);
                AppError::Upstream(format!("GitHub token exchange failed: {}", e))
            })?;

        Ok(token.access_token().secret().clone())
    }

    pub async fn fetch_user(&self, access_token: &str) -> Result<GithubUser, AppError> {
        let upstream = |e: reqwest::Error| AppError::Upstream(format!("GitHub user lookup failed: {}", e));

        self.http
            .get(USER_URL)
            .bearer_auth(access_token)
            .header(header::ACCEPT, "application/vnd.github+json")
            .send()
            .await
            .map_err(upstream)?
            .error_for_status()
            .map_err(upstream)?
            .json::<GithubUser>()
            .await
            .map_err(upstream)
    }
}
