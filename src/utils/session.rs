// src/utils/session.rs

use std::{
    collections::HashMap,
    convert::Infallible,
    time::{SystemTime, UNIX_EPOCH},
};

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{HeaderMap, HeaderValue, header, request::Parts},
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::{config::Config, error::AppError};

/// Everything the server remembers about a browser between requests.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct SessionData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_avatar: Option<String>,
    /// Running score per quiz set id.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub scores: HashMap<String, i64>,
}

impl SessionData {
    pub fn sign_in(&mut self, user_id: i64, name: &str, avatar: Option<&str>) {
        self.user_id = Some(user_id);
        self.user_name = Some(name.to_string());
        self.user_avatar = avatar.map(str::to_string);
    }
}

#[derive(Debug, Deserialize, Serialize)]
struct SessionClaims {
    #[serde(flatten)]
    data: SessionData,
    /// Expiration time as Unix timestamp.
    exp: usize,
}

/// Signs the session into a compact HS256 token.
pub fn sign_session(data: &SessionData, secret: &str, ttl_secs: u64) -> Result<String, AppError> {
    let expiration = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| AppError::InternalServerError(e.to_string()))?
        .as_secs() as usize
        + ttl_secs as usize;

    let claims = SessionClaims {
        data: data.clone(),
        exp: expiration,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::InternalServerError(e.to_string()))
}

/// Verifies signature and expiry.
pub fn verify_session(token: &str, secret: &str) -> Result<SessionData, AppError> {
    let token_data = decode::<SessionClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| AppError::AuthError("Invalid session".to_string()))?;

    Ok(token_data.claims.data)
}

/// Value of the named cookie in the request's `Cookie` headers.
pub fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
}

/// A `Set-Cookie` value scoped to the whole API.
pub fn cookie_header(
    name: &str,
    value: &str,
    max_age_secs: u64,
    secure: bool,
) -> Result<HeaderValue, AppError> {
    let mut cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        name, value, max_age_secs
    );
    if secure {
        cookie.push_str("; Secure");
    }

    HeaderValue::from_str(&cookie).map_err(|e| AppError::InternalServerError(e.to_string()))
}

/// `Set-Cookie` carrying the signed session.
pub fn session_cookie(config: &Config, data: &SessionData) -> Result<HeaderValue, AppError> {
    let token = sign_session(data, &config.session_secret, config.session_ttl_secs)?;
    cookie_header(
        &config.session_cookie_name,
        &token,
        config.session_ttl_secs,
        config.cookie_secure,
    )
}

/// `Set-Cookie` that drops the session entirely.
pub fn clear_session_cookie(config: &Config) -> Result<HeaderValue, AppError> {
    cookie_header(&config.session_cookie_name, "", 0, config.cookie_secure)
}

/// Extractor for the current session. Missing, expired or tampered
/// cookies yield an empty (anonymous) session.
#[derive(Debug, Clone, Default)]
pub struct Session(pub SessionData);

impl<S> FromRequestParts<S> for Session
where
    Config: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let config = Config::from_ref(state);

        let data = read_cookie(&parts.headers, &config.session_cookie_name)
            .filter(|token| !token.is_empty())
            .and_then(|token| match verify_session(&token, &config.session_secret) {
                Ok(data) => Some(data),
                Err(_) => {
                    tracing::debug!("Ignoring invalid session cookie");
                    None
                }
            })
            .unwrap_or_default();

        Ok(Session(data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signed_session_round_trips() {
        let mut data = SessionData::default();
        data.sign_in(7, "ada", Some("https://avatars/7"));
        data.scores.insert("set-1".into(), 3);

        let token = sign_session(&data, "secret", 60).unwrap();
        assert_eq!(verify_session(&token, "secret").unwrap(), data);
        assert!(verify_session(&token, "other-secret").is_err());
    }

    #[test]
    fn reads_cookie_among_others() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; quiz_session=abc.def; x=1"),
        );
        assert_eq!(read_cookie(&headers, "quiz_session").as_deref(), Some("abc.def"));
        assert_eq!(read_cookie(&headers, "missing"), None);
    }

    #[test]
    fn cookie_attributes() {
        let value = cookie_header("quiz_session", "t", 60, true).unwrap();
        assert_eq!(
            value.to_str().unwrap(),
            "quiz_session=t; Path=/; HttpOnly; SameSite=Lax; Max-Age=60; Secure"
        );
    }
}
