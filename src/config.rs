// src/config.rs

use std::env;
use std::str::FromStr;

use dotenvy::dotenv;
use serde::Deserialize;

/// One OpenAI-compatible text generation endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct LlmProvider {
    pub name: String,
    pub base_url: String,
    #[serde(default)]
    pub api_key: String,
    pub model: String,
}

/// Upstream fetch behaviour for the scrapers.
#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    pub timeout_secs: u64,
    /// Retries after the first failed attempt.
    pub retry_attempts: usize,
    pub retry_delay_ms: u64,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            retry_attempts: 2,
            retry_delay_ms: 500,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub session_secret: String,
    pub session_ttl_secs: u64,
    pub session_cookie_name: String,
    /// Marks cookies `Secure`; enabled when `APP_ENV=production`.
    pub cookie_secure: bool,
    pub rust_log: String,
    pub port: u16,
    pub frontend_url: String,
    pub public_url: String,
    pub github_client_id: Option<String>,
    pub github_client_secret: Option<String>,
    pub scrape: ScrapeConfig,
    pub llm_providers: Vec<LlmProvider>,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .expect("DATABASE_URL must be set");

        let session_secret = env::var("SESSION_SECRET")
            .expect("SESSION_SECRET must be set");

        let rust_log = env::var("RUST_LOG")
            .unwrap_or_else(|_| "info".to_string());

        let cookie_secure = env::var("APP_ENV")
            .map(|v| v == "production")
            .unwrap_or(false);

        let llm_providers = match env::var("LLM_PROVIDERS") {
            Ok(raw) if !raw.trim().is_empty() => serde_json::from_str(&raw)
                .expect("LLM_PROVIDERS must be a JSON array of {name, base_url, api_key, model}"),
            _ => Vec::new(),
        };

        let defaults = ScrapeConfig::default();

        Self {
            database_url,
            session_secret,
            session_ttl_secs: parse_or("SESSION_TTL_SECS", 7 * 24 * 60 * 60),
            session_cookie_name: env::var("SESSION_COOKIE_NAME")
                .unwrap_or_else(|_| "quiz_session".to_string()),
            cookie_secure,
            rust_log,
            port: parse_or("PORT", 5000),
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            public_url: env::var("PUBLIC_URL")
                .unwrap_or_else(|_| "http://localhost:5000".to_string()),
            github_client_id: non_empty("GITHUB_CLIENT_ID"),
            github_client_secret: non_empty("GITHUB_CLIENT_SECRET"),
            scrape: ScrapeConfig {
                timeout_secs: parse_or("SCRAPE_TIMEOUT_SECS", defaults.timeout_secs),
                retry_attempts: parse_or("SCRAPE_RETRY_ATTEMPTS", defaults.retry_attempts),
                retry_delay_ms: parse_or("SCRAPE_RETRY_DELAY_MS", defaults.retry_delay_ms),
            },
            llm_providers,
        }
    }
}

fn parse_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn non_empty(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}
