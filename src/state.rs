use std::sync::Arc;

use axum::extract::FromRef;
use sqlx::PgPool;

use crate::{
    config::Config,
    error::AppError,
    scraping::{fetch::Fetcher, source::AdapterRegistry},
    services::{explanation::ProviderChain, github::GithubOAuth},
};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Config,
    pub fetcher: Fetcher,
    pub adapters: Arc<AdapterRegistry>,
    pub explainer: Arc<ProviderChain>,
    /// `None` when no GitHub OAuth app is configured.
    pub github: Option<Arc<GithubOAuth>>,
}

impl AppState {
    /// Wires the outbound clients from configuration.
    pub fn new(pool: PgPool, config: Config) -> Result<Self, AppError> {
        let fetcher = Fetcher::new(&config.scrape)?;
        let explainer = ProviderChain::from_config(&config.llm_providers)?;
        if explainer.is_empty() {
            tracing::warn!("No LLM providers configured; further explanations are unavailable");
        }
        let github = GithubOAuth::from_config(&config)?.map(Arc::new);

        Ok(Self {
            pool,
            config,
            fetcher,
            adapters: Arc::new(AdapterRegistry::default()),
            explainer: Arc::new(explainer),
            github,
        })
    }
}

impl FromRef<AppState> for PgPool {
    fn from_ref(state: &AppState) -> Self {
        state.pool.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}
