// src/services/explanation.rs

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use crate::{config::LlmProvider, error::AppError};

/// Seed explanation the scrapers store when a site has none.
pub const MISSING_EXPLANATION: &str = "Explanation not found.";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, thiserror::Error)]
pub enum ExplainError {
    #[error("{provider}: request failed: {source}")]
    Request {
        provider: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{provider}: HTTP {status}")]
    Status { provider: String, status: u16 },

    #[error("{provider}: response had no completion text")]
    EmptyCompletion { provider: String },

    #[error("Failed to get further explanation")]
    AllProvidersFailed,
}

/// An opaque text-generation service.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    fn name(&self) -> &str;

    async fn generate(&self, prompt: &str) -> Result<String, ExplainError>;
}

/// Any endpoint speaking the OpenAI chat completions protocol.
pub struct OpenAiCompatible {
    client: Client,
    provider: LlmProvider,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Deserialize)]
struct Message {
    content: Option<String>,
}

impl OpenAiCompatible {
    pub fn new(client: Client, provider: LlmProvider) -> Self {
        Self { client, provider }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/chat/completions",
            self.provider.base_url.trim_end_matches('/')
        )
    }
}

#[async_trait]
impl TextGenerator for OpenAiCompatible {
    fn name(&self) -> &str {
        &self.provider.name
    }

    async fn generate(&self, prompt: &str) -> Result<String, ExplainError> {
        let payload = json!({
            "model": self.provider.model,
            "messages": [{ "role": "user", "content": prompt }],
        });

        let mut request = self.client.post(self.endpoint()).json(&payload);
        if !self.provider.api_key.is_empty() {
            request = request.bearer_auth(&self.provider.api_key);
        }

        let response = request.send().await.map_err(|source| ExplainError::Request {
            provider: self.provider.name.clone(),
            source,
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ExplainError::Status {
                provider: self.provider.name.clone(),
                status: status.as_u16(),
            });
        }

        let body: CompletionResponse =
            response.json().await.map_err(|source| ExplainError::Request {
                provider: self.provider.name.clone(),
                source,
            })?;

        body.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or_else(|| ExplainError::EmptyCompletion {
                provider: self.provider.name.clone(),
            })
    }
}

/// Ordered providers; the first success wins.
pub struct ProviderChain {
    providers: Vec<Arc<dyn TextGenerator>>,
}

impl ProviderChain {
    pub fn new(providers: Vec<Arc<dyn TextGenerator>>) -> Self {
        Self { providers }
    }

    pub fn from_config(providers: &[LlmProvider]) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| AppError::InternalServerError(e.to_string()))?;

        let providers = providers
            .iter()
            .cloned()
            .map(|p| Arc::new(OpenAiCompatible::new(client.clone(), p)) as Arc<dyn TextGenerator>)
            .collect();

        Ok(Self::new(providers))
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    pub async fn generate(&self, prompt: &str) -> Result<String, ExplainError> {
        for provider in &self.providers {
            match provider.generate(prompt).await {
                Ok(text) => {
                    tracing::info!("Further explanation generated by {}", provider.name());
                    return Ok(text);
                }
                Err(e) => tracing::warn!("Provider {} failed: {}", provider.name(), e),
            }
        }

        Err(ExplainError::AllProvidersFailed)
    }
}

/// Prompt asking for a layman's explanation of why `answer` is correct,
/// building on the stored explanation when there is a real one.
pub fn build_prompt(
    question_text: &str,
    options: &[String],
    answer: &str,
    explanation: Option<&str>,
) -> String {
    let options = options.join(" ");
    let seed = explanation
        .map(str::trim)
        .filter(|e| !e.is_empty() && *e != MISSING_EXPLANATION);

    match seed {
        Some(seed) => format!(
            "Given this explanation '{seed}', explain further why {answer} is the answer to this \
             following Question: {question_text} {options}. Explain it in the simplest and most \
             appropriate way to understand, in Layman's terms, why {answer} is the answer. Also, \
             identify very brief keywords from the question_text that would serve as a memory \
             guide or hint that would immediately kick in as to why we have the respective answer."
        ),
        None => format!(
            "Given this Question: {question_text} {options}, explain in the simplest and most \
             appropriate way to understand, in Layman's terms, why {answer} is the answer. Also, \
             identify very brief keywords from the question_text that would serve as a memory \
             guide or hint that would immediately kick in as to why we have the respective answer."
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Fixed {
        name: &'static str,
        reply: Option<&'static str>,
        calls: AtomicUsize,
    }

    impl Fixed {
        fn new(name: &'static str, reply: Option<&'static str>) -> Arc<Self> {
            Arc::new(Self {
                name,
                reply,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl TextGenerator for Fixed {
        fn name(&self) -> &str {
            self.name
        }

        async fn generate(&self, _prompt: &str) -> Result<String, ExplainError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.reply
                .map(str::to_string)
                .ok_or_else(|| ExplainError::EmptyCompletion {
                    provider: self.name.to_string(),
                })
        }
    }

    #[tokio::test]
    async fn falls_back_in_order() {
        let first = Fixed::new("first", None);
        let second = Fixed::new("second", Some("because"));
        let third = Fixed::new("third", Some("never asked"));
        let chain = ProviderChain::new(vec![
            first.clone() as Arc<dyn TextGenerator>,
            second.clone() as Arc<dyn TextGenerator>,
            third.clone() as Arc<dyn TextGenerator>,
        ]);

        assert_eq!(chain.generate("p").await.unwrap(), "because");
        assert_eq!(first.calls.load(Ordering::SeqCst), 1);
        assert_eq!(second.calls.load(Ordering::SeqCst), 1);
        assert_eq!(third.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn all_failing_is_one_error() {
        let chain = ProviderChain::new(vec![
            Fixed::new("a", None) as Arc<dyn TextGenerator>,
            Fixed::new("b", None) as Arc<dyn TextGenerator>,
        ]);
        assert!(matches!(
            chain.generate("p").await,
            Err(ExplainError::AllProvidersFailed)
        ));

        let empty = ProviderChain::new(Vec::new());
        assert!(empty.is_empty());
        assert!(matches!(
            empty.generate("p").await,
            Err(ExplainError::AllProvidersFailed)
        ));
    }

    #[test]
    fn prompt_uses_seed_explanation() {
        let options = vec!["Ohm".to_string(), "Volt".to_string()];
        let prompt = build_prompt("Unit of resistance?", &options, "Option A", Some("R = V/I"));
        assert!(prompt.starts_with("Given this explanation 'R = V/I', explain further why Option A"));
        assert!(prompt.contains("Question: Unit of resistance? Ohm Volt."));
    }

    #[test]
    fn placeholder_explanation_counts_as_absent() {
        let options = vec!["Ohm".to_string()];
        for seed in [None, Some(""), Some(MISSING_EXPLANATION)] {
            let prompt = build_prompt("Q?", &options, "Option A", seed);
            assert!(prompt.starts_with("Given this Question: Q? Ohm, explain"));
        }
    }
}
