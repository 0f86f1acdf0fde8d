use crate::retry::{retry_with_backoff, RetryPolicy};
use crate::traits::EnrichmentPort;
use crate::types::{AggregatorError, Category, EnrichmentConfig, EnrichmentResult, NormalizedArticle, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

pub const FAKE_TITLE_MIN_CHARS: usize = 5;
pub const FAKE_TITLE_MAX_CHARS: usize = 160;

/// Headline length requested in the prompt; validation allows more slack.
const PROMPT_TITLE_LIMIT: usize = 120;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Default, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: Option<ChatReply>,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    content: Option<String>,
}

/// Shape the model is asked to return, before validation.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEnrichment {
    fake_title: String,
    category: String,
}

/// Chat-completions backed enrichment with retry and strict output validation.
pub struct OpenAiEnrichment {
    client: Client,
    config: EnrichmentConfig,
    policy: RetryPolicy,
}

impl OpenAiEnrichment {
    pub fn new(config: EnrichmentConfig) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(AggregatorError::Config("OpenAI API key is missing".to_string()));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;
        let policy = RetryPolicy::new(config.retries, Duration::from_millis(config.base_delay_ms));

        info!("OpenAI enrichment configured (model={}, retries={})", config.model, config.retries);

        Ok(Self { client, config, policy })
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/chat/completions", self.config.base_url.trim_end_matches('/'))
    }

    async fn attempt(&self, prompt: &str) -> Result<EnrichmentResult> {
        let body = ChatRequest {
            model: &self.config.model,
            messages: vec![ChatMessage { role: "user", content: prompt }],
            temperature: self.config.temperature,
        };

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| AggregatorError::EnrichmentFailed(format!("transport error: {}", e)))?;

        let reply: ChatResponse = response
            .json()
            .await
            .map_err(|e| AggregatorError::EnrichmentFailed(format!("unreadable response: {}", e)))?;

        let text = reply
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .unwrap_or_default();

        parse_enrichment(&text)
    }
}

#[async_trait]
impl EnrichmentPort for OpenAiEnrichment {
    async fn enrich(&self, article: &NormalizedArticle) -> Result<EnrichmentResult> {
        let prompt = build_prompt(article);
        debug!("Enriching {}", article.url);

        retry_with_backoff(&self.policy, |_| self.attempt(&prompt)).await
    }
}

fn escape_quotes(value: &str) -> String {
    value.replace('"', "\\\"")
}

/// Deterministic instruction text for one article.
pub fn build_prompt(article: &NormalizedArticle) -> String {
    let categories: Vec<&str> = Category::ALL.iter().map(|c| c.as_str()).collect();
    [
        "You are given a REAL news title and its URL.".to_string(),
        format!("1) Create a plausible FAKE headline (<={} chars).", PROMPT_TITLE_LIMIT),
        format!("2) Classify the REAL article into one of: {}.", categories.join(", ")),
        "Return STRICT JSON only with keys: fakeTitle, category.".to_string(),
        format!("RealTitle: \"{}\"", escape_quotes(&article.real_title)),
        format!("URL: \"{}\"", escape_quotes(&article.url)),
    ]
    .join("\n")
}

/// Span from the first `{` to the last `}` of free text, if any.
pub fn extract_json_block(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// Extract, parse and validate the model output.
pub fn parse_enrichment(text: &str) -> Result<EnrichmentResult> {
    let block = extract_json_block(text)
        .ok_or_else(|| AggregatorError::EnrichmentFailed("response contained no JSON block".to_string()))?;

    let raw: RawEnrichment = serde_json::from_str(block)
        .map_err(|e| AggregatorError::EnrichmentFailed(format!("invalid JSON: {}", e)))?;

    validate(raw)
}

fn validate(raw: RawEnrichment) -> Result<EnrichmentResult> {
    let length = raw.fake_title.chars().count();
    if !(FAKE_TITLE_MIN_CHARS..=FAKE_TITLE_MAX_CHARS).contains(&length) {
        return Err(AggregatorError::EnrichmentFailed(format!(
            "fakeTitle must be {}-{} characters, got {}",
            FAKE_TITLE_MIN_CHARS, FAKE_TITLE_MAX_CHARS, length
        )));
    }

    let category: Category = raw.category.parse()?;

    Ok(EnrichmentResult {
        fake_title: raw.fake_title,
        category,
    })
}
