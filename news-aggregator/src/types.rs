use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Placeholder used when a feed entry carries no usable title.
pub const UNTITLED: &str = "(no title)";

/// Input handed to strategies when deciding whether they apply.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolveInput {
    pub url: Option<String>,
    pub content_type_hint: Option<String>,
}

impl ResolveInput {
    pub fn from_url(url: Option<&str>) -> Self {
        Self {
            url: url.map(|u| u.to_string()),
            content_type_hint: None,
        }
    }

    pub fn with_hint(mut self, hint: Option<String>) -> Self {
        self.content_type_hint = hint;
        self
    }
}

/// Canonical article shape produced by every strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedArticle {
    pub real_title: String,
    pub url: String,
    pub source: String,
    pub category: Option<String>,
    pub published_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Politics,
    Sports,
    Technology,
    Other,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Politics,
        Category::Sports,
        Category::Technology,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Politics => "Politics",
            Category::Sports => "Sports",
            Category::Technology => "Technology",
            Category::Other => "Other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = AggregatorError;

    fn from_str(s: &str) -> Result<Self> {
        Category::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| AggregatorError::EnrichmentFailed(format!("unknown category: {}", s)))
    }
}

/// Output of one enrichment call; this is also what the cache stores.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichmentResult {
    pub fake_title: String,
    pub category: Category,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedArticle {
    pub real_title: String,
    pub fake_title: String,
    pub category: Category,
    pub url: String,
    pub source: String,
    pub published_at: DateTime<Utc>,
}

impl EnrichedArticle {
    pub fn new(article: NormalizedArticle, enrichment: EnrichmentResult) -> Self {
        Self {
            real_title: article.real_title,
            fake_title: enrichment.fake_title,
            category: enrichment.category,
            url: article.url,
            source: article.source,
            published_at: article.published_at,
        }
    }
}

/// Wire shape of a single item in the articles response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleView {
    pub real_title: String,
    pub fake_title: String,
    pub category: Category,
    pub url: String,
    pub source: String,
    pub published_at: String,
}

impl From<&EnrichedArticle> for ArticleView {
    fn from(article: &EnrichedArticle) -> Self {
        Self {
            real_title: article.real_title.clone(),
            fake_title: article.fake_title.clone(),
            category: article.category,
            url: article.url.clone(),
            source: article.source.clone(),
            published_at: article.published_at.to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMeta {
    pub count: usize,
    pub duration_ms: u64,
    pub enriched: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticlesResponse {
    pub items: Vec<ArticleView>,
    pub meta: ResponseMeta,
}

impl ArticlesResponse {
    pub fn new(articles: &[EnrichedArticle], duration_ms: u64) -> Self {
        let items: Vec<ArticleView> = articles.iter().map(ArticleView::from).collect();
        Self {
            meta: ResponseMeta {
                count: items.len(),
                duration_ms,
                enriched: true,
            },
            items,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,
    pub kind: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub error: ErrorBody,
}

impl From<&AggregatorError> for ErrorPayload {
    fn from(err: &AggregatorError) -> Self {
        Self {
            error: ErrorBody {
                message: err.to_string(),
                kind: err.kind().to_string(),
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub user_agent: String,
    pub feed_timeout_seconds: u64,
    pub sniff_timeout_seconds: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "SnipsNewsBot/1.0".to_string(),
            feed_timeout_seconds: 10,
            sniff_timeout_seconds: 5,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EnrichmentConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub retries: u32,
    pub base_delay_ms: u64,
    pub timeout_seconds: u64,
    pub temperature: f32,
}

impl EnrichmentConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: "gpt-4o-mini".to_string(),
            base_url: "https://api.openai.com".to_string(),
            retries: 3,
            base_delay_ms: 500,
            timeout_seconds: 15,
            temperature: 0.7,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AggregatorError {
    #[error("Invalid source reference '{reference}': {reason}")]
    InvalidSourceReference { reference: String, reason: String },

    #[error("No suitable source strategy was found for the given input")]
    NoStrategyFound,

    #[error("Feed fetch failed for {url}: {reason}")]
    FetchFailed { url: String, reason: String },

    #[error("Enrichment failed: {0}")]
    EnrichmentFailed(String),

    #[error("Source strategy '{strategy}' is not implemented")]
    NotImplemented { strategy: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl AggregatorError {
    /// Stable kind used in structured error payloads.
    pub fn kind(&self) -> &'static str {
        match self {
            AggregatorError::InvalidSourceReference { .. } => "invalid_source",
            AggregatorError::NoStrategyFound => "no_strategy",
            AggregatorError::FetchFailed { .. } => "fetch_failed",
            AggregatorError::EnrichmentFailed(_) => "enrichment_failed",
            AggregatorError::NotImplemented { .. } => "not_implemented",
            AggregatorError::Config(_) => "config",
            AggregatorError::Http(_) => "internal",
        }
    }
}

pub type Result<T> = std::result::Result<T, AggregatorError>;
