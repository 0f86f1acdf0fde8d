use crate::types::{EnrichmentResult, NormalizedArticle, ResolveInput, Result};
use async_trait::async_trait;
use std::time::Duration;

/// Closed set of feed families the resolver can choose between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKind {
    Rss,
    AlternateFormat,
}

/// A pluggable unit that detects whether it applies to a feed reference
/// and fetches + normalizes entries for one feed family.
#[async_trait]
pub trait NewsSourceStrategy: Send + Sync {
    fn kind(&self) -> StrategyKind;

    /// Decide applicability from the URL and, on the second resolution pass,
    /// a sniffed content-type hint. Must not perform I/O.
    fn can_handle(&self, input: &ResolveInput) -> bool;

    /// Fetch and normalize at most `limit` entries.
    async fn fetch(&self, limit: usize, url: Option<&str>) -> Result<Vec<NormalizedArticle>>;
}

/// Best-effort live content-type detection. Never fails; `None` means unknown.
#[async_trait]
pub trait ContentTypeProbe: Send + Sync {
    async fn sniff(&self, url: &str) -> Option<String>;
}

/// Adapter for the external generative service.
#[async_trait]
pub trait EnrichmentPort: Send + Sync {
    async fn enrich(&self, article: &NormalizedArticle) -> Result<EnrichmentResult>;
}

/// Key-value store with per-entry time-to-live, used cache-aside.
#[async_trait]
pub trait CachePort: Send + Sync {
    async fn get(&self, key: &str) -> Option<EnrichmentResult>;

    async fn set(&self, key: &str, value: EnrichmentResult, ttl: Duration);
}
