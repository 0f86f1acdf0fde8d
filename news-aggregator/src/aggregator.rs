use crate::cache::MemoryCache;
use crate::fetcher::HttpContentTypeProbe;
use crate::llm_adapter::OpenAiEnrichment;
use crate::resolver::SourceResolver;
use crate::rss_utils::url::validate_feed_reference;
use crate::sources::{JsonFeedSource, RssFeedSource};
use crate::traits::{CachePort, EnrichmentPort, NewsSourceStrategy};
use crate::types::{EnrichedArticle, EnrichmentResult, NormalizedArticle, ResolveInput, Result};
use crate::AppConfig;
use futures::future::join_all;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

pub const MIN_LIMIT: i64 = 1;
pub const MAX_LIMIT: i64 = 50;
pub const DEFAULT_LIMIT: i64 = 10;

/// Lifetime of a memoized enrichment.
pub const ENRICHMENT_TTL: Duration = Duration::from_secs(2 * 60 * 60);

pub fn clamp_limit(limit: i64) -> usize {
    limit.clamp(MIN_LIMIT, MAX_LIMIT) as usize
}

/// Lenient limit parsing for user input: any finite number is clamped and
/// truncated toward zero, anything else (missing, blank, non-numeric) means
/// `DEFAULT_LIMIT`.
pub fn parse_limit(raw: Option<&str>) -> i64 {
    match raw.map(str::trim).and_then(|r| r.parse::<f64>().ok()) {
        Some(value) if value.is_finite() => value.clamp(MIN_LIMIT as f64, MAX_LIMIT as f64).trunc() as i64,
        _ => DEFAULT_LIMIT,
    }
}

/// Deterministic cache key for an article's identity.
pub fn cache_key(real_title: &str, url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(real_title.as_bytes());
    hasher.update(b"|");
    hasher.update(url.as_bytes());
    format!("enrich:{:x}", hasher.finalize())
}

/// resolve -> fetch/normalize -> concurrent cache-aside enrichment -> ordered result.
pub struct NewsAggregator {
    resolver: SourceResolver,
    enrichment: Arc<dyn EnrichmentPort>,
    cache: Option<Arc<dyn CachePort>>,
}

impl NewsAggregator {
    pub fn new(
        resolver: SourceResolver,
        enrichment: Arc<dyn EnrichmentPort>,
        cache: Option<Arc<dyn CachePort>>,
    ) -> Self {
        Self {
            resolver,
            enrichment,
            cache,
        }
    }

    /// Wire the production collaborators: RSS first, then the alternate
    /// format, HTTP sniffing, OpenAI enrichment and the in-memory cache.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let enrichment = Arc::new(OpenAiEnrichment::new(config.enrichment.clone())?);
        let strategies: Vec<Arc<dyn NewsSourceStrategy>> = vec![
            Arc::new(RssFeedSource::new(&config.fetch)?),
            Arc::new(JsonFeedSource::new()),
        ];
        let probe = Arc::new(HttpContentTypeProbe::new(&config.fetch)?);
        let resolver = SourceResolver::new(strategies, probe);

        Ok(Self::new(resolver, enrichment, Some(Arc::new(MemoryCache::new()))))
    }

    /// Fetch up to `limit` (clamped to [1, 50]) articles and enrich each of
    /// them. Output order is fetch order. Any single enrichment failure fails
    /// the whole call.
    pub async fn get_articles(&self, limit: i64, feed_url: Option<&str>) -> Result<Vec<EnrichedArticle>> {
        let limit = clamp_limit(limit);
        let feed_url = feed_url.map(str::trim).filter(|u| !u.is_empty());
        if let Some(url) = feed_url {
            validate_feed_reference(url)?;
        }

        let strategy = self.resolver.resolve(&ResolveInput::from_url(feed_url)).await?;
        let articles = strategy.fetch(limit, feed_url).await?;
        info!("Enriching {} articles from {:?}", articles.len(), feed_url);

        // Every enrichment runs to completion; the first failure in fetch
        // order then fails the request.
        let outcomes = join_all(articles.into_iter().map(|article| self.enrich_one(article))).await;
        let enriched = outcomes.into_iter().collect::<Result<Vec<_>>>().map_err(|e| {
            error!("Aborting request for {:?}: {}", feed_url, e);
            e
        })?;

        Ok(enriched)
    }

    async fn enrich_one(&self, article: NormalizedArticle) -> Result<EnrichedArticle> {
        let key = cache_key(&article.real_title, &article.url);

        let cached = match &self.cache {
            Some(cache) => cache.get(&key).await,
            None => None,
        };

        let enrichment: EnrichmentResult = match cached {
            Some(hit) => {
                info!("enrich: cache hit ({})", article.url);
                hit
            }
            None => {
                info!("enrich: cache miss ({})", article.url);
                let fresh = self.enrichment.enrich(&article).await?;
                if let Some(cache) = &self.cache {
                    cache.set(&key, fresh.clone(), ENRICHMENT_TTL).await;
                }
                fresh
            }
        };

        Ok(EnrichedArticle::new(article, enrichment))
    }
}
