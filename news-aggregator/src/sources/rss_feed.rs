use crate::parser::FeedParser;
use crate::rss_utils::{content_type, url};
use crate::traits::{NewsSourceStrategy, StrategyKind};
use crate::types::{AggregatorError, FetchConfig, NormalizedArticle, ResolveInput, Result};
use crate::Fetcher;
use async_trait::async_trait;
use tracing::info;

/// RSS 2.0 / Atom feed source
pub struct RssFeedSource {
    fetcher: Fetcher,
}

impl RssFeedSource {
    pub fn new(fetch_config: &FetchConfig) -> Result<Self> {
        Ok(Self {
            fetcher: Fetcher::new(fetch_config)?,
        })
    }
}

#[async_trait]
impl NewsSourceStrategy for RssFeedSource {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Rss
    }

    fn can_handle(&self, input: &ResolveInput) -> bool {
        if let Some(hint) = input.content_type_hint.as_deref() {
            if content_type::is_feed_content_type(hint) {
                return true;
            }
        }

        input
            .url
            .as_deref()
            .map(|u| !u.is_empty() && url::looks_like_feed_url(u))
            .unwrap_or(false)
    }

    async fn fetch(&self, limit: usize, url: Option<&str>) -> Result<Vec<NormalizedArticle>> {
        let url = url.filter(|u| !u.trim().is_empty()).ok_or_else(|| AggregatorError::FetchFailed {
            url: String::new(),
            reason: "RSS strategy requires a feed URL".to_string(),
        })?;

        info!("Fetching RSS from {}, limit={}", url, limit);

        let content = self.fetcher.fetch_feed(url).await?;
        let articles = FeedParser::new(url).parse_feed(&content, limit)?;

        info!("Fetched {} items from {}", articles.len(), url);
        Ok(articles)
    }
}
