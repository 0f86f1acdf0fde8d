use crate::traits::{NewsSourceStrategy, StrategyKind};
use crate::types::{AggregatorError, NormalizedArticle, ResolveInput, Result};
use async_trait::async_trait;
use tracing::info;

/// Alternate-format (JSON feed) source. Not implemented: it claims every
/// input, and `fetch` reports `NotImplemented` instead of an empty list.
#[derive(Debug, Default)]
pub struct JsonFeedSource;

impl JsonFeedSource {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl NewsSourceStrategy for JsonFeedSource {
    fn kind(&self) -> StrategyKind {
        StrategyKind::AlternateFormat
    }

    fn can_handle(&self, input: &ResolveInput) -> bool {
        info!(
            "JsonFeedSource::can_handle called (url={:?}, content_type={:?}); not implemented yet",
            input.url, input.content_type_hint
        );
        true
    }

    async fn fetch(&self, limit: usize, url: Option<&str>) -> Result<Vec<NormalizedArticle>> {
        info!("JsonFeedSource::fetch called (url={:?}, limit={}); not implemented yet", url, limit);
        Err(AggregatorError::NotImplemented {
            strategy: "json-feed".to_string(),
        })
    }
}
