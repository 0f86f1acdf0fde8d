use crate::traits::{ContentTypeProbe, NewsSourceStrategy};
use crate::types::{AggregatorError, ResolveInput, Result};
use std::sync::Arc;
use tracing::{debug, info};

/// Picks the strategy for a feed reference. Registration order is priority.
pub struct SourceResolver {
    strategies: Vec<Arc<dyn NewsSourceStrategy>>,
    probe: Arc<dyn ContentTypeProbe>,
}

impl SourceResolver {
    pub fn new(strategies: Vec<Arc<dyn NewsSourceStrategy>>, probe: Arc<dyn ContentTypeProbe>) -> Self {
        Self { strategies, probe }
    }

    /// First pass matches on the URL alone. Only when nothing matches and a
    /// URL is present is the content type sniffed and matching repeated.
    pub async fn resolve(&self, input: &ResolveInput) -> Result<Arc<dyn NewsSourceStrategy>> {
        let url = input
            .url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty());

        let by_url = ResolveInput::from_url(url);
        if let Some(strategy) = select(&self.strategies, &by_url) {
            debug!("Resolved {:?} strategy from URL {:?}", strategy.kind(), url);
            return Ok(strategy);
        }

        let hint = match url {
            Some(u) => self.probe.sniff(u).await,
            None => None,
        };
        debug!("Sniffed content type for {:?}: {:?}", url, hint);

        let by_type = ResolveInput::from_url(url).with_hint(hint);
        if let Some(strategy) = select(&self.strategies, &by_type) {
            info!("Resolved {:?} strategy from content type {:?}", strategy.kind(), by_type.content_type_hint);
            return Ok(strategy);
        }

        Err(AggregatorError::NoStrategyFound)
    }
}

/// First registered strategy that accepts `input`.
pub fn select(strategies: &[Arc<dyn NewsSourceStrategy>], input: &ResolveInput) -> Option<Arc<dyn NewsSourceStrategy>> {
    strategies.iter().find(|s| s.can_handle(input)).cloned()
}
