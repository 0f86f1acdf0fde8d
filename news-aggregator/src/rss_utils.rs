/// Feed-reference and hostname helpers

/// URL utilities for feed references
pub mod url {
    use crate::types::{AggregatorError, Result};
    use url::Url;

    /// Check that a user-supplied feed reference is an absolute http/https URL.
    pub fn validate_feed_reference(reference: &str) -> Result<Url> {
        let parsed = Url::parse(reference).map_err(|e| AggregatorError::InvalidSourceReference {
            reference: reference.to_string(),
            reason: format!("must be a valid URL ({})", e),
        })?;

        match parsed.scheme() {
            "http" | "https" => Ok(parsed),
            other => Err(AggregatorError::InvalidSourceReference {
                reference: reference.to_string(),
                reason: format!("must use http/https scheme, got '{}'", other),
            }),
        }
    }

    /// Hostname of a feed URL with any leading "www." removed
    pub fn source_host(url_str: &str) -> Option<String> {
        let parsed = Url::parse(url_str).ok()?;
        let host = parsed.host_str()?;
        Some(host.strip_prefix("www.").unwrap_or(host).to_string())
    }

    /// Whether the URL itself suggests an RSS/Atom document
    pub fn looks_like_feed_url(url_str: &str) -> bool {
        let lower = url_str.to_lowercase();
        lower.contains("rss") || lower.contains(".xml") || lower.contains("feed")
    }
}

/// Content-type helpers
pub mod content_type {
    /// Whether a content-type value names an XML, RSS or Atom document
    pub fn is_feed_content_type(content_type: &str) -> bool {
        let lower = content_type.to_lowercase();
        lower.contains("xml") || lower.contains("rss") || lower.contains("atom")
    }
}
