use crate::traits::ContentTypeProbe;
use crate::types::{AggregatorError, FetchConfig, Result};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Response};
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

/// HTTP client for feed documents.
#[derive(Clone)]
pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.feed_timeout_seconds))
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .build()?;

        Ok(Self { client })
    }

    /// GET the feed body. Transport errors and statuses >= 400 become `FetchFailed`.
    pub async fn fetch_feed(&self, url: &str) -> Result<String> {
        let start_time = Instant::now();
        debug!("Fetching feed: {}", url);

        let response = self.client.get(url).send().await.map_err(|e| {
            error!("Feed HTTP error for {}: {}", url, e);
            AggregatorError::FetchFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        })?;

        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            error!("Feed request for {} returned HTTP {}", url, status);
            return Err(AggregatorError::FetchFailed {
                url: url.to_string(),
                reason: format!("HTTP {}: {}", status.as_u16(), status.canonical_reason().unwrap_or("Unknown")),
            });
        }

        let content = response.text().await.map_err(|e| AggregatorError::FetchFailed {
            url: url.to_string(),
            reason: format!("unable to read body: {}", e),
        })?;

        info!(
            "Fetched feed: {} ({} bytes in {}ms)",
            url,
            content.len(),
            start_time.elapsed().as_millis()
        );
        Ok(content)
    }
}

/// Content-type sniffing over HTTP: one `HEAD`, then one `GET` only when the
/// `HEAD` did not produce a usable content type.
pub struct HttpContentTypeProbe {
    client: Client,
}

impl HttpContentTypeProbe {
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.sniff_timeout_seconds))
            .build()?;

        Ok(Self { client })
    }

    fn content_type_of(response: &Response) -> Option<String> {
        let status = response.status();
        if !(status.is_success() || status.is_redirection()) {
            return None;
        }

        response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.trim().to_lowercase())
            .filter(|v| !v.is_empty())
    }
}

#[async_trait]
impl ContentTypeProbe for HttpContentTypeProbe {
    async fn sniff(&self, url: &str) -> Option<String> {
        match self.client.head(url).send().await {
            Ok(response) => {
                if let Some(content_type) = Self::content_type_of(&response) {
                    debug!("HEAD {} -> {}", url, content_type);
                    return Some(content_type);
                }
            }
            Err(e) => debug!("HEAD probe failed for {}: {}", url, e),
        }

        match self.client.get(url).send().await {
            Ok(response) => {
                let content_type = Self::content_type_of(&response);
                debug!("GET {} -> {:?}", url, content_type);
                content_type
            }
            Err(e) => {
                debug!("GET probe failed for {}: {}", url, e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config() -> FetchConfig {
        FetchConfig {
            user_agent: "SnipsTests/1.0".to_string(),
            ..FetchConfig::default()
        }
    }

    #[tokio::test]
    async fn head_content_type_skips_get() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/latest"))
            .respond_with(ResponseTemplate::new(200).insert_header("content-type", "application/RSS+xml"))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/latest"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let probe = HttpContentTypeProbe::new(&config()).unwrap();
        let sniffed = probe.sniff(&format!("{}/latest", server.uri())).await;
        assert_eq!(sniffed.as_deref(), Some("application/rss+xml"));
    }

    #[tokio::test]
    async fn falls_back_to_get_when_head_fails() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/latest"))
            .respond_with(ResponseTemplate::new(405))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/latest"))
            .respond_with(ResponseTemplate::new(200).set_body_raw("<rss/>", "application/xml"))
            .expect(1)
            .mount(&server)
            .await;

        let probe = HttpContentTypeProbe::new(&config()).unwrap();
        let sniffed = probe.sniff(&format!("{}/latest", server.uri())).await;
        assert_eq!(sniffed.as_deref(), Some("application/xml"));
    }

    #[tokio::test]
    async fn head_without_content_type_falls_back_to_get() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/latest"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/latest"))
            .respond_with(ResponseTemplate::new(200).set_body_raw("<feed/>", "application/atom+xml"))
            .expect(1)
            .mount(&server)
            .await;

        let probe = HttpContentTypeProbe::new(&config()).unwrap();
        let sniffed = probe.sniff(&format!("{}/latest", server.uri())).await;
        assert_eq!(sniffed.as_deref(), Some("application/atom+xml"));
        server.verify().await;
    }

    #[tokio::test]
    async fn unreachable_host_yields_unknown() {
        let probe = HttpContentTypeProbe::new(&config()).unwrap();
        // Port 9 (discard) on localhost is not expected to speak HTTP.
        assert_eq!(probe.sniff("http://127.0.0.1:9/feed").await, None);
    }

    #[tokio::test]
    async fn fetch_feed_sends_user_agent_and_rejects_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ok.xml"))
            .and(wiremock::matchers::header("user-agent", "SnipsTests/1.0"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<rss/>"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/missing.xml"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let fetcher = Fetcher::new(&config()).unwrap();
        let body = fetcher.fetch_feed(&format!("{}/ok.xml", server.uri())).await.unwrap();
        assert_eq!(body, "<rss/>");

        let err = fetcher
            .fetch_feed(&format!("{}/missing.xml", server.uri()))
            .await
            .unwrap_err();
        assert!(matches!(err, AggregatorError::FetchFailed { .. }));
        assert!(err.to_string().contains("404"));
    }
}
