//! Tavily web search client.

use super::{SearchHit, SearchProvider};
use crate::error::{ItineraError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

/// Default Tavily search endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://api.tavily.com/search";

/// Default timeout for search requests.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Client for the Tavily search API.
pub struct TavilyClient {
    http: reqwest::Client,
    api_key: String,
    endpoint: Url,
}

#[derive(Serialize)]
struct SearchRequest<'a> {
    api_key: &'a str,
    query: &'a str,
    max_results: usize,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchHit>,
}

impl TavilyClient {
    /// Create a client against the default endpoint.
    pub fn new(api_key: &str) -> Result<Self> {
        Self::with_config(api_key, DEFAULT_ENDPOINT, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Create a client with a custom endpoint and timeout.
    pub fn with_config(api_key: &str, endpoint: &str, timeout: Duration) -> Result<Self> {
        let endpoint = Url::parse(endpoint)
            .map_err(|e| ItineraError::Config(format!("Invalid search endpoint '{}': {}", endpoint, e)))?;

        let http = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            api_key: api_key.to_string(),
            endpoint,
        })
    }

    /// The endpoint requests are sent to.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl SearchProvider for TavilyClient {
    #[instrument(skip(self, query), fields(endpoint = %self.endpoint))]
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>> {
        let response = self
            .http
            .post(self.endpoint.clone())
            .json(&SearchRequest {
                api_key: &self.api_key,
                query,
                max_results,
            })
            .send()
            .await
            .map_err(|e| ItineraError::Search(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ItineraError::Search(format!("HTTP {}: {}", status, body)));
        }

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| ItineraError::Search(format!("Invalid response: {}", e)))?;

        let mut hits = parsed.results;
        hits.truncate(max_results);
        debug!("Search returned {} hits", hits.len());
        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_invalid_endpoint() {
        let result = TavilyClient::with_config("k", "not a url", Duration::from_secs(1));
        assert!(matches!(result, Err(ItineraError::Config(_))));
    }

    #[test]
    fn test_default_endpoint() {
        let client = TavilyClient::new("k").unwrap();
        assert_eq!(client.endpoint().as_str(), DEFAULT_ENDPOINT);
    }

    #[test]
    fn test_response_parsing_tolerates_missing_fields() {
        let parsed: SearchResponse = serde_json::from_str(
            r#"{"results": [{"title": "Louvre"}, {"content": "snippet", "url": "https://x"}], "query": "q"}"#,
        )
        .unwrap();
        assert_eq!(parsed.results.len(), 2);
        assert_eq!(parsed.results[0].to_bullet(), "- Louvre: N/A");
        assert_eq!(parsed.results[1].to_bullet(), "- N/A: snippet");
    }
}
