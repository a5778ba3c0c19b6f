//! Web search providers used by the reviewer's search tool.

mod tavily;

pub use tavily::{TavilyClient, DEFAULT_ENDPOINT as TAVILY_ENDPOINT};

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A single web search hit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Page title.
    #[serde(default)]
    pub title: Option<String>,
    /// Content snippet.
    #[serde(default)]
    pub content: Option<String>,
    /// Page URL.
    #[serde(default)]
    pub url: Option<String>,
}

impl SearchHit {
    /// Create a hit with a title and content snippet.
    pub fn new(title: &str, content: &str) -> Self {
        Self {
            title: Some(title.to_string()),
            content: Some(content.to_string()),
            url: None,
        }
    }

    /// One-line bullet used in tool output.
    pub fn to_bullet(&self) -> String {
        format!(
            "- {}: {}",
            self.title.as_deref().unwrap_or("N/A"),
            self.content.as_deref().unwrap_or("N/A")
        )
    }
}

/// Trait for web search backends.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Run a query and return at most `max_results` hits.
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>>;
}
