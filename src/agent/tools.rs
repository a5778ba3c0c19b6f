//! Tool definitions and implementations for the agent system.

use super::ToolKind;
use crate::config::SearchSettings;
use crate::error::{ItineraError, Result};
use crate::events::{EventBus, ToolEvent};
use crate::redact::redact_str;
use crate::search::{SearchHit, SearchProvider, TavilyClient};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Characters of search output included in a result preview.
const PREVIEW_CHARS: usize = 400;

/// Hits returned per search.
pub const MAX_RESULTS: usize = 3;

/// Returned when a search yields nothing.
pub const NO_RESULTS: &str = "No results found.";

/// Tool calls the model can make.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "snake_case")]
pub enum ToolCall {
    /// Search the web.
    InternetSearch { query: String },
}

impl ToolCall {
    /// The kind of tool this call targets.
    pub fn kind(&self) -> ToolKind {
        match self {
            ToolCall::InternetSearch { .. } => ToolKind::InternetSearch,
        }
    }
}

/// Internet search tool.
///
/// Reports `call`, then `error` or `result`, then `end` to its event bus on
/// every invocation. Failures become the returned text, never an `Err`.
pub struct SearchTool {
    provider: Option<Arc<dyn SearchProvider>>,
    bus: Arc<EventBus>,
    credential_env: String,
}

impl SearchTool {
    /// Function name exposed to the model.
    pub const NAME: &'static str = "internet_search";

    /// Create a tool. `None` means no credential is configured.
    pub fn new(provider: Option<Arc<dyn SearchProvider>>, bus: Arc<EventBus>) -> Self {
        Self {
            provider,
            bus,
            credential_env: "TAVILY_API_KEY".to_string(),
        }
    }

    /// Build from settings, reading the credential from the environment.
    ///
    /// A missing credential is not an error here; the tool reports it on use.
    pub fn from_settings(settings: &SearchSettings, bus: Arc<EventBus>) -> Result<Self> {
        let provider: Option<Arc<dyn SearchProvider>> = match settings.api_key() {
            Some(key) => Some(Arc::new(TavilyClient::with_config(
                &key,
                &settings.endpoint,
                Duration::from_secs(settings.timeout_seconds),
            )?)),
            None => {
                warn!("{} not set; internet search will be unavailable", settings.api_key_env);
                None
            }
        };

        Ok(Self::new(provider, bus).with_credential_env(&settings.api_key_env))
    }

    /// Name the credential variable in missing-credential messages.
    pub fn with_credential_env(mut self, name: &str) -> Self {
        self.credential_env = name.to_string();
        self
    }

    /// Run a search and return a plain-text summary or an error string.
    pub async fn search(&self, query: &str) -> String {
        self.bus.emit(ToolEvent::Call {
            tool: Self::NAME.to_string(),
            args: serde_json::json!({ "query": redact_str(query) }),
        });
        let _end = EndOnDrop { bus: &self.bus };

        let Some(provider) = &self.provider else {
            let msg = format!("missing {} in environment.", self.credential_env);
            self.emit_error(&msg);
            return format!("Search error: {}", msg);
        };

        match provider.search(query, MAX_RESULTS).await {
            Ok(hits) => {
                let output = format_hits(&hits[..hits.len().min(MAX_RESULTS)]);
                self.bus.emit(ToolEvent::Result {
                    tool: Self::NAME.to_string(),
                    preview: redact_str(&preview(&output)),
                });
                output
            }
            Err(e) => {
                let msg = e.to_string();
                debug!("Search failed: {}", msg);
                self.emit_error(&msg);
                format!("Search error: {}", msg)
            }
        }
    }

    fn emit_error(&self, msg: &str) {
        self.bus.emit(ToolEvent::Error {
            tool: Self::NAME.to_string(),
            error: msg.to_string(),
        });
    }
}

/// Emits the `end` event on every exit path, unwinding included.
struct EndOnDrop<'a> {
    bus: &'a EventBus,
}

impl Drop for EndOnDrop<'_> {
    fn drop(&mut self) {
        self.bus.emit(ToolEvent::End {
            tool: SearchTool::NAME.to_string(),
        });
    }
}

fn format_hits(hits: &[SearchHit]) -> String {
    if hits.is_empty() {
        return NO_RESULTS.to_string();
    }
    hits.iter()
        .map(SearchHit::to_bullet)
        .collect::<Vec<_>>()
        .join("\n")
}

fn preview(output: &str) -> String {
    if output.chars().count() > PREVIEW_CHARS {
        let head: String = output.chars().take(PREVIEW_CHARS).collect();
        format!("{}…", head)
    } else {
        output.to_string()
    }
}

/// The tools available to a runner.
#[derive(Default)]
pub struct Toolbox {
    search: Option<SearchTool>,
}

impl Toolbox {
    /// A toolbox with no tools.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A toolbox with the search tool.
    pub fn with_search(search: SearchTool) -> Self {
        Self {
            search: Some(search),
        }
    }

    /// Execute a tool call and return its text output.
    pub async fn execute(&self, call: &ToolCall) -> Result<String> {
        match call {
            ToolCall::InternetSearch { query } => {
                let tool = self.search.as_ref().ok_or_else(|| {
                    ItineraError::InvalidInput(format!("Tool not available: {}", SearchTool::NAME))
                })?;
                Ok(tool.search(query).await)
            }
        }
    }
}

/// Get OpenAI function/tool definitions for the given tools.
pub fn tool_definitions(tools: &[ToolKind]) -> Vec<async_openai::types::ChatCompletionTool> {
    use async_openai::types::{ChatCompletionTool, ChatCompletionToolType, FunctionObject};

    tools
        .iter()
        .map(|tool| match tool {
            ToolKind::InternetSearch => ChatCompletionTool {
                r#type: ChatCompletionToolType::Function,
                function: FunctionObject {
                    name: SearchTool::NAME.to_string(),
                    description: Some(
                        "Search the internet for current facts: opening hours, prices, \
                        travel times, events. Returns up to three short results."
                            .to_string(),
                    ),
                    parameters: Some(serde_json::json!({
                        "type": "object",
                        "properties": {
                            "query": {
                                "type": "string",
                                "description": "The search query"
                            }
                        },
                        "required": ["query"]
                    })),
                    strict: None,
                },
            },
        })
        .collect()
}

/// Parse a tool call from the OpenAI response format.
pub fn parse_tool_call(name: &str, arguments: &str) -> Result<ToolCall> {
    let args: serde_json::Value = serde_json::from_str(arguments)
        .map_err(|e| ItineraError::InvalidInput(format!("Invalid tool arguments: {}", e)))?;

    match name {
        SearchTool::NAME => {
            let query = args["query"]
                .as_str()
                .ok_or_else(|| ItineraError::InvalidInput("Missing 'query' argument".to_string()))?
                .to_string();
            Ok(ToolCall::InternetSearch { query })
        }
        _ => Err(ItineraError::InvalidInput(format!("Unknown tool: {}", name))),
    }
}
