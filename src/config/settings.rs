//! Configuration settings for Itinera.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub openai: OpenAISettings,
    pub planner: AgentSettings,
    pub reviewer: AgentSettings,
    pub search: SearchSettings,
    pub rag: RagSettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for storing application data.
    pub data_dir: String,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            data_dir: "~/.itinera".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// OpenAI-compatible API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAISettings {
    /// API base URL. `OPENAI_BASE_URL` takes precedence when set.
    pub base_url: Option<String>,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
}

impl Default for OpenAISettings {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout_seconds: 300,
        }
    }
}

impl OpenAISettings {
    /// API key from `OPENAI_API_KEY`, falling back to `API_KEY`.
    pub fn api_key(&self) -> Option<String> {
        ["OPENAI_API_KEY", "API_KEY"]
            .iter()
            .filter_map(|name| std::env::var(name).ok())
            .find(|key| !key.is_empty())
    }

    /// Effective base URL, if any.
    pub fn base_url(&self) -> Option<String> {
        std::env::var("OPENAI_BASE_URL")
            .ok()
            .filter(|url| !url.is_empty())
            .or_else(|| self.base_url.clone())
    }
}

/// Settings for one pipeline stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentSettings {
    /// Display name.
    pub name: String,
    /// Model identifier.
    pub model: String,
    /// Maximum LLM round-trips per run.
    pub max_iterations: usize,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            name: String::new(),
            model: "gpt-4o".to_string(),
            max_iterations: crate::agent::DEFAULT_MAX_ITERATIONS,
        }
    }
}

impl AgentSettings {
    /// Name to display, falling back to `default` when unset.
    pub fn display_name<'a>(&'a self, default: &'a str) -> &'a str {
        if self.name.is_empty() {
            default
        } else {
            &self.name
        }
    }
}

/// Web search settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// Environment variable holding the search API key.
    pub api_key_env: String,
    /// Search endpoint.
    pub endpoint: String,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            api_key_env: "TAVILY_API_KEY".to_string(),
            endpoint: crate::search::TAVILY_ENDPOINT.to_string(),
            timeout_seconds: 30,
        }
    }
}

impl SearchSettings {
    /// The search credential, if configured and non-empty.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|key| !key.is_empty())
    }
}

/// Document chat settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RagSettings {
    /// LLM model for answers.
    pub model: String,
    /// Sampling temperature for answers.
    pub temperature: f32,
    /// Embedding model.
    pub embedding_model: String,
    /// Chunks retrieved per question.
    pub top_k: usize,
    /// Target chunk size in characters.
    pub chunk_size: usize,
    /// Characters shared between neighbouring chunks.
    pub chunk_overlap: usize,
    /// Collection name documents are indexed under.
    pub collection: String,
    /// Path to the SQLite database.
    pub sqlite_path: String,
}

impl Default for RagSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4o".to_string(),
            temperature: 0.2,
            embedding_model: "text-embedding-3-large".to_string(),
            top_k: 4,
            chunk_size: 1000,
            chunk_overlap: 150,
            collection: "docs".to_string(),
            sqlite_path: "~/.itinera/docs.db".to_string(),
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: std::collections::HashMap<String, String>,
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::ItineraError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("itinera")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded data directory path.
    pub fn data_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.data_dir)
    }

    /// Get the expanded SQLite database path.
    pub fn sqlite_path(&self) -> PathBuf {
        Self::expand_path(&self.rag.sqlite_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.search.api_key_env, "TAVILY_API_KEY");
        assert_eq!(settings.rag.top_k, 4);
        assert_eq!(settings.rag.chunk_size, 1000);
        assert_eq!(settings.rag.chunk_overlap, 150);
        assert_eq!(settings.planner.display_name("Planner Agent"), "Planner Agent");
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let settings: Settings = toml::from_str(
            r#"
            [reviewer]
            name = "Fact Checker"
            model = "gpt-4o-mini"

            [search]
            timeout_seconds = 10
            "#,
        )
        .unwrap();
        assert_eq!(settings.reviewer.display_name("Reviewer Agent"), "Fact Checker");
        assert_eq!(settings.reviewer.model, "gpt-4o-mini");
        assert_eq!(settings.planner.model, "gpt-4o");
        assert_eq!(settings.search.timeout_seconds, 10);
        assert_eq!(settings.search.api_key_env, "TAVILY_API_KEY");
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut settings = Settings::default();
        settings.rag.collection = "travel-notes".to_string();
        settings.save_to(&path).unwrap();

        let loaded = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(loaded.rag.collection, "travel-notes");
    }

    #[test]
    fn test_missing_search_key_env_is_none() {
        let settings = SearchSettings {
            api_key_env: "ITINERA_TEST_UNSET_SEARCH_KEY".to_string(),
            ..Default::default()
        };
        assert!(settings.api_key().is_none());
    }
}
