//! Error types for Itinera.

use thiserror::Error;

/// Library-level error type for Itinera operations.
#[derive(Error, Debug)]
pub enum ItineraError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{stage} failed: {message}")]
    Stage { stage: String, message: String },

    #[error("Search request failed: {0}")]
    Search(String),

    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    #[error("Vector store error: {0}")]
    VectorStore(String),

    #[error("RAG error: {0}")]
    Rag(String),

    #[error("Document error: {0}")]
    Document(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("OpenAI API error: {0}")]
    OpenAI(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl ItineraError {
    /// Build a stage failure tagged with the agent name.
    pub fn stage(stage: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Stage {
            stage: stage.into(),
            message: message.into(),
        }
    }
}

/// Result type alias for Itinera operations.
pub type Result<T> = std::result::Result<T, ItineraError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_error_display() {
        let err = ItineraError::stage("Planner Agent", "model unavailable");
        assert_eq!(err.to_string(), "Planner Agent failed: model unavailable");
    }

    #[test]
    fn test_search_error_keeps_message() {
        let err = ItineraError::Search("timeout".to_string());
        assert!(err.to_string().contains("timeout"));
    }
}
