//! Configuration module for Itinera.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{Prompts, RagPrompts, StagePrompts};
pub use settings::{
    AgentSettings, GeneralSettings, OpenAISettings, PromptSettings, RagSettings, SearchSettings,
    Settings,
};
