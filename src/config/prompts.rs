//! Prompt templates for Itinera.
//!
//! Prompts can be customized by placing TOML files in the custom prompts directory.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Prompts {
    pub planner: StagePrompts,
    pub reviewer: StagePrompts,
    pub rag: RagPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: HashMap<String, String>,
}

/// Instructions for one pipeline stage.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StagePrompts {
    pub instructions: String,
}

impl StagePrompts {
    fn planner() -> Self {
        Self {
            instructions: r#"You are a travel planner. Turn the traveller's request into a concrete day-by-day itinerary.

You have no tools. Work only from your own knowledge, and state every assumption you make explicitly
(travel dates, season, arrival time, pace, lodging area, prices) in an "Assumptions" section at the top.

For each day include:
- Morning, afternoon and evening activities with approximate times
- Where to eat, with a rough price level
- Getting around (walking, metro, taxi) and rough travel times
- An estimated daily cost

Finish with a budget table that sums to the traveller's stated budget or explains the gap."#
                .to_string(),
        }
    }

    fn reviewer() -> Self {
        Self {
            instructions: r#"You are a meticulous travel reviewer. You receive a draft itinerary written by another planner.

Validate the draft using the internet_search tool. Check the claims most likely to be wrong or stale:
opening days and hours, ticket prices, closures, and travel times between stops.
Search sparingly; a handful of focused queries is better than many vague ones.

Then return the complete, corrected itinerary in the same structure as the draft:
- Fix anything the searches contradict and keep everything that holds up
- Keep the budget realistic and the daily cost figures consistent with your fixes
- End with a short "Review notes" section listing what you verified and what you changed

If searching is unavailable, say so in the review notes and mark unverified claims as such."#
                .to_string(),
        }
    }
}

/// Prompts for document question answering.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RagPrompts {
    pub system: String,
    pub user: String,
}

impl Default for RagPrompts {
    fn default() -> Self {
        Self {
            system: "You are a helpful assistant. Answer ONLY using the provided context. \
                     If the answer is not in the context, say you don't know. Be concise."
                .to_string(),
            user: "Question: {{question}}\n\nContext:\n{{context}}".to_string(),
        }
    }
}

impl Default for Prompts {
    fn default() -> Self {
        Self::builtin()
    }
}

impl Prompts {
    /// Built-in prompts.
    pub fn builtin() -> Self {
        Self {
            planner: StagePrompts::planner(),
            reviewer: StagePrompts::reviewer(),
            rag: RagPrompts::default(),
            variables: HashMap::new(),
        }
    }

    /// Load prompts from the default location, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::builtin();

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let planner_path = custom_path.join("planner.toml");
            if planner_path.exists() {
                let content = std::fs::read_to_string(&planner_path)?;
                prompts.planner = toml::from_str(&content)?;
            }

            let reviewer_path = custom_path.join("reviewer.toml");
            if reviewer_path.exists() {
                let content = std::fs::read_to_string(&reviewer_path)?;
                prompts.reviewer = toml::from_str(&content)?;
            }

            let rag_path = custom_path.join("rag.toml");
            if rag_path.exists() {
                let content = std::fs::read_to_string(&rag_path)?;
                prompts.rag = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
        let mut result = template.to_string();
        for (key, value) in vars {
            result = result.replace(&format!("{{{{{}}}}}", key), value);
        }
        result
    }

    /// Render a prompt template with both provided variables and custom config variables.
    /// Provided variables take precedence over custom config variables.
    pub fn render_with_custom(&self, template: &str, vars: &HashMap<String, String>) -> String {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }

    /// Planner instructions with custom variables applied.
    pub fn planner_instructions(&self) -> String {
        self.render_with_custom(&self.planner.instructions, &HashMap::new())
    }

    /// Reviewer instructions with custom variables applied.
    pub fn reviewer_instructions(&self) -> String {
        self.render_with_custom(&self.reviewer.instructions, &HashMap::new())
    }
}
