//! Conversation history for the planner chat.
//!
//! Only the reviewer's answer is stored; the planner's draft is handed back
//! to the caller for the current turn and then forgotten. Failed turns are
//! recorded as failure entries so they can be told apart from answers.

use crate::error::Result;
use crate::events::EventSink;
use crate::orchestrator::{Orchestrator, PipelineOutput};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Trace recorded for failed turns.
pub const FAILURE_TRACE: &str = "Runtime error.";

/// Who wrote a history entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// What a history entry represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    /// A user message.
    Message,
    /// A reviewed answer.
    Answer,
    /// A user-facing error in place of an answer.
    Failure,
}

/// One entry of conversation history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatEntry {
    pub role: Role,
    pub content: String,
    pub kind: EntryKind,
    /// Stage trace shown under assistant entries.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace: Option<String>,
}

/// An in-memory planner conversation.
#[derive(Debug, Default, Clone)]
pub struct Conversation {
    entries: Vec<ChatEntry>,
}

impl Conversation {
    /// Create an empty conversation.
    pub fn new() -> Self {
        Self::default()
    }

    /// History, oldest first.
    pub fn entries(&self) -> &[ChatEntry] {
        &self.entries
    }

    /// Forget everything.
    pub fn reset(&mut self) {
        self.entries.clear();
    }

    /// Run one turn through the orchestrator.
    ///
    /// On success the reviewer's text is appended as an answer and both texts
    /// are returned. On failure a formatted error is appended as a failure
    /// entry and the error is returned.
    pub async fn submit(
        &mut self,
        orchestrator: &Orchestrator,
        user_text: &str,
        sink: Arc<dyn EventSink>,
    ) -> Result<PipelineOutput> {
        self.entries.push(ChatEntry {
            role: Role::User,
            content: user_text.to_string(),
            kind: EntryKind::Message,
            trace: None,
        });

        match orchestrator.run_pipeline(user_text, sink).await {
            Ok(output) => {
                self.entries.push(ChatEntry {
                    role: Role::Assistant,
                    content: output.final_text.clone(),
                    kind: EntryKind::Answer,
                    trace: Some(orchestrator.trace()),
                });
                Ok(output)
            }
            Err(e) => {
                self.entries.push(ChatEntry {
                    role: Role::Assistant,
                    content: failure_message(&e),
                    kind: EntryKind::Failure,
                    trace: Some(FAILURE_TRACE.to_string()),
                });
                Err(e)
            }
        }
    }
}

/// The user-facing text recorded for a failed turn.
pub fn failure_message(err: &dyn std::fmt::Display) -> String {
    format!("⚠️ Error while processing your request:\n\n```\n{}\n```", err)
}
