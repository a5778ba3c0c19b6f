//! Itinera - a two-stage travel planner and document chat
//!
//! A planner agent drafts an itinerary from the user's request; a reviewer
//! agent validates the draft with live web searches and returns the
//! corrected plan. Tool calls made along the way are reported as events to
//! whatever sink the caller installed for the request.
//!
//! # Architecture
//!
//! - `config` - Settings and prompt templates
//! - `events` - Tool lifecycle events and the event bus
//! - `redact` - Masking and truncation of event payloads
//! - `search` - Web search provider (Tavily)
//! - `agent` - Agent definitions, the search tool and the stage runner
//! - `orchestrator` - Planner → reviewer pipeline
//! - `session` - Conversation history
//! - `documents`, `embedding`, `vector_store`, `rag` - Document chat
//!
//! # Example
//!
//! ```rust,no_run
//! use itinera::config::{Prompts, Settings};
//! use itinera::events::EventLog;
//! use itinera::orchestrator::Orchestrator;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let orchestrator = Orchestrator::from_settings(&settings, &Prompts::builtin())?;
//!
//!     let log = EventLog::new();
//!     let output = orchestrator
//!         .run_pipeline("3 days in Lisbon on a $600 budget", Arc::new(log.clone()))
//!         .await?;
//!     println!("{}", output.final_text);
//!     println!("{} tool events", log.len());
//!
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod cli;
pub mod config;
pub mod documents;
pub mod embedding;
pub mod error;
pub mod events;
pub mod openai;
pub mod orchestrator;
pub mod rag;
pub mod redact;
pub mod search;
pub mod session;
pub mod vector_store;

pub use error::{ItineraError, Result};
