//! CLI module for Itinera.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Itinera - travel planning with a reviewer that checks the facts
///
/// A planner drafts an itinerary, a reviewer validates it with live web
/// searches. Also answers questions about your own documents.
#[derive(Parser, Debug)]
#[command(name = "itinera")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Plan a trip: draft with the planner, validate with the reviewer
    Plan {
        /// Trip description (destination, duration, budget, interests)
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,

        /// Also print the planner's raw draft
        #[arg(long)]
        show_plan: bool,

        /// Do not print live tool activity
        #[arg(long)]
        hide_tools: bool,
    },

    /// Start an interactive planning session
    Chat {
        /// Do not print live tool activity
        #[arg(long)]
        hide_tools: bool,
    },

    /// Ask questions about your own .txt and .pdf files
    Docs {
        #[command(subcommand)]
        action: DocsAction,
    },

    /// Print a greeting to check the CLI works
    Hello {
        /// Your name
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Start HTTP API server for integration with other systems
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(short, long, default_value = "3000")]
        port: u16,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum DocsAction {
    /// Index files into the document collection
    Ingest {
        /// Files to index (.txt or .pdf)
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Ask one question about the indexed documents
    Ask {
        /// The question to ask
        question: String,

        /// Print the retrieved chunks after the answer
        #[arg(long)]
        show_context: bool,
    },

    /// Chat with your documents
    Chat {
        /// Files to index before chatting
        files: Vec<PathBuf>,

        /// Keep the index in memory for this session only
        #[arg(long)]
        memory: bool,
    },

    /// List indexed files
    List,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Open configuration file in editor
    Edit,

    /// Show configuration file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plan_words() {
        let cli = Cli::parse_from(["itinera", "-v", "plan", "3", "days", "in", "Rome", "--show-plan"]);
        assert_eq!(cli.verbose, 1);
        match cli.command {
            Commands::Plan {
                text,
                show_plan,
                hide_tools,
            } => {
                assert_eq!(text.join(" "), "3 days in Rome");
                assert!(show_plan);
                assert!(!hide_tools);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_docs_chat_memory() {
        let cli = Cli::parse_from(["itinera", "docs", "chat", "a.pdf", "b.txt", "--memory"]);
        match cli.command {
            Commands::Docs {
                action: DocsAction::Chat { files, memory },
            } => {
                assert_eq!(files.len(), 2);
                assert!(memory);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_plan_requires_text() {
        assert!(Cli::try_parse_from(["itinera", "plan"]).is_err());
    }
}
