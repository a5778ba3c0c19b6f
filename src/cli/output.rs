//! CLI output formatting utilities.

use crate::events::ToolEvent;
use crate::orchestrator::PipelineStage;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// Events shown when the tool panel is printed on demand.
pub const TOOL_PANEL_LIMIT: usize = 60;

/// Output helper for CLI formatting.
pub struct Output;

impl Output {
    /// Print an info message.
    pub fn info(msg: &str) {
        println!("{} {}", style(">>").cyan().bold(), msg);
    }

    /// Print a success message.
    pub fn success(msg: &str) {
        println!("{} {}", style(">>").green().bold(), msg);
    }

    /// Print a warning message.
    pub fn warning(msg: &str) {
        eprintln!("{} {}", style(">>").yellow().bold(), msg);
    }

    /// Print an error message.
    pub fn error(msg: &str) {
        eprintln!("{} {}", style(">>").red().bold(), msg);
    }

    /// Print a header.
    pub fn header(msg: &str) {
        println!("\n{}", style(msg).bold().underlined());
    }

    /// Print a key-value pair.
    pub fn kv(key: &str, value: &str) {
        println!("  {}: {}", style(key).dim(), value);
    }

    /// Print a list item.
    pub fn list_item(msg: &str) {
        println!("  {} {}", style("*").cyan(), msg);
    }

    /// Print a stage trace caption.
    pub fn trace(msg: &str) {
        println!("{}", style(msg).dim().italic());
    }

    /// Print one line of tool activity.
    pub fn tool_event(event: &ToolEvent) {
        let tool = style(event.tool()).bold();
        match event {
            ToolEvent::Call { args, .. } => {
                println!("  {} {} called with {}", style("•").cyan(), tool, style(args).dim());
            }
            ToolEvent::Result { preview, .. } => {
                let text = preview
                    .as_str()
                    .map(str::to_string)
                    .unwrap_or_else(|| preview.to_string());
                println!("  {} {} result preview:", style("•").cyan(), tool);
                for line in text.lines() {
                    println!("    {} {}", style(">").dim(), style(line).dim());
                }
            }
            ToolEvent::Error { error, .. } => {
                eprintln!("  {} {} error: {}", style("•").red(), tool, style(error).red());
            }
            ToolEvent::End { .. } => {
                println!("  {} {} finished", style("•").cyan(), tool);
            }
        }
    }

    /// Print a block of tool activity under a heading.
    pub fn tool_panel(events: &[ToolEvent]) {
        println!("{}", style("Recent tool calls").bold());
        if events.is_empty() {
            println!("  {}", style("(none)").dim());
        }
        for event in events {
            Self::tool_event(event);
        }
    }

    /// Print a retrieved document chunk.
    pub fn source_chunk(citation: &str, score: f32, content: &str) {
        println!(
            "\n{} {} (score: {:.2})",
            style(">>").green(),
            style(citation).bold(),
            score
        );
        println!("   {}", content_preview(content, 200));
    }

    /// Create a spinner.
    pub fn spinner(msg: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    }
}

/// Spinner message for a pipeline stage.
pub fn stage_message(stage: PipelineStage, planner: &str, reviewer: &str) -> String {
    match stage {
        PipelineStage::Planning => format!("{} is creating your itinerary…", planner),
        PipelineStage::Reviewing => {
            format!("{} is validating the plan with live searches…", reviewer)
        }
        PipelineStage::Done => "Validation complete.".to_string(),
    }
}

/// Flatten and truncate content with an ellipsis.
pub fn content_preview(content: &str, max_chars: usize) -> String {
    let content = content.replace('\n', " ");
    if content.chars().count() <= max_chars {
        content
    } else {
        let cut: String = content.chars().take(max_chars).collect();
        format!("{}...", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_preview() {
        assert_eq!(content_preview("short\ntext", 20), "short text");
        assert_eq!(content_preview("ééééé", 3), "ééé...");
    }

    #[test]
    fn test_stage_message() {
        let msg = stage_message(PipelineStage::Reviewing, "Planner Agent", "Reviewer Agent");
        assert!(msg.starts_with("Reviewer Agent is validating"));
        assert_eq!(
            stage_message(PipelineStage::Done, "a", "b"),
            "Validation complete."
        );
    }
}
