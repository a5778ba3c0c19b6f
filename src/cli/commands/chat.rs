//! Interactive planning session.

use super::plan::{activity_log, build_orchestrator, check_ready, print_answer};
use crate::cli::output::TOOL_PANEL_LIMIT;
use crate::cli::Output;
use crate::config::Settings;
use crate::events::EventLog;
use crate::orchestrator::PipelineOutput;
use crate::session::Conversation;
use anyhow::Result;
use console::style;
use std::io::{self, BufRead, Write};
use std::sync::Arc;

const EXAMPLE_PROMPTS: [&str; 2] = [
    "Plan a week-long Europe trip for a student on a $1,500 budget who loves history and food",
    "3-day Paris trip for art lovers with $800 budget",
];

/// A line typed at the chat prompt.
#[derive(Debug, PartialEq, Eq)]
enum ChatInput<'a> {
    Empty,
    Exit,
    Reset,
    ShowPlan,
    ShowTools,
    Message(&'a str),
}

fn parse_input(line: &str) -> ChatInput<'_> {
    let line = line.trim();
    if line.is_empty() {
        return ChatInput::Empty;
    }
    match line.to_ascii_lowercase().as_str() {
        "exit" | "quit" => ChatInput::Exit,
        "reset" | "clear" => ChatInput::Reset,
        "plan" => ChatInput::ShowPlan,
        "tools" => ChatInput::ShowTools,
        _ => ChatInput::Message(line),
    }
}

/// Run the interactive chat command.
pub async fn run_chat(hide_tools: bool, settings: Settings) -> Result<()> {
    check_ready(&settings)?;

    println!("\n{}", style("Multi-Agent Travel Planner").bold().cyan());
    println!("{}", style("Planner → Reviewer (with live tool calls)").dim());
    println!("\nTry these prompts:");
    for example in EXAMPLE_PROMPTS {
        Output::list_item(example);
    }
    println!(
        "\n{}\n",
        style("Commands: 'plan' shows the last raw plan, 'tools' the recent tool calls, 'reset' starts over, 'exit' quits.").dim()
    );

    let mut conversation = Conversation::new();
    let mut last_output: Option<PipelineOutput> = None;
    let mut last_log = EventLog::new();

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("{} ", style("You:").green().bold());
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }

        match parse_input(&line) {
            ChatInput::Empty => continue,
            ChatInput::Exit => {
                Output::info("Goodbye!");
                break;
            }
            ChatInput::Reset => {
                conversation.reset();
                last_output = None;
                last_log = EventLog::new();
                Output::info("Conversation reset.");
            }
            ChatInput::ShowPlan => match &last_output {
                Some(output) => {
                    Output::header("Raw plan");
                    println!("{}\n", output.planner_text);
                }
                None => Output::info("No plan yet."),
            },
            ChatInput::ShowTools => Output::tool_panel(&last_log.recent(TOOL_PANEL_LIMIT)),
            ChatInput::Message(text) => {
                let spinner = Output::spinner("Starting…");
                let orchestrator = build_orchestrator(&settings, &spinner)?;
                let log = activity_log(&spinner, hide_tools);
                last_log = log.clone();

                let result = conversation
                    .submit(&orchestrator, text, Arc::new(log))
                    .await;
                spinner.finish_and_clear();

                match result {
                    Ok(output) => {
                        print_answer(&orchestrator, &output, false);
                        println!();
                        last_output = Some(output);
                    }
                    Err(_) => {
                        Output::error("Something went wrong.");
                        if let Some(entry) = conversation.entries().last() {
                            println!("{}\n", entry.content);
                            if let Some(trace) = &entry.trace {
                                Output::trace(trace);
                            }
                        }
                    }
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_input() {
        assert_eq!(parse_input("   \n"), ChatInput::Empty);
        assert_eq!(parse_input("EXIT\n"), ChatInput::Exit);
        assert_eq!(parse_input("reset"), ChatInput::Reset);
        assert_eq!(parse_input("plan"), ChatInput::ShowPlan);
        assert_eq!(parse_input("tools"), ChatInput::ShowTools);
        assert_eq!(
            parse_input("  3 days in Rome \n"),
            ChatInput::Message("3 days in Rome")
        );
    }
}
