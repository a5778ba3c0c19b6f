//! One-shot planning command.

use crate::cli::output::stage_message;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::{Prompts, Settings};
use crate::events::EventLog;
use crate::orchestrator::{Orchestrator, PipelineOutput};
use crate::session::failure_message;
use anyhow::Result;
use indicatif::ProgressBar;
use std::sync::Arc;

/// Run the plan command.
pub async fn run_plan(
    text: &str,
    show_plan: bool,
    hide_tools: bool,
    settings: Settings,
) -> Result<()> {
    if text.trim().is_empty() {
        anyhow::bail!("Describe your trip (destination, duration, budget, interests).");
    }
    check_ready(&settings)?;

    let spinner = Output::spinner("Starting…");
    let orchestrator = build_orchestrator(&settings, &spinner)?;
    let log = activity_log(&spinner, hide_tools);

    match orchestrator.run_pipeline(text, Arc::new(log)).await {
        Ok(output) => {
            spinner.finish_and_clear();
            print_answer(&orchestrator, &output, show_plan);
            Ok(())
        }
        Err(e) => {
            spinner.finish_and_clear();
            Output::error("Something went wrong.");
            println!("{}", failure_message(&e));
            Err(e.into())
        }
    }
}

/// Fail on missing required credentials and print warnings for optional ones.
pub(crate) fn check_ready(settings: &Settings) -> Result<()> {
    match preflight::check(Operation::Plan, settings) {
        Ok(warnings) => {
            for warning in warnings {
                Output::warning(&warning);
            }
            Ok(())
        }
        Err(e) => {
            Output::error(&e.to_string());
            Err(e.into())
        }
    }
}

/// Build the orchestrator with stage progress reported on `spinner`.
pub(crate) fn build_orchestrator(
    settings: &Settings,
    spinner: &ProgressBar,
) -> Result<Orchestrator> {
    let prompts = Prompts::load(
        settings.prompts.custom_dir.as_deref(),
        Some(&settings.prompts.variables),
    )?;
    let orchestrator = Orchestrator::from_settings(settings, &prompts)?;

    let planner = orchestrator.planner().name.clone();
    let reviewer = orchestrator.reviewer().name.clone();
    let spinner = spinner.clone();
    Ok(orchestrator.with_stage_observer(move |stage| {
        spinner.set_message(stage_message(stage, &planner, &reviewer));
    }))
}

/// A per-request event log, printing events live unless hidden.
pub(crate) fn activity_log(spinner: &ProgressBar, hide_tools: bool) -> EventLog {
    let log = EventLog::new();
    if hide_tools {
        return log;
    }
    let spinner = spinner.clone();
    log.with_renderer(move |event| spinner.suspend(|| Output::tool_event(event)))
}

/// Print the reviewed answer, optionally followed by the raw draft.
pub(crate) fn print_answer(orchestrator: &Orchestrator, output: &PipelineOutput, show_plan: bool) {
    Output::header(&format!("{} (validated)", orchestrator.reviewer().name));
    println!("{}", output.final_text);

    if show_plan {
        Output::header(&format!("Raw plan from {}", orchestrator.planner().name));
        println!("{}", output.planner_text);
    }

    println!();
    Output::trace(&orchestrator.trace());
}
