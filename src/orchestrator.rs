//! Planner → reviewer pipeline orchestrator.
//!
//! Runs the planner on the user's text, hands the planner's output to the
//! reviewer, and returns both texts. A per-request event sink is installed
//! on the orchestrator's event bus for the duration of the run so the
//! reviewer's tool calls can report progress.

use crate::agent::{AgentSpec, OpenAIRunner, SearchTool, StageRunner, ToolKind, Toolbox};
use crate::config::{Prompts, Settings};
use crate::error::Result;
use crate::events::{EventBus, EventSink};
use crate::openai::create_client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};

/// Default planner name.
pub const PLANNER_NAME: &str = "Planner Agent";

/// Default reviewer name.
pub const REVIEWER_NAME: &str = "Reviewer Agent";

/// Where a pipeline run currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Planning,
    Reviewing,
    Done,
}

type StageObserver = Arc<dyn Fn(PipelineStage) + Send + Sync>;

/// Output of one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineOutput {
    /// The reviewer's text. This is the answer.
    pub final_text: String,
    /// The planner's raw draft, kept for optional disclosure.
    pub planner_text: String,
}

/// The planner → reviewer orchestrator.
pub struct Orchestrator {
    runner: Arc<dyn StageRunner>,
    planner: AgentSpec,
    reviewer: AgentSpec,
    bus: Arc<EventBus>,
    observer: Option<StageObserver>,
}

impl Orchestrator {
    /// Create an orchestrator from its parts.
    ///
    /// The planner never gets tools, whatever `planner` says.
    pub fn new(
        runner: Arc<dyn StageRunner>,
        planner: AgentSpec,
        reviewer: AgentSpec,
        bus: Arc<EventBus>,
    ) -> Self {
        Self {
            runner,
            planner: planner.without_tools(),
            reviewer,
            bus,
            observer: None,
        }
    }

    /// Build the OpenAI-backed orchestrator on the process-wide event bus.
    pub fn from_settings(settings: &Settings, prompts: &Prompts) -> Result<Self> {
        let bus = EventBus::global();
        let search = SearchTool::from_settings(&settings.search, bus.clone())?;
        let client = create_client(&settings.openai)?;
        let runner = OpenAIRunner::new(client, Toolbox::with_search(search));

        let planner = AgentSpec::new(
            settings.planner.display_name(PLANNER_NAME),
            &settings.planner.model,
            &prompts.planner_instructions(),
        )
        .with_max_iterations(settings.planner.max_iterations);

        let reviewer = AgentSpec::new(
            settings.reviewer.display_name(REVIEWER_NAME),
            &settings.reviewer.model,
            &prompts.reviewer_instructions(),
        )
        .with_tool(ToolKind::InternetSearch)
        .with_max_iterations(settings.reviewer.max_iterations);

        Ok(Self::new(Arc::new(runner), planner, reviewer, bus))
    }

    /// Be notified as the run moves between stages.
    pub fn with_stage_observer(
        mut self,
        observer: impl Fn(PipelineStage) + Send + Sync + 'static,
    ) -> Self {
        self.observer = Some(Arc::new(observer));
        self
    }

    /// The bus tool events are emitted on.
    pub fn bus(&self) -> &Arc<EventBus> {
        &self.bus
    }

    /// The planner stage definition.
    pub fn planner(&self) -> &AgentSpec {
        &self.planner
    }

    /// The reviewer stage definition.
    pub fn reviewer(&self) -> &AgentSpec {
        &self.reviewer
    }

    /// Human-readable trace of the stages, e.g. "Planner Agent → Reviewer Agent".
    pub fn trace(&self) -> String {
        format!("{} → {}", self.planner.name, self.reviewer.name)
    }

    /// Run planner then reviewer on `user_text`.
    ///
    /// `sink` receives tool events for this run only; it is uninstalled before
    /// this returns, on success and on error. A planner failure skips the
    /// reviewer. Stage errors are returned unchanged.
    #[instrument(skip_all)]
    pub async fn run_pipeline(
        &self,
        user_text: &str,
        sink: Arc<dyn EventSink>,
    ) -> Result<PipelineOutput> {
        let _sink = self.bus.scoped(sink);

        self.notify(PipelineStage::Planning);
        let planner_text = self.run_stage(&self.planner, user_text).await?;

        self.notify(PipelineStage::Reviewing);
        let final_text = self.run_stage(&self.reviewer, &planner_text).await?;

        self.notify(PipelineStage::Done);
        Ok(PipelineOutput {
            final_text,
            planner_text,
        })
    }

    async fn run_stage(&self, agent: &AgentSpec, input: &str) -> Result<String> {
        info!("Running {}", agent.name);
        let output = self.runner.run(agent, input).await?;
        Ok(output.extract_text())
    }

    fn notify(&self, stage: PipelineStage) {
        if let Some(observer) = &self.observer {
            observer(stage);
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted runner used by orchestrator and session tests.

    use super::*;
    use crate::agent::StageOutput;
    use crate::error::ItineraError;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Scripted stage behaviour.
    pub enum Script {
        Reply(String),
        /// Reply after running `query` through the given search tool.
        SearchThenReply(Arc<SearchTool>, String, String),
        Fail(String),
    }

    /// Replays scripts keyed by agent name and records every call.
    pub struct ScriptedRunner {
        planner: Script,
        reviewer: Script,
        pub calls: Mutex<Vec<(String, String)>>,
    }

    impl ScriptedRunner {
        pub fn new(planner: Script, reviewer: Script) -> Self {
            Self {
                planner,
                reviewer,
                calls: Mutex::new(Vec::new()),
            }
        }

        pub fn calls(&self) -> Vec<(String, String)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl StageRunner for ScriptedRunner {
        async fn run(&self, agent: &AgentSpec, input: &str) -> Result<Box<dyn StageOutput>> {
            self.calls
                .lock()
                .unwrap()
                .push((agent.name.clone(), input.to_string()));

            let script = if agent.name == PLANNER_NAME {
                &self.planner
            } else {
                &self.reviewer
            };

            match script {
                Script::Reply(text) => Ok(Box::new(text.clone())),
                Script::SearchThenReply(tool, query, text) => {
                    tool.search(query).await;
                    Ok(Box::new(text.clone()))
                }
                Script::Fail(msg) => Err(ItineraError::stage(&agent.name, msg.as_str())),
            }
        }
    }

    pub fn orchestrator(runner: Arc<ScriptedRunner>, bus: Arc<EventBus>) -> Orchestrator {
        Orchestrator::new(
            runner,
            AgentSpec::new(PLANNER_NAME, "test-model", "plan"),
            AgentSpec::new(REVIEWER_NAME, "test-model", "review").with_tool(ToolKind::InternetSearch),
            bus,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use crate::events::{EventLog, ToolEvent};
    use crate::search::{SearchHit, SearchProvider};
    use async_trait::async_trait;
    use std::sync::Mutex;

    const PARIS: &str = "3-day Paris trip for art lovers with $800 budget";

    struct OneHit;

    #[async_trait]
    impl SearchProvider for OneHit {
        async fn search(&self, _query: &str, _max: usize) -> Result<Vec<SearchHit>> {
            Ok(vec![SearchHit::new("Louvre", "Closed on Tuesdays")])
        }
    }

    #[tokio::test]
    async fn test_reviewer_text_is_final() {
        let bus = Arc::new(EventBus::new());
        let runner = Arc::new(ScriptedRunner::new(
            Script::Reply("Day 1: Louvre (Tuesday)".to_string()),
            Script::Reply("Day 1: Louvre moved to Wednesday (closed Tuesdays)".to_string()),
        ));
        let orchestrator = orchestrator(runner.clone(), bus.clone());

        let output = orchestrator
            .run_pipeline(PARIS, Arc::new(EventLog::new()))
            .await
            .unwrap();

        assert!(!output.planner_text.is_empty());
        assert!(!output.final_text.is_empty());
        assert_ne!(output.final_text, output.planner_text);
        assert_eq!(output.final_text, "Day 1: Louvre moved to Wednesday (closed Tuesdays)");
        assert_eq!(output.planner_text, "Day 1: Louvre (Tuesday)");

        let calls = runner.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0], (PLANNER_NAME.to_string(), PARIS.to_string()));
        assert_eq!(
            calls[1],
            (REVIEWER_NAME.to_string(), "Day 1: Louvre (Tuesday)".to_string())
        );
        assert!(!bus.is_installed());
    }

    #[tokio::test]
    async fn test_planner_failure_skips_reviewer_and_uninstalls_sink() {
        let bus = Arc::new(EventBus::new());
        let runner = Arc::new(ScriptedRunner::new(
            Script::Fail("model unavailable".to_string()),
            Script::Reply("never".to_string()),
        ));
        let orchestrator = orchestrator(runner.clone(), bus.clone());

        let err = orchestrator
            .run_pipeline(PARIS, Arc::new(EventLog::new()))
            .await
            .unwrap_err();

        assert!(err.to_string().contains("model unavailable"));
        assert_eq!(runner.calls().len(), 1);
        assert!(!bus.is_installed());
    }

    #[tokio::test]
    async fn test_reviewer_failure_uninstalls_sink() {
        let bus = Arc::new(EventBus::new());
        let runner = Arc::new(ScriptedRunner::new(
            Script::Reply("draft".to_string()),
            Script::Fail("rate limited".to_string()),
        ));
        let orchestrator = orchestrator(runner.clone(), bus.clone());

        let err = orchestrator
            .run_pipeline(PARIS, Arc::new(EventLog::new()))
            .await
            .unwrap_err();

        assert!(err.to_string().contains(REVIEWER_NAME));
        assert_eq!(runner.calls().len(), 2);
        assert!(!bus.is_installed());
    }

    #[tokio::test]
    async fn test_reviewer_tool_events_reach_request_sink() {
        let bus = Arc::new(EventBus::new());
        let tool = Arc::new(SearchTool::new(Some(Arc::new(OneHit)), bus.clone()));
        let runner = Arc::new(ScriptedRunner::new(
            Script::Reply("draft".to_string()),
            Script::SearchThenReply(tool, "Louvre hours".to_string(), "revised".to_string()),
        ));
        let orchestrator = orchestrator(runner, bus.clone());
        let log = EventLog::new();

        let output = orchestrator
            .run_pipeline(PARIS, Arc::new(log.clone()))
            .await
            .unwrap();

        assert_eq!(output.final_text, "revised");
        let kinds: Vec<_> = log.events().iter().map(ToolEvent::kind).collect();
        assert_eq!(kinds, vec!["call", "result", "end"]);

        // Events after the run go nowhere.
        bus.emit(ToolEvent::End {
            tool: "late".to_string(),
        });
        assert_eq!(log.len(), 3);
    }

    #[tokio::test]
    async fn test_stage_observer_sees_each_stage() {
        let bus = Arc::new(EventBus::new());
        let runner = Arc::new(ScriptedRunner::new(
            Script::Reply("draft".to_string()),
            Script::Reply("final".to_string()),
        ));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let orchestrator = orchestrator(runner, bus)
            .with_stage_observer(move |stage| sink.lock().unwrap().push(stage));

        orchestrator
            .run_pipeline(PARIS, Arc::new(EventLog::new()))
            .await
            .unwrap();

        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                PipelineStage::Planning,
                PipelineStage::Reviewing,
                PipelineStage::Done
            ]
        );
    }

    #[test]
    fn test_planner_tools_are_stripped() {
        let runner = Arc::new(ScriptedRunner::new(
            Script::Reply(String::new()),
            Script::Reply(String::new()),
        ));
        let orchestrator = Orchestrator::new(
            runner,
            AgentSpec::new(PLANNER_NAME, "m", "p").with_tool(ToolKind::InternetSearch),
            AgentSpec::new(REVIEWER_NAME, "m", "r").with_tool(ToolKind::InternetSearch),
            Arc::new(EventBus::new()),
        );
        assert!(orchestrator.planner().tools.is_empty());
        assert!(orchestrator.reviewer().allows(ToolKind::InternetSearch));
        assert_eq!(orchestrator.trace(), "Planner Agent → Reviewer Agent");
    }
}
