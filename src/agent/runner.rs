//! Stage execution with a tool calling loop.

use super::tools::{parse_tool_call, tool_definitions, Toolbox};
use super::AgentSpec;
use crate::error::{ItineraError, Result};
use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionMessageToolCall, ChatCompletionRequestAssistantMessageArgs,
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestToolMessageArgs, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs,
};
use async_openai::Client;
use async_trait::async_trait;
use tracing::{debug, info, instrument};

/// The loosely-shaped output of a stage.
///
/// Runners return whatever their backend produces; the pipeline only needs
/// a string out of it.
pub trait StageOutput: Send + Sync + std::fmt::Debug {
    /// Best-effort text rendering of the stage result.
    fn extract_text(&self) -> String;
}

impl StageOutput for String {
    fn extract_text(&self) -> String {
        self.clone()
    }
}

/// Executes an agent against one input.
#[async_trait]
pub trait StageRunner: Send + Sync {
    async fn run(&self, agent: &AgentSpec, input: &str) -> Result<Box<dyn StageOutput>>;
}

/// Result of an [`OpenAIRunner`] run.
#[derive(Debug, Clone, Default)]
pub struct RunResult {
    /// Agent that produced this result.
    pub agent: String,
    /// Content of the final assistant message.
    pub final_output: Option<String>,
    /// All assistant text seen during the run, including text sent alongside tool calls.
    pub text: Option<String>,
    /// Record of all tool calls made during execution.
    pub tool_calls: Vec<ToolCallRecord>,
    /// Number of iterations (LLM calls) used.
    pub iterations: usize,
}

impl StageOutput for RunResult {
    /// Prefer the final output, then the accumulated text, then `Display`.
    fn extract_text(&self) -> String {
        non_empty(&self.final_output)
            .or_else(|| non_empty(&self.text))
            .map(str::to_string)
            .unwrap_or_else(|| self.to_string())
    }
}

fn non_empty(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|s| !s.is_empty())
}

impl std::fmt::Display for RunResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "RunResult(agent={}, iterations={}, tool_calls={})",
            self.agent,
            self.iterations,
            self.tool_calls.len()
        )
    }
}

/// Record of a tool call made by the agent.
#[derive(Debug, Clone)]
pub struct ToolCallRecord {
    /// Name of the tool called.
    pub name: String,
    /// JSON arguments passed to the tool.
    pub arguments: String,
    /// Result returned by the tool.
    pub result: String,
}

impl std::fmt::Display for ToolCallRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.name, self.arguments)
    }
}

/// Runs agents through the OpenAI chat completions API.
pub struct OpenAIRunner {
    client: Client<OpenAIConfig>,
    toolbox: Toolbox,
}

impl OpenAIRunner {
    /// Create a runner over `client` whose agents may use `toolbox`.
    pub fn new(client: Client<OpenAIConfig>, toolbox: Toolbox) -> Self {
        Self { client, toolbox }
    }

    /// Execute a single tool call and return a record of it.
    async fn execute_tool_call(
        &self,
        agent: &AgentSpec,
        tool_call: &ChatCompletionMessageToolCall,
    ) -> ToolCallRecord {
        let name = &tool_call.function.name;
        let arguments = &tool_call.function.arguments;

        info!("{} calling tool: {}", agent.name, name);

        let result = match parse_tool_call(name, arguments) {
            Ok(call) if agent.allows(call.kind()) => match self.toolbox.execute(&call).await {
                Ok(output) => output,
                Err(e) => format!("Tool error: {}", e),
            },
            Ok(_) => format!("Tool not available: {}", name),
            Err(e) => format!("Failed to parse tool call: {}", e),
        };

        ToolCallRecord {
            name: name.clone(),
            arguments: arguments.clone(),
            result,
        }
    }
}

#[async_trait]
impl StageRunner for OpenAIRunner {
    #[instrument(skip(self, agent, input), fields(agent = %agent.name, model = %agent.model))]
    async fn run(&self, agent: &AgentSpec, input: &str) -> Result<Box<dyn StageOutput>> {
        let stage_err = |e: &dyn std::fmt::Display| ItineraError::stage(&agent.name, e.to_string());

        let mut messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(agent.instructions.clone())
                .build()
                .map_err(|e| stage_err(&e))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(input.to_string())
                .build()
                .map_err(|e| stage_err(&e))?
                .into(),
        ];

        let tools = tool_definitions(&agent.tools);
        let mut result = RunResult {
            agent: agent.name.clone(),
            ..Default::default()
        };
        let mut transcript: Vec<String> = Vec::new();

        loop {
            result.iterations += 1;
            if result.iterations > agent.max_iterations {
                return Err(ItineraError::stage(
                    &agent.name,
                    format!("exceeded maximum iterations ({})", agent.max_iterations),
                ));
            }

            debug!("{} iteration {}", agent.name, result.iterations);

            let mut builder = CreateChatCompletionRequestArgs::default();
            builder.model(&agent.model).messages(messages.clone());
            if !tools.is_empty() {
                builder.tools(tools.clone());
            }
            let request = builder.build().map_err(|e| stage_err(&e))?;

            let response = self
                .client
                .chat()
                .create(request)
                .await
                .map_err(|e| ItineraError::OpenAI(format!("{}: {}", agent.name, e)))?;

            let choice = response
                .choices
                .first()
                .ok_or_else(|| ItineraError::stage(&agent.name, "no response from model"))?;

            if let Some(content) = choice.message.content.as_deref().filter(|c| !c.is_empty()) {
                transcript.push(content.to_string());
            }

            let tool_calls = match &choice.message.tool_calls {
                Some(calls) if !calls.is_empty() => calls,
                _ => {
                    result.final_output = choice.message.content.clone();
                    if !transcript.is_empty() {
                        result.text = Some(transcript.join("\n\n"));
                    }
                    let output: Box<dyn StageOutput> = Box::new(result);
                    return Ok(output);
                }
            };

            let assistant_msg = ChatCompletionRequestAssistantMessageArgs::default()
                .tool_calls(tool_calls.clone())
                .build()
                .map_err(|e| stage_err(&e))?;
            messages.push(assistant_msg.into());

            for tool_call in tool_calls {
                let record = self.execute_tool_call(agent, tool_call).await;

                let tool_msg = ChatCompletionRequestToolMessageArgs::default()
                    .tool_call_id(&tool_call.id)
                    .content(record.result.clone())
                    .build()
                    .map_err(|e| stage_err(&e))?;
                messages.push(tool_msg.into());

                result.tool_calls.push(record);
            }
        }
    }
}
