//! Orchestration loop
//!
//! Resolves one user turn by alternating between model completions
//! and board tool executions until the model produces prose, a tool
//! fails, or the round-trip bound is hit. The loop owns nothing
//! beyond the turn: conversation history comes in from the caller and
//! the trace log goes back out with the answer.

pub mod prompt;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::{Result, ToolError};
use crate::provider::{ChatModel, PromptMessage};
use crate::tools::aggregate::Toolbox;
use crate::tools::protocol::extract_tool_call;
use crate::tools::{ToolCall, ToolTrace};

/// Maximum model round-trips while resolving one user turn
const MAX_ROUND_TRIPS: usize = 5;

/// Prior turns forwarded to the model as history
const HISTORY_WINDOW: usize = 2;

/// Assistant turns longer than this are truncated before forwarding
const MAX_FORWARDED_TURN_CHARS: usize = 500;

const TRUNCATION_MARKER: &str = "... [truncated]";

/// Role of a conversation turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
}

/// One turn of the conversation as stored by the presentation layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub role: TurnRole,
    pub content: String,
}

impl Turn {
    /// Create a user turn
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            content: content.into(),
        }
    }

    /// Create an assistant turn
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Assistant,
            content: content.into(),
        }
    }
}

/// Result of resolving one user turn
#[derive(Debug, Clone, Serialize)]
pub struct TurnOutcome {
    /// Final answer text for the user
    pub answer: String,
    /// Trace log of every tool invocation made during the turn
    pub traces: Vec<ToolTrace>,
}

/// States the loop moves through while resolving a single user turn
#[derive(Debug)]
enum LoopState {
    /// Send the message sequence to the model and parse the response
    AwaitModel,
    /// A validated tool call is ready to execute
    HaveToolCall(ToolCall),
    /// A tool ran; its results are in the message sequence
    ToolExecuted,
    /// A tool failed; the turn ends without retrying
    ToolFailed,
    /// The model produced prose (or an unknown tool name)
    FinalAnswer(String),
}

/// The conversational agent
pub struct Agent {
    model: Arc<dyn ChatModel>,
    toolbox: Toolbox,
}

impl Agent {
    /// Create an agent from a model provider and a toolbox.
    pub fn new(model: Arc<dyn ChatModel>, toolbox: Toolbox) -> Self {
        Self { model, toolbox }
    }

    /// Create a production agent from a validated configuration.
    ///
    /// Fails with the missing setting names when the configuration is
    /// incomplete; callers should surface that to the operator before
    /// accepting any turn.
    pub fn from_config(config: &crate::config::Config) -> Result<Self> {
        let missing = config.missing_settings();
        if !missing.is_empty() {
            return Err(crate::error::Error::Config(format!(
                "missing settings: {}",
                missing.join(", ")
            )));
        }

        let groq_key = config.groq_api_key.as_deref().unwrap_or_default();
        let monday_key = config.monday_api_key.as_deref().unwrap_or_default();
        let deals_board = config.deals_board_id.as_deref().unwrap_or_default();
        let work_orders_board = config.work_orders_board_id.as_deref().unwrap_or_default();

        let model = Arc::new(crate::provider::GenAiChat::new(groq_key, None));
        let client = Arc::new(crate::board::MondayClient::new(monday_key)?);
        let toolbox = Toolbox::new(client, deals_board, work_orders_board);

        Ok(Self::new(model, toolbox))
    }

    /// Resolve one user turn to a final answer.
    ///
    /// Drives the model through at most [`MAX_ROUND_TRIPS`]
    /// completions, executing board tools between them. If the bound
    /// is exhausted first, the last model response is returned as-is.
    /// The caller owns the history and the returned trace log.
    pub async fn run_turn(&self, user_message: &str, history: &[Turn]) -> Result<TurnOutcome> {
        info!(history_turns = history.len(), "resolving user turn");

        let mut messages = seed_messages(user_message, history);
        let mut traces: Vec<ToolTrace> = Vec::new();
        let mut last_response = String::new();
        let mut round_trips = 0;
        let mut state = LoopState::AwaitModel;

        loop {
            state = match state {
                LoopState::AwaitModel => {
                    if round_trips == MAX_ROUND_TRIPS {
                        info!(round_trips, "round-trip bound reached before a final answer");
                        return Ok(TurnOutcome {
                            answer: last_response,
                            traces,
                        });
                    }
                    round_trips += 1;

                    let response = self.model.complete(messages.clone()).await?;
                    last_response = response.clone();

                    match extract_tool_call(&response) {
                        None => LoopState::FinalAnswer(response),
                        Some(raw) => match ToolCall::validate(&raw) {
                            Ok(call) => {
                                debug!(tool = call.name(), round_trips, "model requested a tool");
                                messages.push(PromptMessage::assistant(response));
                                LoopState::HaveToolCall(call)
                            }
                            Err(ToolError::NotFound(name)) => {
                                // Permissive by design: an unregistered tool
                                // name is treated as the final answer
                                debug!(tool = %name, "model referenced an unregistered tool");
                                LoopState::FinalAnswer(response)
                            }
                            Err(err) => {
                                warn!(tool = %raw.tool, error = %err, "tool call rejected");
                                traces.push(ToolTrace::failed(
                                    &raw.tool,
                                    Value::Object(raw.params.clone()),
                                    self.toolbox.board_label(&raw.tool),
                                    err.to_string(),
                                ));
                                messages.push(PromptMessage::assistant(response));
                                messages.push(PromptMessage::user(prompt::tool_failure_message(
                                    &raw.tool,
                                    &err.to_string(),
                                )));
                                LoopState::ToolFailed
                            }
                        },
                    }
                }

                LoopState::HaveToolCall(call) => match self.toolbox.execute(&call).await {
                    Ok(output) => {
                        debug!(
                            tool = call.name(),
                            records = ?output.trace.records_returned,
                            "tool executed"
                        );
                        traces.push(output.trace.clone());
                        messages.push(PromptMessage::user(prompt::tool_results_message(
                            call.name(),
                            &output.data,
                        )));
                        LoopState::ToolExecuted
                    }
                    Err(err) => {
                        warn!(tool = call.name(), error = %err, "tool execution failed");
                        traces.push(ToolTrace::failed(
                            call.name(),
                            call.params_json(),
                            self.toolbox.board_label(call.name()),
                            err.to_string(),
                        ));
                        messages.push(PromptMessage::user(prompt::tool_failure_message(
                            call.name(),
                            &err.to_string(),
                        )));
                        LoopState::ToolFailed
                    }
                },

                LoopState::ToolExecuted => LoopState::AwaitModel,

                LoopState::ToolFailed => {
                    // One failure ends the turn; no retry, no further
                    // tool call
                    info!(round_trips, "turn ended after tool failure");
                    return Ok(TurnOutcome {
                        answer: last_response,
                        traces,
                    });
                }

                LoopState::FinalAnswer(answer) => {
                    info!(round_trips, traces = traces.len(), "turn resolved");
                    return Ok(TurnOutcome { answer, traces });
                }
            };
        }
    }
}

/// Compose the message sequence for a turn: system instructions, a
/// bounded window of prior turns, then the new user message.
fn seed_messages(user_message: &str, history: &[Turn]) -> Vec<PromptMessage> {
    let mut messages = vec![PromptMessage::system(prompt::system_prompt())];

    let window_start = history.len().saturating_sub(HISTORY_WINDOW);
    for turn in &history[window_start..] {
        match turn.role {
            TurnRole::User => messages.push(PromptMessage::user(&turn.content)),
            TurnRole::Assistant => {
                messages.push(PromptMessage::assistant(forward_assistant_content(
                    &turn.content,
                )));
            }
        }
    }

    messages.push(PromptMessage::user(user_message));
    messages
}

/// Cap forwarded assistant turns so one verbose answer cannot crowd
/// out the rest of the prompt.
fn forward_assistant_content(content: &str) -> String {
    if content.len() <= MAX_FORWARDED_TURN_CHARS {
        return content.to_string();
    }
    let mut cut = MAX_FORWARDED_TURN_CHARS;
    while !content.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}{}", &content[..cut], TRUNCATION_MARKER)
}
