//! Orchestration loop
//!
//! One pass per user turn:
//! CONTEXT → REQUEST (tools, AUTO) → INSPECT → VALIDATE → EXECUTE ONCE → FOLLOW-UP (no tools) → PERSIST
//!
//! At most one tool executes per turn. Every failure ends the turn with a
//! user-facing message rather than an error.

pub mod prompt;

pub use prompt::DEFAULT_SYSTEM_PROMPT;

use crate::memory::SessionStore;
use crate::model::{ChatModel, Message, ModelRequest};
use crate::models::SessionId;
use crate::tools::{ToolContext, ToolRegistry};
use crate::validation::truncate_chars;
use prompt::{build_prompt, tool_result_message};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

pub const DEFAULT_REPLY_CHAR_LIMIT: usize = 4000;

const NO_RESPONSE: &str = "No valid response received from the model.";

/// What happened during a turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// Plain text answer, no tool involved.
    Answered,
    /// Tool ran and the follow-up produced text.
    ToolAnswered { tool: String },
    /// Tool ran; the follow-up had no text so the raw result was returned.
    ToolFallback { tool: String },
    /// Unknown tool or missing / null arguments; nothing executed.
    ToolSkipped { tool: String },
    ToolFailed { tool: String },
    NoResponse,
    UpstreamFailed,
}

impl TurnOutcome {
    pub fn tool(&self) -> Option<&str> {
        match self {
            TurnOutcome::ToolAnswered { tool }
            | TurnOutcome::ToolFallback { tool }
            | TurnOutcome::ToolSkipped { tool }
            | TurnOutcome::ToolFailed { tool } => Some(tool),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnReply {
    pub text: String,
    pub outcome: TurnOutcome,
}

impl TurnReply {
    fn new(text: impl Into<String>, outcome: TurnOutcome) -> Self {
        Self {
            text: text.into(),
            outcome,
        }
    }
}

pub struct Assistant {
    model: Arc<dyn ChatModel>,
    registry: Arc<ToolRegistry>,
    sessions: Arc<SessionStore>,
    system_prompt: String,
    reply_limit: usize,
}

impl Assistant {
    pub fn new(
        model: Arc<dyn ChatModel>,
        registry: Arc<ToolRegistry>,
        sessions: Arc<SessionStore>,
        system_prompt: impl Into<String>,
    ) -> Self {
        Self {
            model,
            registry,
            sessions,
            system_prompt: system_prompt.into(),
            reply_limit: DEFAULT_REPLY_CHAR_LIMIT,
        }
    }

    /// Characters of each reply kept in the transcript.
    pub fn with_reply_limit(mut self, limit: usize) -> Self {
        self.reply_limit = limit;
        self
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Run one turn and record it in the session transcript.
    pub async fn respond(&self, session: SessionId, input: &str) -> TurnReply {
        let start = Instant::now();
        let input = input.trim();

        info!(session_id = %session, "Turn started");

        let reply = self.run_turn(session, input).await;

        self.sessions
            .append_exchange(session, input, truncate_chars(&reply.text, self.reply_limit));

        info!(
            session_id = %session,
            outcome = ?reply.outcome,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Turn complete"
        );

        TurnReply {
            text: reply.text.trim().to_string(),
            outcome: reply.outcome,
        }
    }

    async fn run_turn(&self, session: SessionId, input: &str) -> TurnReply {
        // === CONTEXT ===
        let history = self.sessions.history_text(session);
        let prompt = build_prompt(&self.system_prompt, &history, input);

        // === REQUEST ===
        let request = ModelRequest::with_tools(vec![Message::user(prompt.clone())], self.registry.declarations());
        debug!(session_id = %session, tools = request.tools.len(), "Requesting model with tools");

        let response = match self.model.generate(&request).await {
            Ok(response) => response,
            Err(e) => {
                error!(session_id = %session, error = %e, "Model request failed");
                return TurnReply::new(format!("Model request failed: {}", e), TurnOutcome::UpstreamFailed);
            }
        };

        // === INSPECT ===
        let Some(call) = response.first_function_call() else {
            return match response.text_output() {
                Some(text) => TurnReply::new(text, TurnOutcome::Answered),
                None => {
                    warn!(session_id = %session, "Model returned neither text nor a function call");
                    TurnReply::new(NO_RESPONSE, TurnOutcome::NoResponse)
                }
            };
        };

        info!(session_id = %session, tool = %call.name, args = ?call.args, "Tool call requested");

        // === VALIDATE ===
        let (tool, args) = match self.registry.validate_call(call) {
            Ok(resolved) => resolved,
            Err(e) => {
                warn!(session_id = %session, tool = %call.name, error = %e, "Skipping tool call");
                return TurnReply::new(
                    format!(
                        "Tool call skipped: invalid arguments ({})",
                        serde_json::Value::Object(call.args.clone())
                    ),
                    TurnOutcome::ToolSkipped {
                        tool: call.name.clone(),
                    },
                );
            }
        };

        // === EXECUTE ONCE ===
        let tool_name = tool.name().to_string();
        let ctx = ToolContext { session_id: session };

        let result = match tool.execute(&ctx, &args).await {
            Ok(result) => result,
            Err(e) => {
                error!(session_id = %session, tool = %tool_name, error = %e, "Tool execution failed");
                return TurnReply::new(
                    format!("Tool execution failed for {}: {}", tool_name, e),
                    TurnOutcome::ToolFailed { tool: tool_name },
                );
            }
        };

        debug!(session_id = %session, tool = %tool_name, result_len = result.len(), "Tool executed");

        // === FOLLOW-UP ===
        let follow_up = ModelRequest::continuation(vec![
            Message::user(prompt),
            Message::model(tool_result_message(&tool_name, &result)),
        ]);

        match self.model.generate(&follow_up).await {
            Ok(response) => match response.text_output() {
                Some(text) => TurnReply::new(text, TurnOutcome::ToolAnswered { tool: tool_name }),
                None => TurnReply::new(result, TurnOutcome::ToolFallback { tool: tool_name }),
            },
            Err(e) => {
                error!(session_id = %session, tool = %tool_name, error = %e, "Follow-up request failed");
                TurnReply::new(format!("Model request failed: {}", e), TurnOutcome::UpstreamFailed)
            }
        }
    }
}
