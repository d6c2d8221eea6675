//! Hosted model abstraction
//!
//! The orchestration loop talks to a `ChatModel`: one request in, candidates
//! out, where each candidate holds text parts and/or function-call parts.

use crate::error::AssistantError;
use crate::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::VecDeque;
use tokio::sync::Mutex;

pub mod gemini;
pub use gemini::GeminiClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub role: Role,
    pub text: String,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            text: text.into(),
        }
    }
}

/// Function schema advertised to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDeclaration {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// Function-calling mode for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolMode {
    /// The model decides whether to call a declared function.
    Auto,
    /// Plain text only.
    None,
}

#[derive(Debug, Clone)]
pub struct ModelRequest {
    pub contents: Vec<Message>,
    pub tools: Vec<FunctionDeclaration>,
    pub tool_mode: ToolMode,
}

impl ModelRequest {
    pub fn with_tools(contents: Vec<Message>, tools: Vec<FunctionDeclaration>) -> Self {
        Self {
            contents,
            tools,
            tool_mode: ToolMode::Auto,
        }
    }

    /// Continuation request: no tools offered, function calling disabled.
    pub fn continuation(contents: Vec<Message>) -> Self {
        Self {
            contents,
            tools: Vec::new(),
            tool_mode: ToolMode::None,
        }
    }
}

/// Function-call intent emitted by the model.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCall {
    pub name: String,
    /// `null` values are kept so validation can reject them.
    pub args: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Part {
    Text(String),
    FunctionCall(FunctionCall),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Candidate {
    pub parts: Vec<Part>,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelResponse {
    pub candidates: Vec<Candidate>,
}

impl ModelResponse {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            candidates: vec![Candidate {
                parts: vec![Part::Text(text.into())],
                finish_reason: Some("STOP".to_string()),
            }],
        }
    }

    pub fn function_call(name: impl Into<String>, args: Value) -> Self {
        Self::function_calls(vec![(name.into(), args)])
    }

    /// One candidate holding several function-call parts.
    pub fn function_calls(calls: Vec<(String, Value)>) -> Self {
        let parts = calls
            .into_iter()
            .map(|(name, args)| {
                Part::FunctionCall(FunctionCall {
                    name,
                    args: match args {
                        Value::Object(map) => map,
                        _ => Map::new(),
                    },
                })
            })
            .collect();

        Self {
            candidates: vec![Candidate {
                parts,
                finish_reason: Some("STOP".to_string()),
            }],
        }
    }

    /// First function-call part across all candidates, in order.
    pub fn first_function_call(&self) -> Option<&FunctionCall> {
        self.candidates
            .iter()
            .flat_map(|c| c.parts.iter())
            .find_map(|part| match part {
                Part::FunctionCall(call) => Some(call),
                Part::Text(_) => None,
            })
    }

    /// Concatenated text of the first candidate, `None` when blank.
    pub fn text_output(&self) -> Option<String> {
        let candidate = self.candidates.first()?;
        let text: String = candidate
            .parts
            .iter()
            .filter_map(|part| match part {
                Part::Text(t) => Some(t.as_str()),
                Part::FunctionCall(_) => None,
            })
            .collect();

        let trimmed = text.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }
}

/// Trait for hosted model access
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn generate(&self, request: &ModelRequest) -> Result<ModelResponse>;
}

/// Replays canned responses in order and records every request.
/// Runs the assistant without a hosted model (offline mode, tests).
#[derive(Default)]
pub struct ScriptedModel {
    responses: Mutex<VecDeque<Result<ModelResponse>>>,
    requests: Mutex<Vec<ModelRequest>>,
}

impl ScriptedModel {
    pub fn new(responses: Vec<Result<ModelResponse>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub async fn push(&self, response: Result<ModelResponse>) {
        self.responses.lock().await.push_back(response);
    }

    pub async fn requests(&self) -> Vec<ModelRequest> {
        self.requests.lock().await.clone()
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    async fn generate(&self, request: &ModelRequest) -> Result<ModelResponse> {
        self.requests.lock().await.push(request.clone());

        self.responses
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Err(AssistantError::LlmError("No scripted response left".to_string())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_first_function_call_wins_across_candidates() {
        let response = ModelResponse {
            candidates: vec![
                Candidate {
                    parts: vec![Part::Text("thinking".into())],
                    finish_reason: None,
                },
                Candidate {
                    parts: vec![
                        Part::FunctionCall(FunctionCall {
                            name: "GetCibil".into(),
                            args: Map::new(),
                        }),
                        Part::FunctionCall(FunctionCall {
                            name: "GetSalary".into(),
                            args: Map::new(),
                        }),
                    ],
                    finish_reason: None,
                },
            ],
        };

        assert_eq!(response.first_function_call().unwrap().name, "GetCibil");
    }

    #[test]
    fn test_text_output_trims_and_skips_blank() {
        assert_eq!(ModelResponse::text("  hello \n").text_output().as_deref(), Some("hello"));
        assert_eq!(ModelResponse::text("   ").text_output(), None);
        assert_eq!(ModelResponse::default().text_output(), None);
        assert_eq!(
            ModelResponse::function_call("GetCibil", json!({"pan": "ABCDE1234F"})).text_output(),
            None
        );
    }

    #[tokio::test]
    async fn test_scripted_model_replays_in_order() {
        let model = ScriptedModel::new(vec![Ok(ModelResponse::text("one"))]);
        model.push(Ok(ModelResponse::text("two"))).await;

        let request = ModelRequest::continuation(vec![Message::user("hi")]);
        assert_eq!(model.generate(&request).await.unwrap().text_output().as_deref(), Some("one"));
        assert_eq!(model.generate(&request).await.unwrap().text_output().as_deref(), Some("two"));
        assert!(model.generate(&request).await.is_err());
        assert_eq!(model.requests().await.len(), 3);
    }
}
