//! Gemini API client with function calling
//!
//! Uses a long-lived reqwest::Client for connection pooling. Every call runs
//! under the upstream call policy (explicit timeout, one retry).

use super::{
    Candidate, ChatModel, FunctionCall, FunctionDeclaration, Message, ModelRequest, ModelResponse,
    Part, Role, ToolMode,
};
use crate::error::AssistantError;
use crate::upstream::{call_with_retry, CallPolicy};
use crate::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::{debug, error, info};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Reusable Gemini client (connection-pooled)
pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    policy: CallPolicy,
}

impl GeminiClient {
    pub fn new(api_key: String, model: String, base_url: String, policy: CallPolicy) -> Result<Self> {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(8)
            .timeout(policy.timeout)
            .build()?;

        Ok(Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            policy,
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        )
    }

    async fn generate_once(&self, body: &GeminiRequest) -> Result<ModelResponse> {
        let response = self
            .client
            .post(self.endpoint())
            .json(body)
            .send()
            .await
            .map_err(|e| {
                // The URL carries the API key.
                let e = e.without_url();
                error!("Gemini API request failed: {}", e);
                AssistantError::from_transport("gemini", e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!(%status, "Gemini API error response: {}", error_text);
            return Err(AssistantError::LlmError(format!(
                "Gemini API returned {}: {}",
                status, error_text
            )));
        }

        let gemini_response: GeminiResponse = response.json().await.map_err(|e| {
            let e = e.without_url();
            error!("Failed to parse Gemini response: {}", e);
            AssistantError::LlmError(format!("Gemini parse error: {}", e))
        })?;

        Ok(gemini_response.into_model_response())
    }
}

#[async_trait]
impl ChatModel for GeminiClient {
    async fn generate(&self, request: &ModelRequest) -> Result<ModelResponse> {
        if self.api_key.is_empty() {
            return Err(AssistantError::ConfigError(
                "GEMINI_API_KEY not configured".to_string(),
            ));
        }

        let body = GeminiRequest::from_request(request);

        info!(
            model = %self.model,
            tools = request.tools.len(),
            messages = request.contents.len(),
            "Calling Gemini API"
        );

        let response = call_with_retry("gemini", self.policy, || self.generate_once(&body)).await?;

        debug!(candidates = response.candidates.len(), "Gemini response received");
        Ok(response)
    }
}

//
// ================= Wire format =================
//

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<ToolDeclarations>,
    tool_config: ToolConfig,
    generation_config: GenerationConfig,
}

impl GeminiRequest {
    fn from_request(request: &ModelRequest) -> Self {
        let contents = request.contents.iter().map(Content::from_message).collect();

        // One tool entry per function, mirroring how declarations are registered.
        let tools = request
            .tools
            .iter()
            .map(|decl| ToolDeclarations {
                function_declarations: vec![decl.clone()],
            })
            .collect();

        let mode = match request.tool_mode {
            ToolMode::Auto if !request.tools.is_empty() => "AUTO",
            _ => "NONE",
        };

        Self {
            contents,
            tools,
            tool_config: ToolConfig {
                function_calling_config: FunctionCallingConfig {
                    mode: mode.to_string(),
                },
            },
            generation_config: GenerationConfig {
                temperature: 0.3,
                top_p: 0.9,
                max_output_tokens: 2048,
            },
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    role: Option<Role>,
    #[serde(default)]
    parts: Vec<WirePart>,
}

impl Content {
    fn from_message(message: &Message) -> Self {
        Self {
            role: Some(message.role),
            parts: vec![WirePart {
                text: Some(message.text.clone()),
                function_call: None,
            }],
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WirePart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    function_call: Option<WireFunctionCall>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireFunctionCall {
    name: String,
    #[serde(default)]
    args: Value,
}

impl WireFunctionCall {
    /// Args normally arrive as an object; some responses carry a JSON string.
    fn into_function_call(self) -> FunctionCall {
        let args = match self.args {
            Value::Object(map) => map,
            Value::String(raw) => match serde_json::from_str::<Value>(&raw) {
                Ok(Value::Object(map)) => map,
                _ => Map::new(),
            },
            _ => Map::new(),
        };

        FunctionCall {
            name: self.name,
            args,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ToolDeclarations {
    function_declarations: Vec<FunctionDeclaration>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ToolConfig {
    function_calling_config: FunctionCallingConfig,
}

#[derive(Debug, Serialize)]
struct FunctionCallingConfig {
    mode: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    top_p: f32,
    max_output_tokens: i32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<WireCandidate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireCandidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(default)]
    finish_reason: Option<String>,
}

impl GeminiResponse {
    fn into_model_response(self) -> ModelResponse {
        let candidates = self
            .candidates
            .into_iter()
            .map(|candidate| {
                let parts = candidate
                    .content
                    .map(|c| c.parts)
                    .unwrap_or_default()
                    .into_iter()
                    .filter_map(|part| match (part.function_call, part.text) {
                        (Some(call), _) => Some(Part::FunctionCall(call.into_function_call())),
                        (None, Some(text)) => Some(Part::Text(text)),
                        (None, None) => None,
                    })
                    .collect();

                Candidate {
                    parts,
                    finish_reason: candidate.finish_reason,
                }
            })
            .collect();

        ModelResponse { candidates }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_serialization_with_tools() {
        let request = ModelRequest::with_tools(
            vec![Message::user("Find travel cards")],
            vec![FunctionDeclaration {
                name: "GetCreditCards".into(),
                description: "Get Credit cards based on benefit type".into(),
                parameters: json!({
                    "type": "object",
                    "properties": {"keyword_name": {"type": "string"}},
                    "required": ["keyword_name"]
                }),
            }],
        );

        let json = serde_json::to_value(GeminiRequest::from_request(&request)).unwrap();

        assert_eq!(json["contents"][0]["role"], "user");
        assert_eq!(json["contents"][0]["parts"][0]["text"], "Find travel cards");
        assert_eq!(json["tools"][0]["functionDeclarations"][0]["name"], "GetCreditCards");
        assert_eq!(json["toolConfig"]["functionCallingConfig"]["mode"], "AUTO");
    }

    #[test]
    fn test_continuation_request_disables_tools() {
        let request = ModelRequest::continuation(vec![Message::user("q"), Message::model("result")]);
        let json = serde_json::to_value(GeminiRequest::from_request(&request)).unwrap();

        assert!(json.get("tools").is_none());
        assert_eq!(json["toolConfig"]["functionCallingConfig"]["mode"], "NONE");
        assert_eq!(json["contents"][1]["role"], "model");
    }

    #[test]
    fn test_response_parsing_function_call_and_text() {
        let raw = json!({
            "candidates": [{
                "content": {
                    "role": "model",
                    "parts": [
                        {"text": "Let me check."},
                        {"functionCall": {"name": "GetCibil", "args": {"pan": "ABCDE1234F"}}}
                    ]
                },
                "finishReason": "STOP"
            }]
        });

        let parsed: GeminiResponse = serde_json::from_value(raw).unwrap();
        let response = parsed.into_model_response();

        let call = response.first_function_call().unwrap();
        assert_eq!(call.name, "GetCibil");
        assert_eq!(call.args["pan"], "ABCDE1234F");
        assert_eq!(response.text_output().as_deref(), Some("Let me check."));
    }

    #[test]
    fn test_string_encoded_args_are_decoded() {
        let raw = json!({
            "candidates": [{
                "content": {"parts": [
                    {"functionCall": {"name": "SendEmailOTP", "args": "{\"email\":\"a@b.com\"}"}}
                ]}
            }]
        });

        let parsed: GeminiResponse = serde_json::from_value(raw).unwrap();
        let response = parsed.into_model_response();

        assert_eq!(response.first_function_call().unwrap().args["email"], "a@b.com");
    }

    #[test]
    fn test_blocked_candidate_without_content() {
        let raw = json!({"candidates": [{"finishReason": "SAFETY"}]});
        let parsed: GeminiResponse = serde_json::from_value(raw).unwrap();
        let response = parsed.into_model_response();

        assert!(response.first_function_call().is_none());
        assert!(response.text_output().is_none());
    }

    #[tokio::test]
    async fn test_missing_api_key_is_config_error() {
        let client = GeminiClient::new(
            String::new(),
            DEFAULT_MODEL.to_string(),
            DEFAULT_BASE_URL.to_string(),
            CallPolicy::default(),
        )
        .unwrap();

        let request = ModelRequest::continuation(vec![Message::user("hi")]);
        let err = client.generate(&request).await.unwrap_err();
        assert!(err.to_string().contains("GEMINI_API_KEY"));
    }
}
