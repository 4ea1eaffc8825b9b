//! Google Gemini `generateContent` backend.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::config::{AgentConfig, API_KEY_ENV_VARS, DEFAULT_BASE_URL};
use crate::error::AgentError;
use crate::types::{GenerationSettings, ToolInvocationRequest, Turn, TurnPayload, TurnRole};

use super::http::{build_client, status_to_error};
use super::{BackendRequest, BackendResponse, ModelBackend};

pub struct GoogleBackend {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
    generation: GenerationSettings,
}

impl std::fmt::Debug for GoogleBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleBackend")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}

impl GoogleBackend {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self, AgentError> {
        Ok(Self {
            client: build_client()?,
            api_key: api_key.into(),
            model: model.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            generation: GenerationSettings::default(),
        })
    }

    /// Build from resolved config. Fails with `MissingCredential` without a key.
    pub fn from_config(config: &AgentConfig) -> Result<Self, AgentError> {
        let api_key = config
            .api_key()
            .ok_or_else(|| AgentError::MissingCredential {
                provider: "google".into(),
                env_var: API_KEY_ENV_VARS[0].into(),
            })?;
        Ok(Self::new(api_key, config.model.clone())?
            .with_base_url(config.base_url.clone())
            .with_generation(config.generation.clone()))
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_generation(mut self, generation: GenerationSettings) -> Self {
        self.generation = generation;
        self
    }

    fn build_request_body(&self, request: &BackendRequest<'_>) -> serde_json::Value {
        let mut body = serde_json::json!({ "contents": build_contents(request.turns) });
        let Some(obj) = body.as_object_mut() else {
            return body;
        };

        if !request.system_instruction.is_empty() {
            obj.insert(
                "systemInstruction".into(),
                serde_json::json!({ "parts": [{ "text": request.system_instruction }] }),
            );
        }

        if !self.generation.is_empty() {
            let mut gen_config = serde_json::Map::new();
            if let Some(max) = self.generation.max_output_tokens {
                gen_config.insert("maxOutputTokens".into(), max.into());
            }
            if let Some(temp) = self.generation.temperature {
                gen_config.insert("temperature".into(), temp.into());
            }
            obj.insert("generationConfig".into(), serde_json::Value::Object(gen_config));
        }

        if !request.tools.is_empty() {
            let fn_decls: Vec<serde_json::Value> = request
                .tools
                .iter()
                .map(|t| {
                    serde_json::json!({
                        "name": t.name(),
                        "description": t.description(),
                        "parameters": t.json_schema(),
                    })
                })
                .collect();
            obj.insert(
                "tools".into(),
                serde_json::json!([{ "functionDeclarations": fn_decls }]),
            );
        }

        body
    }
}

/// Map turns to Gemini contents. Consecutive tool results share one `user` content.
fn build_contents(turns: &[Turn]) -> Vec<serde_json::Value> {
    let mut contents = Vec::new();
    let mut responses: Vec<serde_json::Value> = Vec::new();

    for turn in turns {
        if let TurnPayload::ToolResult(response) = &turn.payload {
            responses.push(serde_json::json!({
                "functionResponse": {
                    "name": response.tool_name,
                    "response": response.result.envelope(),
                }
            }));
            continue;
        }

        if !responses.is_empty() {
            contents.push(serde_json::json!({
                "role": "user",
                "parts": std::mem::take(&mut responses),
            }));
        }

        let role = match turn.role {
            TurnRole::Model => "model",
            TurnRole::User | TurnRole::ToolResult => "user",
        };
        let parts = match &turn.payload {
            TurnPayload::Text { text } => vec![serde_json::json!({ "text": text })],
            TurnPayload::ToolCalls { calls } => calls
                .iter()
                .map(|call| {
                    serde_json::json!({
                        "functionCall": { "name": call.name, "args": call.arguments }
                    })
                })
                .collect(),
            TurnPayload::ToolResult(_) => Vec::new(),
        };
        contents.push(serde_json::json!({ "role": role, "parts": parts }));
    }

    if !responses.is_empty() {
        contents.push(serde_json::json!({ "role": "user", "parts": responses }));
    }

    contents
}

#[async_trait]
impl ModelBackend for GoogleBackend {
    fn provider_name(&self) -> &str {
        "google"
    }

    fn model_id(&self) -> &str {
        &self.model
    }

    async fn generate(&self, request: &BackendRequest<'_>) -> Result<BackendResponse, AgentError> {
        let body = self.build_request_body(request);
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);

        debug!(model = %self.model, turns = request.turns.len(), "Google generateContent");

        let resp = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        let body_text = resp.text().await?;
        if !status.is_success() {
            return Err(status_to_error(status.as_u16(), &body_text));
        }

        let data: GeminiResponse = serde_json::from_str(&body_text)
            .map_err(|e| AgentError::InvalidResponse(format!("malformed Gemini response: {e}")))?;

        let candidate = data
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| AgentError::InvalidResponse("No candidates in Gemini response".into()))?;

        debug!(finish_reason = ?candidate.finish_reason, "Google candidate received");

        let mut text = String::new();
        let mut tool_calls = Vec::new();

        for part in candidate.content.map(|c| c.parts).unwrap_or_default() {
            if let Some(t) = part.text {
                text.push_str(&t);
            }
            if let Some(fc) = part.function_call {
                let arguments = fc
                    .args
                    .unwrap_or_else(|| serde_json::Value::Object(Default::default()));
                let mut call = ToolInvocationRequest::new(fc.name, arguments);
                if let Some(id) = fc.id {
                    call.id = id;
                }
                tool_calls.push(call);
            }
        }

        if text.is_empty() && tool_calls.is_empty() {
            let reason = candidate.finish_reason.as_deref().unwrap_or("unspecified");
            return Err(AgentError::InvalidResponse(format!(
                "Gemini candidate has no text or function calls (finishReason: {reason})"
            )));
        }

        Ok(BackendResponse::from_parts(text, tool_calls))
    }
}

// Internal Gemini response types

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: Option<GeminiContent>,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPart {
    text: Option<String>,
    function_call: Option<GeminiFunctionCall>,
}

#[derive(Deserialize)]
struct GeminiFunctionCall {
    id: Option<String>,
    name: String,
    args: Option<serde_json::Value>,
}
