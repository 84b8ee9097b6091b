//! OpenAI-compatible chat completions backend
//!
//! Uses a long-lived reqwest::Client for connection pooling.

use super::sse::answer_stream;
use super::{tool_result_entry, web_search_tool, AnswerStream, ModelBackend};
use crate::config::Settings;
use crate::error::ChatbotError;
use crate::models::{
    Role, ToolCallRequest, ToolInvocationResult, TranscriptEntry, WEB_SEARCH_TOOL,
};
use crate::Result;
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, error, info};

pub struct OpenAiBackend {
    client: Client,
    api_key: String,
    model: String,
    completions_url: String,
    temperature: f32,
}

impl OpenAiBackend {
    pub fn new(settings: &Settings) -> Result<Self> {
        Ok(Self {
            client: settings.streaming_http_client()?,
            api_key: settings.openai_api_key.clone(),
            model: settings.model.clone(),
            completions_url: format!(
                "{}/chat/completions",
                settings.openai_base_url.trim_end_matches('/')
            ),
            temperature: settings.temperature,
        })
    }

    async fn post(&self, request: &ChatRequest<'_>) -> Result<Response> {
        let response = self
            .client
            .post(&self.completions_url)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                error!("Model API request failed: {}", e);
                ChatbotError::ModelUnavailable(format!("request failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(%status, "Model API error response: {}", body);
            return Err(ChatbotError::ModelUnavailable(format!(
                "model API returned {}",
                status
            )));
        }

        Ok(response)
    }
}

#[async_trait]
impl ModelBackend for OpenAiBackend {
    async fn decide_tool(&self, transcript: &[TranscriptEntry]) -> Result<Option<ToolCallRequest>> {
        let request = ChatRequest {
            model: &self.model,
            messages: to_wire_messages(transcript),
            tools: Some(vec![web_search_tool()]),
            tool_choice: Some("auto"),
            temperature: self.temperature,
            stream: false,
        };

        info!(model = %self.model, messages = transcript.len(), "Asking model about tool use");

        let response = self.post(&request).await?;
        let completion: ChatResponse = response.json().await.map_err(|e| {
            error!("Failed to parse model response: {}", e);
            ChatbotError::ModelUnavailable(format!("unreadable response: {}", e))
        })?;

        let choice = completion.choices.into_iter().next().ok_or_else(|| {
            ChatbotError::ModelUnavailable("model returned no choices".to_string())
        })?;

        let tool_call = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .find_map(|tc| {
                ToolCallRequest::from_function_call(&tc.id, &tc.function.name, &tc.function.arguments)
            });

        debug!(tool_requested = tool_call.is_some(), "Tool decision received");

        Ok(tool_call)
    }

    async fn stream_answer(
        &self,
        transcript: &[TranscriptEntry],
        tool_call_id: Option<&str>,
        tool_result: Option<&ToolInvocationResult>,
    ) -> Result<AnswerStream> {
        let mut messages = to_wire_messages(transcript);

        if let (Some(id), Some(result)) = (tool_call_id, tool_result) {
            messages.push(WireMessage::tool_call_announcement(id, &result.query));
            messages.push(WireMessage::from(&tool_result_entry(id, result)?));
        }

        let request = ChatRequest {
            model: &self.model,
            messages,
            tools: None,
            tool_choice: None,
            temperature: self.temperature,
            stream: true,
        };

        info!(model = %self.model, with_tool_result = tool_result.is_some(), "Opening answer stream");

        let response = self.post(&request).await?;

        Ok(answer_stream(Box::pin(response.bytes_stream())))
    }
}

fn to_wire_messages(transcript: &[TranscriptEntry]) -> Vec<WireMessage> {
    transcript.iter().map(WireMessage::from).collect()
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<&'static str>,
    temperature: f32,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    stream: bool,
}

#[derive(Debug, Serialize)]
struct WireMessage {
    role: &'static str,
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<WireToolCall>>,
}

impl WireMessage {
    /// Assistant turn that precedes a Tool message on the wire.
    fn tool_call_announcement(id: &str, query: &str) -> Self {
        Self {
            role: Role::Assistant.as_str(),
            content: None,
            name: None,
            tool_call_id: None,
            tool_calls: Some(vec![WireToolCall {
                id: id.to_string(),
                kind: "function".to_string(),
                function: WireFunction {
                    name: WEB_SEARCH_TOOL.to_string(),
                    arguments: json!({ "query": query }).to_string(),
                },
            }]),
        }
    }
}

impl From<&TranscriptEntry> for WireMessage {
    fn from(entry: &TranscriptEntry) -> Self {
        Self {
            role: entry.role.as_str(),
            content: Some(entry.content.clone()),
            name: entry.name.clone(),
            tool_call_id: entry.tool_call_id.clone(),
            tool_calls: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct WireToolCall {
    #[serde(default)]
    id: String,
    #[serde(rename = "type", default = "function_kind")]
    kind: String,
    function: WireFunction,
}

fn function_kind() -> String {
    "function".to_string()
}

#[derive(Debug, Serialize, Deserialize)]
struct WireFunction {
    #[serde(default)]
    name: String,
    #[serde(default)]
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    tool_calls: Option<Vec<WireToolCall>>,
}
