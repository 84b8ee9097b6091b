//! Language-model backends
//!
//! The backend makes two kinds of calls per turn: a single non-streaming
//! request where the model may ask for `web_search`, and a streaming request
//! that produces the final answer.

use crate::models::{ToolCallRequest, ToolInvocationResult, TranscriptEntry, WEB_SEARCH_TOOL};
use crate::Result;
use async_trait::async_trait;
use futures::stream::BoxStream;
use serde_json::{json, Value};

pub mod openai;
pub mod sse;

pub use openai::OpenAiBackend;

/// Lazily produced answer fragments, consumed once, in order.
///
/// A transport failure after the stream is established ends the sequence
/// with one `StreamTruncated` error; fragments before it are still valid.
pub type AnswerStream = BoxStream<'static, Result<String>>;

/// Trait for the model that decides on tool use and writes answers
#[async_trait]
pub trait ModelBackend: Send + Sync {
    /// Ask the model whether it wants to search. Only a call to
    /// `web_search` is returned; anything else is `None`.
    async fn decide_tool(&self, transcript: &[TranscriptEntry]) -> Result<Option<ToolCallRequest>>;

    /// Open the answer stream. When both `tool_call_id` and `tool_result`
    /// are given, the request carries the serialized result as a Tool
    /// message attributed to that call. The caller's transcript is not
    /// touched.
    async fn stream_answer(
        &self,
        transcript: &[TranscriptEntry],
        tool_call_id: Option<&str>,
        tool_result: Option<&ToolInvocationResult>,
    ) -> Result<AnswerStream>;
}

/// Function schema advertised to the model.
pub fn web_search_tool() -> Value {
    json!({
        "type": "function",
        "function": {
            "name": WEB_SEARCH_TOOL,
            "description": "Buscar en Google (via serper.dev) y devolver los enlaces más relevantes.",
            "parameters": {
                "type": "object",
                "properties": {
                    "query": {"type": "string", "description": "Consulta del usuario"},
                    "top_k": {"type": "integer", "default": 5}
                },
                "required": ["query"]
            }
        }
    })
}

/// The Tool entry a backend sends after a search.
pub fn tool_result_entry(
    tool_call_id: &str,
    tool_result: &ToolInvocationResult,
) -> Result<TranscriptEntry> {
    let payload = serde_json::to_string(tool_result)?;
    Ok(TranscriptEntry::new(
        crate::models::Role::Tool,
        payload,
        None,
        Some(tool_call_id.to_string()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;

    #[test]
    fn test_tool_schema_shape() {
        let tool = web_search_tool();
        assert_eq!(tool["function"]["name"], "web_search");
        assert_eq!(tool["function"]["parameters"]["required"], json!(["query"]));
        assert_eq!(tool["function"]["parameters"]["properties"]["top_k"]["default"], 5);
    }

    #[test]
    fn test_tool_result_entry_serializes_payload() {
        let result = ToolInvocationResult {
            query: "manzanas".to_string(),
            items: vec![],
            pages: vec![],
        };

        let entry = tool_result_entry("tool_1", &result).unwrap();
        assert_eq!(entry.role, Role::Tool);
        assert_eq!(entry.tool_call_id.as_deref(), Some("tool_1"));

        let parsed: ToolInvocationResult = serde_json::from_str(&entry.content).unwrap();
        assert_eq!(parsed, result);
    }
}
