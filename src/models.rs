//! Core data models for the chatbot

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use tracing::warn;
use url::Url;
use uuid::Uuid;

/// Name of the only tool the model may call.
pub const WEB_SEARCH_TOOL: &str = "web_search";

/// Number of results requested when the model does not say.
pub const DEFAULT_TOP_K: usize = 5;

//
// ================= Transcript =================
//

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Tool => "tool",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One immutable entry of the conversation history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TranscriptEntry {
    pub role: Role,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl TranscriptEntry {
    pub fn new(
        role: Role,
        content: impl Into<String>,
        name: Option<String>,
        tool_call_id: Option<String>,
    ) -> Self {
        Self {
            role,
            content: content.into(),
            name,
            tool_call_id,
            created_at: Utc::now(),
        }
    }
}

//
// ================= Search & Scrape =================
//

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchResultItem {
    pub title: String,
    pub url: Url,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
}

impl SearchResultItem {
    /// Validate raw provider fields. `None` when the title is blank or the
    /// URL is not an absolute http(s) URL with a host.
    pub fn parse(title: &str, url: &str, snippet: Option<String>) -> Option<Self> {
        let title = title.trim();
        if title.is_empty() {
            return None;
        }
        let url = parse_web_url(url)?;

        Some(Self {
            title: title.to_string(),
            url,
            snippet: snippet.filter(|s| !s.trim().is_empty()),
        })
    }
}

pub fn parse_web_url(raw: &str) -> Option<Url> {
    let url = Url::parse(raw.trim()).ok()?;
    match url.scheme() {
        "http" | "https" if url.host_str().is_some() => Some(url),
        _ => None,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScrapedPage {
    pub title: String,
    pub url: Url,
    pub text: String,
}

/// Everything one `web_search` call produced. Serialized as the Tool
/// message sent back to the model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolInvocationResult {
    pub query: String,
    pub items: Vec<SearchResultItem>,
    pub pages: Vec<ScrapedPage>,
}

impl ToolInvocationResult {
    pub fn citations(&self) -> Vec<Citation> {
        self.pages
            .iter()
            .map(|p| Citation {
                title: p.title.clone(),
                url: p.url.to_string(),
            })
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Citation {
    pub title: String,
    pub url: String,
}

//
// ================= Tool Calls =================
//

/// Arguments of a `web_search` call, both optional on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WebSearchArgs {
    pub query: Option<String>,
    pub top_k: Option<usize>,
}

impl WebSearchArgs {
    /// Read arguments from the model's JSON. Integers and numeric strings
    /// are both accepted for `top_k`.
    pub fn from_json(value: &Value) -> Self {
        let query = value
            .get("query")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_string);

        let top_k = value.get("top_k").and_then(|v| match v {
            Value::Number(n) => n
                .as_u64()
                .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
                .map(|n| n as usize),
            Value::String(s) => s.trim().parse::<usize>().ok(),
            _ => None,
        });

        Self { query, top_k }
    }

    /// Query to search for, falling back to the user's utterance.
    pub fn resolve_query(&self, utterance: &str) -> String {
        self.query
            .clone()
            .unwrap_or_else(|| utterance.trim().to_string())
    }

    /// Result count, defaulting to 5 and never below 1.
    pub fn resolve_top_k(&self) -> usize {
        self.top_k.unwrap_or(DEFAULT_TOP_K).max(1)
    }
}

/// The tools the model can invoke. Only recognized names become a variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolCall {
    WebSearch(WebSearchArgs),
}

impl ToolCall {
    pub fn name(&self) -> &'static str {
        match self {
            ToolCall::WebSearch(_) => WEB_SEARCH_TOOL,
        }
    }
}

/// A tool call the model asked for, owned by the orchestrator once returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCallRequest {
    pub id: String,
    pub call: ToolCall,
}

impl ToolCallRequest {
    pub fn web_search(id: impl Into<String>, args: WebSearchArgs) -> Self {
        Self {
            id: id.into(),
            call: ToolCall::WebSearch(args),
        }
    }

    /// Build a request from a function call as the model reported it.
    /// Unknown function names yield `None`; unparsable arguments are
    /// treated as empty.
    pub fn from_function_call(id: &str, name: &str, raw_arguments: &str) -> Option<Self> {
        if name != WEB_SEARCH_TOOL {
            return None;
        }

        let arguments = if raw_arguments.trim().is_empty() {
            Value::Object(Default::default())
        } else {
            serde_json::from_str::<Value>(raw_arguments).unwrap_or_else(|e| {
                warn!(error = %e, "Unparsable web_search arguments, using defaults");
                Value::Object(Default::default())
            })
        };

        let id = if id.trim().is_empty() {
            format!("call_{}", Uuid::new_v4().simple())
        } else {
            id.to_string()
        };

        Some(Self::web_search(id, WebSearchArgs::from_json(&arguments)))
    }
}
