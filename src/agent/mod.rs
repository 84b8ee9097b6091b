//! Turn orchestrator - runs one conversational turn at a time
//!
//! INPUT → DECIDE → SEARCH? → STREAM → APPEND
//!
//! A fatal error at any point (search or model unavailable) ends the turn
//! with an error report; the session keeps going.

use crate::config::Settings;
use crate::llm::ModelBackend;
use crate::memory::Transcript;
use crate::models::{Citation, ToolCall, ToolInvocationResult, WebSearchArgs};
use crate::presenter::Presenter;
use crate::scrape::PageFetcher;
use crate::search::SearchProvider;
use crate::Result;
use futures::StreamExt;
use std::sync::Arc;
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    AwaitingInput,
    Deciding,
    ToolExecuting,
    Streaming,
    Appending,
}

/// What a completed turn produced.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnReport {
    pub answer: String,
    pub tool_call_id: Option<String>,
    pub citations: Vec<Citation>,
    /// The answer stream broke off; `answer` holds what arrived.
    pub truncated: bool,
}

/// Coordinates the model, search and fetch collaborators for each turn
pub struct TurnOrchestrator {
    model: Box<dyn ModelBackend>,
    search: Box<dyn SearchProvider>,
    fetcher: Box<dyn PageFetcher>,
    presenter: Arc<dyn Presenter>,
    transcript: Transcript,
    state: TurnState,
}

impl TurnOrchestrator {
    pub fn new(
        settings: &Settings,
        model: Box<dyn ModelBackend>,
        search: Box<dyn SearchProvider>,
        fetcher: Box<dyn PageFetcher>,
        presenter: Arc<dyn Presenter>,
    ) -> Self {
        Self {
            model,
            search,
            fetcher,
            presenter,
            transcript: Transcript::with_system_prompt(settings.system_prompt.clone()),
            state: TurnState::AwaitingInput,
        }
    }

    pub fn state(&self) -> TurnState {
        self.state
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Process one user utterance through to the appended answer.
    ///
    /// Blank input is ignored (`Ok(None)`); anything else is recorded as
    /// typed. On a fatal error the presenter has already been told, no
    /// Assistant entry is added, and the orchestrator is back in
    /// `AwaitingInput`.
    pub async fn handle_turn(&mut self, utterance: &str) -> Result<Option<TurnReport>> {
        if utterance.trim().is_empty() {
            return Ok(None);
        }

        let turn_id = Uuid::new_v4();
        let span = info_span!("turn", %turn_id);

        match self.run_turn(utterance).instrument(span).await {
            Ok(report) => Ok(Some(report)),
            Err(e) => {
                error!(%turn_id, error = %e, state = ?self.state, "Turn aborted");
                self.presenter.on_error(&e.to_string());
                self.transition(TurnState::AwaitingInput);
                Err(e)
            }
        }
    }

    async fn run_turn(&mut self, utterance: &str) -> Result<TurnReport> {
        // === INPUT ===
        self.transcript.append_user(utterance);

        // === DECIDE ===
        self.transition(TurnState::Deciding);
        let decision = self.model.decide_tool(&self.transcript.snapshot()).await?;

        // === SEARCH ===
        let tool_outcome = match decision {
            Some(request) => {
                self.transition(TurnState::ToolExecuting);
                let result = match &request.call {
                    ToolCall::WebSearch(args) => self.execute_web_search(args, utterance).await?,
                };
                Some((request.id, result))
            }
            None => None,
        };

        let (tool_call_id, tool_result) = match &tool_outcome {
            Some((id, result)) => (Some(id.as_str()), Some(result)),
            None => (None, None),
        };

        // === STREAM ===
        self.transition(TurnState::Streaming);
        let mut stream = self
            .model
            .stream_answer(&self.transcript.snapshot(), tool_call_id, tool_result)
            .await?;

        let mut answer = String::new();
        let mut truncated = false;
        while let Some(item) = stream.next().await {
            match item {
                Ok(fragment) => {
                    self.presenter.on_answer_fragment(&fragment);
                    answer.push_str(&fragment);
                }
                Err(e) => {
                    warn!(error = %e, received_bytes = answer.len(), "Keeping partial answer");
                    truncated = true;
                    break;
                }
            }
        }
        self.presenter.on_turn_complete();

        // === APPEND ===
        self.transition(TurnState::Appending);
        self.transcript.append_assistant(answer.clone());

        let citations = tool_result
            .map(ToolInvocationResult::citations)
            .unwrap_or_default();
        if !citations.is_empty() {
            self.presenter.on_citations(&citations);
        }

        self.transition(TurnState::AwaitingInput);

        info!(
            answer_bytes = answer.len(),
            citations = citations.len(),
            truncated,
            "Turn complete"
        );

        Ok(TurnReport {
            answer,
            tool_call_id: tool_call_id.map(str::to_string),
            citations,
            truncated,
        })
    }

    async fn execute_web_search(
        &self,
        args: &WebSearchArgs,
        utterance: &str,
    ) -> Result<ToolInvocationResult> {
        let query = args.resolve_query(utterance);
        let top_k = args.resolve_top_k();

        self.presenter.on_tool_search_started();

        let mut items = self.search.search(&query, top_k).await?;
        items.truncate(top_k);

        let presenter = &self.presenter;
        let on_processed = |title: &str, url: &str| presenter.on_source_processed(title, url);
        let pages = self.fetcher.fetch_all(&items, &on_processed).await;

        info!(
            query = %query,
            top_k,
            results = items.len(),
            pages = pages.len(),
            "Web search complete"
        );

        Ok(ToolInvocationResult {
            query,
            items,
            pages,
        })
    }

    fn transition(&mut self, next: TurnState) {
        debug!(from = ?self.state, to = ?next, "Turn state");
        self.state = next;
    }
}
