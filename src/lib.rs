//! Web Search Chatbot
//!
//! A console chatbot that, per user turn:
//! - Asks the model whether a web search is needed
//! - Searches and fetches the result pages concurrently
//! - Streams a cited answer back while it is generated
//! - Keeps the whole conversation in an append-only transcript
//!
//! TURN LOOP:
//! INPUT → DECIDE → SEARCH? → STREAM → APPEND

pub mod agent;
pub mod config;
pub mod console;
pub mod error;
pub mod llm;
pub mod memory;
pub mod models;
pub mod presenter;
pub mod scrape;
pub mod search;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::Result;

// Re-export common types
pub use models::*;
pub use agent::{TurnOrchestrator, TurnReport, TurnState};
pub use config::Settings;
pub use error::ChatbotError;
