//! Output surface for the orchestrator
//!
//! The orchestrator reports progress, answer fragments, citations and errors
//! through `Presenter`. Callbacks take `&self` because source notifications
//! arrive from concurrent fetches.

use crate::models::Citation;
use std::io::{self, Write};
use std::sync::Mutex;

pub trait Presenter: Send + Sync {
    fn on_tool_search_started(&self);
    fn on_source_processed(&self, title: &str, url: &str);
    fn on_answer_fragment(&self, text: &str);
    fn on_turn_complete(&self);
    fn on_citations(&self, citations: &[Citation]);
    fn on_error(&self, message: &str);
}

/// Plain-text presenter for a terminal (or any writer).
pub struct ConsolePresenter<W: Write + Send> {
    out: Mutex<W>,
}

impl ConsolePresenter<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> ConsolePresenter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        match self.out.into_inner() {
            Ok(out) => out,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Write and flush. Terminal write errors are not worth failing a turn.
    fn emit(&self, text: &str) {
        let mut out = match self.out.lock() {
            Ok(out) => out,
            Err(poisoned) => poisoned.into_inner(),
        };
        let _ = out.write_all(text.as_bytes());
        let _ = out.flush();
    }
}

impl<W: Write + Send> Presenter for ConsolePresenter<W> {
    fn on_tool_search_started(&self) {
        self.emit("🔎 Búsqueda en internet\n");
    }

    fn on_source_processed(&self, title: &str, url: &str) {
        self.emit(&format!("Fuente procesada: {} ({})\n", title, url));
    }

    fn on_answer_fragment(&self, text: &str) {
        self.emit(text);
    }

    fn on_turn_complete(&self) {
        self.emit("\n");
    }

    fn on_citations(&self, citations: &[Citation]) {
        let mut listing = String::from("\nReferencias:\n");
        for c in citations {
            listing.push_str(&format!("- {} ({})\n", c.title, c.url));
        }
        self.emit(&listing);
    }

    fn on_error(&self, message: &str) {
        self.emit(&format!("Error: {}\n", message));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_console_rendering() {
        let presenter = ConsolePresenter::new(Vec::new());

        presenter.on_tool_search_started();
        presenter.on_source_processed("A", "https://a.com/");
        presenter.on_answer_fragment("Según las fuentes, ");
        presenter.on_answer_fragment("esto funciona.");
        presenter.on_turn_complete();
        presenter.on_citations(&[Citation {
            title: "A".to_string(),
            url: "https://a.com/".to_string(),
        }]);

        let output = String::from_utf8(presenter.into_inner()).unwrap();
        assert_eq!(
            output,
            "🔎 Búsqueda en internet\n\
             Fuente procesada: A (https://a.com/)\n\
             Según las fuentes, esto funciona.\n\
             \nReferencias:\n- A (https://a.com/)\n"
        );
    }

    #[test]
    fn test_error_line() {
        let presenter = ConsolePresenter::new(Vec::new());
        presenter.on_error("Search unavailable: provider returned 503");

        let output = String::from_utf8(presenter.into_inner()).unwrap();
        assert_eq!(output, "Error: Search unavailable: provider returned 503\n");
    }
}
