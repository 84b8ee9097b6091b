//! Interactive console session
//!
//! Reads one utterance per line and hands it to the orchestrator. Turns never
//! overlap: the next line is read only after the previous turn finished.

use crate::agent::TurnOrchestrator;
use crate::config::Settings;
use crate::llm::OpenAiBackend;
use crate::presenter::{ConsolePresenter, Presenter};
use crate::scrape::HttpPageFetcher;
use crate::search::SerperSearch;
use crate::Result;
use std::borrow::Cow;
use std::io::{self, Write};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};

const EXIT_COMMANDS: [&str; 3] = ["salir", "exit", "quit"];

pub fn is_exit_command(input: &str) -> bool {
    let input = input.trim().to_lowercase();
    EXIT_COMMANDS.contains(&input.as_str())
}

/// Wire the real collaborators and run a session on stdin/stdout.
pub async fn run_console(settings: &Settings) -> Result<()> {
    let presenter: Arc<dyn Presenter> = Arc::new(ConsolePresenter::stdout());

    let mut orchestrator = TurnOrchestrator::new(
        settings,
        Box::new(OpenAiBackend::new(settings)?),
        Box::new(SerperSearch::new(settings)?),
        Box::new(HttpPageFetcher::new(settings)?),
        presenter,
    );

    let stdin = BufReader::new(tokio::io::stdin());
    run_session(&mut orchestrator, stdin, &mut io::stdout()).await
}

/// Read utterances from `input` until end of input, an exit command or
/// Ctrl-C. Banner, prompt and farewell go to `out`.
pub async fn run_session<R, W>(
    orchestrator: &mut TurnOrchestrator,
    mut input: R,
    out: &mut W,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    writeln!(out, "Chatbot listo. Escribe tu pregunta (o 'salir').")?;
    let mut raw = Vec::new();

    loop {
        write!(out, "> Usuario: ")?;
        out.flush()?;

        raw.clear();
        let read = tokio::select! {
            read = input.read_until(b'\n', &mut raw) => read?,
            _ = tokio::signal::ctrl_c() => 0,
        };

        if read == 0 {
            writeln!(out, "\nSaliendo...")?;
            break;
        }

        let Some(utterance) = decode_line(&raw) else {
            continue;
        };
        if is_exit_command(&utterance) {
            writeln!(out, "Hasta luego 👋")?;
            break;
        }

        tokio::select! {
            outcome = orchestrator.handle_turn(&utterance) => {
                if let Err(e) = outcome {
                    debug!(error = %e, "Turn failed, waiting for next input");
                }
            }
            _ = tokio::signal::ctrl_c() => {
                warn!("Interrupted during a turn");
                writeln!(out, "\nSaliendo...")?;
                break;
            }
        }
    }

    info!(entries = orchestrator.transcript().len(), "Session finished");
    Ok(())
}

/// Line without its terminator, or `None` when it is blank. Bytes that
/// are not UTF-8 (a Latin-1 terminal, say) become U+FFFD.
fn decode_line(raw: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(raw);
    if let Cow::Owned(_) = text {
        warn!(bytes = raw.len(), "Input line was not valid UTF-8");
    }

    let line = text.trim_end_matches(['\n', '\r']);
    if line.trim().is_empty() {
        None
    } else {
        Some(line.to_string())
    }
}
