//! Append-only conversation transcript

use crate::models::{Role, TranscriptEntry};

/// Ordered conversation history for one chat session.
///
/// Entries are never edited or removed. `snapshot` hands out an owned copy,
/// so a caller iterating over history never sees later appends.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    entries: Vec<TranscriptEntry>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a transcript with a system prompt as its first entry.
    pub fn with_system_prompt(prompt: impl Into<String>) -> Self {
        let mut transcript = Self::new();
        transcript.append(Role::System, prompt, None, None);
        transcript
    }

    /// Add an entry to the end of the history.
    pub fn append(
        &mut self,
        role: Role,
        content: impl Into<String>,
        name: Option<String>,
        tool_call_id: Option<String>,
    ) {
        self.entries
            .push(TranscriptEntry::new(role, content, name, tool_call_id));
    }

    pub fn append_user(&mut self, content: impl Into<String>) {
        self.append(Role::User, content, None, None);
    }

    pub fn append_assistant(&mut self, content: impl Into<String>) {
        self.append(Role::Assistant, content, None, None);
    }

    /// Independent copy of every entry appended so far.
    pub fn snapshot(&self) -> Vec<TranscriptEntry> {
        self.entries.clone()
    }

    /// Iterate without copying
    pub fn entries(&self) -> impl Iterator<Item = &TranscriptEntry> {
        self.entries.iter()
    }

    pub fn last(&self) -> Option<&TranscriptEntry> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_preserves_order() {
        let mut transcript = Transcript::with_system_prompt("Eres un asistente útil.");
        transcript.append_user("¿Qué es el RSI?");
        transcript.append_assistant("Un oscilador de momento.");

        let roles: Vec<Role> = transcript.entries().map(|e| e.role).collect();
        assert_eq!(roles, vec![Role::System, Role::User, Role::Assistant]);
        assert_eq!(transcript.len(), 3);
    }

    #[test]
    fn test_snapshot_is_idempotent() {
        let mut transcript = Transcript::new();
        transcript.append_user("hola");

        assert_eq!(transcript.snapshot(), transcript.snapshot());
    }

    #[test]
    fn test_snapshot_is_independent_of_later_appends() {
        let mut transcript = Transcript::new();
        transcript.append_user("primera");
        let before = transcript.snapshot();

        transcript.append_assistant("respuesta");

        assert_eq!(before.len(), 1);
        assert_eq!(transcript.snapshot().len(), 2);
        assert_eq!(transcript.snapshot()[0], before[0]);
    }
}
