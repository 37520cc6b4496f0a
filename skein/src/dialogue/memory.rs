//! Append-only turn buffer for the dialogue front.

/// One recorded turn: who said it, and what.
#[derive(Debug, Clone)]
pub struct DialogueTurn {
    pub role: String,
    pub text: String,
}

/// Append-only conversation history for a single dialogue session. Unlike
/// [`crate::memory::Store`], this never expires or evicts entries; it backs
/// the chat loop's own rendering, not long-term recall.
#[derive(Debug, Clone, Default)]
pub struct EkoMemory {
    turns: Vec<DialogueTurn>,
}

impl EkoMemory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, role: impl Into<String>, text: impl Into<String>) {
        self.turns.push(DialogueTurn {
            role: role.into(),
            text: text.into(),
        });
    }

    pub fn turns(&self) -> &[DialogueTurn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Renders the buffer as `role: text` lines, the shape the planner and
    /// executor tools fold into their own prompts.
    pub fn render(&self) -> String {
        self.turns
            .iter()
            .map(|t| format!("{}: {}", t.role, t.text))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
