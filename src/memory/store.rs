//! Conversation transcript storage
//!
//! A bounded ring buffer of turns. When full, the oldest turns are dropped.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

pub const DEFAULT_MAX_TURNS: usize = 40;

/// Who produced a turn
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
}

/// A single turn in the transcript
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: TurnRole,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl ConversationTurn {
    pub fn new(role: TurnRole, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(TurnRole::User, text)
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(TurnRole::Assistant, text)
    }
}

/// Transcript for one session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationHistory {
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    turns: VecDeque<ConversationTurn>,
    max_turns: usize,
}

impl ConversationHistory {
    /// `max_turns` counts individual turns (a user/assistant exchange is two).
    /// Zero is treated as one.
    pub fn new(max_turns: usize) -> Self {
        let max_turns = max_turns.max(1);
        Self {
            created_at: Utc::now(),
            updated_at: Utc::now(),
            turns: VecDeque::with_capacity(max_turns),
            max_turns,
        }
    }

    pub fn push(&mut self, turn: ConversationTurn) {
        while self.turns.len() >= self.max_turns {
            self.turns.pop_front();
        }
        self.turns.push_back(turn);
        self.updated_at = Utc::now();
    }

    /// Append one user/assistant exchange.
    pub fn push_exchange(&mut self, user_text: impl Into<String>, assistant_text: impl Into<String>) {
        self.push(ConversationTurn::user(user_text));
        self.push(ConversationTurn::assistant(assistant_text));
    }

    pub fn turns(&self) -> impl Iterator<Item = &ConversationTurn> {
        self.turns.iter()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn max_turns(&self) -> usize {
        self.max_turns
    }

    /// Prompt rendering: one `User: …` / `AI: …` line per turn.
    pub fn render(&self) -> String {
        self.turns
            .iter()
            .map(|turn| match turn.role {
                TurnRole::User => format!("User: {}", turn.text),
                TurnRole::Assistant => format!("AI: {}", turn.text),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Default for ConversationHistory {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_TURNS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_format() {
        let mut history = ConversationHistory::default();
        history.push_exchange("Show travel cards", "Here are some travel cards.");

        assert_eq!(history.render(), "User: Show travel cards\nAI: Here are some travel cards.");
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn test_empty_history_renders_empty() {
        let history = ConversationHistory::default();
        assert!(history.is_empty());
        assert_eq!(history.render(), "");
    }

    #[test]
    fn test_ring_buffer_drops_oldest() {
        let mut history = ConversationHistory::new(4);
        for i in 0..5 {
            history.push_exchange(format!("q{}", i), format!("a{}", i));
        }

        assert_eq!(history.len(), 4);
        let texts: Vec<&str> = history.turns().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["q3", "a3", "q4", "a4"]);
    }

    #[test]
    fn test_zero_bound_keeps_latest_turn() {
        let mut history = ConversationHistory::new(0);
        history.push(ConversationTurn::user("first"));
        history.push(ConversationTurn::user("second"));

        assert_eq!(history.max_turns(), 1);
        assert_eq!(history.render(), "User: second");
    }
}
