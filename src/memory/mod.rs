//! Conversational session store
//!
//! One bounded transcript per session, held in a sharded map so concurrent
//! sessions never contend on a single lock.

pub mod store;

pub use store::{ConversationHistory, ConversationTurn, TurnRole, DEFAULT_MAX_TURNS};

use crate::models::SessionId;
use dashmap::DashMap;
use tracing::debug;

pub struct SessionStore {
    sessions: DashMap<SessionId, ConversationHistory>,
    max_turns: usize,
}

impl SessionStore {
    pub fn new(max_turns: usize) -> Self {
        Self {
            sessions: DashMap::new(),
            max_turns,
        }
    }

    /// Rendered transcript for the prompt; empty for unknown sessions.
    pub fn history_text(&self, session: SessionId) -> String {
        self.sessions
            .get(&session)
            .map(|history| history.render())
            .unwrap_or_default()
    }

    /// Both turns land under one shard lock.
    pub fn append_exchange(&self, session: SessionId, user_text: &str, assistant_text: &str) {
        let mut history = self
            .sessions
            .entry(session)
            .or_insert_with(|| ConversationHistory::new(self.max_turns));
        history.push_exchange(user_text, assistant_text);
        debug!(session_id = %session, turns = history.len(), "Transcript updated");
    }

    pub fn transcript(&self, session: SessionId) -> Vec<ConversationTurn> {
        self.sessions
            .get(&session)
            .map(|history| history.turns().cloned().collect())
            .unwrap_or_default()
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_TURNS)
    }
}
