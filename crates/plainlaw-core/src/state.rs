//! UI-agnostic workflow state types
//!
//! These structures are shared by every front end and carry no dependency on
//! a particular UI framework.

use serde::{Deserialize, Serialize};

/// The author of a chat turn. Serialized as `"user"` / `"ai"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Ai,
}

/// A single chat turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
    /// Locally generated warning; shown to the user but never sent back as history.
    #[serde(skip)]
    pub warning: bool,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into(), warning: false }
    }

    pub fn ai(content: impl Into<String>) -> Self {
        Self { role: Role::Ai, content: content.into(), warning: false }
    }

    pub fn ai_warning(content: impl Into<String>) -> Self {
        Self { role: Role::Ai, content: content.into(), warning: true }
    }
}

/// Append-only, insertion-ordered chat history for one session.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Turns that make up the conversation sent to the backend.
    pub fn history(&self) -> Vec<Turn> {
        self.turns.iter().filter(|t| !t.warning).cloned().collect()
    }
}

/// Lifecycle of one backend-bound operation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RequestState {
    #[default]
    Idle,
    InFlight,
    Succeeded,
    Failed(String),
}

impl RequestState {
    pub fn is_in_flight(&self) -> bool {
        matches!(self, RequestState::InFlight)
    }
}
