//! Conversation turns and the in-memory transcript.
//!
//! These are the value objects that flow through the system: the user
//! submits a turn, the routing pipeline produces an assistant turn (answer
//! plus phase log), and the chat surface appends both to the transcript.
//! The transcript is session-scoped and never persisted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The role of a turn's author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The end user
    User,
    /// The agent
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single turn in the conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    /// Unique turn ID
    pub id: String,

    /// Who authored this turn
    pub role: Role,

    /// The text content
    pub content: String,

    /// Phase log produced while answering (assistant turns only)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub logs: Vec<String>,

    /// Timestamp
    pub timestamp: DateTime<Utc>,
}

impl Turn {
    /// Create a new user turn.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role: Role::User,
            content: content.into(),
            logs: Vec::new(),
            timestamp: Utc::now(),
        }
    }

    /// Create a new assistant turn.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role: Role::Assistant,
            content: content.into(),
            logs: Vec::new(),
            timestamp: Utc::now(),
        }
    }

    /// Create an assistant turn carrying its phase log.
    pub fn assistant_with_logs(content: impl Into<String>, logs: Vec<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role: Role::Assistant,
            content: content.into(),
            logs,
            timestamp: Utc::now(),
        }
    }
}

/// An ordered, append-only sequence of turns for one session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcript {
    /// Ordered turns
    pub turns: Vec<Turn>,

    /// When this session started
    pub created_at: DateTime<Utc>,

    /// When the last turn was added
    pub updated_at: DateTime<Utc>,
}

impl Transcript {
    /// Create a new empty transcript.
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            turns: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Add a turn to the transcript.
    pub fn push(&mut self, turn: Turn) {
        self.updated_at = Utc::now();
        self.turns.push(turn);
    }

    /// Drop all turns, keeping the session alive.
    pub fn clear(&mut self) {
        self.updated_at = Utc::now();
        self.turns.clear();
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// The phase log of the most recent assistant turn, if any.
    pub fn last_logs(&self) -> Option<&[String]> {
        self.turns
            .iter()
            .rev()
            .find(|t| t.role == Role::Assistant)
            .map(|t| t.logs.as_slice())
    }
}

impl Default for Transcript {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_user_turn() {
        let turn = Turn::user("What is 7 factorial?");
        assert_eq!(turn.role, Role::User);
        assert_eq!(turn.content, "What is 7 factorial?");
        assert!(turn.logs.is_empty());
    }

    #[test]
    fn transcript_tracks_updates() {
        let mut transcript = Transcript::new();
        let created = transcript.created_at;

        transcript.push(Turn::user("First turn"));
        assert_eq!(transcript.len(), 1);
        assert!(transcript.updated_at >= created);
    }

    #[test]
    fn turn_serialization_roundtrip() {
        let turn = Turn::assistant_with_logs("4", vec!["Process Complete.".into()]);
        let json = serde_json::to_string(&turn).unwrap();
        let deserialized: Turn = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized.content, "4");
        assert_eq!(deserialized.role, Role::Assistant);
        assert_eq!(deserialized.logs.len(), 1);
    }

    #[test]
    fn last_logs_skips_user_turns() {
        let mut transcript = Transcript::new();
        transcript.push(Turn::user("q1"));
        transcript.push(Turn::assistant_with_logs("a1", vec!["Phase 2: Router deciding tool...".into()]));
        transcript.push(Turn::user("q2"));

        let logs = transcript.last_logs().unwrap();
        assert_eq!(logs.len(), 1);
        assert!(logs[0].contains("Router"));
    }

    #[test]
    fn clear_empties_turns() {
        let mut transcript = Transcript::new();
        transcript.push(Turn::user("hello"));
        transcript.clear();
        assert!(transcript.is_empty());
    }
}
