//! Core type definitions for the agent loop
//!
//! This module defines the data structures shared by the conversation builder,
//! the generation backends, and the round loop. Messages follow the role and
//! content shape that chat templates expect, while the stop reason and turn
//! types carry the per-item termination information the loop routes on.

use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// An ordered list of chat messages for a single agent item.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct Conversation {
    pub messages: Vec<Message>,
}

impl Conversation {
    /// Builds a conversation holding a single user message.
    pub fn from_prompt(prompt: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::user(prompt)],
        }
    }

    pub fn starts_with_system(&self) -> bool {
        matches!(self.messages.first(), Some(m) if m.role == Role::System)
    }
}

/// Why a generated completion ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// Generation hit one of the requested stop strings. The matched string
    /// is not part of the completion text.
    StopSequence(String),
    /// Anything else: end of sequence, token limit, provider-specific reasons.
    Other,
}

impl StopReason {
    pub fn is_stop_sequence(&self, marker: &str) -> bool {
        matches!(self, StopReason::StopSequence(s) if s == marker)
    }
}

/// One batch slot's result from a generation call.
#[derive(Debug, Clone)]
pub struct GeneratedTurn {
    pub completion: String,
    pub stop_reason: StopReason,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CompletionStatus {
    /// The item stopped for a reason other than the code-close marker.
    Finished,
    /// The item was still requesting executions when its round budget ran out.
    BudgetExhausted,
}

/// A finished agent item, in round-of-completion order.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CompletedConversation {
    pub transcript: String,
    pub rounds: usize,
    pub status: CompletionStatus,
}
