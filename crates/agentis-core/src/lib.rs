//! Core framework for running batches of code-interpreter agent conversations.
//!
//! This crate drives multi-turn interactions between a text generation backend
//! and a code execution backend. Raw prompts become chat conversations, are
//! rendered to flat transcripts, and advance in rounds: each round sends every
//! in-flight transcript to the generator in a single batch call, executes the
//! code blocks of the transcripts that stopped at the code-close marker, and
//! appends the execution output so the next round can react to it.
//!
//! # Architecture Overview
//!
//! The crate is organized around a few seams:
//!
//! - **Loop orchestration**: round scheduling, completion tracking, and budgets
//! - **Generation**: provider-agnostic batch completion interface with an
//!   OpenAI-compatible HTTP client
//! - **Execution environments**: sandboxed execution via Docker and a local
//!   subprocess runtime, both reporting failures as text rather than errors
//! - **Conversation assembly**: system prompt composition, tool documentation,
//!   and chat template rendering
//! - **Configuration system**: YAML configuration with validated defaults

pub mod agent;
pub mod config;
pub mod conversation;
pub mod core_types;
pub mod errors;
pub mod executors;
pub mod extract;
pub mod generator;
pub mod prompts;
pub mod search;
pub mod template;
pub mod trace;

pub use agent::{AgentLoop, LoopConfig};
pub use config::{AgentisConfig, ConfigLoader};
pub use conversation::{ConversationBuilder, ToolSpec};
pub use core_types::{
    CompletedConversation, CompletionStatus, Conversation, GeneratedTurn, Message, Role, StopReason,
};
pub use errors::{AgentError, SandboxError};
pub use executors::{CodeExecutor, ExecutionOutcome, LocalExecutor, SandboxExecutor};
pub use generator::{GenerationParams, Generator, HttpGenerator};
pub use template::{ChatTemplate, TeraChatTemplate};

#[cfg(test)]
pub mod test_utils;
