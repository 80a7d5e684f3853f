//! Code execution backends for the agent loop.
//!
//! Executors run the code blocks the model writes and report the result as
//! plain text. The boundary is deliberately infallible: whatever goes wrong
//! (bad code, a dead interpreter, a timeout) comes back as
//! [`ExecutionOutcome::Error`] so the loop can append it to the transcript
//! and let the model react to it.

use async_trait::async_trait;

pub mod local;
pub mod sandbox;

pub use local::LocalExecutor;
pub use sandbox::SandboxExecutor;

/// The result of running one code block, as shown to the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionOutcome {
    Success(String),
    Error(String),
}

impl ExecutionOutcome {
    /// The output text, whichever way the execution went.
    pub fn as_text(&self) -> &str {
        match self {
            ExecutionOutcome::Success(text) | ExecutionOutcome::Error(text) => text,
        }
    }

    pub fn into_text(self) -> String {
        match self {
            ExecutionOutcome::Success(text) | ExecutionOutcome::Error(text) => text,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ExecutionOutcome::Error(_))
    }
}

#[async_trait]
pub trait CodeExecutor: Send + Sync {
    async fn execute(&self, code: &str) -> ExecutionOutcome;
}
