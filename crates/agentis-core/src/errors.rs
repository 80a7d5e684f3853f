//! Error types for failure handling across the agent loop
//!
//! Two layers of failure exist here. `AgentError` covers the loop and its
//! setup: generation transport failures, broken batch contracts, unreadable
//! tool scripts, template and configuration problems. `SandboxError` covers
//! the Docker-backed executor internally; it never crosses the executor
//! boundary, which reports every failure as output text instead.

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum AgentError {
    #[error("Generation request failed: {0}")]
    GenerationError(String),
    #[error("Generator returned {got} completions for {expected} prompts")]
    BatchMismatch { expected: usize, got: usize },
    #[error("Failed to read tools script '{path}': {message}")]
    ScriptReadError { path: String, message: String },
    #[error("Template rendering failed: {0}")]
    TemplateError(String),
    #[error("Search failed: {0}")]
    SearchError(String),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("I/O error: {0}")]
    IoError(String),
}

impl From<std::io::Error> for AgentError {
    fn from(err: std::io::Error) -> Self {
        AgentError::IoError(err.to_string())
    }
}

impl From<reqwest::Error> for AgentError {
    fn from(err: reqwest::Error) -> Self {
        AgentError::GenerationError(err.to_string())
    }
}

// Specific error for the sandboxed executor
#[derive(Error, Debug)]
pub enum SandboxError {
    #[error("Bollard (Docker client) error: {0}")]
    BollardError(#[from] bollard::errors::Error),
    #[error("Container execution failed with exit code {exit_code:?}:\nStdout: {stdout}\nStderr: {stderr}")]
    ContainerFailed {
        exit_code: Option<i64>,
        stdout: String,
        stderr: String,
    },
    #[error("I/O error during sandbox operation: {0}")]
    IoError(#[from] std::io::Error),
    #[error("UTF-8 decoding error from slice: {0}")]
    StrUtf8Error(#[from] std::str::Utf8Error),
    #[error("Could not create temporary file/directory: {0}")]
    TempFileError(String),
    #[error("Execution timed out after {0} seconds")]
    Timeout(u64),
}
