//! Text generation backends.
//!
//! A [`Generator`] takes a batch of flat prompts and returns one completion
//! per prompt, in order, with the reason each one stopped. The loop relies on
//! the stop reason to tell code-requesting items from finished ones, so
//! implementations must report stop-string hits per item.

use async_trait::async_trait;

use crate::core_types::GeneratedTurn;
use crate::errors::AgentError;

pub mod http;

pub use http::HttpGenerator;

/// Sampling settings for one generation call.
#[derive(Debug, Clone)]
pub struct GenerationParams {
    pub max_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
    pub stop: Vec<String>,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            max_tokens: 1024,
            temperature: 0.7,
            top_p: 1.0,
            stop: Vec::new(),
        }
    }
}

#[async_trait]
pub trait Generator: Send + Sync {
    /// Generates one completion per prompt, preserving order. Returning a
    /// different number of turns than prompts is a contract violation the
    /// loop rejects with [`AgentError::BatchMismatch`].
    async fn generate(
        &self,
        prompts: &[String],
        params: &GenerationParams,
    ) -> Result<Vec<GeneratedTurn>, AgentError>;
}
