//! YAML configuration for assembling the agent loop.
//!
//! Every field has a default so a minimal file (or none at all) yields a
//! runnable configuration. Loading validates eagerly: a config that parses
//! but cannot drive a run is rejected up front with a message naming the
//! offending field.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::agent::LoopConfig;
use crate::errors::AgentError;
use crate::generator::GenerationParams;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AgentisConfig {
    #[serde(default)]
    pub generator: GeneratorConfig,
    #[serde(default)]
    pub executor: ExecutorConfig,
    #[serde(default)]
    pub agent: AgentSettings,
    #[serde(default)]
    pub prompts: PromptSettings,
    #[serde(default)]
    pub tools: ToolSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_top_p")]
    pub top_p: f32,
    #[serde(default = "default_request_timeout")]
    pub timeout_seconds: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            model: default_model(),
            api_key: None,
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            top_p: default_top_p(),
            timeout_seconds: default_request_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ExecutorConfig {
    Sandbox {
        #[serde(default = "default_image")]
        image: String,
        #[serde(default)]
        dependencies: Vec<String>,
        #[serde(default = "default_execution_timeout")]
        timeout_seconds: u64,
    },
    Local {
        #[serde(default = "default_interpreter")]
        interpreter: String,
        #[serde(default = "default_interpreter_args")]
        args: Vec<String>,
        #[serde(default = "default_execution_timeout")]
        timeout_seconds: u64,
    },
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        ExecutorConfig::Local {
            interpreter: default_interpreter(),
            args: default_interpreter_args(),
            timeout_seconds: default_execution_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSettings {
    #[serde(default = "default_max_rounds")]
    pub max_rounds: usize,
    #[serde(default = "default_code_open")]
    pub code_open: String,
    #[serde(default = "default_code_close")]
    pub code_close: String,
    #[serde(default = "default_output_open")]
    pub output_open: String,
    #[serde(default = "default_output_close")]
    pub output_close: String,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            max_rounds: default_max_rounds(),
            code_open: default_code_open(),
            code_close: default_code_close(),
            output_open: default_output_open(),
            output_close: default_output_close(),
        }
    }
}

/// Prompt overrides. `None` falls back to the library defaults.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PromptSettings {
    #[serde(default)]
    pub system: Option<String>,
    #[serde(default)]
    pub environment: Option<String>,
    /// Tera source for the chat template; ChatML when absent.
    #[serde(default)]
    pub chat_template: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ToolSettings {
    /// Helper script whose text is shown to the model and prepended to
    /// every executed code block.
    #[serde(default)]
    pub script_file: Option<String>,
    /// Document the built-in web search helper in the system message.
    #[serde(default)]
    pub include_search_docs: bool,
}

fn default_api_base() -> String {
    "http://localhost:8000/v1".to_string()
}

fn default_model() -> String {
    "default".to_string()
}

fn default_max_tokens() -> u32 {
    1024
}

fn default_temperature() -> f32 {
    0.7
}

fn default_top_p() -> f32 {
    1.0
}

fn default_request_timeout() -> u64 {
    120
}

fn default_image() -> String {
    "python:3.10-slim".to_string()
}

fn default_interpreter() -> String {
    "python3".to_string()
}

fn default_interpreter_args() -> Vec<String> {
    vec!["-c".to_string()]
}

fn default_execution_timeout() -> u64 {
    30
}

fn default_max_rounds() -> usize {
    10
}

fn default_code_open() -> String {
    "<code>".to_string()
}

fn default_code_close() -> String {
    "</code>".to_string()
}

fn default_output_open() -> String {
    "<output>".to_string()
}

fn default_output_close() -> String {
    "</output>".to_string()
}

impl AgentisConfig {
    pub fn validate(&self) -> Result<(), AgentError> {
        if self.generator.api_base.trim().is_empty() {
            return Err(AgentError::ConfigError(
                "generator.api_base must not be empty".to_string(),
            ));
        }
        if self.generator.model.trim().is_empty() {
            return Err(AgentError::ConfigError(
                "generator.model must not be empty".to_string(),
            ));
        }
        if !(0.0..=2.0).contains(&self.generator.temperature) {
            return Err(AgentError::ConfigError(format!(
                "generator.temperature must be between 0.0 and 2.0, got {}",
                self.generator.temperature
            )));
        }
        if !(0.0..=1.0).contains(&self.generator.top_p) {
            return Err(AgentError::ConfigError(format!(
                "generator.top_p must be between 0.0 and 1.0, got {}",
                self.generator.top_p
            )));
        }
        if self.generator.timeout_seconds == 0 {
            return Err(AgentError::ConfigError(
                "generator.timeout_seconds must be at least 1".to_string(),
            ));
        }
        if self.agent.max_rounds == 0 {
            return Err(AgentError::ConfigError(
                "agent.max_rounds must be at least 1".to_string(),
            ));
        }

        let markers = [
            ("agent.code_open", &self.agent.code_open),
            ("agent.code_close", &self.agent.code_close),
            ("agent.output_open", &self.agent.output_open),
            ("agent.output_close", &self.agent.output_close),
        ];
        for (name, marker) in &markers {
            if marker.is_empty() {
                return Err(AgentError::ConfigError(format!(
                    "{} must not be empty",
                    name
                )));
            }
        }
        // A marker reused for another role makes transcripts ambiguous.
        for (i, (name_a, marker_a)) in markers.iter().enumerate() {
            for (name_b, marker_b) in &markers[i + 1..] {
                if marker_a == marker_b {
                    return Err(AgentError::ConfigError(format!(
                        "{} and {} must differ",
                        name_a, name_b
                    )));
                }
            }
        }

        match &self.executor {
            ExecutorConfig::Sandbox {
                image,
                timeout_seconds,
                ..
            } => {
                if image.trim().is_empty() {
                    return Err(AgentError::ConfigError(
                        "executor.image must not be empty".to_string(),
                    ));
                }
                if *timeout_seconds == 0 {
                    return Err(AgentError::ConfigError(
                        "executor.timeout_seconds must be at least 1".to_string(),
                    ));
                }
            }
            ExecutorConfig::Local {
                interpreter,
                timeout_seconds,
                ..
            } => {
                if interpreter.trim().is_empty() {
                    return Err(AgentError::ConfigError(
                        "executor.interpreter must not be empty".to_string(),
                    ));
                }
                if *timeout_seconds == 0 {
                    return Err(AgentError::ConfigError(
                        "executor.timeout_seconds must be at least 1".to_string(),
                    ));
                }
            }
        }

        Ok(())
    }

    pub fn generation_params(&self) -> GenerationParams {
        GenerationParams {
            max_tokens: self.generator.max_tokens,
            temperature: self.generator.temperature,
            top_p: self.generator.top_p,
            stop: Vec::new(),
        }
    }

    pub fn loop_config(&self) -> LoopConfig {
        LoopConfig {
            code_open: self.agent.code_open.clone(),
            code_close: self.agent.code_close.clone(),
            output_open: self.agent.output_open.clone(),
            output_close: self.agent.output_close.clone(),
            max_rounds: self.agent.max_rounds,
            generation: self.generation_params(),
        }
    }
}

/// Configuration loader for YAML files
pub struct ConfigLoader;

impl ConfigLoader {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<AgentisConfig, AgentError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            AgentError::ConfigError(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_str(&content)
    }

    pub fn from_str(content: &str) -> Result<AgentisConfig, AgentError> {
        let config: AgentisConfig = serde_yaml::from_str(content)
            .map_err(|e| AgentError::ConfigError(format!("Failed to parse YAML config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }
}
