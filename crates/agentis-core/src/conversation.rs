//! Conversation assembly for raw prompts.
//!
//! The builder turns each raw prompt into a single-user conversation with
//! exactly one leading system message. The system message is composed from
//! the base prompt, the environment description, and tool documentation,
//! which can come from a script's literal source text or from a rendered
//! tool list. The script text doubles as the helper prefix the extractor
//! prepends to executed code, so there is one source of truth for both.

use std::fs;
use std::path::Path;

use crate::core_types::{Conversation, Message};
use crate::errors::AgentError;
use crate::prompts::{DEFAULT_ENVIRONMENT_PROMPT, DEFAULT_SYSTEM_PROMPT};
use crate::template::ChatTemplate;

/// A tool made available to the model, documented by source or summary.
#[derive(Debug, Clone)]
pub struct ToolSpec {
    pub name: String,
    pub source: Option<String>,
    pub summary: Option<String>,
}

impl ToolSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: None,
            summary: None,
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }
}

#[derive(Debug, Clone)]
pub struct ConversationBuilder {
    system_prompt: String,
    environment_prompt: String,
    tools_script: Option<String>,
    tool_docs: Option<String>,
}

impl ConversationBuilder {
    pub fn new() -> Self {
        Self {
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            environment_prompt: DEFAULT_ENVIRONMENT_PROMPT.to_string(),
            tools_script: None,
            tool_docs: None,
        }
    }

    pub fn with_system_prompt(mut self, prompt: String) -> Self {
        self.system_prompt = prompt;
        self
    }

    pub fn with_environment_prompt(mut self, prompt: String) -> Self {
        self.environment_prompt = prompt;
        self
    }

    /// Attaches helper script text. It is shown to the model verbatim and
    /// prepended to every extracted code block at execution time.
    pub fn with_tools_script(mut self, script: String) -> Self {
        self.tools_script = Some(script);
        self
    }

    /// Reads the helper script from a file. An unreadable file is fatal at
    /// setup; the error names the offending path.
    pub fn with_tools_script_file<P: AsRef<Path>>(self, path: P) -> Result<Self, AgentError> {
        let path = path.as_ref();
        let script = fs::read_to_string(path).map_err(|e| AgentError::ScriptReadError {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Ok(self.with_tools_script(script))
    }

    /// Documents a tool list in the system message, preferring source code
    /// over summaries.
    pub fn with_tools(mut self, tools: &[ToolSpec]) -> Self {
        self.tool_docs = Some(render_tool_docs(tools));
        self
    }

    /// The helper script text, for the extractor.
    pub fn tools_script(&self) -> Option<&str> {
        self.tools_script.as_deref()
    }

    fn system_message(&self) -> Message {
        let mut parts = vec![self.system_prompt.clone(), self.environment_prompt.clone()];
        if let Some(script) = &self.tools_script {
            parts.push(script.clone());
        }
        if let Some(docs) = &self.tool_docs {
            parts.push(docs.clone());
        }
        Message::system(parts.join("\n"))
    }

    /// One single-user conversation per prompt, each with its system message.
    pub fn build(&self, prompts: &[String]) -> Vec<Conversation> {
        prompts.iter().map(|p| self.conversation(p)).collect()
    }

    pub fn conversation(&self, prompt: &str) -> Conversation {
        let mut conversation = Conversation::from_prompt(prompt);
        self.ensure_system(&mut conversation);
        conversation
    }

    /// Prepends the system message unless the conversation already starts
    /// with one. Safe to apply repeatedly.
    pub fn ensure_system(&self, conversation: &mut Conversation) {
        if !conversation.starts_with_system() {
            conversation.messages.insert(0, self.system_message());
        }
    }

    /// Applies the system message to conversations built elsewhere.
    pub fn prepare(&self, conversations: &mut [Conversation]) {
        for conversation in conversations.iter_mut() {
            self.ensure_system(conversation);
        }
    }

    /// Renders every conversation with the assistant turn opened.
    pub fn render_all(
        &self,
        template: &dyn ChatTemplate,
        conversations: &[Conversation],
    ) -> Result<Vec<String>, AgentError> {
        conversations
            .iter()
            .map(|c| template.render(c, true))
            .collect()
    }
}

impl Default for ConversationBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn render_tool_docs(tools: &[ToolSpec]) -> String {
    let mut docs = String::from("Available tools:\n");
    for tool in tools {
        docs.push_str(&format!("\nTool: {}\n", tool.name));
        if let Some(source) = &tool.source {
            docs.push_str(&format!("Source code:\n{}\n", source));
        } else if let Some(summary) = &tool.summary {
            docs.push_str(&format!("Documentation:\n{}\n", summary));
        } else {
            docs.push_str("No documentation available\n");
        }
    }
    docs
}
