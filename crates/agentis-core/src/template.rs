//! Chat template rendering.
//!
//! Conversations are flattened to the plain-text transcripts a completion
//! endpoint expects. Rendering must be deterministic: the loop reconstructs
//! transcripts by concatenating onto previously rendered text, so the same
//! conversation has to render to the same string every time.

use tera::{Context, Tera};

use crate::core_types::Conversation;
use crate::errors::AgentError;

/// The default ChatML layout used when a model ships no template of its own.
pub const CHATML_TEMPLATE: &str = "{% for message in messages %}<|im_start|>{{ message.role }}\n{{ message.content }}<|im_end|>\n{% endfor %}{% if add_generation_prompt %}<|im_start|>assistant\n{% endif %}";

pub trait ChatTemplate: Send + Sync {
    /// Renders a conversation to a flat prompt. With `add_generation_prompt`
    /// the rendered text ends with the assistant turn opener so the model
    /// continues as the assistant.
    fn render(
        &self,
        conversation: &Conversation,
        add_generation_prompt: bool,
    ) -> Result<String, AgentError>;
}

/// Template backed by a Tera source string.
///
/// The template sees two variables: `messages`, the conversation's message
/// list with `role` and `content` fields, and the `add_generation_prompt`
/// flag.
pub struct TeraChatTemplate {
    template: String,
}

impl TeraChatTemplate {
    pub fn new(template: String) -> Self {
        Self { template }
    }

    pub fn chatml() -> Self {
        Self::new(CHATML_TEMPLATE.to_string())
    }
}

impl Default for TeraChatTemplate {
    fn default() -> Self {
        Self::chatml()
    }
}

impl ChatTemplate for TeraChatTemplate {
    fn render(
        &self,
        conversation: &Conversation,
        add_generation_prompt: bool,
    ) -> Result<String, AgentError> {
        let mut context = Context::new();
        context.insert("messages", &conversation.messages);
        context.insert("add_generation_prompt", &add_generation_prompt);

        Tera::one_off(&self.template, &context, false)
            .map_err(|e| AgentError::TemplateError(format!("Failed to render chat template: {}", e)))
    }
}
