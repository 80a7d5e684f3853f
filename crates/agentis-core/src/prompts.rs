//! Default prompt text for the agent loop.

/// Base system prompt used when the configuration supplies none.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant that answers questions and solves problems. When running code would help, write it between <code> and </code> tags and it will be executed for you.";

/// Describes the execution environment to the model.
pub const DEFAULT_ENVIRONMENT_PROMPT: &str = "Code between <code> and </code> runs in a Python interpreter. Anything printed to stdout comes back between <output> and </output> tags. State does not persist between runs, so each code block must be self-contained.";
