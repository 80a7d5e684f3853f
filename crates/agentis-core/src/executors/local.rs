use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;

use super::{CodeExecutor, ExecutionOutcome};

/// Executor that runs code with a local interpreter subprocess.
///
/// Every failure mode surfaces as [`ExecutionOutcome::Error`] text: a missing
/// interpreter, a nonzero exit, a kill by signal, a timeout. Callers never
/// see a propagated error from this executor.
pub struct LocalExecutor {
    interpreter: String,
    args: Vec<String>,
    timeout: Option<Duration>,
}

impl LocalExecutor {
    pub fn new() -> Self {
        Self {
            interpreter: "python3".to_string(),
            args: vec!["-c".to_string()],
            timeout: None,
        }
    }

    /// Replaces the interpreter invocation. The code is appended as the
    /// final argument after `args`.
    pub fn with_interpreter(mut self, interpreter: String, args: Vec<String>) -> Self {
        self.interpreter = interpreter;
        self.args = args;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

impl Default for LocalExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CodeExecutor for LocalExecutor {
    async fn execute(&self, code: &str) -> ExecutionOutcome {
        let mut command = Command::new(&self.interpreter);
        command.args(&self.args).arg(code);
        // A timeout drops the output future; the child must go with it.
        command.kill_on_drop(true);

        let result = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, command.output()).await {
                Ok(result) => result,
                Err(_) => {
                    return ExecutionOutcome::Error(format!(
                        "Error executing code: timed out after {:?}",
                        limit
                    ))
                }
            },
            None => command.output().await,
        };

        let output = match result {
            Ok(output) => output,
            Err(e) => return ExecutionOutcome::Error(format!("Error executing code: {}", e)),
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        if output.status.success() {
            if stderr.is_empty() {
                ExecutionOutcome::Success(stdout.into_owned())
            } else {
                ExecutionOutcome::Success(format!("{}{}", stdout, stderr))
            }
        } else {
            match output.status.code() {
                Some(code) => ExecutionOutcome::Error(format!(
                    "Error executing code: exit code {}:\n{}{}",
                    code, stdout, stderr
                )),
                None => ExecutionOutcome::Error(format!(
                    "Error executing code: terminated by signal:\n{}{}",
                    stdout, stderr
                )),
            }
        }
    }
}
