//! Round-based batch agent loop.
//!
//! The loop advances a working set of transcripts in rounds. Each round makes
//! a single batch generation call with the code-close marker as the stop
//! string. Items that stopped at the marker get their latest code block
//! extracted and executed, the output appended inside the output delimiters,
//! and stay in the working set; items that stopped for any other reason move
//! to the completed set. The working set can only shrink, and every item is
//! accounted for after every round: completed plus in-flight always equals
//! the initial batch size.

use std::sync::Arc;

use crate::conversation::ConversationBuilder;
use crate::core_types::{CompletedConversation, CompletionStatus};
use crate::errors::AgentError;
use crate::executors::CodeExecutor;
use crate::extract::extract_code;
use crate::generator::Generator;
use crate::template::ChatTemplate;
use crate::trace::RoundTraceHandler;

/// Markers, budgets, and sampling settings for a loop run.
#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub code_open: String,
    pub code_close: String,
    pub output_open: String,
    pub output_close: String,
    /// Most generation calls any single item may consume. An item that is
    /// still asking for executions past this bound completes as
    /// [`CompletionStatus::BudgetExhausted`] instead of looping forever.
    pub max_rounds: usize,
    pub generation: crate::generator::GenerationParams,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            code_open: "<code>".to_string(),
            code_close: "</code>".to_string(),
            output_open: "<output>".to_string(),
            output_close: "</output>".to_string(),
            max_rounds: 10,
            generation: crate::generator::GenerationParams::default(),
        }
    }
}

struct PendingItem {
    /// Position in the original batch, for logging.
    index: usize,
    transcript: String,
    rounds: usize,
}

pub struct AgentLoop {
    generator: Arc<dyn Generator>,
    executor: Arc<dyn CodeExecutor>,
    template: Arc<dyn ChatTemplate>,
    builder: ConversationBuilder,
    config: LoopConfig,
    trace_handler: Option<Arc<dyn RoundTraceHandler>>,
}

impl AgentLoop {
    pub fn new(
        generator: Arc<dyn Generator>,
        executor: Arc<dyn CodeExecutor>,
        template: Arc<dyn ChatTemplate>,
        builder: ConversationBuilder,
        config: LoopConfig,
    ) -> Self {
        Self {
            generator,
            executor,
            template,
            builder,
            config,
            trace_handler: None,
        }
    }

    pub fn set_trace_handler(&mut self, handler: Arc<dyn RoundTraceHandler>) {
        self.trace_handler = Some(handler);
    }

    /// Runs every prompt to completion and returns the finished
    /// conversations in round-of-completion order.
    pub async fn run(&self, prompts: &[String]) -> Result<Vec<CompletedConversation>, AgentError> {
        let conversations = self.builder.build(prompts);
        let transcripts = self
            .builder
            .render_all(self.template.as_ref(), &conversations)?;

        let initial = transcripts.len();
        let mut working: Vec<PendingItem> = transcripts
            .into_iter()
            .enumerate()
            .map(|(index, transcript)| PendingItem {
                index,
                transcript,
                rounds: 0,
            })
            .collect();
        let mut completed: Vec<CompletedConversation> = Vec::with_capacity(initial);

        let mut params = self.config.generation.clone();
        params.stop = vec![self.config.code_close.clone()];

        let mut round = 0;
        while !working.is_empty() {
            round += 1;
            log::info!("Round {}: {} item(s) in flight", round, working.len());

            let batch: Vec<String> = working
                .iter()
                .map(|item| item.transcript.clone())
                .collect();
            let turns = self.generator.generate(&batch, &params).await?;
            if turns.len() != working.len() {
                return Err(AgentError::BatchMismatch {
                    expected: working.len(),
                    got: turns.len(),
                });
            }

            let before = working.len();
            let mut still_working: Vec<PendingItem> = Vec::with_capacity(before);
            let mut completed_in_round = 0;

            for (mut item, turn) in working.into_iter().zip(turns) {
                item.transcript.push_str(&turn.completion);
                item.rounds += 1;

                if !turn.stop_reason.is_stop_sequence(&self.config.code_close) {
                    log::debug!("Item {} finished after {} round(s)", item.index, item.rounds);
                    completed.push(CompletedConversation {
                        transcript: item.transcript,
                        rounds: item.rounds,
                        status: CompletionStatus::Finished,
                    });
                    completed_in_round += 1;
                    continue;
                }

                if item.rounds >= self.config.max_rounds {
                    log::warn!(
                        "Item {} exhausted its budget of {} round(s)",
                        item.index,
                        self.config.max_rounds
                    );
                    completed.push(CompletedConversation {
                        transcript: item.transcript,
                        rounds: item.rounds,
                        status: CompletionStatus::BudgetExhausted,
                    });
                    completed_in_round += 1;
                    continue;
                }

                let code = extract_code(
                    &item.transcript,
                    &self.config.code_open,
                    self.builder.tools_script(),
                );
                let outcome = self.executor.execute(&code).await;
                if outcome.is_error() {
                    log::debug!("Item {} execution failed, feeding the error back", item.index);
                }

                item.transcript.push_str(&self.config.code_close);
                item.transcript.push_str(&self.config.output_open);
                item.transcript.push_str(outcome.as_text());
                item.transcript.push_str(&self.config.output_close);
                still_working.push(item);
            }

            working = still_working;
            debug_assert!(working.len() <= before);
            debug_assert_eq!(completed.len() + working.len(), initial);

            if let Some(handler) = &self.trace_handler {
                handler.on_round_complete(round, completed_in_round, working.len());
            }
        }

        log::info!(
            "Batch complete: {} conversation(s) in {} round(s)",
            completed.len(),
            round
        );
        Ok(completed)
    }
}
