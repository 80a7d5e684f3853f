use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use crate::core_types::{GeneratedTurn, StopReason};
use crate::errors::AgentError;
use crate::generator::{GenerationParams, Generator};

/// Client for an OpenAI-compatible `/completions` endpoint.
///
/// Targets batch-capable servers in the vLLM mold: the request carries the
/// whole prompt array, choices come back tagged with their batch `index`,
/// and the non-standard `stop_reason` field names the stop string a choice
/// ended on. A choice without a string `stop_reason` counts as
/// [`StopReason::Other`].
#[derive(Debug, Clone)]
pub struct HttpGenerator {
    client: Client,
    api_base: String,
    model: String,
    api_key: Option<String>,
}

impl HttpGenerator {
    pub fn new(api_base: String, model: String) -> Self {
        Self {
            client: Client::new(),
            api_base: api_base.trim_end_matches('/').to_string(),
            model,
            api_key: None,
        }
    }

    pub fn with_api_key(mut self, api_key: String) -> Self {
        self.api_key = Some(api_key);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());
        self
    }

    fn build_request_body(&self, prompts: &[String], params: &GenerationParams) -> Value {
        let mut body = json!({
            "model": self.model,
            "prompt": prompts,
            "max_tokens": params.max_tokens,
            "temperature": params.temperature,
            "top_p": params.top_p,
        });

        if !params.stop.is_empty() {
            body["stop"] = json!(params.stop);
        }

        body
    }

    fn parse_response(&self, response: &Value, expected: usize) -> Result<Vec<GeneratedTurn>, AgentError> {
        let choices = response
            .get("choices")
            .and_then(|c| c.as_array())
            .ok_or_else(|| {
                AgentError::GenerationError("Response missing 'choices' array".to_string())
            })?;

        let mut turns: Vec<Option<GeneratedTurn>> = vec![None; expected];
        for choice in choices {
            let index = choice
                .get("index")
                .and_then(|i| i.as_u64())
                .ok_or_else(|| {
                    AgentError::GenerationError("Choice missing 'index'".to_string())
                })? as usize;
            if index >= expected {
                return Err(AgentError::GenerationError(format!(
                    "Choice index {} out of range for batch of {}",
                    index, expected
                )));
            }

            let completion = choice
                .get("text")
                .and_then(|t| t.as_str())
                .unwrap_or("")
                .to_string();
            let stop_reason = match choice.get("stop_reason") {
                Some(Value::String(s)) => StopReason::StopSequence(s.clone()),
                _ => StopReason::Other,
            };

            turns[index] = Some(GeneratedTurn {
                completion,
                stop_reason,
            });
        }

        let turns: Vec<GeneratedTurn> = turns.into_iter().flatten().collect();
        if turns.len() != expected {
            return Err(AgentError::BatchMismatch {
                expected,
                got: turns.len(),
            });
        }
        Ok(turns)
    }
}

#[async_trait]
impl Generator for HttpGenerator {
    async fn generate(
        &self,
        prompts: &[String],
        params: &GenerationParams,
    ) -> Result<Vec<GeneratedTurn>, AgentError> {
        let url = format!("{}/completions", self.api_base);
        let body = self.build_request_body(prompts, params);

        log::debug!("Completion request to {} for {} prompt(s)", url, prompts.len());

        let mut request = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&body);
        if let Some(api_key) = &self.api_key {
            request = request.header("Authorization", format!("Bearer {}", api_key));
        }

        let response = request
            .send()
            .await
            .map_err(|e| AgentError::GenerationError(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        let response_text = response
            .text()
            .await
            .map_err(|e| AgentError::GenerationError(format!("Failed to read response: {}", e)))?;

        log::debug!("Completion response ({}): {}", status, response_text);

        if !status.is_success() {
            return Err(AgentError::GenerationError(format!(
                "API request failed with status {}: {}",
                status, response_text
            )));
        }

        let response_json: Value = serde_json::from_str(&response_text)
            .map_err(|e| AgentError::GenerationError(format!("Invalid JSON response: {}", e)))?;

        self.parse_response(&response_json, prompts.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::MockCompletionsServer;

    fn generator(api_base: String) -> HttpGenerator {
        HttpGenerator::new(api_base, "test-model".to_string())
    }

    #[test]
    fn parse_restores_batch_order_from_choice_index() {
        let response = json!({
            "choices": [
                {"index": 1, "text": " second", "finish_reason": "stop", "stop_reason": "</code>"},
                {"index": 0, "text": " first", "finish_reason": "stop", "stop_reason": null},
            ]
        });

        let g = generator("http://unused".to_string());
        let turns = g.parse_response(&response, 2).unwrap();
        assert_eq!(turns[0].completion, " first");
        assert_eq!(turns[0].stop_reason, StopReason::Other);
        assert_eq!(turns[1].completion, " second");
        assert_eq!(
            turns[1].stop_reason,
            StopReason::StopSequence("</code>".to_string())
        );
    }

    #[test]
    fn parse_rejects_short_batches() {
        let response = json!({
            "choices": [{"index": 0, "text": "only one", "stop_reason": null}]
        });

        let g = generator("http://unused".to_string());
        let err = g.parse_response(&response, 2).unwrap_err();
        assert!(matches!(err, AgentError::BatchMismatch { expected: 2, got: 1 }));
    }

    #[test]
    fn parse_rejects_out_of_range_index() {
        let response = json!({
            "choices": [{"index": 5, "text": "x", "stop_reason": null}]
        });

        let g = generator("http://unused".to_string());
        assert!(g.parse_response(&response, 1).is_err());
    }

    #[test]
    fn integer_stop_reason_counts_as_other() {
        // vLLM reports stop-token hits as integers; only string stop
        // reasons identify a matched stop string.
        let response = json!({
            "choices": [{"index": 0, "text": "x", "stop_reason": 128001}]
        });

        let g = generator("http://unused".to_string());
        let turns = g.parse_response(&response, 1).unwrap();
        assert_eq!(turns[0].stop_reason, StopReason::Other);
    }

    #[tokio::test]
    async fn sends_batch_and_maps_stop_reasons() {
        let server = MockCompletionsServer::start(vec![Ok(json!({
            "id": "cmpl-1",
            "object": "text_completion",
            "choices": [
                {"index": 0, "text": "<code-hit>", "finish_reason": "stop", "stop_reason": "</code>"},
                {"index": 1, "text": "plain answer", "finish_reason": "stop", "stop_reason": null},
            ]
        }))])
        .await;

        let g = generator(server.address());
        let params = GenerationParams {
            stop: vec!["</code>".to_string()],
            ..Default::default()
        };
        let prompts = vec!["p0".to_string(), "p1".to_string()];
        let turns = g.generate(&prompts, &params).await.unwrap();

        assert_eq!(turns.len(), 2);
        assert!(turns[0].stop_reason.is_stop_sequence("</code>"));
        assert_eq!(turns[1].stop_reason, StopReason::Other);

        let requests = server.get_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0]["prompt"], json!(["p0", "p1"]));
        assert_eq!(requests[0]["stop"], json!(["</code>"]));
        assert_eq!(requests[0]["model"], json!("test-model"));

        server.shutdown().await;
    }

    #[tokio::test]
    async fn server_error_propagates_as_generation_error() {
        let server = MockCompletionsServer::start(vec![Err(AgentError::GenerationError(
            "scripted failure".to_string(),
        ))])
        .await;

        let g = generator(server.address());
        let err = g
            .generate(&["p".to_string()], &GenerationParams::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::GenerationError(_)));

        server.shutdown().await;
    }
}
