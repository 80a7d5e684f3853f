//! Web search helpers.
//!
//! A small DuckDuckGo instant-answer client. The public `search` entry point
//! is intentionally lossless for the loop: transport failures, bad payloads
//! and empty answers all come back as an empty result list, with the cause
//! logged, so an agent run never dies on a flaky search.

use std::time::Duration;

use reqwest::Client;
use serde_json::Value;

use crate::conversation::ToolSpec;
use crate::errors::AgentError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    pub title: String,
    pub snippet: String,
    pub url: String,
}

pub struct SearchClient {
    client: Client,
    endpoint: String,
}

impl SearchClient {
    pub fn new() -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_else(|_| Client::new()),
            endpoint: "https://api.duckduckgo.com".to_string(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: String) -> Self {
        self.endpoint = endpoint.trim_end_matches('/').to_string();
        self
    }

    /// Runs a search, recovering every failure as an empty result list.
    pub async fn search(&self, query: &str, max_results: usize) -> Vec<SearchResult> {
        match self.fetch(query, max_results).await {
            Ok(results) => results,
            Err(e) => {
                log::error!("Search for '{}' failed: {}", query, e);
                Vec::new()
            }
        }
    }

    async fn fetch(&self, query: &str, max_results: usize) -> Result<Vec<SearchResult>, AgentError> {
        // DuckDuckGo Instant Answer API (free but limited)
        let url = format!(
            "{}/?q={}&format=json&no_html=1&skip_disambig=1",
            self.endpoint,
            urlencoding::encode(query)
        );

        let response = self
            .client
            .get(&url)
            .header("User-Agent", "agentis/0.1")
            .send()
            .await
            .map_err(|e| {
                AgentError::SearchError(format!("DuckDuckGo API request failed: {}", e))
            })?;

        let data: Value = response.json().await.map_err(|e| {
            AgentError::SearchError(format!("Failed to parse DuckDuckGo response: {}", e))
        })?;

        Ok(parse_results(query, &data, max_results))
    }
}

impl Default for SearchClient {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_results(query: &str, data: &Value, max_results: usize) -> Vec<SearchResult> {
    let mut results = Vec::new();

    if let Some(answer) = data["Answer"].as_str() {
        if !answer.is_empty() {
            results.push(SearchResult {
                title: format!("Instant answer for '{}'", query),
                snippet: answer.to_string(),
                url: data["AbstractURL"].as_str().unwrap_or("").to_string(),
            });
        }
    }

    if let Some(abstract_text) = data["Abstract"].as_str() {
        if !abstract_text.is_empty() {
            results.push(SearchResult {
                title: data["Heading"].as_str().unwrap_or(query).to_string(),
                snippet: abstract_text.to_string(),
                url: data["AbstractURL"].as_str().unwrap_or("").to_string(),
            });
        }
    }

    if let Some(topics) = data["RelatedTopics"].as_array() {
        for topic in topics {
            if results.len() >= max_results {
                break;
            }
            if let (Some(text), Some(url)) = (topic["Text"].as_str(), topic["FirstURL"].as_str()) {
                if !text.is_empty() {
                    results.push(SearchResult {
                        title: text.split(" - ").next().unwrap_or(text).to_string(),
                        snippet: text.to_string(),
                        url: url.to_string(),
                    });
                }
            }
        }
    }

    results.truncate(max_results);
    results
}

/// Tool descriptions for the conversation builder.
pub fn tool_specs() -> Vec<ToolSpec> {
    vec![ToolSpec::new("web_search").with_summary(
        "web_search(query, max_results=5): searches the web and returns results \
         with title, snippet and url. Returns an empty list when the search fails.",
    )]
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn failed_search_recovers_to_empty_results() {
        // Nothing listens on the discard port; the request fails fast.
        let client = SearchClient::new().with_endpoint("http://127.0.0.1:9".to_string());
        let results = client.search("rust language", 3).await;
        assert!(results.is_empty());
    }

    #[test]
    fn parses_abstract_and_related_topics() {
        let data = json!({
            "Answer": "",
            "Abstract": "Rust is a systems programming language.",
            "Heading": "Rust",
            "AbstractURL": "https://en.wikipedia.org/wiki/Rust_(programming_language)",
            "RelatedTopics": [
                {"Text": "Cargo - the Rust package manager", "FirstURL": "https://doc.rust-lang.org/cargo/"},
                {"Text": "", "FirstURL": "https://ignored.example"},
            ]
        });

        let results = parse_results("rust", &data, 5);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].title, "Rust");
        assert_eq!(results[0].snippet, "Rust is a systems programming language.");
        assert_eq!(results[1].title, "Cargo");
        assert_eq!(results[1].url, "https://doc.rust-lang.org/cargo/");
    }

    #[test]
    fn respects_max_results() {
        let data = json!({
            "RelatedTopics": [
                {"Text": "one", "FirstURL": "u1"},
                {"Text": "two", "FirstURL": "u2"},
                {"Text": "three", "FirstURL": "u3"},
            ]
        });

        let results = parse_results("q", &data, 2);
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn empty_payload_yields_no_results() {
        let results = parse_results("q", &json!({}), 5);
        assert!(results.is_empty());
    }

    #[test]
    fn search_tool_is_documented_for_the_builder() {
        let specs = tool_specs();
        assert_eq!(specs.len(), 1);
        assert_eq!(specs[0].name, "web_search");
        assert!(specs[0].summary.as_deref().unwrap().contains("empty list"));
    }
}
