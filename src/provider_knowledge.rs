//! Knowledge-base provider.
//!
//! Talks to the internal knowledge-search service over HTTP. The service is
//! treated as an opaque capability: `POST {endpoint}/search` with a query
//! and result cap, answering ranked snippets with file paths and relevance
//! scores. Unset endpoint means the provider is unavailable, which the
//! orchestrator treats as a routing signal rather than an error.

use async_trait::async_trait;
use std::time::Duration;

use crate::config::{KnowledgeBaseConfig, RetrievalConfig};
use crate::error::RetrievalError;
use crate::models::{SearchQuery, SourceResult, SourceType};
use crate::provider::{filter_by_relevance, SourceProvider};

pub struct KnowledgeBaseProvider {
    config: KnowledgeBaseConfig,
    relevance_threshold: f64,
    client: reqwest::Client,
}

impl KnowledgeBaseProvider {
    pub fn new(config: KnowledgeBaseConfig, retrieval: &RetrievalConfig) -> Self {
        Self {
            config,
            relevance_threshold: retrieval.relevance_threshold,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl SourceProvider for KnowledgeBaseProvider {
    fn source_type(&self) -> SourceType {
        SourceType::KnowledgeBase
    }

    fn name(&self) -> &'static str {
        "knowledge_base"
    }

    fn is_available(&self) -> bool {
        self.config.endpoint.is_some()
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<SourceResult>, RetrievalError> {
        let endpoint = self
            .config
            .endpoint
            .as_deref()
            .ok_or(RetrievalError::Unavailable("knowledge_base"))?;

        let max_results = query.max_results.min(self.config.max_results);
        let body = serde_json::json!({
            "query": query.query,
            "top_n": max_results,
        });

        let response = self
            .client
            .post(format!("{}/search", endpoint.trim_end_matches('/')))
            .timeout(Duration::from_secs(self.config.timeout_secs))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(RetrievalError::status(status.as_u16(), body_text));
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| RetrievalError::Malformed(e.to_string()))?;

        let mut results = parse_search_response(&json)?;
        results.truncate(max_results);
        Ok(filter_by_relevance(results, self.relevance_threshold))
    }
}

/// Parse the knowledge-search response: `{ "results": [ { "content",
/// "file_path", "relevance_score", "key_concepts" } ] }`.
fn parse_search_response(json: &serde_json::Value) -> Result<Vec<SourceResult>, RetrievalError> {
    let items = json
        .get("results")
        .and_then(|r| r.as_array())
        .ok_or_else(|| RetrievalError::Malformed("missing results array".to_string()))?;

    let mut results = Vec::with_capacity(items.len());
    for item in items {
        // Entries flagged as errors by the service are skipped, not fatal.
        if item.get("error").is_some_and(|e| !e.is_null()) {
            continue;
        }

        let content = item
            .get("content")
            .and_then(|c| c.as_str())
            .unwrap_or_default()
            .to_string();

        let mut result = SourceResult::new(content, SourceType::KnowledgeBase);
        result.file_path = item
            .get("file_path")
            .and_then(|p| p.as_str())
            .map(|p| p.to_string());
        result.relevance_score = item.get("relevance_score").and_then(|s| s.as_f64());

        if let Some(concepts) = item.get("key_concepts").and_then(|c| c.as_array()) {
            let joined = concepts
                .iter()
                .filter_map(|c| c.as_str())
                .collect::<Vec<_>>()
                .join(",");
            if !joined.is_empty() {
                result
                    .metadata
                    .get_or_insert_with(Default::default)
                    .insert("key_concepts".to_string(), joined);
            }
        }

        results.push(result);
    }

    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_search_response() {
        let json = serde_json::json!({
            "results": [
                {
                    "content": "fn main() {}",
                    "file_path": "src/main.rs",
                    "relevance_score": 0.91,
                    "key_concepts": ["entrypoint", "binary"]
                },
                {
                    "content": "",
                    "error": "chunk unavailable"
                }
            ]
        });
        let results = parse_search_response(&json).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].file_path.as_deref(), Some("src/main.rs"));
        assert_eq!(results[0].relevance_score, Some(0.91));
        assert_eq!(
            results[0].metadata.as_ref().unwrap().get("key_concepts").unwrap(),
            "entrypoint,binary"
        );
    }

    #[test]
    fn test_parse_rejects_missing_results() {
        let json = serde_json::json!({ "status": "ok" });
        assert!(parse_search_response(&json).is_err());
    }

    #[test]
    fn test_unavailable_without_endpoint() {
        let provider = KnowledgeBaseProvider::new(
            KnowledgeBaseConfig::default(),
            &RetrievalConfig::default(),
        );
        assert!(!provider.is_available());
    }
}
