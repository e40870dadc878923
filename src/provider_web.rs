//! Web-search provider, the last-resort channel.
//!
//! Queries a configured search API endpoint for educational material. The
//! query is enriched with tutorial/documentation keywords before it goes
//! out, and each hit gets a locally computed relevance score (Jaccard
//! similarity between topic and snippet, plus a small boost for educational
//! keywords). That score is advisory: the backend reports no relevance of
//! its own, and dropping heuristically scored hits would gut the one channel
//! that exists to backstop empty primaries.

use async_trait::async_trait;
use std::collections::HashSet;
use std::time::Duration;

use crate::config::WebSearchConfig;
use crate::error::RetrievalError;
use crate::models::{SearchQuery, SourceResult, SourceType};
use crate::provider::SourceProvider;

const EDUCATIONAL_KEYWORDS: &[&str] = &["tutorial", "guide", "documentation", "example", "how"];

pub struct WebSearchProvider {
    config: WebSearchConfig,
    client: reqwest::Client,
}

impl WebSearchProvider {
    pub fn new(config: WebSearchConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl SourceProvider for WebSearchProvider {
    fn source_type(&self) -> SourceType {
        SourceType::WebSearch
    }

    fn name(&self) -> &'static str {
        "web_search"
    }

    fn is_available(&self) -> bool {
        self.config.endpoint.is_some() && self.config.api_key.is_some()
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<SourceResult>, RetrievalError> {
        let endpoint = self
            .config
            .endpoint
            .as_deref()
            .ok_or(RetrievalError::Unavailable("web_search"))?;
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(RetrievalError::Unavailable("web_search"))?;

        let max_results = query.max_results.min(self.config.max_results);
        let response = self
            .client
            .get(endpoint)
            .timeout(Duration::from_secs(self.config.timeout_secs))
            .header("Authorization", format!("Bearer {}", api_key))
            .query(&[
                ("q", enhance_query(&query.query)),
                ("count", max_results.to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RetrievalError::status(status.as_u16(), body));
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| RetrievalError::Malformed(e.to_string()))?;

        let mut results = parse_web_results(&json, &query.query)?;
        results.truncate(max_results);
        Ok(results)
    }
}

/// Bias the outgoing query toward educational content.
fn enhance_query(query: &str) -> String {
    format!("{} tutorial OR guide OR documentation OR example", query)
}

/// Parse `{ "results": [ { "title", "url", "snippet" } ] }`.
fn parse_web_results(
    json: &serde_json::Value,
    topic: &str,
) -> Result<Vec<SourceResult>, RetrievalError> {
    let items = json
        .get("results")
        .and_then(|r| r.as_array())
        .ok_or_else(|| RetrievalError::Malformed("missing results array".to_string()))?;

    Ok(items
        .iter()
        .filter_map(|item| {
            let url = item.get("url").and_then(|u| u.as_str())?;
            let snippet = item
                .get("snippet")
                .and_then(|s| s.as_str())
                .unwrap_or_default();

            let mut result = SourceResult::new(snippet, SourceType::WebSearch);
            result.url = Some(url.to_string());
            result.relevance_score = Some(calculate_relevance(snippet, topic));
            if let Some(title) = item.get("title").and_then(|t| t.as_str()) {
                result
                    .metadata
                    .get_or_insert_with(Default::default)
                    .insert("title".to_string(), title.to_string());
            }
            Some(result)
        })
        .collect())
}

/// Jaccard similarity between query and content word sets, with a +0.2
/// boost when the content carries educational keywords. Clamped to 1.0.
fn calculate_relevance(content: &str, query: &str) -> f64 {
    if content.is_empty() || query.is_empty() {
        return 0.0;
    }

    let content_lower = content.to_lowercase();
    let query_lower = query.to_lowercase();
    let query_words: HashSet<&str> = query_lower.split_whitespace().collect();
    let content_words: HashSet<&str> = content_lower.split_whitespace().collect();

    let intersection = query_words.intersection(&content_words).count();
    let union = query_words.union(&content_words).count();
    if union == 0 {
        return 0.0;
    }

    let mut relevance = intersection as f64 / union as f64;
    if EDUCATIONAL_KEYWORDS.iter().any(|k| content_lower.contains(k)) {
        relevance += 0.2;
    }
    relevance.min(1.0)
}
