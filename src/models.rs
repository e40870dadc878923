//! Core data models for source discovery.
//!
//! These types represent the queries, results, and aggregates that flow
//! between the capability providers, the discovery orchestrator, and the
//! source tracker. Everything here serializes to plain JSON maps and lists,
//! so no encoder downstream ever needs type-specific special-casing.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// The channel a result came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    /// Internal vector knowledge base (semantic search over indexed docs).
    KnowledgeBase,
    /// Code-hosting platform (a user's repositories).
    Repository,
    /// General web search, used only as a last resort.
    WebSearch,
    /// External file store. No provider ships for it today, but tracked
    /// results of this type are carried through summaries unchanged.
    FileStore,
}

impl SourceType {
    /// All variants, in declaration order.
    pub const ALL: [SourceType; 4] = [
        SourceType::KnowledgeBase,
        SourceType::Repository,
        SourceType::WebSearch,
        SourceType::FileStore,
    ];

    /// Stable label used in summaries and log events.
    pub fn label(&self) -> &'static str {
        match self {
            SourceType::KnowledgeBase => "knowledge_base",
            SourceType::Repository => "repository",
            SourceType::WebSearch => "web_search",
            SourceType::FileStore => "file_store",
        }
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One discovered reference, as returned fresh from a provider.
///
/// At least one of `url` / `file_path` should be present for a usable
/// citation; absence is flagged by source validation rather than rejected
/// here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceResult {
    /// Text snippet. May be empty.
    pub content: String,
    pub source_type: SourceType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    /// `owner/name` when the result points at a repository.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,
    /// Relevance in `[0, 1]` when the backend reports one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relevance_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<HashMap<String, String>>,
}

impl SourceResult {
    /// Minimal constructor; optional fields start empty.
    pub fn new(content: impl Into<String>, source_type: SourceType) -> Self {
        Self {
            content: content.into(),
            source_type,
            url: None,
            file_path: None,
            repository: None,
            relevance_score: None,
            metadata: None,
        }
    }

    /// The citation key for this result: url if present, else file path.
    pub fn citation_key(&self) -> Option<&str> {
        self.url.as_deref().or(self.file_path.as_deref())
    }
}

/// A request to a capability provider. Constructed per call, never stored.
#[derive(Debug, Clone, Serialize)]
pub struct SearchQuery {
    pub query: String,
    pub max_results: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filters: Option<HashMap<String, String>>,
}

impl SearchQuery {
    pub fn new(query: impl Into<String>, max_results: usize) -> Self {
        Self {
            query: query.into(),
            max_results,
            filters: None,
        }
    }

    /// Stable string form used for cache keying.
    pub fn cache_args(&self) -> Vec<String> {
        let mut args = vec![self.query.clone(), self.max_results.to_string()];
        if let Some(filters) = &self.filters {
            let mut pairs: Vec<String> =
                filters.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
            pairs.sort();
            args.extend(pairs);
        }
        args
    }
}

/// The orchestrator's output for one topic. Transient; returned directly to
/// the caller and never persisted.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DiscoveryResult {
    pub knowledge_results: Vec<SourceResult>,
    pub repo_results: Vec<SourceResult>,
    pub web_results: Vec<SourceResult>,
    /// Channel labels that yielded at least one result, in the order the
    /// chosen strategy queries them (not completion order).
    pub used_sources: Vec<String>,
    pub total_results: usize,
}

impl DiscoveryResult {
    /// All results across channels, in channel order.
    pub fn all_results(&self) -> impl Iterator<Item = &SourceResult> {
        self.knowledge_results
            .iter()
            .chain(self.repo_results.iter())
            .chain(self.web_results.iter())
    }
}
