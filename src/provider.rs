//! The capability-provider contract.
//!
//! Every backend the orchestrator can route to (knowledge base, repository
//! platform, web search) implements [`SourceProvider`]. The contract is
//! deliberately small: a cheap availability probe and a single rank-ordered
//! search. Providers are selected at construction time; there is no runtime
//! capability discovery.
//!
//! # Example
//!
//! ```rust
//! use async_trait::async_trait;
//! use course_sources::error::RetrievalError;
//! use course_sources::models::{SearchQuery, SourceResult, SourceType};
//! use course_sources::provider::SourceProvider;
//!
//! struct FixtureProvider;
//!
//! #[async_trait]
//! impl SourceProvider for FixtureProvider {
//!     fn source_type(&self) -> SourceType { SourceType::KnowledgeBase }
//!     fn name(&self) -> &'static str { "fixture" }
//!     fn is_available(&self) -> bool { true }
//!
//!     async fn search(&self, query: &SearchQuery) -> Result<Vec<SourceResult>, RetrievalError> {
//!         let _ = query;
//!         Ok(vec![])
//!     }
//! }
//! ```

use async_trait::async_trait;

use crate::error::RetrievalError;
use crate::models::{SearchQuery, SourceResult, SourceType};

/// A search backend the orchestrator can consult.
#[async_trait]
pub trait SourceProvider: Send + Sync {
    /// The channel this provider serves.
    fn source_type(&self) -> SourceType;

    /// Short provider name for status listings and log events.
    fn name(&self) -> &'static str;

    /// True iff the provider's required configuration is present. Must be
    /// cheap and non-blocking, and must not error: missing configuration is
    /// a routing signal, not a failure.
    fn is_available(&self) -> bool;

    /// Perform the lookup, returning a rank-ordered list (best first) capped
    /// at `query.max_results`. Results already relevance-filtered against
    /// the configured threshold. Any underlying failure surfaces as a
    /// [`RetrievalError`] which the caller treats as zero results for this
    /// round.
    async fn search(&self, query: &SearchQuery) -> Result<Vec<SourceResult>, RetrievalError>;
}

/// Repository-specific operations beyond plain search: extracting files and
/// scoped code search. Implemented by the GitHub provider; the orchestrator
/// holds this separately so tests can script it.
#[async_trait]
pub trait RepositoryOps: Send + Sync {
    /// Fetch one file's decoded contents from `owner/name`.
    async fn get_file_contents(
        &self,
        repository: &str,
        file_path: &str,
    ) -> Result<String, RetrievalError>;

    /// Code search, optionally scoped to one repository.
    async fn search_code(
        &self,
        query: &str,
        repository: Option<&str>,
    ) -> Result<Vec<SourceResult>, RetrievalError>;
}

/// Drop results whose reported relevance falls below the threshold. Results
/// without a score pass through untouched.
pub fn filter_by_relevance(results: Vec<SourceResult>, threshold: f64) -> Vec<SourceResult> {
    results
        .into_iter()
        .filter(|r| match r.relevance_score {
            Some(score) => score >= threshold,
            None => true,
        })
        .collect()
}

/// Heuristic sufficiency gate for one channel's results: at least three
/// results at or above the relevance threshold, with a combined content
/// length of at least 1000 characters. Callers use this to decide whether
/// further search rounds are worth running; it is advisory, never enforced.
pub fn assess_sufficiency(results: &[SourceResult], relevance_threshold: f64) -> bool {
    let qualifying: Vec<&SourceResult> = results
        .iter()
        .filter(|r| r.relevance_score.map_or(false, |s| s >= relevance_threshold))
        .collect();

    if qualifying.len() < 3 {
        return false;
    }
    let total_content: usize = qualifying.iter().map(|r| r.content.len()).sum();
    total_content >= 1000
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scored(content: &str, score: Option<f64>) -> SourceResult {
        let mut r = SourceResult::new(content, SourceType::KnowledgeBase);
        r.relevance_score = score;
        r
    }

    #[test]
    fn test_relevance_filter_drops_low_scores() {
        let results = vec![
            scored("a", Some(0.9)),
            scored("b", Some(0.3)),
            scored("c", None),
        ];
        let kept = filter_by_relevance(results, 0.7);
        let contents: Vec<&str> = kept.iter().map(|r| r.content.as_str()).collect();
        assert_eq!(contents, vec!["a", "c"]);
    }

    #[test]
    fn test_sufficiency_needs_three_quality_results() {
        let long = "x".repeat(500);
        let results = vec![scored(&long, Some(0.9)), scored(&long, Some(0.9))];
        assert!(!assess_sufficiency(&results, 0.7));
    }

    #[test]
    fn test_sufficiency_needs_content_depth() {
        let results = vec![
            scored("short", Some(0.9)),
            scored("short", Some(0.9)),
            scored("short", Some(0.9)),
        ];
        assert!(!assess_sufficiency(&results, 0.7));
    }

    #[test]
    fn test_sufficiency_holds_at_thresholds() {
        let chunk = "y".repeat(334);
        let results = vec![
            scored(&chunk, Some(0.7)),
            scored(&chunk, Some(0.8)),
            scored(&chunk, Some(0.9)),
            // Unscored results never count toward sufficiency.
            scored(&"z".repeat(5000), None),
        ];
        assert!(assess_sufficiency(&results, 0.7));
    }
}
