//! Source tracker: the provenance ledger for one discovery session.
//!
//! Every discovered reference is appended here, bounded per source type
//! (oldest-of-type evicted first), and surfaced two ways: a diagnostic
//! summary with preview content, and the prioritized citation list the
//! content generator embeds as `source_from`. The citation list only ever
//! contains entries a provider actually produced; zero sources is a
//! legitimate terminal state, never papered over.
//!
//! The tracker is request-scoped: one instance per discovery session, owned
//! by a single writer. Nothing here persists across sessions.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use tracing::debug;

use crate::config::TrackingConfig;
use crate::models::{SourceResult, SourceType};

/// A retained, preview-truncated record of a discovered reference.
#[derive(Debug, Clone, Serialize)]
pub struct TrackedSource {
    pub content: String,
    pub source_type: SourceType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relevance_score: Option<f64>,
    pub concepts: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<HashMap<String, String>>,
    pub timestamp: DateTime<Utc>,
}

impl TrackedSource {
    fn citation_key(&self) -> Option<&str> {
        self.url.as_deref().or(self.file_path.as_deref())
    }
}

/// Per-type counts and full listing, for diagnostics and audit, never for
/// citation directly.
#[derive(Debug, Serialize)]
pub struct Summary {
    pub total_sources: usize,
    pub counts: HashMap<String, usize>,
    pub timestamp: DateTime<Utc>,
    pub references: HashMap<String, Vec<TrackedSource>>,
}

/// Advisory findings from [`SourceTracker::validate_sources`]. Never blocks
/// progress.
#[derive(Debug, Default, Serialize)]
pub struct ValidationIssues {
    /// Entries lacking both url and file path.
    pub missing_urls: Vec<String>,
    /// Entries with preview content under 10 characters.
    pub low_quality: Vec<String>,
    /// Citation keys seen more than once.
    pub duplicate_sources: Vec<String>,
}

impl ValidationIssues {
    pub fn is_empty(&self) -> bool {
        self.missing_urls.is_empty()
            && self.low_quality.is_empty()
            && self.duplicate_sources.is_empty()
    }
}

/// Append-only, type-bounded ledger of discovered references.
pub struct SourceTracker {
    sources: Vec<TrackedSource>,
    config: TrackingConfig,
}

impl SourceTracker {
    pub fn new(config: TrackingConfig) -> Self {
        Self {
            sources: Vec::new(),
            config,
        }
    }

    /// Track one provider result. Content is truncated to the configured
    /// preview length (or suppressed entirely when preview tracking is off),
    /// and insertion beyond the per-type cap evicts the oldest entry of the
    /// same type. Entries of other types are untouched.
    pub fn add_source_result(&mut self, result: &SourceResult) {
        let tracked = TrackedSource {
            content: self.content_preview(&result.content),
            source_type: result.source_type,
            url: result.url.clone(),
            file_path: result.file_path.clone(),
            repository: result.repository.clone(),
            relevance_score: result.relevance_score,
            concepts: Vec::new(),
            metadata: result.metadata.clone(),
            timestamp: Utc::now(),
        };
        self.insert_bounded(tracked);
    }

    fn insert_bounded(&mut self, tracked: TrackedSource) {
        let existing = self
            .sources
            .iter()
            .filter(|s| s.source_type == tracked.source_type)
            .count();

        if existing >= self.config.max_references_per_type {
            if let Some(oldest) = self
                .sources
                .iter()
                .position(|s| s.source_type == tracked.source_type)
            {
                let removed = self.sources.remove(oldest);
                debug!(
                    source_type = %removed.source_type,
                    key = removed.citation_key().unwrap_or("(none)"),
                    "evicted oldest tracked source of type"
                );
            }
        }

        debug!(
            source_type = %tracked.source_type,
            key = tracked.citation_key().unwrap_or("(none)"),
            "tracked source"
        );
        self.sources.push(tracked);
    }

    fn content_preview(&self, content: &str) -> String {
        if !self.config.track_content_preview {
            return String::new();
        }
        if content.chars().count() <= self.config.preview_length {
            return content.to_string();
        }
        let truncated: String = content.chars().take(self.config.preview_length).collect();
        format!("{}...", truncated)
    }

    /// Counts per type, total, and the full per-type listing.
    pub fn get_summary(&self) -> Summary {
        let mut counts = HashMap::new();
        let mut references: HashMap<String, Vec<TrackedSource>> = HashMap::new();
        for source_type in SourceType::ALL {
            let of_type: Vec<TrackedSource> = self
                .sources
                .iter()
                .filter(|s| s.source_type == source_type)
                .cloned()
                .collect();
            counts.insert(source_type.label().to_string(), of_type.len());
            references.insert(source_type.label().to_string(), of_type);
        }
        Summary {
            total_sources: self.sources.len(),
            counts,
            timestamp: Utc::now(),
            references,
        }
    }

    /// The prioritized citation list.
    ///
    /// Repository URLs come first (a user's own repositories are the most
    /// trustworthy citation), then web-search URLs. Knowledge-base file
    /// paths are the least citable and appear only when neither of the
    /// better-typed channels produced anything. Each bucket is deduplicated
    /// preserving first-seen order.
    pub fn get_source_urls(&self) -> Vec<String> {
        let mut repo_urls = Vec::new();
        let mut web_urls = Vec::new();
        let mut kb_paths = Vec::new();

        for source in &self.sources {
            match source.source_type {
                SourceType::Repository => {
                    if let Some(url) = &source.url {
                        push_unique(&mut repo_urls, url);
                    }
                }
                SourceType::WebSearch => {
                    if let Some(url) = &source.url {
                        push_unique(&mut web_urls, url);
                    }
                }
                SourceType::KnowledgeBase => {
                    if let Some(path) = &source.file_path {
                        push_unique(&mut kb_paths, path);
                    }
                }
                SourceType::FileStore => {}
            }
        }

        if !repo_urls.is_empty() {
            repo_urls.extend(web_urls);
            repo_urls
        } else if !web_urls.is_empty() {
            web_urls
        } else {
            kb_paths
        }
    }

    /// Three advisory checks: missing identifiers, sub-10-character
    /// previews, and duplicate citation keys.
    pub fn validate_sources(&self) -> ValidationIssues {
        let mut issues = ValidationIssues::default();
        let mut seen: HashSet<&str> = HashSet::new();

        for source in &self.sources {
            if source.url.is_none() && source.file_path.is_none() {
                issues
                    .missing_urls
                    .push(format!("{} source without URL or path", source.source_type));
            }

            if source.content.chars().count() < 10 {
                issues.low_quality.push(format!(
                    "{}: {}",
                    source.source_type,
                    source.citation_key().unwrap_or("(none)")
                ));
            }

            if let Some(key) = source.citation_key() {
                if !seen.insert(key) {
                    issues.duplicate_sources.push(key.to_string());
                }
            }
        }

        issues
    }

    /// All tracked sources of one type, oldest first.
    pub fn sources_by_type(&self, source_type: SourceType) -> Vec<&TrackedSource> {
        self.sources
            .iter()
            .filter(|s| s.source_type == source_type)
            .collect()
    }

    /// Sources at or above the given relevance score.
    pub fn high_relevance_sources(&self, min_score: f64) -> Vec<&TrackedSource> {
        self.sources
            .iter()
            .filter(|s| s.relevance_score.map_or(false, |r| r >= min_score))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

fn push_unique(list: &mut Vec<String>, value: &str) {
    if !list.iter().any(|v| v == value) {
        list.push(value.to_string());
    }
}
