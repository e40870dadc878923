//! Integration tests for the discovery orchestrator.
//!
//! These tests drive the real orchestrator through scripted in-memory
//! providers (implemented via the `SourceProvider` and `RepositoryOps`
//! traits) to prove strategy dispatch, threshold fallback, caching, and
//! graceful degradation end-to-end, plus the tracker's citation behavior
//! on a full discovery result.

use async_trait::async_trait;
use course_sources::config::{Config, SourcePriority};
use course_sources::discovery::SourceDiscovery;
use course_sources::error::RetrievalError;
use course_sources::models::{SearchQuery, SourceResult, SourceType};
use course_sources::provider::{RepositoryOps, SourceProvider};
use course_sources::tracker::SourceTracker;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ─── Scripted providers ─────────────────────────────────────────────

/// An in-memory provider that returns a fixed script and records calls.
struct ScriptedProvider {
    source_type: SourceType,
    name: &'static str,
    available: bool,
    results: Vec<SourceResult>,
    fail: bool,
    delay: Option<Duration>,
    calls: AtomicUsize,
    seen_caps: Mutex<Vec<usize>>,
}

impl ScriptedProvider {
    fn new(source_type: SourceType, name: &'static str, results: Vec<SourceResult>) -> Self {
        Self {
            source_type,
            name,
            available: true,
            results,
            fail: false,
            delay: None,
            calls: AtomicUsize::new(0),
            seen_caps: Mutex::new(Vec::new()),
        }
    }

    fn unavailable(source_type: SourceType, name: &'static str) -> Self {
        let mut p = Self::new(source_type, name, Vec::new());
        p.available = false;
        p
    }

    fn failing(source_type: SourceType, name: &'static str) -> Self {
        let mut p = Self::new(source_type, name, Vec::new());
        p.fail = true;
        p
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SourceProvider for ScriptedProvider {
    fn source_type(&self) -> SourceType {
        self.source_type
    }

    fn name(&self) -> &'static str {
        self.name
    }

    fn is_available(&self) -> bool {
        self.available
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<SourceResult>, RetrievalError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen_caps.lock().unwrap().push(query.max_results);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            return Err(RetrievalError::Malformed("scripted failure".to_string()));
        }
        Ok(self.results.clone())
    }
}

/// Scripted repository operations: a fixed file map and code hit list.
struct ScriptedRepoOps {
    files: HashMap<String, String>,
    code_hits: Vec<SourceResult>,
}

#[async_trait]
impl RepositoryOps for ScriptedRepoOps {
    async fn get_file_contents(
        &self,
        _repository: &str,
        file_path: &str,
    ) -> Result<String, RetrievalError> {
        self.files
            .get(file_path)
            .cloned()
            .ok_or_else(|| RetrievalError::status(404, "Not Found".to_string()))
    }

    async fn search_code(
        &self,
        _query: &str,
        repository: Option<&str>,
    ) -> Result<Vec<SourceResult>, RetrievalError> {
        Ok(self
            .code_hits
            .iter()
            .filter(|hit| match repository {
                Some(repo) => hit.repository.as_deref() == Some(repo),
                None => true,
            })
            .cloned()
            .collect())
    }
}

// ─── Helpers ────────────────────────────────────────────────────────

fn kb_result(path: &str) -> SourceResult {
    let mut r = SourceResult::new("indexed notes about the topic", SourceType::KnowledgeBase);
    r.file_path = Some(path.to_string());
    r.relevance_score = Some(0.9);
    r
}

fn repo_result(full_name: &str) -> SourceResult {
    let mut r = SourceResult::new("a project description", SourceType::Repository);
    r.url = Some(format!("https://github.com/{}", full_name));
    r.repository = Some(full_name.to_string());
    r
}

fn web_result(url: &str) -> SourceResult {
    let mut r = SourceResult::new("a tutorial found on the web", SourceType::WebSearch);
    r.url = Some(url.to_string());
    r.relevance_score = Some(0.5);
    r
}

fn discovery_with(
    config: &Config,
    kb: Arc<ScriptedProvider>,
    repo: Arc<ScriptedProvider>,
    web: Arc<ScriptedProvider>,
) -> SourceDiscovery {
    SourceDiscovery::new(config, kb, repo, web, None)
}

// ─── Discovery ──────────────────────────────────────────────────────

#[tokio::test]
async fn sufficient_primaries_skip_web_fallback() {
    let config = Config::default();
    let kb = Arc::new(ScriptedProvider::new(
        SourceType::KnowledgeBase,
        "knowledge_base",
        vec![kb_result("docs/a.md"), kb_result("docs/b.md")],
    ));
    let repo = Arc::new(ScriptedProvider::new(
        SourceType::Repository,
        "github",
        vec![repo_result("u/one")],
    ));
    let web = Arc::new(ScriptedProvider::new(
        SourceType::WebSearch,
        "web_search",
        vec![web_result("https://example.com/t")],
    ));

    let discovery = discovery_with(&config, kb.clone(), repo.clone(), web.clone());
    let result = discovery.discover("rust ownership").await;

    // 2 + 1 meets the default threshold of 3; web is never consulted.
    assert_eq!(result.total_results, 3);
    assert!(result.web_results.is_empty());
    assert_eq!(web.calls(), 0);
    assert_eq!(result.used_sources, vec!["knowledge_base", "repository"]);
}

#[tokio::test]
async fn thin_primaries_trigger_web_fallback() {
    let config = Config::default();
    let kb = Arc::new(ScriptedProvider::new(
        SourceType::KnowledgeBase,
        "knowledge_base",
        vec![kb_result("docs/a.md")],
    ));
    let repo = Arc::new(ScriptedProvider::new(
        SourceType::Repository,
        "github",
        vec![repo_result("u/one")],
    ));
    let web = Arc::new(ScriptedProvider::new(
        SourceType::WebSearch,
        "web_search",
        vec![web_result("https://example.com/t")],
    ));

    let discovery = discovery_with(&config, kb, repo, web.clone());
    let result = discovery.discover("rust ownership").await;

    // 1 + 1 is below the threshold of 3; web search supplements.
    assert_eq!(web.calls(), 1);
    assert_eq!(result.web_results.len(), 1);
    assert_eq!(result.total_results, 3);
    assert_eq!(
        result.used_sources,
        vec!["knowledge_base", "repository", "web_search"]
    );
}

#[tokio::test]
async fn repository_first_orders_used_sources() {
    let mut config = Config::default();
    config.priority = SourcePriority::RepositoryFirst;
    let kb = Arc::new(ScriptedProvider::new(
        SourceType::KnowledgeBase,
        "knowledge_base",
        vec![kb_result("docs/a.md")],
    ));
    let repo = Arc::new(ScriptedProvider::new(
        SourceType::Repository,
        "github",
        vec![repo_result("u/one"), repo_result("u/two")],
    ));
    let web = Arc::new(ScriptedProvider::new(
        SourceType::WebSearch,
        "web_search",
        Vec::new(),
    ));

    let discovery = discovery_with(&config, kb, repo, web);
    let result = discovery.discover("graph databases").await;

    assert_eq!(result.used_sources, vec!["repository", "knowledge_base"]);
}

#[tokio::test]
async fn balanced_halves_the_knowledge_cap() {
    let mut config = Config::default();
    config.priority = SourcePriority::Balanced;
    config.knowledge_base.max_results = 4;
    let kb = Arc::new(ScriptedProvider::new(
        SourceType::KnowledgeBase,
        "knowledge_base",
        vec![kb_result("docs/a.md")],
    ));
    let repo = Arc::new(ScriptedProvider::new(
        SourceType::Repository,
        "github",
        vec![repo_result("u/one"), repo_result("u/two")],
    ));
    let web = Arc::new(ScriptedProvider::new(
        SourceType::WebSearch,
        "web_search",
        Vec::new(),
    ));

    let discovery = discovery_with(&config, kb.clone(), repo, web);
    discovery.discover("graph databases").await;

    assert_eq!(kb.seen_caps.lock().unwrap().as_slice(), &[2]);
}

#[tokio::test]
async fn failing_channel_degrades_to_empty_without_aborting_sibling() {
    let config = Config::default();
    let kb = Arc::new(ScriptedProvider::failing(
        SourceType::KnowledgeBase,
        "knowledge_base",
    ));
    let repo = Arc::new(ScriptedProvider::new(
        SourceType::Repository,
        "github",
        vec![
            repo_result("u/one"),
            repo_result("u/two"),
            repo_result("u/three"),
        ],
    ));
    let web = Arc::new(ScriptedProvider::new(
        SourceType::WebSearch,
        "web_search",
        Vec::new(),
    ));

    let discovery = discovery_with(&config, kb, repo, web);
    let result = discovery.discover("rust ownership").await;

    assert!(result.knowledge_results.is_empty());
    assert_eq!(result.repo_results.len(), 3);
    assert_eq!(result.used_sources, vec!["repository"]);
}

#[tokio::test]
async fn slow_channel_times_out_without_aborting_sibling() {
    let mut config = Config::default();
    config.knowledge_base.timeout_secs = 1;
    let mut slow = ScriptedProvider::new(
        SourceType::KnowledgeBase,
        "knowledge_base",
        vec![kb_result("docs/a.md")],
    );
    slow.delay = Some(Duration::from_secs(5));
    let kb = Arc::new(slow);
    let repo = Arc::new(ScriptedProvider::new(
        SourceType::Repository,
        "github",
        vec![
            repo_result("u/one"),
            repo_result("u/two"),
            repo_result("u/three"),
        ],
    ));
    let web = Arc::new(ScriptedProvider::new(
        SourceType::WebSearch,
        "web_search",
        Vec::new(),
    ));

    let discovery = discovery_with(&config, kb.clone(), repo, web);
    let result = discovery.discover("rust ownership").await;

    // The knowledge channel was consulted but its round expired.
    assert_eq!(kb.calls(), 1);
    assert!(result.knowledge_results.is_empty());
    assert_eq!(result.repo_results.len(), 3);
    assert_eq!(result.used_sources, vec!["repository"]);
}

#[tokio::test]
async fn total_failure_yields_empty_result() {
    let config = Config::default();
    let kb = Arc::new(ScriptedProvider::failing(
        SourceType::KnowledgeBase,
        "knowledge_base",
    ));
    let repo = Arc::new(ScriptedProvider::unavailable(
        SourceType::Repository,
        "github",
    ));
    let web = Arc::new(ScriptedProvider::failing(
        SourceType::WebSearch,
        "web_search",
    ));

    let discovery = discovery_with(&config, kb, repo.clone(), web);
    let result = discovery.discover("anything").await;

    assert_eq!(result.total_results, 0);
    assert!(result.used_sources.is_empty());
    // Unavailable providers are skipped, never searched.
    assert_eq!(repo.calls(), 0);
}

#[tokio::test]
async fn repeated_discovery_is_served_from_cache() {
    let config = Config::default();
    let kb = Arc::new(ScriptedProvider::new(
        SourceType::KnowledgeBase,
        "knowledge_base",
        vec![kb_result("docs/a.md"), kb_result("docs/b.md")],
    ));
    let repo = Arc::new(ScriptedProvider::new(
        SourceType::Repository,
        "github",
        vec![repo_result("u/one")],
    ));
    let web = Arc::new(ScriptedProvider::new(
        SourceType::WebSearch,
        "web_search",
        Vec::new(),
    ));

    let discovery = discovery_with(&config, kb.clone(), repo.clone(), web);
    let first = discovery.discover("rust ownership").await;
    let second = discovery.discover("rust ownership").await;

    assert_eq!(kb.calls(), 1);
    assert_eq!(repo.calls(), 1);
    assert_eq!(first.total_results, second.total_results);

    // A different topic misses the cache.
    discovery.discover("rust lifetimes").await;
    assert_eq!(kb.calls(), 2);
}

// ─── Repository operations ──────────────────────────────────────────

#[tokio::test]
async fn extract_skips_unfetchable_files() {
    let config = Config::default();
    let ops = Arc::new(ScriptedRepoOps {
        files: HashMap::from([("README.md".to_string(), "# Graphflix".to_string())]),
        code_hits: Vec::new(),
    });
    let discovery = SourceDiscovery::new(
        &config,
        Arc::new(ScriptedProvider::unavailable(
            SourceType::KnowledgeBase,
            "knowledge_base",
        )),
        Arc::new(ScriptedProvider::unavailable(
            SourceType::Repository,
            "github",
        )),
        Arc::new(ScriptedProvider::unavailable(
            SourceType::WebSearch,
            "web_search",
        )),
        Some(ops),
    );

    let contents = discovery
        .extract_repository_content(
            "Reynxzz/graphflix",
            &["README.md".to_string(), "missing.md".to_string()],
        )
        .await;

    assert_eq!(contents.len(), 1);
    assert_eq!(contents["README.md"], "# Graphflix");
}

#[tokio::test]
async fn scoped_code_search_aggregates_across_repositories() {
    let config = Config::default();
    let mut hit_one = SourceResult::new("", SourceType::Repository);
    hit_one.repository = Some("u/one".to_string());
    hit_one.file_path = Some("src/a.rs".to_string());
    let mut hit_two = SourceResult::new("", SourceType::Repository);
    hit_two.repository = Some("u/two".to_string());
    hit_two.file_path = Some("src/b.rs".to_string());
    let mut hit_other = SourceResult::new("", SourceType::Repository);
    hit_other.repository = Some("u/other".to_string());

    let ops = Arc::new(ScriptedRepoOps {
        files: HashMap::new(),
        code_hits: vec![hit_one, hit_two, hit_other],
    });
    let discovery = SourceDiscovery::new(
        &config,
        Arc::new(ScriptedProvider::unavailable(
            SourceType::KnowledgeBase,
            "knowledge_base",
        )),
        Arc::new(ScriptedProvider::unavailable(
            SourceType::Repository,
            "github",
        )),
        Arc::new(ScriptedProvider::unavailable(
            SourceType::WebSearch,
            "web_search",
        )),
        Some(ops),
    );

    let scope = vec!["u/one".to_string(), "u/two".to_string()];
    let results = discovery
        .search_code_in_repositories("fn main", Some(&scope))
        .await;

    let repos: Vec<&str> = results
        .iter()
        .filter_map(|r| r.repository.as_deref())
        .collect();
    assert_eq!(repos, vec!["u/one", "u/two"]);

    let all = discovery.search_code_in_repositories("fn main", None).await;
    assert_eq!(all.len(), 3);
}

// ─── Discovery + tracking end-to-end ────────────────────────────────

#[tokio::test]
async fn discovery_feeds_tracker_with_prioritized_citations() {
    let config = Config::default();
    let kb = Arc::new(ScriptedProvider::new(
        SourceType::KnowledgeBase,
        "knowledge_base",
        vec![kb_result("notes/graphs.md")],
    ));
    let repo = Arc::new(ScriptedProvider::new(
        SourceType::Repository,
        "github",
        vec![repo_result("Reynxzz/graphflix")],
    ));
    let web = Arc::new(ScriptedProvider::new(
        SourceType::WebSearch,
        "web_search",
        vec![web_result("https://neo4j.com/docs/")],
    ));

    let discovery = discovery_with(&config, kb, repo, web);
    let result = discovery.discover("graphflix").await;

    let mut tracker = SourceTracker::new(config.tracking.clone());
    for source in result.all_results() {
        tracker.add_source_result(source);
    }

    // Repository citations lead, web follows, knowledge-base paths are
    // excluded when better-typed sources exist.
    assert_eq!(
        tracker.get_source_urls(),
        vec![
            "https://github.com/Reynxzz/graphflix",
            "https://neo4j.com/docs/"
        ]
    );
    assert!(tracker.validate_sources().is_empty());

    let summary = tracker.get_summary();
    assert_eq!(summary.total_sources, 3);
    assert_eq!(summary.counts["repository"], 1);
}
