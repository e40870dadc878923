use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// Which primary channel the discovery strategy favors.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SourcePriority {
    KnowledgeBaseFirst,
    RepositoryFirst,
    Balanced,
}

impl Default for SourcePriority {
    fn default() -> Self {
        SourcePriority::KnowledgeBaseFirst
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub priority: SourcePriority,
    #[serde(default)]
    pub knowledge_base: KnowledgeBaseConfig,
    #[serde(default)]
    pub github: GitHubConfig,
    #[serde(default)]
    pub web_search: WebSearchConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub tracking: TrackingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct KnowledgeBaseConfig {
    /// Base URL of the internal knowledge-search service. The provider
    /// reports unavailable when unset.
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default = "default_kb_max_results")]
    pub max_results: usize,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for KnowledgeBaseConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            max_results: default_kb_max_results(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct GitHubConfig {
    /// Personal access token. Read from the `GITHUB_TOKEN` environment
    /// variable only, never from the config file.
    #[serde(skip)]
    pub token: Option<String>,
    #[serde(default = "default_github_api_url")]
    pub api_url: String,
    #[serde(default = "default_max_repositories")]
    pub max_repositories: usize,
    #[serde(default = "default_max_code_results")]
    pub max_code_results: usize,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            token: None,
            api_url: default_github_api_url(),
            max_repositories: default_max_repositories(),
            max_code_results: default_max_code_results(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct WebSearchConfig {
    /// Search API endpoint. The provider reports unavailable when unset.
    #[serde(default)]
    pub endpoint: Option<String>,
    /// API key. Read from `WEB_SEARCH_API_KEY` only.
    #[serde(skip)]
    pub api_key: Option<String>,
    #[serde(default = "default_web_max_results")]
    pub max_results: usize,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for WebSearchConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key: None,
            max_results: default_web_max_results(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    /// Results scoring below this are dropped before a provider returns.
    #[serde(default = "default_relevance_threshold")]
    pub relevance_threshold: f64,
    /// Minimum combined primary-channel count below which web search runs.
    #[serde(default = "default_fallback_threshold")]
    pub fallback_threshold: usize,
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            relevance_threshold: default_relevance_threshold(),
            fallback_threshold: default_fallback_threshold(),
            cache_ttl_secs: default_cache_ttl_secs(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct TrackingConfig {
    /// Per-type cap on retained sources; oldest of the same type is evicted.
    #[serde(default = "default_max_references_per_type")]
    pub max_references_per_type: usize,
    #[serde(default = "default_track_content_preview")]
    pub track_content_preview: bool,
    #[serde(default = "default_preview_length")]
    pub preview_length: usize,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            max_references_per_type: default_max_references_per_type(),
            track_content_preview: default_track_content_preview(),
            preview_length: default_preview_length(),
        }
    }
}

fn default_kb_max_results() -> usize {
    2
}
fn default_github_api_url() -> String {
    "https://api.github.com".to_string()
}
fn default_max_repositories() -> usize {
    5
}
fn default_max_code_results() -> usize {
    10
}
fn default_web_max_results() -> usize {
    5
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_relevance_threshold() -> f64 {
    0.7
}
fn default_fallback_threshold() -> usize {
    3
}
fn default_cache_ttl_secs() -> u64 {
    300
}
fn default_max_references_per_type() -> usize {
    5
}
fn default_track_content_preview() -> bool {
    true
}
fn default_preview_length() -> usize {
    200
}

/// Load configuration from a TOML file, then apply environment overrides.
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let mut config: Config =
        toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    apply_env_overrides(&mut config)?;
    validate(&config)?;
    Ok(config)
}

/// Build a configuration purely from defaults and environment variables.
pub fn load_config_from_env() -> Result<Config> {
    let mut config = Config::default();
    apply_env_overrides(&mut config)?;
    validate(&config)?;
    Ok(config)
}

fn apply_env_overrides(config: &mut Config) -> Result<()> {
    if let Ok(value) = std::env::var("COURSE_SOURCES_PRIORITY") {
        config.priority = match value.as_str() {
            "knowledge_base_first" => SourcePriority::KnowledgeBaseFirst,
            "repository_first" => SourcePriority::RepositoryFirst,
            "balanced" => SourcePriority::Balanced,
            other => anyhow::bail!(
                "Unknown COURSE_SOURCES_PRIORITY: '{}'. Use knowledge_base_first, repository_first, or balanced.",
                other
            ),
        };
    }
    if let Ok(value) = std::env::var("COURSE_SOURCES_KB_ENDPOINT") {
        config.knowledge_base.endpoint = Some(value);
    }
    if let Ok(value) = std::env::var("COURSE_SOURCES_KB_MAX_RESULTS") {
        config.knowledge_base.max_results = value
            .parse()
            .context("COURSE_SOURCES_KB_MAX_RESULTS must be an integer")?;
    }
    if let Ok(value) = std::env::var("COURSE_SOURCES_MAX_REPOSITORIES") {
        config.github.max_repositories = value
            .parse()
            .context("COURSE_SOURCES_MAX_REPOSITORIES must be an integer")?;
    }
    if let Ok(value) = std::env::var("COURSE_SOURCES_FALLBACK_THRESHOLD") {
        config.retrieval.fallback_threshold = value
            .parse()
            .context("COURSE_SOURCES_FALLBACK_THRESHOLD must be an integer")?;
    }
    if let Ok(value) = std::env::var("COURSE_SOURCES_WEB_ENDPOINT") {
        config.web_search.endpoint = Some(value);
    }

    // Secrets come from the environment only.
    config.github.token = std::env::var("GITHUB_TOKEN").ok();
    config.web_search.api_key = std::env::var("WEB_SEARCH_API_KEY").ok();

    Ok(())
}

fn validate(config: &Config) -> Result<()> {
    if config.knowledge_base.max_results == 0 {
        anyhow::bail!("knowledge_base.max_results must be >= 1");
    }
    if config.github.max_repositories == 0 {
        anyhow::bail!("github.max_repositories must be >= 1");
    }
    if config.web_search.max_results == 0 {
        anyhow::bail!("web_search.max_results must be >= 1");
    }
    if !(0.0..=1.0).contains(&config.retrieval.relevance_threshold) {
        anyhow::bail!("retrieval.relevance_threshold must be in [0.0, 1.0]");
    }
    if config.tracking.max_references_per_type == 0 {
        anyhow::bail!("tracking.max_references_per_type must be >= 1");
    }
    Ok(())
}
