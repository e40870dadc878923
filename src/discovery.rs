//! Discovery orchestrator: the routing brain.
//!
//! One discovery pass per topic, terminal after a single state-machine walk:
//!
//! 1. **Strategy dispatch**: pick caps and channel order from the configured
//!    priority. All strategies launch both primary channels concurrently;
//!    `balanced` halves the knowledge-base cap.
//! 2. **Collect**: join the fan-out. A failed or timed-out channel is logged
//!    and becomes an empty list; it never aborts its sibling.
//! 3. **Threshold fallback**: when combined primary results fall below the
//!    fallback threshold, consult web search as a supplementary round.
//! 4. **Aggregate**: per-channel lists, the channels that yielded results
//!    (in strategy order, not completion order), and the combined total.
//!
//! Total provider failure produces an all-empty [`DiscoveryResult`] with
//! `total_results == 0`, a valid outcome the content generator must handle
//! by declining to fabricate sources.
//!
//! The whole pass is a plain future with nothing detached, so dropping it at
//! a caller-imposed deadline abandons in-flight provider calls cleanly.

use futures::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::cache::SearchCache;
use crate::config::{Config, SourcePriority};
use crate::error::RetrievalError;
use crate::models::{DiscoveryResult, SearchQuery, SourceResult, SourceType};
use crate::provider::{RepositoryOps, SourceProvider};
use crate::provider_github::GitHubProvider;
use crate::provider_knowledge::KnowledgeBaseProvider;
use crate::provider_web::WebSearchProvider;

struct Channel {
    provider: Arc<dyn SourceProvider>,
    max_results: usize,
    timeout: Duration,
}

/// Orchestrates one discovery session across the three capability providers.
pub struct SourceDiscovery {
    priority: SourcePriority,
    knowledge: Channel,
    repository: Channel,
    web: Channel,
    repository_ops: Option<Arc<dyn RepositoryOps>>,
    fallback_threshold: usize,
    cache: SearchCache,
}

impl SourceDiscovery {
    /// Wire up the real providers from configuration.
    pub fn from_config(config: &Config) -> Self {
        let github = Arc::new(GitHubProvider::new(config.github.clone()));
        Self::new(
            config,
            Arc::new(KnowledgeBaseProvider::new(
                config.knowledge_base.clone(),
                &config.retrieval,
            )),
            github.clone(),
            Arc::new(WebSearchProvider::new(config.web_search.clone())),
            Some(github),
        )
    }

    /// Construct with explicit providers. Tests use this to script channels.
    pub fn new(
        config: &Config,
        knowledge: Arc<dyn SourceProvider>,
        repository: Arc<dyn SourceProvider>,
        web: Arc<dyn SourceProvider>,
        repository_ops: Option<Arc<dyn RepositoryOps>>,
    ) -> Self {
        Self {
            priority: config.priority,
            knowledge: Channel {
                provider: knowledge,
                max_results: config.knowledge_base.max_results,
                timeout: Duration::from_secs(config.knowledge_base.timeout_secs),
            },
            repository: Channel {
                provider: repository,
                max_results: config.github.max_repositories,
                timeout: Duration::from_secs(config.github.timeout_secs),
            },
            web: Channel {
                provider: web,
                max_results: config.web_search.max_results,
                timeout: Duration::from_secs(config.web_search.timeout_secs),
            },
            repository_ops,
            fallback_threshold: config.retrieval.fallback_threshold,
            cache: SearchCache::new(Duration::from_secs(config.retrieval.cache_ttl_secs)),
        }
    }

    /// Run one discovery pass for a topic.
    pub async fn discover(&self, topic: &str) -> DiscoveryResult {
        info!(topic, priority = ?self.priority, "starting content discovery");

        let knowledge_cap = match self.priority {
            // Balanced splits attention: the knowledge-base cap is halved
            // relative to the other strategies.
            SourcePriority::Balanced => (self.knowledge.max_results / 2).max(1),
            _ => self.knowledge.max_results,
        };

        let (knowledge_results, repo_results) = tokio::join!(
            self.channel_search(&self.knowledge, topic, knowledge_cap),
            self.channel_search(&self.repository, topic, self.repository.max_results),
        );

        let primary_total = knowledge_results.len() + repo_results.len();
        let web_results = if primary_total < self.fallback_threshold {
            info!(
                primary_total,
                threshold = self.fallback_threshold,
                "insufficient primary results, falling back to web search"
            );
            self.channel_search(&self.web, topic, self.web.max_results)
                .await
        } else {
            Vec::new()
        };

        let mut used_sources = Vec::new();
        let primary_order: [(&Channel, &[SourceResult]); 2] = match self.priority {
            SourcePriority::RepositoryFirst => [
                (&self.repository, repo_results.as_slice()),
                (&self.knowledge, knowledge_results.as_slice()),
            ],
            _ => [
                (&self.knowledge, knowledge_results.as_slice()),
                (&self.repository, repo_results.as_slice()),
            ],
        };
        for (channel, results) in primary_order {
            if !results.is_empty() {
                used_sources.push(channel.provider.source_type().label().to_string());
            }
        }
        if !web_results.is_empty() {
            used_sources.push(SourceType::WebSearch.label().to_string());
        }

        let total_results = primary_total + web_results.len();
        info!(total_results, used_sources = ?used_sources, "content discovery completed");

        DiscoveryResult {
            knowledge_results,
            repo_results,
            web_results,
            used_sources,
            total_results,
        }
    }

    /// One channel round: availability check, cache lookup, timed search,
    /// failure downgraded to empty.
    async fn channel_search(
        &self,
        channel: &Channel,
        topic: &str,
        max_results: usize,
    ) -> Vec<SourceResult> {
        let provider = &channel.provider;
        if !provider.is_available() {
            warn!(provider = provider.name(), "provider not configured, skipping channel");
            return Vec::new();
        }

        let query = SearchQuery::new(topic, max_results);
        let key = SearchCache::make_key(provider.name(), &query.cache_args());
        if let Some(cached) = self.cache.get(&key) {
            info!(provider = provider.name(), "using cached search results");
            return cached;
        }

        match tokio::time::timeout(channel.timeout, provider.search(&query)).await {
            Ok(Ok(results)) => {
                info!(
                    provider = provider.name(),
                    count = results.len(),
                    "provider search completed"
                );
                self.cache.set(&key, results.clone());
                results
            }
            Ok(Err(err)) => {
                warn!(provider = provider.name(), error = %err, "provider search failed");
                Vec::new()
            }
            Err(_) => {
                let err = RetrievalError::Timeout {
                    provider: provider.name(),
                    seconds: channel.timeout.as_secs(),
                };
                warn!(provider = provider.name(), error = %err, "provider search timed out");
                Vec::new()
            }
        }
    }

    /// Fetch specific files from one repository, fan-out/fan-in. Per-file
    /// failures are logged and the file is omitted.
    pub async fn extract_repository_content(
        &self,
        repository: &str,
        file_patterns: &[String],
    ) -> HashMap<String, String> {
        let Some(ops) = &self.repository_ops else {
            warn!("repository operations not configured");
            return HashMap::new();
        };

        let fetches = file_patterns.iter().map(|pattern| async move {
            match tokio::time::timeout(
                self.repository.timeout,
                ops.get_file_contents(repository, pattern),
            )
            .await
            {
                Ok(Ok(contents)) => Some((pattern.clone(), contents)),
                Ok(Err(err)) => {
                    warn!(repository, pattern = pattern.as_str(), error = %err, "file fetch failed");
                    None
                }
                Err(_) => {
                    let err = RetrievalError::Timeout {
                        provider: "github",
                        seconds: self.repository.timeout.as_secs(),
                    };
                    warn!(repository, pattern = pattern.as_str(), error = %err, "file fetch timed out");
                    None
                }
            }
        });

        join_all(fetches).await.into_iter().flatten().collect()
    }

    /// Search for code patterns, scoped to the given repositories or global.
    /// Per-repository failures degrade to empty contributions.
    pub async fn search_code_in_repositories(
        &self,
        query: &str,
        repositories: Option<&[String]>,
    ) -> Vec<SourceResult> {
        let Some(ops) = &self.repository_ops else {
            warn!("repository operations not configured");
            return Vec::new();
        };

        match repositories {
            Some(repos) => {
                let searches = repos.iter().map(|repo| async move {
                    match ops.search_code(query, Some(repo)).await {
                        Ok(results) => results,
                        Err(err) => {
                            warn!(repository = repo.as_str(), error = %err, "code search failed");
                            Vec::new()
                        }
                    }
                });
                join_all(searches).await.into_iter().flatten().collect()
            }
            None => match ops.search_code(query, None).await {
                Ok(results) => results,
                Err(err) => {
                    warn!(error = %err, "global code search failed");
                    Vec::new()
                }
            },
        }
    }

    /// The memoization layer, exposed for inspection.
    pub fn cache(&self) -> &SearchCache {
        &self.cache
    }
}
