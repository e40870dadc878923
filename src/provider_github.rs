//! Repository provider backed by the GitHub REST API.
//!
//! Search is a resolution pipeline rather than a plain keyword query:
//!
//! 1. Resolve the authenticated identity and its repository list.
//! 2. Fuzzy-match the topic against the known names ([`crate::repo_match`]).
//! 3. A confident match short-circuits to that single repository.
//! 4. Otherwise walk the fixed fallback query chain, most precise first,
//!    stopping at the first query that returns anything.
//! 5. Without an identity, degrade to one unscoped keyword search.
//!
//! Every underlying failure surfaces as a [`RetrievalError`] which the
//! orchestrator downgrades to an empty channel for the round.

use async_trait::async_trait;
use base64::Engine;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

use crate::config::GitHubConfig;
use crate::error::RetrievalError;
use crate::models::{SearchQuery, SourceResult, SourceType};
use crate::provider::{RepositoryOps, SourceProvider};
use crate::repo_match;

pub struct GitHubProvider {
    config: GitHubConfig,
    client: reqwest::Client,
}

impl GitHubProvider {
    pub fn new(config: GitHubConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    async fn api_get(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<serde_json::Value, RetrievalError> {
        let token = self
            .config
            .token
            .as_deref()
            .ok_or(RetrievalError::Unavailable("github"))?;

        let url = format!("{}{}", self.config.api_url.trim_end_matches('/'), path);
        let response = self
            .client
            .get(url)
            .timeout(Duration::from_secs(self.config.timeout_secs))
            .header("Authorization", format!("Bearer {}", token))
            .header("Accept", "application/vnd.github+json")
            .header("User-Agent", "course-sources")
            .query(params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RetrievalError::status(status.as_u16(), body));
        }

        response
            .json()
            .await
            .map_err(|e| RetrievalError::Malformed(e.to_string()))
    }

    /// Login of the authenticated user.
    async fn authenticated_login(&self) -> Result<String, RetrievalError> {
        let json = self.api_get("/user", &[]).await?;
        json.get("login")
            .and_then(|l| l.as_str())
            .map(|l| l.to_string())
            .ok_or_else(|| RetrievalError::Malformed("missing login".to_string()))
    }

    /// Full names (`owner/name`) of the user's repositories.
    async fn list_repositories(&self) -> Result<Vec<String>, RetrievalError> {
        let json = self
            .api_get("/user/repos", &[("per_page", "100".to_string())])
            .await?;
        let items = json
            .as_array()
            .ok_or_else(|| RetrievalError::Malformed("expected repo array".to_string()))?;
        Ok(items
            .iter()
            .filter_map(|r| r.get("full_name").and_then(|n| n.as_str()))
            .map(|n| n.to_string())
            .collect())
    }

    /// Repository search through the platform's search endpoint.
    pub async fn search_repositories(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<SourceResult>, RetrievalError> {
        let json = self
            .api_get(
                "/search/repositories",
                &[
                    ("q", query.to_string()),
                    ("per_page", max_results.to_string()),
                ],
            )
            .await?;
        let mut results = parse_repository_items(&json)?;
        results.truncate(max_results);
        Ok(results)
    }

    /// Resolve the topic to repositories using the fuzzy-match pipeline.
    async fn resolve(
        &self,
        topic: &str,
        max_results: usize,
    ) -> Result<Vec<SourceResult>, RetrievalError> {
        let (login, known) = match self.identity_and_repos().await {
            Ok(pair) => pair,
            Err(err) => {
                debug!(error = %err, "identity/listing unavailable, unscoped search");
                return self
                    .search_repositories(&repo_match::unscoped_query(topic), max_results)
                    .await;
            }
        };

        if let Some(matched) = repo_match::best_match(topic, &known) {
            debug!(repo = %matched.name, score = matched.score, "fuzzy repository match");
            let full_name = qualify(&matched.name, &login);
            let results = self
                .search_repositories(&format!("repo:{}", full_name), 1)
                .await?;
            if !results.is_empty() {
                return Ok(results);
            }
        }

        for query in repo_match::fallback_queries(topic, &login) {
            let results = self.search_repositories(&query, max_results).await?;
            if !results.is_empty() {
                debug!(query = %query, count = results.len(), "fallback query matched");
                return Ok(results);
            }
        }

        Ok(Vec::new())
    }

    async fn identity_and_repos(&self) -> Result<(String, Vec<String>), RetrievalError> {
        let login = self.authenticated_login().await?;
        let repos = self.list_repositories().await?;
        Ok((login, repos))
    }
}

#[async_trait]
impl SourceProvider for GitHubProvider {
    fn source_type(&self) -> SourceType {
        SourceType::Repository
    }

    fn name(&self) -> &'static str {
        "github"
    }

    fn is_available(&self) -> bool {
        self.config.token.is_some()
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<SourceResult>, RetrievalError> {
        if !self.is_available() {
            return Err(RetrievalError::Unavailable("github"));
        }
        let max_results = query.max_results.min(self.config.max_repositories);
        self.resolve(&query.query, max_results).await
    }
}

#[async_trait]
impl RepositoryOps for GitHubProvider {
    async fn get_file_contents(
        &self,
        repository: &str,
        file_path: &str,
    ) -> Result<String, RetrievalError> {
        let json = self
            .api_get(&format!("/repos/{}/contents/{}", repository, file_path), &[])
            .await?;
        decode_file_contents(&json)
    }

    async fn search_code(
        &self,
        query: &str,
        repository: Option<&str>,
    ) -> Result<Vec<SourceResult>, RetrievalError> {
        let q = match repository {
            Some(repo) => format!("{} repo:{}", query, repo),
            None => query.to_string(),
        };
        let json = self
            .api_get(
                "/search/code",
                &[
                    ("q", q),
                    ("per_page", self.config.max_code_results.to_string()),
                ],
            )
            .await?;
        parse_code_items(&json)
    }
}

/// Prefix a bare repository name with the login; full names pass through.
fn qualify(name: &str, login: &str) -> String {
    if name.contains('/') {
        name.to_string()
    } else {
        format!("{}/{}", login, name)
    }
}

/// Convert `/search/repositories` items into source results.
fn parse_repository_items(json: &serde_json::Value) -> Result<Vec<SourceResult>, RetrievalError> {
    let items = json
        .get("items")
        .and_then(|i| i.as_array())
        .ok_or_else(|| RetrievalError::Malformed("missing items array".to_string()))?;

    let mut results = Vec::with_capacity(items.len());
    for item in items {
        let description = item
            .get("description")
            .and_then(|d| d.as_str())
            .unwrap_or_default();

        let mut result = SourceResult::new(description, SourceType::Repository);
        result.url = item
            .get("html_url")
            .and_then(|u| u.as_str())
            .map(|u| u.to_string());
        result.repository = item
            .get("full_name")
            .and_then(|n| n.as_str())
            .map(|n| n.to_string());

        let mut metadata = HashMap::new();
        if let Some(stars) = item.get("stargazers_count").and_then(|s| s.as_u64()) {
            metadata.insert("stars".to_string(), stars.to_string());
        }
        if let Some(language) = item.get("language").and_then(|l| l.as_str()) {
            metadata.insert("language".to_string(), language.to_string());
        }
        if let Some(updated) = item.get("updated_at").and_then(|u| u.as_str()) {
            metadata.insert("updated_at".to_string(), updated.to_string());
        }
        if !metadata.is_empty() {
            result.metadata = Some(metadata);
        }

        results.push(result);
    }
    Ok(results)
}

/// Convert `/search/code` items into source results.
fn parse_code_items(json: &serde_json::Value) -> Result<Vec<SourceResult>, RetrievalError> {
    let items = json
        .get("items")
        .and_then(|i| i.as_array())
        .ok_or_else(|| RetrievalError::Malformed("missing items array".to_string()))?;

    Ok(items
        .iter()
        .map(|item| {
            let path = item.get("path").and_then(|p| p.as_str()).unwrap_or_default();
            let mut result = SourceResult::new("", SourceType::Repository);
            result.file_path = Some(path.to_string());
            result.url = item
                .get("html_url")
                .and_then(|u| u.as_str())
                .map(|u| u.to_string());
            result.repository = item
                .get("repository")
                .and_then(|r| r.get("full_name"))
                .and_then(|n| n.as_str())
                .map(|n| n.to_string());
            result
        })
        .collect())
}

/// Decode the contents API payload (base64 with embedded newlines).
fn decode_file_contents(json: &serde_json::Value) -> Result<String, RetrievalError> {
    let encoded = json
        .get("content")
        .and_then(|c| c.as_str())
        .ok_or_else(|| RetrievalError::Malformed("missing content field".to_string()))?;

    let cleaned: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(cleaned)
        .map_err(|e| RetrievalError::Malformed(format!("invalid base64 content: {}", e)))?;
    String::from_utf8(bytes)
        .map_err(|e| RetrievalError::Malformed(format!("non-utf8 file contents: {}", e)))
}
