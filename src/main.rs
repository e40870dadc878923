//! # Course Sources CLI (`course-sources`)
//!
//! Command-line front end for the discovery orchestrator. It wires the
//! configured providers together, runs a discovery pass for a topic, and
//! prints the aggregated results with their citation list.
//!
//! ## Usage
//!
//! ```bash
//! course-sources [--config ./course-sources.toml] <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `course-sources discover "<topic>"` | Run a discovery pass and print results |
//! | `course-sources sources` | List providers and their availability |
//! | `course-sources extract <owner/repo> <path>...` | Fetch file contents from a repository |
//! | `course-sources code-search "<query>"` | Search code, optionally scoped to repositories |
//!
//! Secrets never live in the config file: the GitHub token is read from
//! `GITHUB_TOKEN` and the web-search key from `WEB_SEARCH_API_KEY`.
//!
//! ## Examples
//!
//! ```bash
//! # Discover grounded material for a course topic
//! GITHUB_TOKEN=ghp_... course-sources discover "graph databases"
//!
//! # Check which providers are configured
//! course-sources sources
//!
//! # Pull specific files out of a repository
//! course-sources extract Reynxzz/graphflix README.md package.json
//!
//! # Scoped code search
//! course-sources code-search "neo4j driver" --repo Reynxzz/graphflix
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use course_sources::config::{self, Config};
use course_sources::discovery::SourceDiscovery;
use course_sources::sources;
use course_sources::tracker::SourceTracker;

/// Course Sources CLI — content discovery for LLM-driven course generation.
#[derive(Parser)]
#[command(
    name = "course-sources",
    about = "Course Sources — content discovery across knowledge base, GitHub, and web search",
    version,
    long_about = "Course Sources routes topic queries across an internal knowledge base, the \
    user's GitHub repositories, and general web search, aggregating grounded material and a \
    citation list for a course-content generator."
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// When omitted, configuration is built from defaults plus
    /// `COURSE_SOURCES_*` environment variables.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Run a discovery pass for a topic.
    ///
    /// Queries the primary channels per the configured priority, falls back
    /// to web search when primary results are thin, and prints the results
    /// grouped by channel with a prioritized citation list.
    Discover {
        /// The course topic to find grounded material for.
        topic: String,

        /// Emit the raw discovery result as JSON instead of a report.
        #[arg(long)]
        json: bool,
    },

    /// List capability providers and their availability.
    ///
    /// Shows which providers have the configuration they need. Useful for
    /// verifying endpoints and tokens before running a discovery pass.
    Sources,

    /// Fetch file contents from a repository.
    ///
    /// Retrieves each named file via the repository platform's contents API
    /// and prints it. Files that cannot be fetched are reported and skipped.
    Extract {
        /// Repository in `owner/name` form.
        repository: String,

        /// One or more file paths within the repository.
        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// Search for code patterns.
    ///
    /// Scoped to the given repositories when `--repo` is passed (repeatable),
    /// otherwise a single global code search.
    CodeSearch {
        /// The code search query.
        query: String,

        /// Restrict the search to a repository (`owner/name`). Repeatable.
        #[arg(long = "repo")]
        repos: Vec<String>,
    },
}

fn load(cli: &Cli) -> anyhow::Result<Config> {
    match &cli.config {
        Some(path) => config::load_config(path),
        None => config::load_config_from_env(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = load(&cli)?;

    match cli.command {
        Commands::Discover { topic, json } => {
            let discovery = SourceDiscovery::from_config(&cfg);
            let result = discovery.discover(&topic).await;

            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
                return Ok(());
            }

            let mut tracker = SourceTracker::new(cfg.tracking.clone());
            for source in result.all_results() {
                tracker.add_source_result(source);
            }

            println!("Discovery for \"{}\"", topic);
            println!(
                "  knowledge base: {} result(s)",
                result.knowledge_results.len()
            );
            println!("  repositories:   {} result(s)", result.repo_results.len());
            println!("  web search:     {} result(s)", result.web_results.len());
            println!("  channels used:  {}", result.used_sources.join(", "));

            let citations = tracker.get_source_urls();
            if !citations.is_empty() {
                println!("\nCitations:");
                for url in &citations {
                    println!("  - {}", url);
                }
            }

            let issues = tracker.validate_sources();
            if !issues.is_empty() {
                println!("\nValidation issues:");
                for issue in issues.missing_urls {
                    println!("  missing url: {}", issue);
                }
                for issue in issues.low_quality {
                    println!("  low quality: {}", issue);
                }
                for issue in issues.duplicate_sources {
                    println!("  duplicate:   {}", issue);
                }
            }
        }
        Commands::Sources => {
            sources::list_sources(&cfg)?;
        }
        Commands::Extract { repository, paths } => {
            let discovery = SourceDiscovery::from_config(&cfg);
            let contents = discovery
                .extract_repository_content(&repository, &paths)
                .await;
            if contents.is_empty() {
                println!("No files retrieved from {}.", repository);
                return Ok(());
            }
            for path in &paths {
                if let Some(body) = contents.get(path) {
                    println!("==> {} <==", path);
                    println!("{}", body);
                }
            }
        }
        Commands::CodeSearch { query, repos } => {
            let discovery = SourceDiscovery::from_config(&cfg);
            let scope = if repos.is_empty() {
                None
            } else {
                Some(repos.as_slice())
            };
            let results = discovery.search_code_in_repositories(&query, scope).await;
            if results.is_empty() {
                println!("No code matches.");
                return Ok(());
            }
            for result in results {
                let repo = result.repository.as_deref().unwrap_or("?");
                let path = result.file_path.as_deref().unwrap_or("?");
                println!("{:<32} {}", repo, path);
            }
        }
    }

    Ok(())
}
