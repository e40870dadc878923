//! # Course Sources
//!
//! A content-discovery layer for LLM-driven course generation.
//!
//! Course Sources routes topic queries across three capability providers
//! (an internal knowledge base, the user's GitHub repositories, and general
//! web search), aggregates the grounded material for a content generator,
//! and keeps a bounded provenance log that becomes the course's citation
//! list.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────┐   ┌──────────────────────────────┐
//! │  CLI (topic)   │──▶│     Discovery orchestrator    │
//! └────────────────┘   │  strategy dispatch + fallback │
//!                      └──────┬───────┬───────┬────────┘
//!                             ▼       ▼       ▼
//!                      ┌─────────┐ ┌──────┐ ┌─────────┐
//!                      │Knowledge│ │GitHub│ │   Web   │
//!                      │  base   │ │      │ │ search  │
//!                      └────┬────┘ └──┬───┘ └────┬────┘
//!                           └─────────┼──────────┘
//!                                     ▼
//!                           ┌──────────────────┐
//!                           │  Source tracker   │
//!                           │ bounded, cited    │
//!                           └──────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! export GITHUB_TOKEN=ghp_...
//! course-sources discover "graph databases"
//! course-sources sources
//! course-sources extract Reynxzz/graphflix README.md src/main.ts
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration with env overrides |
//! | [`models`] | Core data types |
//! | [`error`] | Provider error taxonomy |
//! | [`provider`] | Capability-provider contract |
//! | [`provider_knowledge`] | Knowledge-base provider |
//! | [`provider_github`] | GitHub repository provider |
//! | [`provider_web`] | Web-search provider |
//! | [`repo_match`] | Fuzzy repository-name matching |
//! | [`discovery`] | Discovery orchestrator |
//! | [`tracker`] | Bounded source tracking and citations |
//! | [`cache`] | TTL result cache |
//! | [`sources`] | Provider availability report |

pub mod cache;
pub mod config;
pub mod discovery;
pub mod error;
pub mod models;
pub mod provider;
pub mod provider_github;
pub mod provider_knowledge;
pub mod provider_web;
pub mod repo_match;
pub mod sources;
pub mod tracker;
