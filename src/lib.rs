//! # trace-search
//!
//! A small web service that takes a raw exception stack trace, works out
//! what failed, and searches GitHub issues and Stack Overflow for fixes.
//!
//! ## Architecture
//!
//! ```text
//!                        ┌──────────────────┐
//!                        │  Raw stack trace │
//!                        └────────┬─────────┘
//!                                 │ normalize + validate
//!                                 ▼
//!                     ┌───────────────────────┐
//!                     │ Language classifier   │
//!                     │ java / python scores  │
//!                     └───────────┬───────────┘
//!                                 ▼
//!              ┌──────────────────────────────────────┐
//!              │ Extractor + root cause + keywords    │
//!              │ deepest cause wins, top 5 tokens     │
//!              └──────────────────┬───────────────────┘
//!                                 │ ParsedError
//!                    ┌────────────┴────────────┐
//!                    ▼                         ▼
//!          ┌──────────────────┐      ┌──────────────────┐
//!          │ Repo onion tiers │      │ Q&A tiers        │
//!          │ stop at 5 issues │      │ first non-empty  │
//!          └────────┬─────────┘      └────────┬─────────┘
//!                   └────────────┬────────────┘
//!                                ▼
//!                  ┌───────────────────────────┐
//!                  │ Ranking                   │
//!                  │ reject guards, weighted   │
//!                  │ sum, stable sort, top 15  │
//!                  └─────────────┬─────────────┘
//!                                ▼
//!                  ┌───────────────────────────┐
//!                  │ AnalyzeResponse (cached)  │
//!                  └───────────────────────────┘
//! ```
//!
//! ## Module Overview
//!
//! - [`config`] - Environment-based configuration for upstream APIs, limits and ranking weights
//! - [`models`] - Shared data types: `ParsedError`, candidates, `ScoredResult`, request/response types
//! - [`error`] - `AnalyzeError` and its HTTP mapping
//! - [`parser`] - Language classification, Java/Python extractors, root cause and keyword extraction
//! - [`search::query`] - Onion query construction for both sources
//! - [`search::ranking`] - Pure relevance scoring with rejection guards
//! - [`search::pipeline`] - Orchestration: tiered fetching, merging, ranking
//! - [`search::cache`] - LRU response cache keyed by a hash of the normalized trace
//! - [`sources`] - GitHub and Stack Exchange clients behind infallible traits
//! - [`api`] - Axum HTTP handlers
//! - [`state`] - Shared application state

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod parser;
pub mod search;
pub mod sources;
pub mod state;
