//! Request orchestration.
//!
//! ```text
//!   raw ──▶ normalize ──▶ validate ──▶ cache? ──hit──▶ response
//!                                        │
//!                                       miss
//!                                        ▼
//!                               parse (classify, extract,
//!                               root cause, keywords)
//!                                        │
//!                        ┌───────────────┴───────────────┐
//!                        ▼                               ▼
//!              repo tiers, dedupe by URL,      qa tiers, first
//!              stop at min_repo_results        non-empty tier wins
//!                        └───────────────┬───────────────┘
//!                                        ▼
//!                      score, drop rejected, stable sort, truncate
//! ```
//!
//! Only input validation and language detection can fail a request.
//! Upstream trouble shows up as fewer results.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures_util::future::join;

use super::cache::{self, ResponseCache};
use super::query;
use super::ranking;
use crate::config::{RankingConfig, SearchConfig};
use crate::error::AnalyzeError;
use crate::models::{AnalyzeResponse, CandidateItem, ParsedError, QaQuestion, RepoIssue, ScoredResult};
use crate::parser;
use crate::sources::{IssueSource, QuestionSource};

#[derive(Clone)]
pub struct Pipeline {
    issues: Arc<dyn IssueSource>,
    questions: Arc<dyn QuestionSource>,
    cache: Arc<ResponseCache>,
    search: SearchConfig,
    ranking: RankingConfig,
}

impl Pipeline {
    pub fn new(
        issues: Arc<dyn IssueSource>,
        questions: Arc<dyn QuestionSource>,
        cache: Arc<ResponseCache>,
        search: SearchConfig,
        ranking: RankingConfig,
    ) -> Self {
        Self {
            issues,
            questions,
            cache,
            search,
            ranking,
        }
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    /// Analyze a raw stack trace and return ranked fixes.
    pub async fn analyze(&self, raw: &str) -> Result<AnalyzeResponse, AnalyzeError> {
        self.analyze_at(raw, Utc::now()).await
    }

    /// Same as [`Pipeline::analyze`] with an explicit clock for recency scoring.
    pub async fn analyze_at(
        &self,
        raw: &str,
        now: DateTime<Utc>,
    ) -> Result<AnalyzeResponse, AnalyzeError> {
        let normalized = cache::normalize(raw);
        self.validate(&normalized)?;

        let key = cache::cache_key(&normalized);
        if let Some(hit) = self.cache.get(&key) {
            tracing::info!("Cache hit for trace {}", &key[..12]);
            return Ok(hit);
        }

        let parsed = parser::parse(&normalized)?;
        let repo_queries = query::build_repo_queries(&parsed, &normalized);
        let qa_queries = query::build_qa_queries(&parsed);
        tracing::info!(
            "Built {} repo and {} qa queries for {}",
            repo_queries.len(),
            qa_queries.len(),
            parsed.exception_type
        );

        let (issues, questions) = join(
            self.collect_issues(&repo_queries),
            self.collect_questions(&qa_queries, &parsed),
        )
        .await;

        let candidates: Vec<CandidateItem> = issues
            .into_iter()
            .map(CandidateItem::Repo)
            .chain(questions.into_iter().map(CandidateItem::Qa))
            .collect();
        let results = rank(
            &candidates,
            &parsed.keywords,
            &self.ranking,
            now,
            self.search.max_results,
        );
        tracing::info!(
            "Ranked {} of {} candidates for {}",
            results.len(),
            candidates.len(),
            parsed.exception_type
        );

        let response = AnalyzeResponse {
            language: parsed.language,
            exception_type: parsed.exception_type,
            message: parsed.message,
            keywords: parsed.keywords,
            root_cause: parsed.root_cause,
            results,
            stack_trace_lines: parsed.stack_trace_lines,
        };
        self.cache.insert(key, response.clone());
        Ok(response)
    }

    fn validate(&self, normalized: &str) -> Result<(), AnalyzeError> {
        if normalized.is_empty() {
            return Err(AnalyzeError::InvalidInput(
                "Stack trace cannot be empty".into(),
            ));
        }
        let chars = normalized.chars().count();
        if chars < self.search.min_input_chars {
            return Err(AnalyzeError::InvalidInput(format!(
                "Stack trace is too short (minimum {} characters)",
                self.search.min_input_chars
            )));
        }
        if chars > self.search.max_input_chars {
            return Err(AnalyzeError::InvalidInput(format!(
                "Stack trace is too long (maximum {} characters)",
                self.search.max_input_chars
            )));
        }
        Ok(())
    }

    /// Issue tiers in order, deduplicated by URL, until enough issues are collected.
    async fn collect_issues(&self, queries: &[String]) -> Vec<RepoIssue> {
        let mut seen = HashSet::new();
        let mut issues = Vec::new();

        for (tier, query) in queries.iter().enumerate() {
            let before = issues.len();
            for issue in self.issues.search_issues(query).await {
                if seen.insert(issue.url.clone()) {
                    issues.push(issue);
                }
            }
            tracing::info!(
                "Repo tier {}: +{} issues ({} total)",
                tier + 1,
                issues.len() - before,
                issues.len()
            );
            if issues.len() >= self.search.min_repo_results {
                tracing::debug!("Repo search stopped after tier {}", tier + 1);
                break;
            }
        }
        issues
    }

    /// Question tiers in order; the first non-empty tier is the answer.
    async fn collect_questions(&self, queries: &[String], parsed: &ParsedError) -> Vec<QaQuestion> {
        let exception = query::query_exception(parsed);

        for (tier, query) in queries.iter().enumerate() {
            let in_title = (tier == 0).then_some(exception.as_str());
            let questions = self
                .questions
                .search_questions(query, parsed.language, in_title)
                .await;
            if !questions.is_empty() {
                tracing::info!("Q&A tier {}: {} questions", tier + 1, questions.len());
                return questions;
            }
        }
        tracing::info!("Q&A search found nothing");
        Vec::new()
    }
}

/// Score candidates, drop rejected ones, sort by score (stable) and keep the top `limit`.
pub fn rank(
    candidates: &[CandidateItem],
    keywords: &[String],
    config: &RankingConfig,
    now: DateTime<Utc>,
    limit: usize,
) -> Vec<ScoredResult> {
    let mut results: Vec<ScoredResult> = candidates
        .iter()
        .map(|c| ScoredResult::new(c, ranking::score(c, keywords, config, now)))
        .filter(|r| !r.is_rejected())
        .collect();

    results.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    results.truncate(limit);
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Source;

    fn repo(title: &str, url: &str, comments: u32) -> CandidateItem {
        CandidateItem::Repo(RepoIssue {
            title: title.to_string(),
            url: url.to_string(),
            state: "open".to_string(),
            comment_count: comments,
            reaction_count: 0,
            created_at: None,
            body: None,
        })
    }

    #[test]
    fn test_rank_truncates_and_sorts_descending() {
        let keywords = vec!["illegalstateexception".to_string()];
        let candidates: Vec<CandidateItem> = (0..20)
            .map(|i| {
                repo(
                    "IllegalStateException on shutdown",
                    &format!("https://github.com/a/b/issues/{i}"),
                    i,
                )
            })
            .collect();
        let results = rank(&candidates, &keywords, &RankingConfig::default(), Utc::now(), 15);
        assert_eq!(results.len(), 15);
        for pair in results.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
        assert_eq!(results[0].url, "https://github.com/a/b/issues/19");
    }

    #[test]
    fn test_rank_drops_rejected() {
        let keywords = vec!["valueerror".to_string()];
        let candidates = vec![
            repo("unrelated title", "https://github.com/a/b/issues/1", 5),
            repo("ValueError on parse", "https://github.com/a/b/issues/2", 5),
        ];
        let results = rank(&candidates, &keywords, &RankingConfig::default(), Utc::now(), 15);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].source, Source::Repo);
        assert!(results.iter().all(|r| r.score >= 0.0));
    }

    #[test]
    fn test_rank_ties_keep_input_order() {
        let keywords = vec!["valueerror".to_string()];
        let candidates = vec![
            repo("ValueError first", "https://github.com/a/b/issues/1", 0),
            repo("ValueError second", "https://github.com/a/b/issues/2", 0),
        ];
        let results = rank(&candidates, &keywords, &RankingConfig::default(), Utc::now(), 15);
        assert_eq!(results[0].url, "https://github.com/a/b/issues/1");
        assert_eq!(results[1].url, "https://github.com/a/b/issues/2");
    }
}
