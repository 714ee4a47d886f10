use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::{decode_entities, IssueSource, UpstreamError};
use crate::config::GitHubConfig;
use crate::models::RepoIssue;

const USER_AGENT: &str = concat!("trace-search/", env!("CARGO_PKG_VERSION"));
const ISSUE_QUALIFIERS: &str = "is:issue is:public";

/// GitHub issue search (`GET /search/issues`).
pub struct GitHubClient {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
    per_page: u32,
    timeout: Duration,
}

impl GitHubClient {
    pub fn new(client: reqwest::Client, config: &GitHubConfig, timeout: Duration) -> Self {
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
            per_page: config.per_page,
            timeout,
        }
    }

    async fn fetch(&self, query: &str) -> Result<Vec<RepoIssue>, UpstreamError> {
        let url = format!("{}/search/issues", self.base_url);
        let q = format!("{query} {ISSUE_QUALIFIERS}");
        let per_page = self.per_page.to_string();

        let mut req = self
            .client
            .get(&url)
            .query(&[("q", q.as_str()), ("per_page", per_page.as_str())])
            .header(reqwest::header::ACCEPT, "application/vnd.github.v3+json")
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .timeout(self.timeout);
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }

        let resp = req.send().await?;
        if !resp.status().is_success() {
            return Err(UpstreamError::from_status(resp.status()));
        }

        let body: SearchResponse = resp.json().await?;
        if body.incomplete_results {
            tracing::debug!("GitHub reported incomplete results for '{query}'");
        }
        Ok(body.items.into_iter().filter_map(IssueItem::into_issue).collect())
    }
}

#[async_trait]
impl IssueSource for GitHubClient {
    async fn search_issues(&self, query: &str) -> Vec<RepoIssue> {
        tracing::info!("GitHub query: {query}");
        match self.fetch(query).await {
            Ok(issues) => {
                tracing::debug!("GitHub returned {} issues", issues.len());
                issues
            }
            Err(e @ UpstreamError::RateLimited(_)) => {
                tracing::warn!("GitHub search {e}, backing off for '{query}'");
                Vec::new()
            }
            Err(e) => {
                tracing::warn!("GitHub search failed for '{query}': {e}");
                Vec::new()
            }
        }
    }
}

// ─── Wire types ──────────────────────────────────────────

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    incomplete_results: bool,
    #[serde(default)]
    items: Vec<IssueItem>,
}

#[derive(Deserialize)]
struct IssueItem {
    title: Option<String>,
    html_url: Option<String>,
    state: Option<String>,
    #[serde(default)]
    comments: u32,
    reactions: Option<Reactions>,
    created_at: Option<DateTime<Utc>>,
    body: Option<String>,
}

#[derive(Deserialize)]
struct Reactions {
    #[serde(default)]
    total_count: u32,
}

impl IssueItem {
    /// Items without a link cannot be shown and are dropped.
    fn into_issue(self) -> Option<RepoIssue> {
        let url = self.html_url.filter(|u| !u.is_empty())?;
        Some(RepoIssue {
            title: decode_entities(self.title.as_deref().unwrap_or_default()),
            url,
            state: self.state.unwrap_or_default(),
            comment_count: self.comments,
            reaction_count: self.reactions.map_or(0, |r| r.total_count),
            created_at: self.created_at,
            body: self.body,
        })
    }
}
