use std::sync::Arc;

use anyhow::Context;

use crate::config::Config;
use crate::search::cache::ResponseCache;
use crate::search::pipeline::Pipeline;
use crate::sources::github::GitHubClient;
use crate::sources::stackoverflow::StackOverflowClient;
use crate::sources::{IssueSource, QuestionSource};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Pipeline,
}

impl AppState {
    /// Wire the live GitHub and Stack Exchange clients.
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let http_client = reqwest::Client::builder()
            .connect_timeout(std::time::Duration::from_secs(5))
            .timeout(config.fetch_timeout())
            .build()
            .context("Failed to build HTTP client")?;

        let timeout = config.fetch_timeout();
        let issues: Arc<dyn IssueSource> = Arc::new(GitHubClient::new(
            http_client.clone(),
            &config.github,
            timeout,
        ));
        let questions: Arc<dyn QuestionSource> = Arc::new(StackOverflowClient::new(
            http_client,
            &config.stackoverflow,
            timeout,
        ));

        Ok(Self::with_sources(config, issues, questions))
    }

    /// Build state around arbitrary sources, e.g. in-memory fixtures.
    pub fn with_sources(
        config: &Config,
        issues: Arc<dyn IssueSource>,
        questions: Arc<dyn QuestionSource>,
    ) -> Self {
        let cache = Arc::new(ResponseCache::new(config.cache_capacity));
        let pipeline = Pipeline::new(
            issues,
            questions,
            cache,
            config.search.clone(),
            config.ranking.clone(),
        );
        Self { pipeline }
    }
}
