use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use super::{decode_entities, QuestionSource, UpstreamError};
use crate::config::StackOverflowConfig;
use crate::models::{Language, QaQuestion};

/// Stack Exchange advanced search against the stackoverflow site.
pub struct StackOverflowClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    page_size: u32,
    timeout: Duration,
}

/// Tag used to scope a search, if the language has one.
fn language_tag(language: Language) -> Option<&'static str> {
    match language {
        Language::Java => Some("java"),
        Language::Python => Some("python"),
        Language::Unknown => None,
    }
}

impl StackOverflowClient {
    pub fn new(client: reqwest::Client, config: &StackOverflowConfig, timeout: Duration) -> Self {
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            page_size: config.page_size,
            timeout,
        }
    }

    fn params(&self, query: &str, language: Language, in_title: Option<&str>) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("order", "desc".to_string()),
            ("sort", "relevance".to_string()),
            ("answers", "1".to_string()),
            ("site", "stackoverflow".to_string()),
            ("q", query.to_string()),
            ("pagesize", self.page_size.to_string()),
        ];
        if let Some(tag) = language_tag(language) {
            params.push(("tagged", tag.to_string()));
        }
        if let Some(title) = in_title.filter(|t| !t.is_empty()) {
            params.push(("intitle", title.to_string()));
        }
        if let Some(key) = &self.api_key {
            params.push(("key", key.clone()));
        }
        params
    }

    async fn fetch(
        &self,
        query: &str,
        language: Language,
        in_title: Option<&str>,
    ) -> Result<Vec<QaQuestion>, UpstreamError> {
        let url = format!("{}/search/advanced", self.base_url);
        let resp = self
            .client
            .get(&url)
            .query(&self.params(query, language, in_title))
            .timeout(self.timeout)
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(UpstreamError::from_status(resp.status()));
        }

        let body: SearchResponse = resp.json().await?;
        if let Some(quota) = body.quota_remaining {
            tracing::debug!("Stack Exchange quota remaining: {quota}");
        }
        if let Some(backoff) = body.backoff {
            tracing::warn!("Stack Exchange asked to back off for {backoff}s");
        }
        Ok(body.items.into_iter().filter_map(QuestionItem::into_question).collect())
    }
}

#[async_trait]
impl QuestionSource for StackOverflowClient {
    async fn search_questions(
        &self,
        query: &str,
        language: Language,
        in_title: Option<&str>,
    ) -> Vec<QaQuestion> {
        tracing::info!("Stack Overflow query: {query} [tag: {language}, intitle: {in_title:?}]");
        match self.fetch(query, language, in_title).await {
            Ok(questions) => {
                tracing::debug!("Stack Overflow returned {} questions", questions.len());
                questions
            }
            Err(e @ UpstreamError::RateLimited(_)) => {
                tracing::warn!("Stack Overflow search {e}, backing off for '{query}'");
                Vec::new()
            }
            Err(e) => {
                tracing::warn!("Stack Overflow search failed for '{query}': {e}");
                Vec::new()
            }
        }
    }
}

// ─── Wire types ──────────────────────────────────────────

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<QuestionItem>,
    quota_remaining: Option<i64>,
    backoff: Option<u64>,
}

#[derive(Deserialize)]
struct QuestionItem {
    question_id: Option<u64>,
    title: Option<String>,
    link: Option<String>,
    #[serde(default)]
    score: i64,
    #[serde(default)]
    answer_count: u32,
    #[serde(default)]
    is_answered: bool,
    creation_date: Option<i64>,
    owner: Option<Owner>,
}

#[derive(Deserialize)]
struct Owner {
    display_name: Option<String>,
}

impl QuestionItem {
    fn into_question(self) -> Option<QaQuestion> {
        let url = self.link.filter(|l| !l.is_empty())?;
        Some(QaQuestion {
            question_id: self.question_id,
            title: decode_entities(self.title.as_deref().unwrap_or_default()),
            url,
            vote_score: self.score,
            answer_count: self.answer_count,
            is_answered: self.is_answered,
            created_at: self.creation_date,
            author_name: self
                .owner
                .and_then(|o| o.display_name)
                .map(|name| decode_entities(&name)),
        })
    }
}
