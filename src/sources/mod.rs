//! Upstream search clients.
//!
//! Both traits are infallible by signature: rate limiting, auth failures,
//! timeouts and malformed payloads are logged by the client and surface as
//! an empty list.

pub mod github;
pub mod stackoverflow;

use async_trait::async_trait;

use crate::models::{Language, QaQuestion, RepoIssue};

/// Code-hosting issue search.
#[async_trait]
pub trait IssueSource: Send + Sync {
    async fn search_issues(&self, query: &str) -> Vec<RepoIssue>;
}

/// Q&A site question search.
#[async_trait]
pub trait QuestionSource: Send + Sync {
    /// `language` scopes the search by tag; `in_title`, when set, must
    /// appear in the question title.
    async fn search_questions(
        &self,
        query: &str,
        language: Language,
        in_title: Option<&str>,
    ) -> Vec<QaQuestion>;
}

/// Why an upstream call produced nothing.
#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    #[error("rate limited (HTTP {0})")]
    RateLimited(u16),
    #[error("upstream unavailable (HTTP {0})")]
    Unavailable(u16),
    #[error("unexpected status {0}")]
    Status(u16),
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

impl UpstreamError {
    pub fn from_status(status: reqwest::StatusCode) -> Self {
        let code = status.as_u16();
        if code == 403 || code == 429 {
            UpstreamError::RateLimited(code)
        } else if status.is_server_error() {
            UpstreamError::Unavailable(code)
        } else {
            UpstreamError::Status(code)
        }
    }
}

/// Decode the HTML entities Stack Exchange and GitHub emit in titles.
pub fn decode_entities(text: &str) -> String {
    text.replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_entities() {
        assert_eq!(
            decode_entities("Why does &quot;x&quot; throw &lt;T&gt; &amp; isn&#39;t caught"),
            "Why does \"x\" throw <T> & isn't caught"
        );
    }

    #[test]
    fn test_amp_decoded_last() {
        assert_eq!(decode_entities("&amp;lt;"), "&lt;");
    }

    #[test]
    fn test_status_classification() {
        assert!(matches!(
            UpstreamError::from_status(reqwest::StatusCode::TOO_MANY_REQUESTS),
            UpstreamError::RateLimited(429)
        ));
        assert!(matches!(
            UpstreamError::from_status(reqwest::StatusCode::FORBIDDEN),
            UpstreamError::RateLimited(403)
        ));
        assert!(matches!(
            UpstreamError::from_status(reqwest::StatusCode::BAD_GATEWAY),
            UpstreamError::Unavailable(502)
        ));
        assert!(matches!(
            UpstreamError::from_status(reqwest::StatusCode::UNPROCESSABLE_ENTITY),
            UpstreamError::Status(422)
        ));
    }
}
