use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Languages the parser understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Java,
    Python,
    Unknown,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Java => "java",
            Language::Python => "python",
            Language::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything extracted locally from one stack trace.
///
/// When a chained cause was found, `exception_type`, `qualified_exception` and
/// `message` already describe the deepest cause rather than the outer wrapper.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedError {
    pub language: Language,
    /// Display name, e.g. `NullPointerException` or `ZeroDivisionError`.
    pub exception_type: String,
    /// Name as it appeared in the trace, e.g. `java.lang.NullPointerException`.
    pub qualified_exception: String,
    pub message: String,
    /// `Type: message` line of the deepest chained cause, if any.
    pub root_cause: Option<String>,
    /// At most five lowercase tokens, strongest first.
    pub keywords: Vec<String>,
    /// Number of non-blank lines in the trace.
    pub stack_trace_lines: usize,
}

/// An issue returned by the code-hosting issue search.
#[derive(Debug, Clone, PartialEq)]
pub struct RepoIssue {
    pub title: String,
    pub url: String,
    pub state: String,
    pub comment_count: u32,
    /// 0 when the upstream did not report reactions.
    pub reaction_count: u32,
    pub created_at: Option<DateTime<Utc>>,
    pub body: Option<String>,
}

/// A question returned by the Q&A search.
#[derive(Debug, Clone, PartialEq)]
pub struct QaQuestion {
    pub question_id: Option<u64>,
    pub title: String,
    pub url: String,
    /// Net votes, may be negative.
    pub vote_score: i64,
    pub answer_count: u32,
    pub is_answered: bool,
    /// Epoch seconds
    pub created_at: Option<i64>,
    pub author_name: Option<String>,
}

/// A fetched item from either source, before scoring.
#[derive(Debug, Clone, PartialEq)]
pub enum CandidateItem {
    Repo(RepoIssue),
    Qa(QaQuestion),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Source {
    #[serde(rename = "github")]
    Repo,
    #[serde(rename = "stackoverflow")]
    Qa,
}

/// A candidate after scoring. A negative `score` marks a rejected item and
/// never leaves the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredResult {
    pub source: Source,
    pub title: String,
    pub url: String,
    /// Reactions + comments for issues, votes for questions.
    pub engagement: i64,
    pub score: f64,
    pub answer_count: Option<u32>,
    pub is_answered: Option<bool>,
    pub created_at: Option<DateTime<Utc>>,
}

impl ScoredResult {
    pub fn new(candidate: &CandidateItem, score: f64) -> Self {
        match candidate {
            CandidateItem::Repo(issue) => Self {
                source: Source::Repo,
                title: issue.title.clone(),
                url: issue.url.clone(),
                engagement: i64::from(issue.reaction_count) + i64::from(issue.comment_count),
                score,
                answer_count: None,
                is_answered: None,
                created_at: issue.created_at,
            },
            CandidateItem::Qa(question) => Self {
                source: Source::Qa,
                title: question.title.clone(),
                url: question.url.clone(),
                engagement: question.vote_score,
                score,
                answer_count: Some(question.answer_count),
                is_answered: Some(question.is_answered),
                created_at: question
                    .created_at
                    .and_then(|secs| DateTime::from_timestamp(secs, 0)),
            },
        }
    }

    pub fn is_rejected(&self) -> bool {
        self.score < 0.0
    }
}

/// Analyze request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    pub stack_trace: String,
}

/// Analyze response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeResponse {
    pub language: Language,
    pub exception_type: String,
    pub message: String,
    pub keywords: Vec<String>,
    pub root_cause: Option<String>,
    pub results: Vec<ScoredResult>,
    pub stack_trace_lines: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_serializes_lowercase() {
        let json = serde_json::to_value(Language::Python).unwrap();
        assert_eq!(json, "python");
    }

    #[test]
    fn test_source_serializes_to_service_name() {
        assert_eq!(serde_json::to_value(Source::Repo).unwrap(), "github");
        assert_eq!(serde_json::to_value(Source::Qa).unwrap(), "stackoverflow");
    }

    #[test]
    fn test_repo_result_has_no_answer_fields() {
        let issue = RepoIssue {
            title: "Fix NPE".to_string(),
            url: "https://github.com/a/b/issues/1".to_string(),
            state: "open".to_string(),
            comment_count: 3,
            reaction_count: 2,
            created_at: None,
            body: None,
        };
        let result = ScoredResult::new(&CandidateItem::Repo(issue), 0.7);
        assert_eq!(result.engagement, 5);
        assert_eq!(result.answer_count, None);

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["source"], "github");
        assert!(json["isAnswered"].is_null());
    }

    #[test]
    fn test_qa_result_keeps_answer_fields() {
        let question = QaQuestion {
            question_id: Some(1),
            title: "ValueError in pandas".to_string(),
            url: "https://stackoverflow.com/q/1".to_string(),
            vote_score: -2,
            answer_count: 7,
            is_answered: true,
            created_at: Some(1_700_000_000),
            author_name: None,
        };
        let result = ScoredResult::new(&CandidateItem::Qa(question), 0.4);
        assert_eq!(result.source, Source::Qa);
        assert_eq!(result.engagement, -2);
        assert_eq!(result.answer_count, Some(7));
        assert_eq!(result.is_answered, Some(true));
        assert!(result.created_at.is_some());
    }

    #[test]
    fn test_analyze_request_uses_camel_case() {
        let req: AnalyzeRequest =
            serde_json::from_str(r#"{"stackTrace": "java.lang.Error"}"#).unwrap();
        assert_eq!(req.stack_trace, "java.lang.Error");
    }
}
