use chrono::{DateTime, Utc};

use crate::config::RankingConfig;
use crate::models::{CandidateItem, QaQuestion, RepoIssue};
use crate::parser::keywords;

/// Score that marks a candidate as irrelevant.
pub const REJECTED: f64 = -1.0;

const ENGAGEMENT_SCALE: f64 = 20.0;
const LOW_ENGAGEMENT_FLOOR: f64 = 0.1;
const QA_ENGAGEMENT_SCALE: f64 = 100.0;
const QA_ANSWER_WEIGHT: i64 = 3;
const STRONG_KEYWORD_LEN: usize = 4;
const NEUTRAL_RECENCY: f64 = 0.5;
const ANSWERED_SOURCE_SCORE: f64 = 1.0;
const UNANSWERED_SOURCE_SCORE: f64 = 0.5;

/// Package segments that look like keywords but identify nothing.
const PACKAGE_NOISE: &[&str] = &[
    "com", "org", "net", "java", "javax", "jakarta", "lang", "util", "utils", "internal",
    "impl", "core", "common", "apache", "springframework", "sun", "jdk",
];

/// Organisations whose issue trackers get a small trust bonus.
pub const TRUSTED_ORGS: &[&str] = &[
    "spring-projects",
    "hibernate",
    "fasterxml",
    "apache",
    "python",
    "pallets",
    "django",
    "psf",
    "numpy",
    "pandas-dev",
    "openjdk",
    "eclipse",
];

/// 8+ characters that are all hex, or a digit/letter mix typical of ids and hashes.
pub fn is_hash_like(token: &str) -> bool {
    if token.len() < 8 || !token.chars().all(|c| c.is_ascii_alphanumeric()) {
        return false;
    }
    if token.chars().all(|c| c.is_ascii_hexdigit()) {
        return true;
    }
    let digits = token.chars().filter(|c| c.is_ascii_digit()).count();
    let letters = token.len() - digits;
    digits >= 3 && letters >= 3
}

fn is_exception_shaped(keyword: &str) -> bool {
    keyword.ends_with("exception") || keyword.ends_with("error")
}

/// Keywords specific enough to gate relevance.
pub fn strong_keywords(keywords: &[String]) -> Vec<String> {
    keywords
        .iter()
        .map(|k| k.to_lowercase())
        .filter(|k| {
            k.chars().count() >= STRONG_KEYWORD_LEN
                && !keywords::is_stopword(k)
                && !PACKAGE_NOISE.contains(&k.as_str())
                && !is_hash_like(k)
        })
        .collect()
}

/// Anchors for Q&A items: exception-like names or code fragments.
pub fn qa_anchors(keywords: &[String]) -> Vec<String> {
    keywords
        .iter()
        .map(|k| k.to_lowercase())
        .filter(|k| {
            k.ends_with("exception")
                || k.ends_with("error")
                || k.contains(['.', '(', ')'])
        })
        .collect()
}

fn has_alphabetic_run(text: &str, min: usize) -> bool {
    let mut run = 0;
    for c in text.chars() {
        if c.is_alphabetic() {
            run += 1;
            if run >= min {
                return true;
            }
        } else {
            run = 0;
        }
    }
    false
}

fn overlap(haystack: &str, keywords: &[String]) -> f64 {
    if keywords.is_empty() {
        return 0.0;
    }
    let hits = keywords.iter().filter(|k| haystack.contains(k.as_str())).count();
    hits as f64 / keywords.len() as f64
}

/// Linear decay from 1.0 today to 0.0 at the end of the window.
pub fn recency_score(
    created_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    window_days: i64,
) -> f64 {
    let Some(created_at) = created_at else {
        return NEUTRAL_RECENCY;
    };
    let days = (now - created_at).num_days();
    if days <= 0 {
        1.0
    } else if days >= window_days {
        0.0
    } else {
        1.0 - days as f64 / window_days as f64
    }
}

fn engagement_score(reactions: u32, comments: u32) -> f64 {
    let engagement = f64::from(reactions) + f64::from(comments);
    if engagement == 0.0 {
        return 0.0;
    }
    (engagement / ENGAGEMENT_SCALE).clamp(LOW_ENGAGEMENT_FLOOR, 1.0)
}

fn from_trusted_org(url: &str) -> bool {
    let url = url.to_lowercase();
    TRUSTED_ORGS
        .iter()
        .any(|org| url.contains(&format!("/{org}/")))
}

/// Score an issue against the extracted keywords. Returns [`REJECTED`] for
/// noise titles, issues whose title misses an exception keyword, and
/// issues that cover too few strong keywords.
pub fn score_repo_item(
    issue: &RepoIssue,
    keywords: &[String],
    config: &RankingConfig,
    now: DateTime<Utc>,
) -> f64 {
    if !has_alphabetic_run(&issue.title, 3) {
        return REJECTED;
    }

    let title = issue.title.to_lowercase();
    let haystack = format!(
        "{} {}",
        title,
        issue.body.as_deref().unwrap_or_default().to_lowercase()
    );

    let exception_keywords: Vec<String> = keywords
        .iter()
        .map(|k| k.to_lowercase())
        .filter(|k| is_exception_shaped(k))
        .collect();
    if exception_keywords.iter().any(|k| !title.contains(k.as_str())) {
        return REJECTED;
    }

    let strong = strong_keywords(keywords);
    let keyword_overlap = overlap(&haystack, &strong);
    if !strong.is_empty() && keyword_overlap < config.min_strong_coverage {
        return REJECTED;
    }

    let reaction = engagement_score(issue.reaction_count, issue.comment_count);
    let recency = recency_score(issue.created_at, now, config.recency_window_days);
    let title_bonus = if exception_keywords.is_empty() {
        0.0
    } else {
        config.title_bonus
    };
    let org_bonus = if from_trusted_org(&issue.url) {
        config.trusted_org_bonus
    } else {
        0.0
    };

    let score = config.repo_reaction_weight * reaction
        + config.repo_overlap_weight * keyword_overlap
        + config.repo_recency_weight * recency
        + title_bonus
        + org_bonus;

    tracing::debug!(
        "Repo '{}' reactions={reaction:.2} overlap={keyword_overlap:.2} recency={recency:.2} final={score:.3}",
        issue.title
    );
    score
}

/// Score a Q&A question against the extracted keywords. Only the title is
/// available for this source, so anchors and overlap are tested against it.
pub fn score_qa_item(
    question: &QaQuestion,
    keywords: &[String],
    config: &RankingConfig,
    now: DateTime<Utc>,
) -> f64 {
    let anchors = qa_anchors(keywords);
    if anchors.is_empty() {
        return REJECTED;
    }

    let title = question.title.to_lowercase();
    if !anchors.iter().any(|a| title.contains(a.as_str())) {
        return REJECTED;
    }

    let votes = question.vote_score.max(0);
    let engagement_raw = votes + QA_ANSWER_WEIGHT * i64::from(question.answer_count);
    let engagement = (engagement_raw as f64 / QA_ENGAGEMENT_SCALE).min(1.0);
    let keyword_overlap = overlap(&title, &strong_keywords(keywords));
    let created_at = question
        .created_at
        .and_then(|secs| DateTime::from_timestamp(secs, 0));
    let recency = recency_score(created_at, now, config.recency_window_days);
    let source = if question.is_answered {
        ANSWERED_SOURCE_SCORE
    } else {
        UNANSWERED_SOURCE_SCORE
    };
    let accepted_bonus = if question.is_answered && question.answer_count >= 1 {
        config.accepted_bonus
    } else {
        0.0
    };

    let score = config.qa_engagement_weight * engagement
        + config.qa_overlap_weight * keyword_overlap
        + config.qa_recency_weight * recency
        + config.qa_source_weight * source
        + accepted_bonus;

    tracing::debug!(
        "Q&A '{}' engagement={engagement:.2} overlap={keyword_overlap:.2} recency={recency:.2} final={score:.3}",
        question.title
    );
    score
}

pub fn score(
    candidate: &CandidateItem,
    keywords: &[String],
    config: &RankingConfig,
    now: DateTime<Utc>,
) -> f64 {
    match candidate {
        CandidateItem::Repo(issue) => score_repo_item(issue, keywords, config, now),
        CandidateItem::Qa(question) => score_qa_item(question, keywords, config, now),
    }
}
