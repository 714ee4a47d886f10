//! Onion query construction.
//!
//! Repo queries run from most to least specific:
//!
//! ```text
//!   framework signature  ──▶  "BeanCreationException spring in:title,body"
//!   exception + context  ──▶  "LazyInitializationException hibernate in:title,body"
//!   exception + keywords ──▶  "SQLException connection refused in:title,body"
//!   broad fallback       ──▶  "MappingException in:title,body"   (skipped for generic names)
//! ```
//!
//! Q&A queries are two tiers: exception plus a sanitized message phrase,
//! then the bare exception name.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use super::ranking::is_hash_like;
use crate::models::ParsedError;
use crate::parser::{keywords, simple_name};

/// Queries longer than this are cut at a word boundary.
pub const MAX_QUERY_CHARS: usize = 250;

const FALLBACK_EXCEPTION: &str = "Exception";
const SCOPE_BODY: &str = "in:title,body";
const SCOPE_TITLE: &str = "in:title";
const QUERY_KEYWORDS: usize = 3;
const PHRASE_WORDS: usize = 6;

/// First package segments that are organisations rather than libraries.
const UMBRELLA_ORGS: &[&str] = &[
    "apache", "google", "amazon", "aws", "azure", "eclipse", "jakarta", "github", "software",
];

const GENERIC_PACKAGE_PARTS: &[&str] = &[
    "internal", "util", "utils", "common", "core", "impl", "exception", "exceptions", "error",
    "errors", "api", "spi",
];

const STDLIB_PREFIXES: &[&str] = &["java.", "javax.", "jakarta.", "sun.", "jdk."];

/// Exception names too common to search on their own.
const GENERIC_EXCEPTIONS: &[&str] = &[
    "exception",
    "runtimeexception",
    "error",
    "throwable",
    "executionexception",
    "completionexception",
    "ioexception",
    "sqlexception",
    "nullpointerexception",
];

/// Tokens that say nothing useful to an issue search engine.
const QUERY_NOISE: &[&str] = &[
    "com", "org", "net", "io", "java", "jakarta", "javax", "exception", "error", "failed",
    "failure", "null", "instance", "bean", "type", "class", "method", "unable", "with", "from",
    "into", "before", "after", "cant", "shall", "might", "must", "about", "through",
];

/// Raw trace namespaces mapped to one canonical context token.
const CONTEXT_NAMESPACES: &[(&[&str], &str)] = &[
    (&["org.springframework"], "spring"),
    (&["org.hibernate"], "hibernate"),
    (&["jakarta.persistence", "javax.persistence"], "jpa"),
    (&["com.fasterxml.jackson"], "jackson"),
    (&["org.junit", "org.mockito"], "test"),
];

static SCOPE_OPERATOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:in|is|label|repo|user|org|intitle|tagged):\S*").expect("scope operator pattern")
});
static QUOTED_LITERAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""[^"]*"|'[^']*'|`[^`]*`"#).expect("quoted literal pattern"));
static HEX_ADDRESS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b0x[0-9a-fA-F]+\b").expect("hex address pattern"));
static PATH_FRAGMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\S*[/\\]\S*").expect("path pattern"));
static DOTTED_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[A-Za-z_$][\w$]*(?:\.[A-Za-z_$][\w$]*)+").expect("dotted name pattern")
});

// ─── Context detection ──────────────────────────────────────────────

/// Library token from a qualified exception name, e.g.
/// `org.hibernate.LazyInitializationException` → `hibernate` and
/// `org.apache.kafka.common.KafkaException` → `kafka`.
pub fn extract_library(qualified: &str) -> Option<String> {
    if !qualified.contains('.') || STDLIB_PREFIXES.iter().any(|p| qualified.starts_with(p)) {
        return None;
    }

    let parts: Vec<&str> = qualified.split('.').collect();
    if parts.len() < 3 {
        return None;
    }

    let mut candidate = parts[1].to_lowercase();
    if UMBRELLA_ORGS.contains(&candidate.as_str()) && parts.len() > 3 {
        candidate = parts[2].to_lowercase();
    }

    if candidate.len() <= 2 || GENERIC_PACKAGE_PARTS.contains(&candidate.as_str()) {
        return None;
    }
    Some(candidate)
}

fn normalize_library(library: &str) -> String {
    let l = library.to_lowercase();
    if l.contains("spring") {
        "spring".to_string()
    } else if l.contains("hibernate") {
        "hibernate".to_string()
    } else if l.contains("jakarta") || l.contains("persistence") || l.contains("jpa") {
        "jpa".to_string()
    } else if l.contains("jackson") || l.contains("fasterxml") {
        "jackson".to_string()
    } else {
        l.trim().to_string()
    }
}

/// Canonical framework context: the exception's own library first, then
/// well-known namespaces appearing anywhere in the trace.
pub fn detect_context(qualified: &str, raw_lower: &str) -> Option<String> {
    if let Some(library) = extract_library(qualified) {
        return Some(normalize_library(&library));
    }
    CONTEXT_NAMESPACES
        .iter()
        .find(|(needles, _)| needles.iter().any(|n| raw_lower.contains(n)))
        .map(|(_, token)| token.to_string())
}

fn looks_spring(exception: &str, raw_lower: &str, context: Option<&str>) -> bool {
    raw_lower.contains("org.springframework")
        || context == Some("spring")
        || exception.to_lowercase().contains("bean")
}

/// Dependency-injection failure phrasing.
fn has_bean_signature(exception: &str, message: &str) -> bool {
    let msg = message.to_lowercase();
    msg.contains("no qualifying bean")
        || msg.contains("nosuchbeandefinition")
        || exception.to_lowercase().contains("nosuchbeandefinition")
}

pub fn is_generic_exception(simple: &str) -> bool {
    GENERIC_EXCEPTIONS.contains(&simple.to_lowercase().as_str())
}

// ─── Keyword filtering ──────────────────────────────────────────────

/// Lowercase package segments of the qualified exception and of every dotted
/// name in the trace. Class and member names (the last segment, or anything
/// capitalized) are not namespaces.
fn namespace_segments(qualified: &str, raw: &str) -> HashSet<String> {
    std::iter::once(qualified)
        .chain(DOTTED_NAME.find_iter(raw).map(|m| m.as_str()))
        .flat_map(|name| {
            let segments: Vec<&str> = name.split('.').collect();
            let package_len = segments.len().saturating_sub(1);
            segments.into_iter().take(package_len)
        })
        .filter(|segment| segment.starts_with(|c: char| c.is_ascii_lowercase()))
        .map(str::to_ascii_lowercase)
        .collect()
}

fn is_useful_keyword(
    keyword: &str,
    exception_lower: &str,
    context: Option<&str>,
    namespaces: &HashSet<String>,
) -> bool {
    let k = keyword.trim();
    if k.len() < 3 || k == exception_lower || Some(k) == context || namespaces.contains(k) {
        return false;
    }
    if k.contains(['.', '/', '\\', ':']) {
        return false;
    }
    if QUERY_NOISE.contains(&k) || keywords::is_stopword(k) || is_hash_like(k) {
        return false;
    }
    let namespace_prefixed = ["com", "org", "net", "io"].iter().any(|p| k.starts_with(p));
    !(namespace_prefixed && k.contains("example"))
}

/// Keywords worth adding to a query; the exception name and context token
/// are already part of every query that uses them, and package names of
/// the trace never are.
fn useful_keywords(
    parsed: &ParsedError,
    exception: &str,
    context: Option<&str>,
    raw: &str,
) -> Vec<String> {
    let exception_lower = exception.to_lowercase();
    let namespaces = namespace_segments(&parsed.qualified_exception, raw);
    parsed
        .keywords
        .iter()
        .map(|k| {
            k.to_lowercase()
                .chars()
                .filter(|c| c.is_ascii_alphanumeric())
                .collect::<String>()
        })
        .filter(|k| is_useful_keyword(k, &exception_lower, context, &namespaces))
        .take(QUERY_KEYWORDS)
        .collect()
}

// ─── Repo queries ───────────────────────────────────────────────────

/// The simple exception name queries are anchored on.
pub fn query_exception(parsed: &ParsedError) -> String {
    let simple = simple_name(&parsed.exception_type);
    if simple.is_empty() {
        FALLBACK_EXCEPTION.to_string()
    } else {
        simple.to_string()
    }
}

/// Ordered, deduplicated issue-search queries, strict to broad.
pub fn build_repo_queries(parsed: &ParsedError, raw: &str) -> Vec<String> {
    let exception = query_exception(parsed);
    let raw_lower = raw.to_lowercase();
    let context = detect_context(&parsed.qualified_exception, &raw_lower);
    let ctx = context.as_deref().filter(|c| !c.is_empty());
    let keywords = useful_keywords(parsed, &exception, ctx, raw);
    let generic = is_generic_exception(&exception);

    let mut queries = Vec::new();

    if looks_spring(&exception, &raw_lower, ctx) {
        queries.push(format!("{exception} spring {SCOPE_BODY}"));
        if has_bean_signature(&exception, &parsed.message) {
            queries.push(format!("\"no qualifying bean\" spring {SCOPE_BODY}"));
        }
        queries.push(format!("{exception} {SCOPE_TITLE} spring"));
    }

    if let Some(ctx) = ctx {
        queries.push(format!("{exception} {ctx} {SCOPE_BODY}"));
        queries.push(format!("{exception} {SCOPE_TITLE} {ctx}"));
    }

    if !keywords.is_empty() {
        let top = keywords[..keywords.len().min(2)].join(" ");
        queries.push(format!("{exception} {top} {SCOPE_BODY}"));
        if let Some(ctx) = ctx {
            queries.push(format!("{exception} {ctx} {top} {SCOPE_BODY}"));
        }
    }

    if !generic {
        queries.push(format!("{exception} {SCOPE_BODY}"));
        queries.push(format!("{exception} {SCOPE_TITLE}"));
    } else if let Some(first) = keywords.first() {
        queries.push(format!("{exception} {first} {SCOPE_BODY}"));
    }

    // A bare generic name with nothing to qualify it still gets one query.
    if queries.is_empty() {
        queries.push(format!("{exception} {SCOPE_BODY}"));
    }

    finalize(queries)
}

// ─── Q&A queries ────────────────────────────────────────────────────

/// First clause of the message with search operators, paths, addresses
/// and quoted literals removed.
pub fn message_phrase(message: &str) -> String {
    let cleaned = SCOPE_OPERATOR.replace_all(message, " ");
    let cleaned = QUOTED_LITERAL.replace_all(&cleaned, " ");
    let cleaned = PATH_FRAGMENT.replace_all(&cleaned, " ");
    let cleaned = HEX_ADDRESS.replace_all(&cleaned, " ");

    let lower = cleaned.to_ascii_lowercase();
    let mut end = cleaned.len();
    if let Some(idx) = lower.find(" because ") {
        end = end.min(idx);
    }
    if let Some(idx) = cleaned.find([';', ':', '(']) {
        end = end.min(idx);
    }

    cleaned[..end]
        .split_whitespace()
        .take(PHRASE_WORDS)
        .collect::<Vec<_>>()
        .join(" ")
        .trim_matches(|c: char| c == '.' || c == ',')
        .to_string()
}

/// Two tiers: exception plus message phrase, then the bare exception.
pub fn build_qa_queries(parsed: &ParsedError) -> Vec<String> {
    let exception = query_exception(parsed);
    let phrase = message_phrase(&parsed.message);

    let mut queries = Vec::with_capacity(2);
    if !phrase.is_empty() {
        if phrase.contains(char::is_whitespace) || phrase.contains('.') {
            queries.push(format!("{exception} \"{phrase}\""));
        } else {
            queries.push(format!("{exception} {phrase}"));
        }
    }
    queries.push(exception);

    finalize(queries)
}

// ─── Post-processing ────────────────────────────────────────────────

fn cap_length(query: &str) -> String {
    if query.chars().count() <= MAX_QUERY_CHARS {
        return query.to_string();
    }
    let cut: String = query.chars().take(MAX_QUERY_CHARS).collect();
    match cut.rfind(' ') {
        Some(idx) if idx > 0 => cut[..idx].trim_end().to_string(),
        _ => cut,
    }
}

/// Trim, cap, drop blanks and duplicates while keeping order.
fn finalize(queries: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    queries
        .into_iter()
        .map(|q| cap_length(q.trim()))
        .filter(|q| !q.is_empty())
        .filter(|q| seen.insert(q.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Language;

    fn parsed(qualified: &str, message: &str, keywords: &[&str]) -> ParsedError {
        ParsedError {
            language: Language::Java,
            exception_type: simple_name(qualified).to_string(),
            qualified_exception: qualified.to_string(),
            message: message.to_string(),
            root_cause: None,
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            stack_trace_lines: 1,
        }
    }

    #[test]
    fn test_extract_library() {
        assert_eq!(
            extract_library("org.hibernate.LazyInitializationException").as_deref(),
            Some("hibernate")
        );
        assert_eq!(
            extract_library("org.apache.kafka.common.KafkaException").as_deref(),
            Some("kafka")
        );
        assert_eq!(extract_library("java.lang.NullPointerException"), None);
        assert_eq!(extract_library("com.example.Foo"), Some("example".to_string()));
        assert_eq!(extract_library("org.util.Thing"), None);
        assert_eq!(extract_library("a.io.Thing"), None);
        assert_eq!(extract_library("NullPointerException"), None);
    }

    #[test]
    fn test_context_normalization() {
        assert_eq!(
            detect_context("org.springframework.beans.BeanCreationException", "").as_deref(),
            Some("spring")
        );
        assert_eq!(
            detect_context("java.lang.IllegalStateException", "at jakarta.persistence.foo").as_deref(),
            Some("jpa")
        );
        assert_eq!(
            detect_context("java.lang.RuntimeException", "at com.fasterxml.jackson.databind").as_deref(),
            Some("jackson")
        );
        assert_eq!(
            detect_context("java.lang.AssertionError", "at org.junit.assert").as_deref(),
            Some("test")
        );
        assert_eq!(detect_context("java.lang.RuntimeException", "at com.app.main"), None);
    }

    #[test]
    fn test_hibernate_layers_strict_to_broad() {
        let error = parsed(
            "org.hibernate.LazyInitializationException",
            "could not initialize proxy - no Session",
            &["lazyinitializationexception", "hibernate", "initialize", "proxy", "session"],
        );
        let queries = build_repo_queries(&error, "org.hibernate.LazyInitializationException: ...");
        assert_eq!(
            queries,
            vec![
                "LazyInitializationException hibernate in:title,body",
                "LazyInitializationException in:title hibernate",
                "LazyInitializationException initialize proxy in:title,body",
                "LazyInitializationException hibernate initialize proxy in:title,body",
                "LazyInitializationException in:title,body",
                "LazyInitializationException in:title",
            ]
        );
    }

    #[test]
    fn test_keyword_matching_exception_name_is_skipped() {
        let error = parsed("java.lang.IllegalStateException", "", &["illegalstateexception", "queue"]);
        let queries = build_repo_queries(&error, "");
        assert_eq!(queries[0], "IllegalStateException queue in:title,body");
    }

    #[test]
    fn test_spring_signature_queries_come_first() {
        let error = parsed(
            "org.springframework.beans.factory.NoSuchBeanDefinitionException",
            "No qualifying bean of type 'com.app.UserRepository' available",
            &["nosuchbeandefinitionexception", "qualifying", "available"],
        );
        let queries = build_repo_queries(&error, "org.springframework.beans.factory...");
        assert_eq!(queries[0], "NoSuchBeanDefinitionException spring in:title,body");
        assert_eq!(queries[1], "\"no qualifying bean\" spring in:title,body");
        assert_eq!(queries[2], "NoSuchBeanDefinitionException in:title spring");
    }

    #[test]
    fn test_generic_exception_skips_broad_fallback() {
        let error = parsed(
            "java.lang.NullPointerException",
            "Cannot invoke foo()",
            &["nullpointerexception", "invoke"],
        );
        let queries = build_repo_queries(&error, "");
        assert!(!queries.contains(&"NullPointerException in:title,body".to_string()));
        assert!(!queries.contains(&"NullPointerException in:title".to_string()));
        assert!(queries.contains(&"NullPointerException invoke in:title,body".to_string()));
    }

    #[test]
    fn test_generic_exception_with_nothing_else_still_queries() {
        let error = parsed("java.lang.RuntimeException", "", &["runtimeexception"]);
        assert_eq!(
            build_repo_queries(&error, ""),
            vec!["RuntimeException in:title,body"]
        );
    }

    #[test]
    fn test_noisy_keywords_excluded() {
        let error = parsed(
            "com.app.CustomException",
            "",
            &["customexception", "deadbeefcafe", "comexamplefoo", "instance", "a1b2c3d4e5"],
        );
        let queries = build_repo_queries(&error, "");
        assert!(queries.iter().all(|q| !q.contains("deadbeef")));
        assert!(queries.iter().all(|q| !q.contains("comexample")));
        assert!(queries.iter().all(|q| !q.contains("instance")));
        assert!(queries.iter().all(|q| !q.contains("a1b2c3")));
    }

    #[test]
    fn test_namespace_segments_from_trace() {
        let namespaces = namespace_segments(
            "requests.exceptions.ConnectionError",
            "  File \"app.py\", line 3\n\tat com.acme.queue.Worker.run(Worker.java:10)",
        );
        for segment in ["requests", "exceptions", "app", "com", "acme", "queue"] {
            assert!(namespaces.contains(segment), "{segment} missing");
        }
        assert!(!namespaces.contains("connectionerror"));
        assert!(!namespaces.contains("worker"));
        assert!(!namespaces.contains("run"));
    }

    #[test]
    fn test_package_keywords_never_reach_queries() {
        let error = ParsedError {
            language: Language::Python,
            exception_type: "requests.exceptions.ConnectionError".to_string(),
            qualified_exception: "requests.exceptions.ConnectionError".to_string(),
            message: "Max retries exceeded".to_string(),
            root_cause: None,
            keywords: vec![
                "requests".to_string(),
                "exceptions".to_string(),
                "connectionerror".to_string(),
                "retries".to_string(),
                "exceeded".to_string(),
            ],
            stack_trace_lines: 3,
        };
        let raw = "Traceback (most recent call last):\n\
                   requests.exceptions.ConnectionError: Max retries exceeded";
        let queries = build_repo_queries(&error, raw);
        assert_eq!(queries[0], "ConnectionError retries exceeded in:title,body");
        assert!(queries.iter().all(|q| !q.contains("requests") && !q.contains("exceptions")));
    }

    #[test]
    fn test_kafka_namespace_keywords_skipped() {
        let error = parsed(
            "org.apache.kafka.common.errors.TimeoutException",
            "Expiring 1 record(s)",
            &["timeoutexception", "apache", "common", "expiring", "record"],
        );
        let raw = "org.apache.kafka.common.errors.TimeoutException: Expiring 1 record(s)";
        let queries = build_repo_queries(&error, raw);
        assert!(queries.contains(&"TimeoutException expiring record in:title,body".to_string()));
        assert!(queries.iter().all(|q| !q.contains("apache") && !q.contains("common")));
    }

    #[test]
    fn test_queries_are_unique_trimmed_and_capped() {
        let long = "verylongtoken ".repeat(40);
        let queries = finalize(vec![
            "  a in:title  ".to_string(),
            "a in:title".to_string(),
            String::new(),
            long,
        ]);
        assert_eq!(queries[0], "a in:title");
        assert_eq!(queries.len(), 2);
        assert!(queries[1].chars().count() <= MAX_QUERY_CHARS);
        assert!(!queries[1].ends_with(' '));
    }

    #[test]
    fn test_message_phrase_sanitized() {
        assert_eq!(
            message_phrase("Cannot invoke \"String.length()\" because \"s\" is null"),
            "Cannot invoke"
        );
        assert_eq!(
            message_phrase("failed to open /tmp/x.txt at 0x7ffe12 in:title is:open"),
            "failed to open at"
        );
        assert_eq!(message_phrase("division by zero"), "division by zero");
        assert_eq!(message_phrase(""), "");
    }

    #[test]
    fn test_qa_queries_two_tiers() {
        let error = ParsedError {
            language: Language::Python,
            exception_type: "ZeroDivisionError".to_string(),
            qualified_exception: "ZeroDivisionError".to_string(),
            message: "division by zero".to_string(),
            root_cause: None,
            keywords: vec![],
            stack_trace_lines: 3,
        };
        assert_eq!(
            build_qa_queries(&error),
            vec!["ZeroDivisionError \"division by zero\"", "ZeroDivisionError"]
        );
    }

    #[test]
    fn test_qa_queries_without_message() {
        let error = parsed("java.lang.StackOverflowError", "", &[]);
        assert_eq!(build_qa_queries(&error), vec!["StackOverflowError"]);
    }

    #[test]
    fn test_qa_single_word_phrase_not_quoted() {
        let error = parsed("java.lang.IllegalStateException", "closed", &[]);
        assert_eq!(
            build_qa_queries(&error),
            vec!["IllegalStateException closed", "IllegalStateException"]
        );
    }
}
