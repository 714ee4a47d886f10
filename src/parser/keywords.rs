//! Weighted keyword extraction.
//!
//! Structured identifiers are more search-discriminating than prose, so the
//! exception type counts three times, the root cause twice and the free-text
//! message once.

use std::collections::HashMap;

pub const MAX_KEYWORDS: usize = 5;

const EXCEPTION_WEIGHT: f64 = 3.0;
const ROOT_CAUSE_WEIGHT: f64 = 2.0;
const MESSAGE_WEIGHT: f64 = 1.0;
const LONG_TOKEN_BONUS: f64 = 0.5;
const LONG_TOKEN_LEN: usize = 6;
const MIN_TOKEN_LEN: usize = 3;

/// Words that carry no search signal in a stack trace.
pub const STOPWORDS: &[&str] = &[
    "the", "and", "for", "from", "with", "this", "that", "into", "not", "has", "have", "had",
    "was", "were", "are", "but", "can", "cannot", "could", "would", "should", "will", "when",
    "while", "because", "during", "been", "being", "does", "did", "than", "then", "there",
    "exception", "error", "failed", "cause", "caused", "stack", "trace", "null", "line", "java",
    "python", "lang", "org", "com", "net", "javax", "most", "recent", "call", "last", "file",
    "traceback", "thread", "main", "more", "none", "isnt", "doesnt", "dont", "didnt", "cant",
    "wont", "wasnt", "arent", "couldnt", "shouldnt",
];

const SEPARATORS: &[char] = &[
    ':', ',', ';', '(', ')', '[', ']', '{', '}', '<', '>', '=', '|', '!', '?', '*', '#', '@',
];

const QUOTES: &[char] = &['"', '\'', '`'];

pub fn is_stopword(word: &str) -> bool {
    STOPWORDS.contains(&word)
}

/// Digits only, or a run of six or more hex digits (hashes, addresses).
pub fn is_numeric_or_hex(word: &str) -> bool {
    if word.is_empty() {
        return false;
    }
    word.chars().all(|c| c.is_ascii_digit())
        || (word.len() >= 6 && word.chars().all(|c| c.is_ascii_hexdigit()))
}

/// Whole pieces that are paths, source files or quoted literals.
fn is_noise_piece(piece: &str) -> bool {
    let lower = piece.trim_end_matches('.').to_lowercase();
    lower.contains('/')
        || lower.contains('\\')
        || lower.ends_with(".java")
        || lower.ends_with(".py")
        || piece.starts_with(QUOTES)
        || piece.ends_with(QUOTES)
}

fn is_candidate(token: &str) -> bool {
    token.chars().count() >= MIN_TOKEN_LEN && !is_stopword(token) && !is_numeric_or_hex(token)
}

/// Split `text` into lowercase candidate tokens.
///
/// Pieces are separated on whitespace and punctuation. A dotted name keeps
/// only its last segment, so `requests.exceptions.ConnectionError` yields
/// `connectionerror` and no package names. Quote characters inside a word
/// are removed (`isn't` → `isnt`).
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| c.is_whitespace() || SEPARATORS.contains(&c))
        .filter(|piece| !piece.is_empty() && !is_noise_piece(piece))
        .filter_map(|piece| piece.trim_matches('.').rsplit('.').next())
        .map(|segment| {
            segment
                .trim_matches(|c: char| !c.is_alphanumeric() && c != '_')
                .chars()
                .filter(|c| !QUOTES.contains(c))
                .collect::<String>()
                .to_lowercase()
        })
        .filter(|token| is_candidate(token))
        .collect()
}

#[derive(Default)]
struct KeywordScores {
    order: Vec<(String, f64)>,
    index: HashMap<String, usize>,
}

impl KeywordScores {
    fn add(&mut self, text: Option<&str>, weight: f64) {
        let Some(text) = text else { return };
        for token in tokenize(text) {
            let mut score = weight;
            if token.chars().count() >= LONG_TOKEN_LEN {
                score += LONG_TOKEN_BONUS;
            }
            match self.index.get(&token) {
                Some(&i) => self.order[i].1 += score,
                None => {
                    self.index.insert(token.clone(), self.order.len());
                    self.order.push((token, score));
                }
            }
        }
    }

    /// Highest score first; equal scores keep first-seen order.
    fn top(mut self, n: usize) -> Vec<String> {
        self.order
            .sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        self.order.into_iter().take(n).map(|(token, _)| token).collect()
    }
}

/// Extract up to [`MAX_KEYWORDS`] tokens from the parsed error fields.
pub fn extract(exception_type: &str, root_cause: Option<&str>, message: &str) -> Vec<String> {
    let mut scores = KeywordScores::default();
    scores.add(Some(exception_type), EXCEPTION_WEIGHT);
    scores.add(root_cause, ROOT_CAUSE_WEIGHT);
    scores.add(Some(message), MESSAGE_WEIGHT);
    scores.top(MAX_KEYWORDS)
}
