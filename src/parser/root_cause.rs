//! Finds the deepest cause in a chained stack trace.

use std::sync::LazyLock;

use regex::Regex;

const CAUSED_BY: &str = "Caused by:";
const NESTED_EXCEPTION: &str = "nested exception is";
const PYTHON_CHAIN: &str = "During handling of the above exception";

static PYTHON_EXCEPTION_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][\w.]*(?:Error|Exception):.*$").expect("python cause pattern")
});

/// Return the payload of the last chained-cause marker in `text`.
///
/// Later markers overwrite earlier ones, so the deepest cause wins. Handles
/// Java `Caused by:`, Spring `nested exception is`, and the Python
/// "During handling of the above exception" idiom where the next
/// `Type: message` line is the new cause.
pub fn extract_deepest_cause(text: &str) -> Option<String> {
    let mut last_cause: Option<String> = None;
    let mut expect_python_cause = false;

    for line in text.lines().map(str::trim) {
        if let Some(rest) = line.strip_prefix(CAUSED_BY) {
            let rest = match rest.rfind(NESTED_EXCEPTION) {
                Some(idx) => &rest[idx + NESTED_EXCEPTION.len()..],
                None => rest,
            };
            set_cause(&mut last_cause, rest);
            continue;
        }

        if let Some(idx) = line.rfind(NESTED_EXCEPTION) {
            set_cause(&mut last_cause, &line[idx + NESTED_EXCEPTION.len()..]);
            continue;
        }

        if line.starts_with(PYTHON_CHAIN) {
            expect_python_cause = true;
            continue;
        }

        if expect_python_cause && PYTHON_EXCEPTION_LINE.is_match(line) {
            last_cause = Some(line.to_string());
            expect_python_cause = false;
        }
    }

    if let Some(cause) = &last_cause {
        tracing::debug!("Root cause: {cause}");
    }
    last_cause
}

fn set_cause(slot: &mut Option<String>, payload: &str) {
    // Spring appends "; nested exception is ..." chains and sometimes a trailing ']'
    let payload = payload.trim().trim_end_matches(']').trim();
    if !payload.is_empty() {
        *slot = Some(payload.to_string());
    }
}
