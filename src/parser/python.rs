use std::sync::LazyLock;

use regex::Regex;

use super::{ErrorParser, ExtractedException};
use crate::error::AnalyzeError;
use crate::models::Language;

/// Reported when the final traceback line has no recognisable shape.
pub const UNKNOWN_PYTHON_ERROR: &str = "UnknownPythonError";

/// `dotted.Name: message`
static ERROR_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Za-z_][\w.]*):\s*(.*)$").expect("python error pattern"));

/// Exceptions raised without a message, e.g. `KeyboardInterrupt`.
static BARE_ERROR_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z_][\w.]*(?:Error|Exception|Interrupt|Exit))$")
        .expect("python bare error pattern")
});

pub struct PythonParser;

impl ErrorParser for PythonParser {
    fn language(&self) -> Language {
        Language::Python
    }

    /// Tracebacks end with the error line, so the last non-blank line is authoritative.
    fn extract(&self, text: &str) -> Result<ExtractedException, AnalyzeError> {
        let last = text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .last()
            .ok_or_else(|| AnalyzeError::InvalidInput("Stack trace cannot be empty".into()))?;

        if let Some(found) = self.parse_cause(last) {
            return Ok(found);
        }

        tracing::warn!("Could not match Python error pattern: {last}");
        Ok(ExtractedException {
            exception_type: UNKNOWN_PYTHON_ERROR.to_string(),
            qualified_exception: UNKNOWN_PYTHON_ERROR.to_string(),
            message: last.to_string(),
        })
    }

    fn parse_cause(&self, cause: &str) -> Option<ExtractedException> {
        let line = cause.trim();
        let (name, message) = if let Some(caps) = ERROR_LINE.captures(line) {
            (caps[1].to_string(), caps[2].trim().to_string())
        } else {
            let caps = BARE_ERROR_LINE.captures(line)?;
            (caps[1].to_string(), String::new())
        };
        Some(ExtractedException {
            exception_type: name.clone(),
            qualified_exception: name,
            message,
        })
    }
}
