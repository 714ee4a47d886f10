use std::sync::LazyLock;

use regex::Regex;

use super::{simple_name, ErrorParser, ExtractedException};
use crate::error::AnalyzeError;
use crate::models::Language;

/// `[Exception in thread "x"] qualified.NameException[: message]`
static EXCEPTION_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"^(?:Exception in thread "[^"]*"\s+)?((?:[A-Za-z_$][\w$]*\.)*[A-Za-z_$][\w$]*(?:Exception|Error))(?::\s*(.*))?$"#,
    )
    .expect("java exception pattern")
});

/// Loose `Type[: message]` shape used for chained-cause payloads.
static CAUSE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^((?:[A-Za-z_$][\w$]*\.)*[A-Za-z_$][\w$]*)(?::\s*(.*))?$")
        .expect("java cause pattern")
});

pub struct JavaParser;

impl ErrorParser for JavaParser {
    fn language(&self) -> Language {
        Language::Java
    }

    /// First line shaped like an exception wins; otherwise the first
    /// non-blank line is reported verbatim.
    fn extract(&self, text: &str) -> Result<ExtractedException, AnalyzeError> {
        let lines: Vec<&str> = text.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
        let first = lines
            .first()
            .copied()
            .ok_or_else(|| AnalyzeError::InvalidInput("Stack trace cannot be empty".into()))?;

        for line in &lines {
            if let Some(caps) = EXCEPTION_LINE.captures(line) {
                let qualified = caps[1].to_string();
                let message = caps.get(2).map(|m| m.as_str().trim()).unwrap_or("");
                return Ok(ExtractedException {
                    exception_type: simple_name(&qualified).to_string(),
                    qualified_exception: qualified,
                    message: message.to_string(),
                });
            }
        }

        tracing::debug!("No Java exception line matched, using first line verbatim");
        Ok(ExtractedException {
            exception_type: first.to_string(),
            qualified_exception: first.to_string(),
            message: String::new(),
        })
    }

    fn parse_cause(&self, cause: &str) -> Option<ExtractedException> {
        let caps = CAUSE_LINE.captures(cause.trim())?;
        let qualified = caps[1].to_string();
        let message = caps.get(2).map(|m| m.as_str().trim()).unwrap_or("");
        Some(ExtractedException {
            exception_type: simple_name(&qualified).to_string(),
            qualified_exception: qualified,
            message: message.to_string(),
        })
    }
}
