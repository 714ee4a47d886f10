//! Stack trace parsing: language detection, exception extraction, chained
//! root cause lookup and keyword extraction.

pub mod classifier;
pub mod java;
pub mod keywords;
pub mod python;
pub mod root_cause;

use crate::error::AnalyzeError;
use crate::models::{Language, ParsedError};

/// Exception name and message found by a language grammar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedException {
    /// Display name (simple name for Java, as found for Python).
    pub exception_type: String,
    /// Name exactly as it appeared in the trace.
    pub qualified_exception: String,
    pub message: String,
}

/// One grammar per supported language.
pub trait ErrorParser: Send + Sync {
    fn language(&self) -> Language;

    /// Locate the failing exception line. Only blank input is an error;
    /// unmatched traces fall back to best-effort values.
    fn extract(&self, text: &str) -> Result<ExtractedException, AnalyzeError>;

    /// Parse a `Type: message` chained-cause payload.
    fn parse_cause(&self, cause: &str) -> Option<ExtractedException>;

    /// Build the full [`ParsedError`]. A chained root cause, when present,
    /// replaces the outer exception as the reported error.
    fn parse(&self, text: &str) -> Result<ParsedError, AnalyzeError> {
        let outer = self.extract(text)?;
        let root_cause = root_cause::extract_deepest_cause(text);

        let reported = root_cause
            .as_deref()
            .and_then(|cause| self.parse_cause(cause))
            .unwrap_or(outer);

        let keywords = keywords::extract(
            &reported.exception_type,
            root_cause.as_deref(),
            &reported.message,
        );

        Ok(ParsedError {
            language: self.language(),
            exception_type: reported.exception_type,
            qualified_exception: reported.qualified_exception,
            message: reported.message,
            root_cause,
            keywords,
            stack_trace_lines: text.lines().filter(|l| !l.trim().is_empty()).count(),
        })
    }
}

static JAVA: java::JavaParser = java::JavaParser;
static PYTHON: python::PythonParser = python::PythonParser;

/// Map a detected language to its parser, or None if unsupported.
pub fn parser_for(language: Language) -> Option<&'static dyn ErrorParser> {
    match language {
        Language::Java => Some(&JAVA),
        Language::Python => Some(&PYTHON),
        Language::Unknown => None,
    }
}

/// Last segment of a dotted name.
pub fn simple_name(qualified: &str) -> &str {
    qualified.rsplit('.').next().unwrap_or(qualified).trim()
}

/// Classify `text` and run the matching language parser.
pub fn parse(text: &str) -> Result<ParsedError, AnalyzeError> {
    if text.trim().is_empty() {
        return Err(AnalyzeError::InvalidInput(
            "Stack trace cannot be empty".into(),
        ));
    }

    let classification = classifier::classify(text)?;
    tracing::info!(
        "Detected language: {} (score {})",
        classification.language,
        classification.score
    );

    let parser = parser_for(classification.language).ok_or(AnalyzeError::UnsupportedLanguage)?;
    let parsed = parser.parse(text)?;
    tracing::debug!(
        "Parsed: exception={}, message={}, keywords={:?}",
        parsed.exception_type,
        parsed.message,
        parsed.keywords
    );
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_name() {
        assert_eq!(simple_name("java.lang.NullPointerException"), "NullPointerException");
        assert_eq!(simple_name("ValueError"), "ValueError");
    }

    #[test]
    fn test_parse_java_scenario() {
        let parsed = parse("java.lang.NullPointerException: Cannot invoke foo()\n at X.java:1").unwrap();
        assert_eq!(parsed.language, Language::Java);
        assert_eq!(parsed.exception_type, "NullPointerException");
        assert_eq!(parsed.message, "Cannot invoke foo()");
        assert_eq!(parsed.root_cause, None);
        assert_eq!(parsed.stack_trace_lines, 2);
        assert_eq!(parsed.keywords[0], "nullpointerexception");
    }

    #[test]
    fn test_parse_python_scenario() {
        let parsed = parse(
            "Traceback (most recent call last):\n File \"a.py\", line 1\nZeroDivisionError: division by zero",
        )
        .unwrap();
        assert_eq!(parsed.language, Language::Python);
        assert_eq!(parsed.exception_type, "ZeroDivisionError");
        assert_eq!(parsed.message, "division by zero");
        assert_eq!(parsed.keywords, vec!["zerodivisionerror", "division", "zero"]);
    }

    #[test]
    fn test_root_cause_replaces_outer_exception() {
        let trace = "org.springframework.beans.factory.BeanCreationException: Error creating bean with name 'dataSource'\n\
                     \tat org.springframework.beans.factory.support.AbstractBeanFactory.getBean(AbstractBeanFactory.java:10)\n\
                     Caused by: org.hibernate.HibernateException: Unable to build session\n\
                     \tat org.hibernate.Foo.bar(Foo.java:1)\n\
                     Caused by: java.sql.SQLException: Connection refused\n\
                     \t... 12 more";
        let parsed = parse(trace).unwrap();
        assert_eq!(parsed.exception_type, "SQLException");
        assert_eq!(parsed.qualified_exception, "java.sql.SQLException");
        assert_eq!(parsed.message, "Connection refused");
        assert_eq!(
            parsed.root_cause.as_deref(),
            Some("java.sql.SQLException: Connection refused")
        );
        assert_eq!(parsed.keywords[0], "sqlexception");
    }

    #[test]
    fn test_blank_rejected_before_classification() {
        assert!(matches!(parse("   "), Err(AnalyzeError::InvalidInput(_))));
    }

    #[test]
    fn test_unknown_text_unsupported() {
        assert_eq!(
            parse("just some words without any trace"),
            Err(AnalyzeError::UnsupportedLanguage)
        );
    }

    #[test]
    fn test_keywords_respect_invariants() {
        let trace = "Exception in thread \"main\" java.io.FileNotFoundException: /tmp/app/config.yml (No such file or directory)\n\
                     \tat java.io.FileInputStream.open0(Native Method)\n\
                     \tat com.app.Config.load(Config.java:42)";
        let parsed = parse(trace).unwrap();
        assert!(parsed.keywords.len() <= 5);
        for k in &parsed.keywords {
            assert!(k.len() >= 3);
            assert_eq!(*k, k.to_lowercase());
            assert!(!keywords::is_stopword(k));
            assert!(!k.contains('/'));
        }
    }
}
