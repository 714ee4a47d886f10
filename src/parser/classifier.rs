//! Score-based language detection.
//!
//! Real traces mix vocabulary (a Java log line can mention "traceback", a
//! Python message can contain "Exception"), so each language sums points for
//! every signal it finds and the higher total wins.

use crate::error::AnalyzeError;
use crate::models::Language;

/// Substring signals matched against the lowercased trace, with their points.
const JAVA_SIGNALS: &[(&str, u32)] = &[
    ("exception in thread \"", 3),
    (".java:", 3),
    ("caused by: ", 2),
    ("nested exception is", 2),
    ("java.lang.", 2),
    ("\tat ", 2),
    ("    at ", 2),
    ("(native method)", 2),
    ("(unknown source)", 2),
    ("exception:", 1),
];

const PYTHON_SIGNALS: &[(&str, u32)] = &[
    ("traceback (most recent call last)", 3),
    ("file \"", 2),
    (", line ", 2),
    (".py\"", 2),
    ("during handling of the above exception", 2),
    ("the above exception was the direct cause", 2),
    ("    raise ", 1),
];

/// Priority order used to break exact ties.
const PRIORITY: [Language; 2] = [Language::Java, Language::Python];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub language: Language,
    pub score: u32,
}

fn signals(language: Language) -> &'static [(&'static str, u32)] {
    match language {
        Language::Java => JAVA_SIGNALS,
        Language::Python => PYTHON_SIGNALS,
        Language::Unknown => &[],
    }
}

/// Sum the points of every signal present in `lowered`.
fn score(lowered: &str, language: Language) -> u32 {
    signals(language)
        .iter()
        .filter(|(needle, _)| lowered.contains(needle))
        .map(|(_, points)| points)
        .sum()
}

/// Pick the language with the strictly highest score; ties go to the
/// language listed first in [`PRIORITY`].
pub fn classify(text: &str) -> Result<Classification, AnalyzeError> {
    let lowered = text.to_lowercase();

    let mut best: Option<Classification> = None;
    for language in PRIORITY {
        let points = score(&lowered, language);
        tracing::debug!("Language score {language}: {points}");
        if points == 0 {
            continue;
        }
        match best {
            Some(current) if current.score >= points => {}
            _ => {
                best = Some(Classification {
                    language,
                    score: points,
                })
            }
        }
    }

    best.ok_or(AnalyzeError::UnsupportedLanguage)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_java_trace() {
        let trace = "java.lang.NullPointerException: boom\n\tat com.app.Main.run(Main.java:10)";
        let result = classify(trace).unwrap();
        assert_eq!(result.language, Language::Java);
        assert!(result.score >= 5);
    }

    #[test]
    fn test_classify_python_trace() {
        let trace = "Traceback (most recent call last):\n  File \"script.py\", line 1, in <module>\nValueError: bad";
        let result = classify(trace).unwrap();
        assert_eq!(result.language, Language::Python);
    }

    #[test]
    fn test_java_wins_exact_tie() {
        // 3 points each: the Python header vs. a Java frame location
        let mixed = "Traceback (most recent call last)\nFoo.java:12";
        assert_eq!(score(&mixed.to_lowercase(), Language::Java), 3);
        assert_eq!(score(&mixed.to_lowercase(), Language::Python), 3);
        assert_eq!(classify(mixed).unwrap().language, Language::Java);
    }

    #[test]
    fn test_java_log_mentioning_traceback_stays_java() {
        let trace = "Exception in thread \"main\" java.lang.IllegalStateException: no traceback available\n\tat com.app.Main.main(Main.java:5)";
        assert_eq!(classify(trace).unwrap().language, Language::Java);
    }

    #[test]
    fn test_python_with_exception_word_stays_python() {
        let trace = "Traceback (most recent call last):\n  File \"app.py\", line 3, in <module>\n    raise CustomException: oops\nCustomException: oops";
        assert_eq!(classify(trace).unwrap().language, Language::Python);
    }

    #[test]
    fn test_no_signal_is_unsupported() {
        let err = classify("I am not a stack trace just some random text").unwrap_err();
        assert_eq!(err, AnalyzeError::UnsupportedLanguage);
    }
}
