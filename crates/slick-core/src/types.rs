//! Core types for lint problems and results.

use crate::span::{Position, Range};
use miette::{Diagnostic, SourceSpan};
use serde::{Deserialize, Serialize};

/// Severity level for lint problems.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational message, does not fail lint.
    Info,
    /// Warning that should be addressed.
    Warning,
    /// Error that must be fixed.
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// A suggested fix for a problem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    /// Human-readable description of the fix.
    pub message: String,
}

impl Suggestion {
    /// Creates a new suggestion.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// A problem found during analysis.
///
/// Problems come from two sources: rules reporting on the AST, and the
/// substrate itself diagnosing malformed inline directives. The latter carry
/// no rule code/name and are never suppressed by directives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Problem {
    /// Rule code (e.g., "SL001"); `None` for directive diagnostics.
    pub code: Option<String>,
    /// Rule name (e.g., "require-this-in-methods"); `None` for directive
    /// diagnostics.
    pub rule: Option<String>,
    /// Severity of this problem.
    pub severity: Severity,
    /// Position of the problem in the source.
    pub position: Position,
    /// Byte range covered by the problem.
    pub range: Range,
    /// Human-readable message.
    pub message: String,
    /// Optional suggestion for fixing.
    pub suggestion: Option<Suggestion>,
}

impl Problem {
    /// Creates a new rule problem.
    #[must_use]
    pub fn new(
        code: impl Into<String>,
        rule: impl Into<String>,
        severity: Severity,
        position: Position,
        range: Range,
        message: impl Into<String>,
    ) -> Self {
        Self {
            code: Some(code.into()),
            rule: Some(rule.into()),
            severity,
            position,
            range,
            message: message.into(),
            suggestion: None,
        }
    }

    /// Creates a problem with no associated rule, used for directive
    /// diagnostics.
    #[must_use]
    pub fn without_rule(
        severity: Severity,
        position: Position,
        range: Range,
        message: impl Into<String>,
    ) -> Self {
        Self {
            code: None,
            rule: None,
            severity,
            position,
            range,
            message: message.into(),
            suggestion: None,
        }
    }

    /// Adds a suggestion to this problem.
    #[must_use]
    pub fn with_suggestion(mut self, suggestion: Suggestion) -> Self {
        self.suggestion = Some(suggestion);
        self
    }

    /// Formats the problem for terminal output.
    #[must_use]
    pub fn format(&self) -> String {
        use std::fmt::Write;
        let mut output = format!(
            "{}:{} {} {}\n",
            self.position.line,
            self.position.column,
            self.severity,
            self.rule.as_deref().unwrap_or("(directive)"),
        );
        let _ = writeln!(output, "  {}", self.message);
        if let Some(suggestion) = &self.suggestion {
            let _ = writeln!(output, "  = help: {}", suggestion.message);
        }
        output
    }
}

impl std::fmt::Display for Problem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}: {} {}",
            self.position.line, self.position.column, self.severity, self.message
        )?;
        if let Some(code) = &self.code {
            write!(f, " [{code}]")?;
        }
        Ok(())
    }
}

/// Converts a Problem to a miette Diagnostic for rich error display.
#[derive(Debug, thiserror::Error, Diagnostic)]
#[error("{message}")]
pub struct ProblemDiagnostic {
    message: String,
    #[help]
    help: Option<String>,
    #[label("{label_message}")]
    span: SourceSpan,
    label_message: String,
}

impl From<&Problem> for ProblemDiagnostic {
    fn from(p: &Problem) -> Self {
        let label_message = p.rule.clone().unwrap_or_else(|| "directive".to_string());
        Self {
            message: match &p.code {
                Some(code) => format!("[{code}] {}", p.message),
                None => p.message.clone(),
            },
            help: p.suggestion.as_ref().map(|s| s.message.clone()),
            span: SourceSpan::from((p.range.start, p.range.len())),
            label_message,
        }
    }
}

/// Result of running lint analysis over one source.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct LintResult {
    /// All problems found, sorted by position.
    pub problems: Vec<Problem>,
}

impl LintResult {
    /// Creates a new empty result.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if there are any errors.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.problems.iter().any(|p| p.severity == Severity::Error)
    }

    /// Returns true if any problem meets or exceeds the given severity.
    #[must_use]
    pub fn has_problems_at(&self, severity: Severity) -> bool {
        self.problems.iter().any(|p| p.severity >= severity)
    }

    /// Counts problems by severity: (errors, warnings, infos).
    #[must_use]
    pub fn count_by_severity(&self) -> (usize, usize, usize) {
        let mut counts = (0, 0, 0);
        for p in &self.problems {
            match p.severity {
                Severity::Error => counts.0 += 1,
                Severity::Warning => counts.1 += 1,
                Severity::Info => counts.2 += 1,
            }
        }
        counts
    }

    /// Formats a human-readable multi-line report.
    #[must_use]
    pub fn format_report(&self) -> String {
        use std::fmt::Write;
        let mut report = String::new();
        for p in &self.problems {
            let _ = write!(report, "{}", p.format());
        }
        let (errors, warnings, infos) = self.count_by_severity();
        let _ = writeln!(
            report,
            "\nFound {errors} error(s), {warnings} warning(s), {infos} info(s)"
        );
        report
    }
}
