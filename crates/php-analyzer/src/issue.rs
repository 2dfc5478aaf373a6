use std::fmt;
use std::path::PathBuf;

use php_ast::{LineIndex, Span};
use serde::Serialize;

/// Key of the issue reported once per syntax error.
pub const PARSE_ERROR: &str = "parse-error";

/// Key of the single issue left behind by an abandoned file.
pub const ANALYSIS_ABANDONED: &str = "analysis-abandoned";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    /// Key of the check that raised the issue, e.g. `undefined-variable`.
    pub check: String,
    pub severity: Severity,
    pub message: String,
    pub span: Span,
    /// 1-based.
    pub line: u32,
    /// 1-based, in bytes.
    pub column: u32,
}

impl Issue {
    pub fn new(
        check: impl Into<String>,
        severity: Severity,
        message: impl Into<String>,
        span: Span,
        lines: &LineIndex,
    ) -> Self {
        let position = lines.line_col(span.start);
        Self {
            check: check.into(),
            severity,
            message: message.into(),
            span,
            line: position.line,
            column: position.column,
        }
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}: {} [{}] {}",
            self.line, self.column, self.severity, self.check, self.message
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileOutcome {
    Analyzed,
    /// Analysis stopped part way. The report then carries exactly one
    /// issue explaining why and nothing from the partial run.
    Abandoned,
}

#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub path: PathBuf,
    pub outcome: FileOutcome,
    pub issues: Vec<Issue>,
}

impl FileReport {
    pub fn is_abandoned(&self) -> bool {
        self.outcome == FileOutcome::Abandoned
    }

    pub fn issues_for<'a>(&'a self, check: &'a str) -> impl Iterator<Item = &'a Issue> + 'a {
        self.issues.iter().filter(move |issue| issue.check == check)
    }
}
