use std::fmt;
use std::path::{Path, PathBuf};

use miette::{Diagnostic, GraphicalReportHandler, GraphicalTheme, LabeledSpan, NamedSource, SourceCode};
use thiserror::Error;

use crate::issue::{Issue, Severity};

#[derive(Debug, Error)]
pub enum AnalyzerError {
    #[error("cannot read {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration{}", .path.as_ref().map(|p| format!(" in {}", p.display())).unwrap_or_default())]
    Config {
        path: Option<PathBuf>,
        #[source]
        source: serde_json::Error,
    },

    #[error("cannot walk directory")]
    Walk(#[from] walkdir::Error),
}

/// An issue paired with its file, renderable with a source snippet.
#[derive(Debug)]
pub struct FileDiagnostic {
    issue: Issue,
    source: NamedSource<String>,
}

impl FileDiagnostic {
    pub fn new(path: &Path, source: &str, issue: Issue) -> Self {
        Self {
            issue,
            source: NamedSource::new(path.display().to_string(), source.to_string()),
        }
    }

    pub fn issue(&self) -> &Issue {
        &self.issue
    }

    /// Plain-text report with the offending line underlined.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let handler = GraphicalReportHandler::new_themed(GraphicalTheme::unicode_nocolor());
        if handler.render_report(&mut out, self).is_err() {
            return self.issue.to_string();
        }
        out
    }
}

impl fmt::Display for FileDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.issue.message)
    }
}

impl std::error::Error for FileDiagnostic {}

impl Diagnostic for FileDiagnostic {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new(&self.issue.check))
    }

    fn severity(&self) -> Option<miette::Severity> {
        Some(match self.issue.severity {
            Severity::Error => miette::Severity::Error,
            Severity::Warning => miette::Severity::Warning,
        })
    }

    fn source_code(&self) -> Option<&dyn SourceCode> {
        Some(&self.source)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let span = self.issue.span;
        Some(Box::new(std::iter::once(LabeledSpan::new_with_span(
            None,
            (span.start as usize, span.len() as usize),
        ))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use php_ast::{LineIndex, Span};

    #[test]
    fn test_render_includes_code_and_snippet() {
        let source = "<?php\necho $x;\n";
        let issue = Issue::new(
            "undefined-variable",
            Severity::Warning,
            "$x is never assigned",
            Span::new(11, 13),
            &LineIndex::new(source),
        );
        assert_eq!((issue.line, issue.column), (2, 6));
        let rendered = FileDiagnostic::new(Path::new("a.php"), source, issue).render();
        assert!(rendered.contains("undefined-variable"), "{rendered}");
        assert!(rendered.contains("echo $x;"), "{rendered}");
        assert!(rendered.contains("a.php"), "{rendered}");
    }

    #[test]
    fn test_config_error_mentions_path() {
        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = AnalyzerError::Config {
            path: Some(PathBuf::from("analyzer.json")),
            source,
        };
        assert_eq!(err.to_string(), "invalid configuration in analyzer.json");
    }
}
