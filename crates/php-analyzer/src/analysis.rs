//! The per-file pipeline: parse, resolve, build graphs, run checks.
//!
//! Files never affect each other. A file that trips a construction limit or
//! panics is abandoned as a whole and reported with a single issue.

use std::any::Any;
use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};

use php_ast::{LineIndex, Span};
use php_parser::{parse_with, LimitExceeded};
use rayon::prelude::*;
use walkdir::WalkDir;

use crate::checks::{CheckContext, CheckRegistry};
use crate::config::AnalyzerConfig;
use crate::diagnostics::AnalyzerError;
use crate::issue::{FileOutcome, FileReport, Issue, Severity, ANALYSIS_ABANDONED, PARSE_ERROR};
use crate::suppression::SuppressionMap;

pub fn analyze_source(
    path: &Path,
    source: &str,
    config: &AnalyzerConfig,
    registry: &CheckRegistry,
) -> FileReport {
    let span = tracing::debug_span!("analyze_file", path = %path.display());
    let _enter = span.enter();

    match panic::catch_unwind(AssertUnwindSafe(|| run_pipeline(path, source, config, registry))) {
        Ok(report) => report,
        Err(payload) => {
            let reason = panic_message(payload.as_ref());
            tracing::debug!(%reason, "analysis panicked, file abandoned");
            abandoned(path, source, Span::new(0, 0), format!("analysis failed: {reason}"))
        }
    }
}

/// Analyze every file, in parallel when the configuration allows it.
/// Reports come back in the order of `paths`.
pub fn analyze_paths(paths: &[PathBuf], config: &AnalyzerConfig, registry: &CheckRegistry) -> Vec<FileReport> {
    let analyze = |path: &PathBuf| match fs::read(path) {
        Ok(bytes) => analyze_source(path, &String::from_utf8_lossy(&bytes), config, registry),
        Err(err) => {
            tracing::debug!(path = %path.display(), error = %err, "cannot read file");
            abandoned(path, "", Span::new(0, 0), format!("cannot read file: {err}"))
        }
    };

    let reports: Vec<FileReport> = if config.parallel {
        paths.par_iter().map(analyze).collect()
    } else {
        paths.iter().map(analyze).collect()
    };

    let issues: usize = reports.iter().map(|r| r.issues.len()).sum();
    let abandoned_files = reports.iter().filter(|r| r.is_abandoned()).count();
    tracing::info!(files = reports.len(), issues, abandoned = abandoned_files, "analysis finished");
    reports
}

/// `.php` files under `root`, sorted by path. A file path is returned as is.
pub fn collect_php_files(root: &Path) -> Result<Vec<PathBuf>, AnalyzerError> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root).follow_links(true).sort_by_file_name() {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type().is_file() && path.extension().is_some_and(|ext| ext == "php") {
            files.push(path.to_path_buf());
        }
    }
    Ok(files)
}

fn run_pipeline(path: &Path, source: &str, config: &AnalyzerConfig, registry: &CheckRegistry) -> FileReport {
    let result = parse_with(source, &config.parser_config());
    if let Some(limit) = &result.limit_exceeded {
        let span = match limit {
            LimitExceeded::NestingDepth { span, .. } => *span,
            LimitExceeded::FileSize { .. } => Span::new(0, 0),
        };
        tracing::debug!(%limit, "construction limit exceeded, file abandoned");
        return abandoned(path, source, span, limit.to_string());
    }

    let lines = LineIndex::new(source);
    let symbols = php_semantic::resolve(&result.program);
    let cfgs = php_semantic::build_all(&result.program);
    let suppressions = SuppressionMap::build(source, &result.tokens, &result.program, &lines);

    let mut issues: Vec<Issue> = result
        .errors
        .iter()
        .map(|err| Issue::new(PARSE_ERROR, Severity::Error, err.to_string(), err.span(), &lines))
        .collect();

    let ctx = CheckContext {
        path,
        source,
        program: &result.program,
        symbols: &symbols,
        cfgs: &cfgs,
        lines: &lines,
    };
    for check in registry.enabled(config) {
        let found = check.run(&ctx);
        tracing::trace!(check = check.key(), issues = found.len(), "check finished");
        issues.extend(
            found
                .into_iter()
                .filter(|issue| !suppressions.is_suppressed(issue.line, &issue.check)),
        );
    }

    issues.sort_by(|a, b| (a.line, a.column, &a.check).cmp(&(b.line, b.column, &b.check)));
    tracing::debug!(issues = issues.len(), parse_errors = result.errors.len(), "file analyzed");
    FileReport {
        path: path.to_path_buf(),
        outcome: FileOutcome::Analyzed,
        issues,
    }
}

fn abandoned(path: &Path, source: &str, span: Span, message: String) -> FileReport {
    let issue = Issue::new(ANALYSIS_ABANDONED, Severity::Error, message, span, &LineIndex::new(source));
    FileReport {
        path: path.to_path_buf(),
        outcome: FileOutcome::Abandoned,
        issues: vec![issue],
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::{Check, CheckContext};

    struct Panics;

    impl Check for Panics {
        fn key(&self) -> &'static str {
            "panics"
        }

        fn description(&self) -> &'static str {
            "always panics"
        }

        fn run(&self, _ctx: &CheckContext<'_>) -> Vec<Issue> {
            panic!("boom")
        }
    }

    #[test]
    fn test_parse_errors_become_issues_and_checks_still_run() {
        let source = "<?php\nfunction f() {\n  return 1;\n  a();\n}\n$x = ;\n";
        let report = analyze_source(Path::new("t.php"), source, &AnalyzerConfig::default(), CheckRegistry::builtin());
        assert_eq!(report.outcome, FileOutcome::Analyzed);
        assert_eq!(report.issues_for(PARSE_ERROR).count(), 1);
        assert_eq!(report.issues_for("unreachable-code").map(|i| i.line).collect::<Vec<_>>(), vec![4]);
    }

    #[test]
    fn test_nesting_limit_abandons_file() {
        let config = AnalyzerConfig {
            max_nesting_depth: 4,
            ..AnalyzerConfig::default()
        };
        let source = "<?php $x = ((((((((1))))))));";
        let report = analyze_source(Path::new("t.php"), source, &config, CheckRegistry::builtin());
        assert!(report.is_abandoned());
        assert_eq!(report.issues.len(), 1);
        assert_eq!(report.issues[0].check, ANALYSIS_ABANDONED);
    }

    #[test]
    fn test_panicking_check_abandons_only_that_file() {
        let registry = CheckRegistry::builder().register(Panics).build();
        let report = analyze_source(Path::new("t.php"), "<?php echo 1;", &AnalyzerConfig::default(), &registry);
        assert!(report.is_abandoned());
        assert!(report.issues[0].message.contains("boom"));
    }

    #[test]
    fn test_nosonar_drops_issue() {
        let source = "<?php\nfunction f() {\n  return 1;\n  a(); // NOSONAR\n}\n";
        let report = analyze_source(Path::new("t.php"), source, &AnalyzerConfig::default(), CheckRegistry::builtin());
        assert!(report.issues.is_empty(), "{:?}", report.issues);
    }
}
