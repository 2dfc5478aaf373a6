//! Per-file PHP analysis.
//!
//! Each file runs the full pipeline on one thread: parse, resolve symbols,
//! build control-flow graphs, then run every enabled check from an
//! immutable [`CheckRegistry`]. Files are independent, so [`analyze_paths`]
//! spreads them over the rayon pool and a failure in one file never reaches
//! another.
//!
//! ```
//! use std::path::Path;
//! use php_analyzer::{analyze_source, AnalyzerConfig, CheckRegistry};
//!
//! let source = "<?php function f() { return 1; echo 'never'; }";
//! let report = analyze_source(Path::new("a.php"), source, &AnalyzerConfig::default(), CheckRegistry::builtin());
//! assert_eq!(report.issues[0].check, "unreachable-code");
//! ```

pub mod analysis;
pub mod checks;
pub mod config;
pub mod diagnostics;
pub mod issue;
pub mod logging;
pub mod suppression;

pub use analysis::{analyze_paths, analyze_source, collect_php_files};
pub use checks::{Check, CheckContext, CheckRegistry, CheckRegistryBuilder};
pub use config::AnalyzerConfig;
pub use diagnostics::{AnalyzerError, FileDiagnostic};
pub use issue::{FileOutcome, FileReport, Issue, Severity};
pub use suppression::{Suppression, SuppressionMap};
