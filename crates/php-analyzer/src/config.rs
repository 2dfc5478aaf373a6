use std::fs;
use std::path::Path;

use php_lexer::PhpVersion;
use php_parser::config::{DEFAULT_MAX_FILE_SIZE, DEFAULT_MAX_NESTING_DEPTH};
use php_parser::ParserConfig;
use serde::{Deserialize, Serialize};

use crate::diagnostics::AnalyzerError;

/// Process-wide analysis settings. Built once before any file is analyzed
/// and shared by reference afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    pub php_version: PhpVersion,
    pub max_nesting_depth: u32,
    pub max_file_size: usize,
    /// Checks to run. Empty means every registered check.
    pub enabled_checks: Vec<String>,
    /// Checks to skip, applied after `enabled_checks`.
    pub disabled_checks: Vec<String>,
    /// Analyze files on the rayon thread pool.
    pub parallel: bool,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            php_version: PhpVersion::default(),
            max_nesting_depth: DEFAULT_MAX_NESTING_DEPTH,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            enabled_checks: Vec::new(),
            disabled_checks: Vec::new(),
            parallel: true,
        }
    }
}

impl AnalyzerConfig {
    pub fn from_json_str(json: &str) -> Result<Self, AnalyzerError> {
        serde_json::from_str(json).map_err(|source| AnalyzerError::Config { path: None, source })
    }

    pub fn from_path(path: &Path) -> Result<Self, AnalyzerError> {
        let json = fs::read_to_string(path).map_err(|source| AnalyzerError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&json).map_err(|source| AnalyzerError::Config {
            path: Some(path.to_path_buf()),
            source,
        })
    }

    pub fn parser_config(&self) -> ParserConfig {
        ParserConfig {
            version: self.php_version,
            max_nesting_depth: self.max_nesting_depth,
            max_file_size: self.max_file_size,
        }
    }

    pub fn is_check_enabled(&self, key: &str) -> bool {
        let enabled = self.enabled_checks.is_empty() || self.enabled_checks.iter().any(|k| k == key);
        enabled && !self.disabled_checks.iter().any(|k| k == key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = AnalyzerConfig::from_json_str(r#"{"php_version": "8.1", "parallel": false}"#).unwrap();
        assert_eq!(config.php_version, PhpVersion::Php81);
        assert!(!config.parallel);
        assert_eq!(config.max_nesting_depth, DEFAULT_MAX_NESTING_DEPTH);
        assert_eq!(config.parser_config().version, PhpVersion::Php81);
    }

    #[test]
    fn test_from_path_reads_file_and_reports_missing() {
        let path = std::env::temp_dir().join(format!("php-analyzer-config-{}.json", std::process::id()));
        fs::write(&path, r#"{"max_file_size": 1024}"#).unwrap();
        let config = AnalyzerConfig::from_path(&path).unwrap();
        fs::remove_file(&path).unwrap();
        assert_eq!(config.max_file_size, 1024);
        assert!(matches!(AnalyzerConfig::from_path(&path), Err(AnalyzerError::Io { .. })));
    }

    #[test]
    fn test_check_selection() {
        let config = AnalyzerConfig {
            enabled_checks: vec!["a".into(), "b".into()],
            disabled_checks: vec!["b".into()],
            ..AnalyzerConfig::default()
        };
        assert!(config.is_check_enabled("a"));
        assert!(!config.is_check_enabled("b"));
        assert!(!config.is_check_enabled("c"));
        assert!(AnalyzerConfig::default().is_check_enabled("c"));
    }

    #[test]
    fn test_invalid_json_is_a_config_error() {
        let err = AnalyzerConfig::from_json_str("{").unwrap_err();
        assert!(matches!(err, AnalyzerError::Config { path: None, .. }));
    }
}
