//! Check registry.
//!
//! Checks are stateless: everything they need arrives in a [`CheckContext`]
//! for one file, and the registry is frozen once built so it can be shared
//! across worker threads by reference.

mod undefined_variable;
mod unreachable_code;

pub use undefined_variable::UndefinedVariableCheck;
pub use unreachable_code::UnreachableCodeCheck;

use std::path::Path;

use lazy_static::lazy_static;
use php_ast::{LineIndex, Program, Span};
use php_semantic::{FunctionCfg, SymbolTable};

use crate::config::AnalyzerConfig;
use crate::issue::{Issue, Severity};

lazy_static! {
    static ref BUILTIN: CheckRegistry = CheckRegistry::with_builtin_checks();
}

/// Everything known about one file once the frontend has run.
pub struct CheckContext<'a> {
    pub path: &'a Path,
    pub source: &'a str,
    pub program: &'a Program,
    pub symbols: &'a SymbolTable,
    pub cfgs: &'a [FunctionCfg],
    pub lines: &'a LineIndex,
}

impl CheckContext<'_> {
    pub fn issue(&self, check: &dyn Check, span: Span, message: impl Into<String>) -> Issue {
        Issue::new(check.key(), check.severity(), message, span, self.lines)
    }

    pub fn text(&self, span: Span) -> &str {
        self.source.get(span.as_range()).unwrap_or("")
    }
}

pub trait Check: Send + Sync {
    /// Stable identifier, used in configuration and suppressions.
    fn key(&self) -> &'static str;

    fn description(&self) -> &'static str;

    fn severity(&self) -> Severity {
        Severity::Warning
    }

    fn run(&self, ctx: &CheckContext<'_>) -> Vec<Issue>;
}

pub struct CheckRegistry {
    checks: Vec<Box<dyn Check>>,
}

impl CheckRegistry {
    pub fn builder() -> CheckRegistryBuilder {
        CheckRegistryBuilder { checks: Vec::new() }
    }

    pub fn with_builtin_checks() -> Self {
        Self::builder()
            .register(UnreachableCodeCheck)
            .register(UndefinedVariableCheck)
            .build()
    }

    /// Process-wide registry holding the built-in checks.
    pub fn builtin() -> &'static CheckRegistry {
        &BUILTIN
    }

    pub fn len(&self) -> usize {
        self.checks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&dyn Check> {
        self.checks.iter().find(|c| c.key() == key).map(|c| c.as_ref())
    }

    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.checks.iter().map(|c| c.key())
    }

    /// Checks selected by `config`, in registration order.
    pub fn enabled<'a>(&'a self, config: &'a AnalyzerConfig) -> impl Iterator<Item = &'a dyn Check> + 'a {
        self.checks
            .iter()
            .map(|c| c.as_ref())
            .filter(move |c| config.is_check_enabled(c.key()))
    }
}

impl std::fmt::Debug for CheckRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.keys()).finish()
    }
}

pub struct CheckRegistryBuilder {
    checks: Vec<Box<dyn Check>>,
}

impl CheckRegistryBuilder {
    /// Add a check. A later check with an already registered key is dropped.
    pub fn register(mut self, check: impl Check + 'static) -> Self {
        if self.checks.iter().any(|c| c.key() == check.key()) {
            tracing::warn!(key = check.key(), "duplicate check ignored");
            return self;
        }
        self.checks.push(Box::new(check));
        self
    }

    pub fn build(self) -> CheckRegistry {
        CheckRegistry { checks: self.checks }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Named(&'static str);

    impl Check for Named {
        fn key(&self) -> &'static str {
            self.0
        }

        fn description(&self) -> &'static str {
            "test"
        }

        fn run(&self, _ctx: &CheckContext<'_>) -> Vec<Issue> {
            Vec::new()
        }
    }

    #[test]
    fn test_builder_keeps_first_of_duplicates() {
        let registry = CheckRegistry::builder()
            .register(Named("a"))
            .register(Named("b"))
            .register(Named("a"))
            .build();
        assert_eq!(registry.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        assert!(registry.get("b").is_some());
        assert!(registry.get("c").is_none());
    }

    #[test]
    fn test_enabled_follows_config() {
        let config = AnalyzerConfig {
            disabled_checks: vec!["unreachable-code".to_string()],
            ..AnalyzerConfig::default()
        };
        let keys: Vec<_> = CheckRegistry::builtin().enabled(&config).map(|c| c.key()).collect();
        assert_eq!(keys, vec!["undefined-variable"]);
    }

    #[test]
    fn test_registry_is_shareable() {
        fn assert_sync<T: Send + Sync>() {}
        assert_sync::<CheckRegistry>();
    }
}
