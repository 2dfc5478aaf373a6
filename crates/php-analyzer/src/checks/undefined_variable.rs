use php_semantic::{Symbol, SymbolKind, SymbolTable};

use super::{Check, CheckContext};
use crate::issue::Issue;

/// Function-local variables that are read but never assigned anywhere in
/// their function.
///
/// Only whole-function facts are used, so a read before the first write is
/// not reported. Anything the resolver cannot see through (dynamic variable
/// names, `extract()`, by-reference out parameters) silences the symbol.
pub struct UndefinedVariableCheck;

impl Check for UndefinedVariableCheck {
    fn key(&self) -> &'static str {
        "undefined-variable"
    }

    fn description(&self) -> &'static str {
        "Variables read without ever being assigned"
    }

    fn run(&self, ctx: &CheckContext<'_>) -> Vec<Issue> {
        ctx.symbols
            .symbols()
            .iter()
            .filter(|symbol| is_candidate(ctx.symbols, symbol))
            .filter_map(|symbol| {
                let read = symbol.usages.iter().find(|u| u.kind.is_read())?;
                Some(ctx.issue(
                    self,
                    read.span,
                    format!("${} is used but never assigned in this scope.", symbol.name),
                ))
            })
            .collect()
    }
}

fn is_candidate(table: &SymbolTable, symbol: &Symbol) -> bool {
    if symbol.kind != SymbolKind::Variable || symbol.name == "this" || symbol.is_written() {
        return false;
    }
    let flags = symbol.flags;
    if flags.is_parameter
        || flags.is_by_ref
        || flags.is_captured
        || flags.is_global
        || flags.is_static
        || flags.is_superglobal
        || flags.is_implicit
    {
        return false;
    }
    // Included files and callers can define globals.
    let scope = table.scope(symbol.scope);
    if symbol.scope == table.global_scope() || !scope.kind.is_function_like() || scope.has_dynamic_variables {
        return false;
    }
    !symbol.usages.iter().any(|u| u.guarded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::analyze_source;
    use crate::checks::CheckRegistry;
    use crate::config::AnalyzerConfig;
    use std::path::Path;

    fn messages(source: &str) -> Vec<String> {
        let registry = CheckRegistry::builder().register(UndefinedVariableCheck).build();
        analyze_source(Path::new("t.php"), source, &AnalyzerConfig::default(), &registry)
            .issues
            .into_iter()
            .map(|issue| format!("{}: {}", issue.line, issue.message))
            .collect()
    }

    #[test]
    fn test_nested_function_cannot_see_outer_local() {
        let source = "<?php\nfunction f($p) {\n  $a = 1;\n  function g() {\n    echo $a;\n  }\n}\n";
        assert_eq!(messages(source), vec!["5: $a is used but never assigned in this scope."]);
    }

    #[test]
    fn test_imports_and_parameters_are_defined() {
        let source = "<?php\nfunction f($p) {\n  global $cfg;\n  static $n;\n  $c = function () use ($p) { return $p; };\n  return $cfg . $n . $_GET['x'] . $this;\n}\n";
        assert!(messages(source).is_empty());
    }

    #[test]
    fn test_guarded_and_dynamic_reads_are_ignored() {
        let source = "<?php\nfunction f() {\n  if (isset($maybe)) { echo $maybe; }\n  preg_match('/x/', 'x', $m);\n  echo $m[0];\n}\nfunction g() {\n  extract([]);\n  echo $anything;\n}\n";
        assert!(messages(source).is_empty());
    }

    #[test]
    fn test_top_level_reads_are_not_reported() {
        assert!(messages("<?php echo $fromInclude;").is_empty());
    }

    #[test]
    fn test_arrow_function_reads_outer_value() {
        let source = "<?php\nfunction f() {\n  $k = 2;\n  return fn($x) => $x * $k * $missing;\n}\n";
        assert_eq!(messages(source), vec!["4: $missing is used but never assigned in this scope."]);
    }
}
