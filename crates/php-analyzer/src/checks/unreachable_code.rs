use std::collections::{BTreeMap, HashSet};

use php_ast::visitor::{self, Visitor};
use php_ast::{Span, Stmt, StmtKind};
use php_semantic::{BlockId, ControlFlowGraph};

use super::{Check, CheckContext};
use crate::issue::Issue;

/// Reports the first statement of every unreachable region.
pub struct UnreachableCodeCheck;

impl Check for UnreachableCodeCheck {
    fn key(&self) -> &'static str {
        "unreachable-code"
    }

    fn description(&self) -> &'static str {
        "Statements that can never execute"
    }

    fn run(&self, ctx: &CheckContext<'_>) -> Vec<Issue> {
        let mut inert = InertStatements::default();
        inert.visit_program(ctx.program);

        let mut issues = Vec::new();
        for function in ctx.cfgs {
            for span in region_starts(&function.cfg, &inert.spans) {
                issues.push(ctx.issue(self, span, "Remove this unreachable code."));
            }
        }
        issues
    }
}

/// Earliest statement of each connected group of dead blocks. Dead blocks
/// are grouped so a dead loop or branch reports once.
fn region_starts(cfg: &ControlFlowGraph, inert: &HashSet<Span>) -> Vec<Span> {
    let dead: Vec<BlockId> = cfg.dead_blocks().map(|b| b.id).collect();
    if dead.is_empty() {
        return Vec::new();
    }

    let mut parent: Vec<usize> = (0..cfg.blocks().len()).collect();
    fn find(parent: &mut [usize], mut i: usize) -> usize {
        while parent[i] != i {
            parent[i] = parent[parent[i]];
            i = parent[i];
        }
        i
    }
    for &id in &dead {
        for edge in cfg.successors(id) {
            if cfg.block(edge.target).dead {
                let (a, b) = (find(&mut parent, id.0), find(&mut parent, edge.target.0));
                parent[a] = b;
            }
        }
    }

    let mut first: BTreeMap<usize, Span> = BTreeMap::new();
    for &id in &dead {
        let root = find(&mut parent, id.0);
        for &span in &cfg.block(id).statements {
            if inert.contains(&span) {
                continue;
            }
            first
                .entry(root)
                .and_modify(|best| {
                    if span.start < best.start {
                        *best = span;
                    }
                })
                .or_insert(span);
        }
    }
    let mut starts: Vec<Span> = first.into_values().collect();
    starts.sort_by_key(|span| span.start);
    starts
}

/// Statements that do nothing at runtime or are hoisted, so their position
/// after a jump is harmless.
#[derive(Default)]
struct InertStatements {
    spans: HashSet<Span>,
}

impl Visitor for InertStatements {
    fn visit_stmt(&mut self, stmt: &Stmt) {
        if matches!(
            stmt.kind,
            StmtKind::Function(_)
                | StmtKind::Class(_)
                | StmtKind::Interface(_)
                | StmtKind::Trait(_)
                | StmtKind::Enum(_)
                | StmtKind::Nop
                | StmtKind::InlineHtml(_)
                | StmtKind::HaltCompiler(_)
        ) {
            self.spans.insert(stmt.span);
        }
        visitor::walk_stmt(self, stmt);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::analyze_source;
    use crate::checks::CheckRegistry;
    use crate::config::AnalyzerConfig;
    use std::path::Path;

    fn lines(source: &str) -> Vec<u32> {
        let registry = CheckRegistry::builder().register(UnreachableCodeCheck).build();
        analyze_source(Path::new("t.php"), source, &AnalyzerConfig::default(), &registry)
            .issues
            .iter()
            .map(|issue| issue.line)
            .collect()
    }

    #[test]
    fn test_reports_first_statement_after_return() {
        let source = "<?php\nfunction f() {\n  return 1;\n  a();\n  b();\n}\n";
        assert_eq!(lines(source), vec![4]);
    }

    #[test]
    fn test_dead_loop_reports_once() {
        let source = "<?php\nfunction f($x) {\n  throw new E();\n  while ($x) {\n    a();\n  }\n  b();\n}\n";
        assert_eq!(lines(source), vec![4]);
    }

    #[test]
    fn test_hoisted_declarations_are_fine() {
        let source = "<?php\nreturn 1;\nfunction helper() {}\nclass Late {}\n";
        assert!(lines(source).is_empty());
    }

    #[test]
    fn test_each_branch_ending_counts() {
        let source = "<?php\nfunction f($x) {\n  if ($x) { return 1; } else { return 2; }\n  tail();\n}\n";
        assert_eq!(lines(source), vec![4]);
    }

    #[test]
    fn test_goto_target_is_live() {
        let source = "<?php\nfunction f() {\n  goto elsewhere;\n  a();\n  elsewhere:\n  b();\n}\n";
        assert_eq!(lines(source), vec![4]);
    }
}
