use php_ast::Span;
use php_parser::parse;
use php_semantic::{
    build_all, resolve, BlockKind, ControlFlowGraph, EdgeKind, FunctionKind, ScopeKind, SymbolKind,
};

fn span_of(source: &str, needle: &str, nth: usize) -> Span {
    let start = source
        .match_indices(needle)
        .nth(nth)
        .map(|(i, _)| i)
        .unwrap_or_else(|| panic!("`{needle}` occurrence {nth} not found"));
    Span::new(start as u32, (start + needle.len()) as u32)
}

fn graphs(source: &str) -> Vec<php_semantic::FunctionCfg> {
    let result = parse(source);
    assert!(result.errors.is_empty(), "{:?}", result.errors);
    build_all(&result.program)
}

fn function_graph(source: &str) -> ControlFlowGraph {
    graphs(source)
        .into_iter()
        .find(|f| f.kind == FunctionKind::Function)
        .map(|f| f.cfg)
        .unwrap()
}

const SAMPLES: &[&str] = &[
    "<?php function f($p){ $a=1; function g(){ echo $a; } }",
    "<?php $x = 1; function f() { global $x; $y = $x; return fn($z) => $y + $z; }",
    "<?php class A { private $v; function m($a) { $b = $a; $c = function () use ($b) { return $b; }; return $this->v; } }",
    "<?php function f($xs) { foreach ($xs as $k => $v) { try { g($v); } catch (E $e) { continue; } finally { h(); } } }",
    "<?php function f($n) { switch ($n) { case 1: a(); case 2: b(); break; default: c(); } do { $n--; } while ($n > 0); }",
    "<?php function f() { for ($i = 0; $i < 3; $i++) { if ($i) { break; } else { continue; } } goto end; x(); end: return match($i) { 1 => 'a', default => throw new E() }; }",
    "<?php namespace App; enum Suit { case Hearts; public function label(): string { return match($this) { Suit::Hearts => 'H' }; } }",
];

#[test]
fn test_nested_function_does_not_see_outer_locals() {
    let source = SAMPLES[0];
    let result = parse(source);
    let table = resolve(&result.program);

    let outer = table.symbol_at(span_of(source, "$a", 0)).symbol().unwrap();
    let inner = table.symbol_at(span_of(source, "$a", 1)).symbol().unwrap();
    assert_ne!(outer, inner);

    let inner = table.symbol(inner);
    assert_eq!(inner.kind, SymbolKind::Variable);
    assert!(!inner.is_written());
    let g_scope = table.scope(inner.scope);
    assert_eq!(g_scope.kind, ScopeKind::Function);
    assert_eq!(g_scope.name.as_deref(), Some("g"));
    assert_ne!(table.symbol(outer).scope, inner.scope);
}

#[test]
fn test_variable_usages_stay_inside_their_scope() {
    for source in SAMPLES {
        let result = parse(source);
        let table = resolve(&result.program);
        for symbol in table.symbols() {
            if symbol.kind != SymbolKind::Variable {
                continue;
            }
            let scope = table.scope(symbol.scope);
            let Some(owner) = scope.owner else { continue };
            if scope.id == table.global_scope() {
                continue;
            }
            for usage in &symbol.usages {
                assert!(
                    owner.encloses(usage.span),
                    "${} used at {:?} outside its scope {:?} in {source}",
                    symbol.name,
                    usage.span,
                    owner
                );
            }
        }
    }
}

#[test]
fn test_every_block_is_reachable_or_dead() {
    for source in SAMPLES {
        for function in graphs(source) {
            let cfg = &function.cfg;
            let reachable = cfg.reachable_from_entry();
            for block in cfg.blocks() {
                assert_eq!(block.dead, !reachable.contains(&block.id), "{source}\n{cfg}");
                for edge in &block.successors {
                    assert!(cfg.predecessors(edge.target).contains(&block.id));
                }
            }
            assert!(!cfg.block(cfg.entry()).dead);
        }
    }
}

#[test]
fn test_switch_case_falls_through_but_not_into_default() {
    let source = "<?php function f($x) { switch($x){case 1: foo(); case 2: bar(); break; default: baz();} }";
    let cfg = function_graph(source);
    let case1 = cfg.block_of(span_of(source, "foo();", 0)).unwrap();
    let case2 = cfg.block_of(span_of(source, "bar();", 0)).unwrap();
    let default = cfg.block_of(span_of(source, "baz();", 0)).unwrap();
    assert_eq!(cfg.block(case1).kind, BlockKind::Case);
    assert!(cfg.block(case1).has_edge_to(case2, EdgeKind::Fallthrough));
    assert!(cfg.successors(case2).iter().all(|edge| edge.target != default));
}

#[test]
fn test_return_inside_try_runs_finally_first() {
    let source = "<?php function f() { try { return 1; } finally { cleanup(); } }";
    let cfg = function_graph(source);
    let ret = cfg.block_of(span_of(source, "return 1;", 0)).unwrap();
    let finally = cfg.block_of(span_of(source, "cleanup();", 0)).unwrap();

    let return_edges: Vec<_> = cfg
        .successors(ret)
        .iter()
        .filter(|edge| edge.kind == EdgeKind::Return)
        .collect();
    assert_eq!(return_edges.len(), 1);
    assert_eq!(return_edges[0].target, finally);
    assert!(cfg.block(finally).has_edge_to(cfg.exit(), EdgeKind::Return));
    assert!(cfg.exit_blocks().contains(&finally));
    assert!(!cfg.exit_blocks().contains(&ret));
}

#[test]
fn test_alternate_syntax_builds_the_same_graph() {
    let pairs = [
        (
            "<?php if ($a) { x(); } elseif ($b) { y(); } else { z(); }",
            "<?php if ($a): x(); elseif ($b): y(); else: z(); endif;",
        ),
        (
            "<?php while ($a) { x(); }",
            "<?php while ($a): x(); endwhile;",
        ),
        (
            "<?php foreach ($xs as $x) { if ($x) { break; } }",
            "<?php foreach ($xs as $x): if ($x): break; endif; endforeach;",
        ),
        (
            "<?php for ($i = 0; $i < 3; $i++) { x(); }",
            "<?php for ($i = 0; $i < 3; $i++): x(); endfor;",
        ),
        (
            "<?php switch ($a) { case 1: x(); break; default: y(); }",
            "<?php switch ($a): case 1: x(); break; default: y(); endswitch;",
        ),
    ];
    for (braced, alternate) in pairs {
        let braced_graph = graphs(braced).remove(0).cfg.to_string();
        let alternate_graph = graphs(alternate).remove(0).cfg.to_string();
        assert_eq!(braced_graph, alternate_graph, "{braced}\n{alternate}");
    }
}

#[test]
fn test_analysis_is_idempotent() {
    for source in SAMPLES {
        let result = parse(source);
        let first = resolve(&result.program);
        let second = resolve(&result.program);
        assert_eq!(format!("{:?}", first.symbols()), format!("{:?}", second.symbols()));

        let dump = |graphs: Vec<php_semantic::FunctionCfg>| -> Vec<String> {
            graphs.iter().map(|f| f.cfg.to_string()).collect()
        };
        assert_eq!(dump(build_all(&result.program)), dump(build_all(&result.program)));
    }
}

#[test]
fn test_one_graph_per_function_like() {
    let kinds: Vec<FunctionKind> = graphs(SAMPLES[2]).iter().map(|f| f.kind).collect();
    assert_eq!(kinds, vec![FunctionKind::Script, FunctionKind::Method, FunctionKind::Closure]);

    let kinds: Vec<FunctionKind> = graphs(SAMPLES[1]).iter().map(|f| f.kind).collect();
    assert_eq!(
        kinds,
        vec![FunctionKind::Script, FunctionKind::Function, FunctionKind::ArrowFunction]
    );
}
