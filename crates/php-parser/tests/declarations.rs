use php_ast::{
    ClassMemberKind, PropertyHookBody, PropertyHookKind, Stmt, StmtKind, TraitAdaptationKind, UseKind, Visibility,
};
use php_parser::{parse, parse_with, ParseError, ParseResult, ParserConfig, PhpVersion};

fn parse_clean(source: &str) -> ParseResult {
    let result = parse(source);
    assert!(result.errors.is_empty(), "unexpected errors: {:#?}", result.errors);
    result
}

fn forbidden_messages(result: &ParseResult) -> Vec<&str> {
    result
        .errors
        .iter()
        .filter_map(|e| match e {
            ParseError::Forbidden { message, .. } => Some(message.as_str()),
            _ => None,
        })
        .collect()
}

fn member_kinds(stmt: &Stmt) -> Vec<&'static str> {
    let members = match &stmt.kind {
        StmtKind::Class(class) => &class.members,
        StmtKind::Interface(iface) => &iface.members,
        StmtKind::Trait(trait_decl) => &trait_decl.members,
        StmtKind::Enum(enum_decl) => &enum_decl.members,
        other => panic!("expected class-like, got {other:?}"),
    };
    members
        .iter()
        .map(|m| match &m.kind {
            ClassMemberKind::Property(_) => "property",
            ClassMemberKind::Method(_) => "method",
            ClassMemberKind::ClassConst(_) => "const",
            ClassMemberKind::TraitUse(_) => "use",
            ClassMemberKind::EnumCase(_) => "case",
        })
        .collect()
}

// =============================================================================
// Class members
// =============================================================================

const CLASS_SOURCE: &str = "<?php
abstract class A extends B implements C, D {
    use T1, T2 { T1::hello insteadof T2; T2::hello as protected greet; world as private; }
    const X = 1, Y = 2;
    final public const int Z = 3;
    public static ?int $count = 0, $other;
    protected readonly string $name;
    var $legacy;
    abstract protected function run(int $a, string ...$rest): void;
    public function __construct(private readonly int $id, public $tag = null) {}
}";

#[test]
fn test_class_members_in_source_order() {
    let result = parse_clean(CLASS_SOURCE);
    let stmt = &result.program.stmts[0];
    assert_eq!(
        member_kinds(stmt),
        vec!["use", "const", "const", "const", "property", "property", "property", "property", "method", "method"]
    );

    let StmtKind::Class(class) = &stmt.kind else {
        unreachable!()
    };
    assert!(class.modifiers.is_abstract);
    assert_eq!(class.extends.as_ref().map(|n| n.joined()), Some("B".to_string()));
    assert_eq!(class.implements.len(), 2);

    let ClassMemberKind::ClassConst(z) = &class.members[3].kind else {
        panic!("expected constant");
    };
    assert_eq!(z.name, "Z");
    assert!(z.modifiers.is_final && z.type_hint.is_some());
    assert_eq!(z.modifiers.visibility, Some(Visibility::Public));

    let ClassMemberKind::Property(other) = &class.members[5].kind else {
        panic!("expected property");
    };
    assert_eq!(other.name, "other");
    assert!(other.modifiers.is_static);
    assert!(other.type_hint.is_some());

    let ClassMemberKind::Property(legacy) = &class.members[7].kind else {
        panic!("expected property");
    };
    assert_eq!(legacy.modifiers.visibility, Some(Visibility::Public));

    let ClassMemberKind::Method(run) = &class.members[8].kind else {
        panic!("expected method");
    };
    assert!(run.modifiers.is_abstract && run.body.is_none());
    assert!(run.params[1].variadic);

    let ClassMemberKind::Method(ctor) = &class.members[9].kind else {
        panic!("expected method");
    };
    assert!(ctor.params.iter().all(|p| p.is_promoted()));
    assert!(ctor.params[0].modifiers.is_readonly);
}

#[test]
fn test_member_spans_cover_their_text() {
    let result = parse_clean(CLASS_SOURCE);
    let StmtKind::Class(class) = &result.program.stmts[0].kind else {
        unreachable!()
    };
    let texts: Vec<&str> = class.members.iter().map(|m| result.text(CLASS_SOURCE, m.span)).collect();
    assert_eq!(texts[1], "const X = 1");
    assert_eq!(texts[2], "Y = 2");
    assert_eq!(texts[7], "var $legacy");
}

#[test]
fn test_trait_adaptations() {
    let result = parse_clean(CLASS_SOURCE);
    let StmtKind::Class(class) = &result.program.stmts[0].kind else {
        unreachable!()
    };
    let ClassMemberKind::TraitUse(used) = &class.members[0].kind else {
        panic!("expected trait use");
    };
    assert_eq!(used.traits.len(), 2);
    assert_eq!(used.adaptations.len(), 3);

    match &used.adaptations[0].kind {
        TraitAdaptationKind::Precedence {
            trait_name,
            method,
            insteadof,
        } => {
            assert_eq!(trait_name.joined(), "T1");
            assert_eq!(method, "hello");
            assert_eq!(insteadof[0].joined(), "T2");
        }
        other => panic!("expected precedence, got {other:?}"),
    }
    match &used.adaptations[1].kind {
        TraitAdaptationKind::Alias {
            new_modifier, new_name, ..
        } => {
            assert_eq!(*new_modifier, Some(Visibility::Protected));
            assert_eq!(new_name.as_deref(), Some("greet"));
        }
        other => panic!("expected alias, got {other:?}"),
    }
    match &used.adaptations[2].kind {
        TraitAdaptationKind::Alias {
            trait_name,
            method,
            new_modifier,
            new_name,
        } => {
            assert!(trait_name.is_none());
            assert_eq!(method, "world");
            assert_eq!(*new_modifier, Some(Visibility::Private));
            assert!(new_name.is_none());
        }
        other => panic!("expected alias, got {other:?}"),
    }
}

#[test]
fn test_modifier_conflicts_are_reported() {
    let result = parse("<?php class A { public public $x; abstract final function f(); }");
    let messages = forbidden_messages(&result);
    assert!(messages.iter().any(|m| m.contains("multiple access type modifiers")), "{messages:?}");
    assert!(messages.iter().any(|m| m.contains("'abstract' and 'final'")), "{messages:?}");
    assert_eq!(member_kinds(&result.program.stmts[0]), vec!["property", "method"]);
}

#[test]
fn test_asymmetric_visibility() {
    let result = parse_clean("<?php class A { public private(set) string $name; }");
    let StmtKind::Class(class) = &result.program.stmts[0].kind else {
        unreachable!()
    };
    let ClassMemberKind::Property(prop) = &class.members[0].kind else {
        panic!("expected property");
    };
    assert_eq!(prop.modifiers.visibility, Some(Visibility::Public));
    assert_eq!(prop.modifiers.set_visibility, Some(Visibility::Private));
}

#[test]
fn test_broken_member_recovers_at_next_member() {
    let result = parse("<?php class A { public function f() {} 42; public $ok; }");
    assert!(result.has_errors());
    assert_eq!(member_kinds(&result.program.stmts[0]), vec!["method", "property"]);
}

// =============================================================================
// Property hooks
// =============================================================================

const HOOKS_SOURCE: &str = "<?php class P {
    public string $full {
        get => $this->first . ' ' . $this->last;
        set(string $value) { $this->first = $value; }
    }
    public function __construct(public int $x { get => 1; }) {}
}";

#[test]
fn test_property_hooks() {
    let result = parse_clean(HOOKS_SOURCE);
    let StmtKind::Class(class) = &result.program.stmts[0].kind else {
        unreachable!()
    };
    let ClassMemberKind::Property(full) = &class.members[0].kind else {
        panic!("expected property");
    };
    let kinds: Vec<PropertyHookKind> = full.hooks.iter().map(|h| h.kind).collect();
    assert_eq!(kinds, vec![PropertyHookKind::Get, PropertyHookKind::Set]);
    assert!(matches!(full.hooks[0].body, PropertyHookBody::Expression(_)));
    assert!(matches!(full.hooks[1].body, PropertyHookBody::Block(_)));
    assert_eq!(full.hooks[1].params.len(), 1);

    let ClassMemberKind::Method(ctor) = &class.members[1].kind else {
        panic!("expected method");
    };
    assert_eq!(ctor.params[0].hooks.len(), 1);
}

#[test]
fn test_property_hooks_need_84() {
    let result = parse_with(HOOKS_SOURCE, &ParserConfig::for_version(PhpVersion::Php83));
    assert!(result.errors.iter().any(|e| matches!(
        e,
        ParseError::UnsupportedFeature {
            required: PhpVersion::Php84,
            ..
        }
    )));
}

// =============================================================================
// Enums, interfaces, traits
// =============================================================================

#[test]
fn test_backed_enum() {
    let source = "<?php enum Suit: string implements HasLabel {
        case Hearts = 'H';
        case Spades = 'S';
        const Wild = self::Spades;
        public function label(): string { return ucfirst($this->name); }
    }";
    let result = parse_clean(source);
    let stmt = &result.program.stmts[0];
    assert_eq!(member_kinds(stmt), vec!["case", "case", "const", "method"]);
    let StmtKind::Enum(decl) = &stmt.kind else {
        unreachable!()
    };
    assert_eq!(decl.scalar_type.as_ref().map(|n| n.last()), Some("string"));
    assert_eq!(decl.implements.len(), 1);
}

#[test]
fn test_enum_backing_type_must_be_int_or_string() {
    let result = parse("<?php enum E: float { case A = 1.5; }");
    assert!(forbidden_messages(&result)
        .iter()
        .any(|m| m.contains("int or string")));
}

#[test]
fn test_interface_and_trait_bodies() {
    let result = parse_clean(
        "<?php interface I extends J, K { const V = 1; public function f(): int; }
        trait T { private $cache = []; abstract public function g(); }",
    );
    assert_eq!(member_kinds(&result.program.stmts[0]), vec!["const", "method"]);
    assert_eq!(member_kinds(&result.program.stmts[1]), vec!["property", "method"]);
    let StmtKind::Interface(iface) = &result.program.stmts[0].kind else {
        unreachable!()
    };
    assert_eq!(iface.extends.len(), 2);
}

#[test]
fn test_reserved_class_names_are_rejected() {
    let result = parse("<?php class self {} class A extends parent {}");
    assert_eq!(forbidden_messages(&result).len(), 2);
}

// =============================================================================
// Imports and statements
// =============================================================================

#[test]
fn test_group_use_prefixes_items() {
    let result = parse_clean("<?php use App\\{Models\\User, function helper, Other as O};");
    let StmtKind::Use(decl) = &result.program.stmts[0].kind else {
        panic!("expected use");
    };
    assert_eq!(decl.kind, UseKind::Normal);
    let names: Vec<String> = decl.uses.iter().map(|u| u.name.joined()).collect();
    assert_eq!(names, vec!["App\\Models\\User", "App\\helper", "App\\Other"]);
    assert_eq!(decl.uses[1].kind, Some(UseKind::Function));
    assert_eq!(decl.uses[2].local_name(), "O");
}

#[test]
fn test_declare_forms() {
    let result = parse_clean(
        "<?php declare(strict_types=1); declare(ticks=1) { tick(); } declare(ticks=1): tick(); enddeclare;",
    );
    let bodies: Vec<bool> = result
        .program
        .stmts
        .iter()
        .map(|s| match &s.kind {
            StmtKind::Declare(declare) => declare.body.is_some(),
            other => panic!("expected declare, got {other:?}"),
        })
        .collect();
    assert_eq!(bodies, vec![false, true, true]);
}

#[test]
fn test_else_if_nests_an_if() {
    let result = parse_clean("<?php if ($a) {} else if ($b) {} elseif ($c) {}");
    let StmtKind::If(outer) = &result.program.stmts[0].kind else {
        panic!("expected if");
    };
    assert!(outer.elseifs.is_empty());
    let Some(else_branch) = &outer.else_branch else {
        panic!("expected else");
    };
    let StmtKind::If(inner) = &else_branch.kind else {
        panic!("expected nested if");
    };
    assert_eq!(inner.elseifs.len(), 1);
}

#[test]
fn test_try_without_handlers_is_an_error() {
    let result = parse("<?php try { f(); }");
    assert!(result.has_errors());
    assert!(matches!(result.program.stmts[0].kind, StmtKind::Try(_)));
}

#[test]
fn test_break_level_must_be_positive() {
    let result = parse("<?php while (true) { break 0; }");
    assert!(forbidden_messages(&result)
        .iter()
        .any(|m| m.contains("positive integers")));
}

#[test]
fn test_static_and_global_statements() {
    let result = parse_clean("<?php function f() { static $a = 1, $b; global $g, $$h; }");
    let StmtKind::Function(func) = &result.program.stmts[0].kind else {
        panic!("expected function");
    };
    let StmtKind::StaticVar(vars) = &func.body[0].kind else {
        panic!("expected static");
    };
    assert_eq!(vars.len(), 2);
    assert!(vars[0].default.is_some() && vars[1].default.is_none());
    assert!(matches!(&func.body[1].kind, StmtKind::Global(vars) if vars.len() == 2));
}

#[test]
fn test_nested_namespace_is_forbidden() {
    let result = parse("<?php function f() { namespace A; }");
    assert!(forbidden_messages(&result).iter().any(|m| m.contains("top level")));
}
