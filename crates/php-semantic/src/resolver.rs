//! Name resolution.
//!
//! The first pass hoists every function, class-like and constant declaration
//! into the global scope, wherever it is nested, and links class hierarchies.
//! The second pass walks bodies with a scope stack and binds each variable
//! and name reference following PHP's rules: a function body sees only its
//! own variables plus what `global`, `static` and `use (...)` bring in.

use std::collections::{HashMap, HashSet};

use lazy_static::lazy_static;
use php_ast::visitor::{self, Visitor};
use php_ast::*;

use crate::symbols::{
    ClassInfo, NameSpace, Resolution, ScopeId, ScopeKind, SymbolId, SymbolKind, SymbolTable, Usage,
    UsageKind,
};

lazy_static! {
    static ref SUPERGLOBALS: HashSet<&'static str> = [
        "GLOBALS", "_SERVER", "_GET", "_POST", "_FILES", "_COOKIE", "_SESSION", "_REQUEST", "_ENV",
    ]
    .into_iter()
    .collect();

    /// Calls that read or write the local variable table by name.
    static ref SCOPE_INTROSPECTION: HashSet<&'static str> =
        ["extract", "compact", "get_defined_vars", "parse_str"].into_iter().collect();

    static ref BUILTIN_TYPES: HashSet<&'static str> = [
        "int", "float", "string", "bool", "array", "callable", "iterable", "object", "mixed",
        "void", "null", "never", "false", "true", "integer", "double", "boolean", "resource",
    ]
    .into_iter()
    .collect();
}

pub fn is_superglobal(name: &str) -> bool {
    SUPERGLOBALS.contains(name)
}

/// Build the symbol table for one file.
pub fn resolve(program: &Program) -> SymbolTable {
    let mut table = SymbolTable::new(program.span);

    let mut collector = Collector {
        table: &mut table,
        names: NameContext::default(),
        links: Vec::new(),
    };
    collector.visit_program(program);
    let links = std::mem::take(&mut collector.links);
    link_classes(&mut table, links);

    let mut resolver = Resolver {
        table: &mut table,
        names: NameContext::default(),
        scope: ScopeId(0),
        classes: Vec::new(),
        guarded: false,
    };
    resolver.visit_program(program);

    tracing::trace!(
        scopes = table.scopes().len(),
        symbols = table.symbols().len(),
        "resolved symbols"
    );
    table
}

// =============================================================================
// Namespaces and imports
// =============================================================================

#[derive(Debug, Default, Clone)]
struct NameContext {
    namespace: String,
    /// Lower-cased alias to fully qualified name.
    classes: HashMap<String, String>,
    functions: HashMap<String, String>,
    /// Constant aliases are case-sensitive.
    constants: HashMap<String, String>,
}

impl NameContext {
    fn enter_namespace(&mut self, name: Option<&Name>) {
        *self = NameContext {
            namespace: name.map(|n| n.parts.join("\\")).unwrap_or_default(),
            ..NameContext::default()
        };
    }

    fn add_use(&mut self, decl: &UseDecl) {
        for item in &decl.uses {
            let target = item.name.parts.join("\\");
            let alias = match &item.alias {
                Some(alias) => alias.clone(),
                None => item.name.parts.last().cloned().unwrap_or_default(),
            };
            match item.kind.unwrap_or(decl.kind) {
                UseKind::Normal => {
                    self.classes.insert(alias.to_ascii_lowercase(), target);
                }
                UseKind::Function => {
                    self.functions.insert(alias.to_ascii_lowercase(), target);
                }
                UseKind::Const => {
                    self.constants.insert(alias, target);
                }
            }
        }
    }

    /// Name of a declaration made in the current namespace.
    fn declared(&self, name: &str) -> String {
        if self.namespace.is_empty() {
            name.to_string()
        } else {
            format!("{}\\{}", self.namespace, name)
        }
    }

    fn class_name(&self, raw: &str) -> String {
        if let Some(rest) = raw.strip_prefix('\\') {
            return rest.to_string();
        }
        if let Some(rest) = strip_relative(raw) {
            return self.declared(rest);
        }
        let (first, rest) = match raw.split_once('\\') {
            Some((first, rest)) => (first, Some(rest)),
            None => (raw, None),
        };
        match (self.classes.get(&first.to_ascii_lowercase()), rest) {
            (Some(target), Some(rest)) => format!("{target}\\{rest}"),
            (Some(target), None) => target.clone(),
            (None, _) => self.declared(raw),
        }
    }

    /// Candidate names for a function call in lookup order. Unqualified calls
    /// inside a namespace fall back to the global function.
    fn function_candidates(&self, raw: &str) -> Vec<String> {
        if let Some(rest) = raw.strip_prefix('\\') {
            return vec![rest.to_string()];
        }
        if raw.contains('\\') {
            return vec![self.class_name(raw)];
        }
        if let Some(target) = self.functions.get(&raw.to_ascii_lowercase()) {
            return vec![target.clone()];
        }
        self.with_global_fallback(raw)
    }

    fn constant_candidates(&self, raw: &str) -> Vec<String> {
        if let Some(rest) = raw.strip_prefix('\\') {
            return vec![rest.to_string()];
        }
        if raw.contains('\\') {
            return vec![self.class_name(raw)];
        }
        if let Some(target) = self.constants.get(raw) {
            return vec![target.clone()];
        }
        self.with_global_fallback(raw)
    }

    fn with_global_fallback(&self, raw: &str) -> Vec<String> {
        if self.namespace.is_empty() {
            vec![raw.to_string()]
        } else {
            vec![self.declared(raw), raw.to_string()]
        }
    }
}

fn strip_relative(raw: &str) -> Option<&str> {
    let (head, rest) = raw.split_once('\\')?;
    head.eq_ignore_ascii_case("namespace").then_some(rest)
}

fn name_text(name: &Name) -> String {
    let joined = name.parts.join("\\");
    match name.kind {
        NameKind::FullyQualified => format!("\\{joined}"),
        NameKind::Relative => format!("namespace\\{joined}"),
        NameKind::Qualified | NameKind::Unqualified => joined,
    }
}

fn is_class_keyword(raw: &str) -> bool {
    ["self", "static", "parent"]
        .iter()
        .any(|k| raw.eq_ignore_ascii_case(k))
}

// =============================================================================
// Pass 1: declarations
// =============================================================================

struct ClassLinks {
    symbol: SymbolId,
    scope: ScopeId,
    parent: Option<(String, Span)>,
    interfaces: Vec<(String, Span)>,
    traits: Vec<(String, Span)>,
}

struct Collector<'t> {
    table: &'t mut SymbolTable,
    names: NameContext,
    links: Vec<ClassLinks>,
}

impl Collector<'_> {
    fn declare_class_like(
        &mut self,
        kind: SymbolKind,
        name: &str,
        owner: Span,
        extends: &[&Name],
        implements: &[Name],
    ) -> ScopeId {
        let global = self.table.global_scope();
        let fqn = self.names.declared(name);
        let symbol = self
            .table
            .declare(global, NameSpace::Class, kind, &fqn, Some(owner));
        let scope = self
            .table
            .add_scope(ScopeKind::Class, Some(global), owner, Some(fqn));
        let qualify = |n: &Name| (self.names.class_name(&name_text(n)), n.span);

        // Interfaces may extend several parents; only classes have a chain.
        let (parent, mut interfaces) = match (kind, extends) {
            (SymbolKind::Class, [parent]) => (Some(qualify(*parent)), Vec::new()),
            _ => (None, extends.iter().map(|n| qualify(*n)).collect::<Vec<_>>()),
        };
        interfaces.extend(implements.iter().map(qualify));
        self.links.push(ClassLinks {
            symbol,
            scope,
            parent,
            interfaces,
            traits: Vec::new(),
        });
        scope
    }

    fn add_traits(&mut self, used: &TraitUseDecl) {
        let traits: Vec<_> = used
            .traits
            .iter()
            .map(|n| (self.names.class_name(&name_text(n)), n.span))
            .collect();
        if let Some(links) = self.links.last_mut() {
            links.traits.extend(traits);
        }
    }

    fn collect_members(&mut self, scope: ScopeId, members: &[ClassMember]) {
        for member in members {
            match &member.kind {
                ClassMemberKind::TraitUse(used) => self.add_traits(used),
                _ => declare_member(self.table, scope, member),
            }
        }
    }
}

fn declare_member(table: &mut SymbolTable, scope: ScopeId, member: &ClassMember) {
    match &member.kind {
        ClassMemberKind::Method(method) => declare_method(table, scope, method, member.span),
        ClassMemberKind::Property(prop) => {
            table.declare(scope, NameSpace::Property, SymbolKind::Field, &prop.name, Some(member.span));
        }
        ClassMemberKind::ClassConst(constant) => {
            table.declare(
                scope,
                NameSpace::Constant,
                SymbolKind::ClassConstant,
                &constant.name,
                Some(member.span),
            );
        }
        ClassMemberKind::EnumCase(case) => {
            table.declare(scope, NameSpace::Constant, SymbolKind::EnumCase, &case.name, Some(member.span));
        }
        ClassMemberKind::TraitUse(_) => {}
    }
}

fn declare_method(table: &mut SymbolTable, scope: ScopeId, method: &MethodDecl, span: Span) {
    table.declare(scope, NameSpace::Method, SymbolKind::Method, &method.name, Some(span));
    if method.name.eq_ignore_ascii_case("__construct") {
        for param in method.params.iter().filter(|p| p.is_promoted()) {
            table.declare(scope, NameSpace::Property, SymbolKind::Field, &param.name, Some(param.span));
        }
    }
}

impl Visitor for Collector<'_> {
    fn visit_stmt(&mut self, stmt: &Stmt) {
        match &stmt.kind {
            StmtKind::Namespace(ns) => {
                self.names.enter_namespace(ns.name.as_ref());
                if let NamespaceBody::Braced(_) = ns.body {
                    visitor::walk_stmt(self, stmt);
                    self.names = NameContext::default();
                }
                return;
            }
            StmtKind::Use(decl) => self.names.add_use(decl),
            StmtKind::Function(func) => {
                let global = self.table.global_scope();
                let fqn = self.names.declared(&func.name);
                self.table
                    .declare(global, NameSpace::Function, SymbolKind::Function, &fqn, Some(stmt.span));
            }
            StmtKind::Const(items) => {
                let global = self.table.global_scope();
                for item in items {
                    let fqn = self.names.declared(&item.name);
                    self.table
                        .declare(global, NameSpace::Constant, SymbolKind::Constant, &fqn, Some(item.span));
                }
            }
            StmtKind::Class(class) => {
                if let Some(name) = &class.name {
                    let extends: Vec<&Name> = class.extends.iter().collect();
                    let scope =
                        self.declare_class_like(SymbolKind::Class, name, stmt.span, &extends, &class.implements);
                    self.collect_members(scope, &class.members);
                }
            }
            StmtKind::Interface(iface) => {
                let extends: Vec<&Name> = iface.extends.iter().collect();
                let scope = self.declare_class_like(SymbolKind::Interface, &iface.name, stmt.span, &extends, &[]);
                self.collect_members(scope, &iface.members);
            }
            StmtKind::Trait(trait_decl) => {
                let scope = self.declare_class_like(SymbolKind::Trait, &trait_decl.name, stmt.span, &[], &[]);
                self.collect_members(scope, &trait_decl.members);
            }
            StmtKind::Enum(enum_decl) => {
                let scope =
                    self.declare_class_like(SymbolKind::Enum, &enum_decl.name, stmt.span, &[], &enum_decl.implements);
                self.collect_members(scope, &enum_decl.members);
            }
            _ => {}
        }
        visitor::walk_stmt(self, stmt);
    }

    fn visit_expr(&mut self, expr: &Expr) {
        // define('NAME', value)
        if let ExprKind::FunctionCall(call) = &expr.kind {
            if let ExprKind::Identifier(callee) = &call.name.kind {
                if callee.trim_start_matches('\\').eq_ignore_ascii_case("define") {
                    if let Some(ExprKind::String(name)) = call.args.first().map(|a| &a.value.kind) {
                        let global = self.table.global_scope();
                        self.table.declare(
                            global,
                            NameSpace::Constant,
                            SymbolKind::Constant,
                            name.trim_start_matches('\\'),
                            Some(expr.span),
                        );
                    }
                }
            }
        }
        visitor::walk_expr(self, expr);
    }
}

fn link_classes(table: &mut SymbolTable, links: Vec<ClassLinks>) {
    let global = table.global_scope();
    let resolve = |table: &mut SymbolTable, (name, span): (String, Span)| {
        let resolution = table.lookup(global, NameSpace::Class, &name);
        table.record(span, resolution);
        if let Resolution::Resolved(id) = resolution {
            table.add_usage(id, Usage { span, kind: UsageKind::Read, guarded: false });
        }
        resolution
    };
    for link in links {
        let parent = link.parent.map(|p| resolve(table, p));
        let interfaces = link.interfaces.into_iter().map(|i| resolve(table, i)).collect();
        let traits = link.traits.into_iter().map(|t| resolve(table, t)).collect();
        table.set_class_info(ClassInfo {
            symbol: link.symbol,
            scope: link.scope,
            parent,
            interfaces,
            traits,
        });
    }
}

// =============================================================================
// Pass 2: bodies
// =============================================================================

struct ClassFrame {
    symbol: Option<SymbolId>,
}

struct Resolver<'t> {
    table: &'t mut SymbolTable,
    names: NameContext,
    scope: ScopeId,
    classes: Vec<ClassFrame>,
    /// Inside an `isset()`/`empty()` operand or the left side of `??`.
    guarded: bool,
}

impl Resolver<'_> {
    fn enter_scope(&mut self, kind: ScopeKind, owner: Span, name: Option<String>) -> ScopeId {
        let saved = self.scope;
        self.scope = self.table.add_scope(kind, Some(saved), owner, name);
        saved
    }

    fn variable_scope(&self) -> ScopeId {
        self.table.variable_scope(self.scope)
    }

    fn current_class(&self) -> Option<SymbolId> {
        self.classes.last().and_then(|frame| frame.symbol)
    }

    fn mark_dynamic(&mut self) {
        let scope = self.variable_scope();
        self.table.mark_dynamic(scope);
    }

    // -- variables ------------------------------------------------------------

    fn variable_symbol(&mut self, name: &str, kind: UsageKind) -> SymbolId {
        if is_superglobal(name) {
            let global = self.table.global_scope();
            let id = self
                .table
                .declare(global, NameSpace::Variable, SymbolKind::Variable, name, None);
            self.table.symbol_mut(id).flags.is_superglobal = true;
            return id;
        }

        let scope = self.variable_scope();
        if let Resolution::Resolved(id) = self.table.lookup(scope, NameSpace::Variable, name) {
            return id;
        }

        // Arrow functions capture the enclosing variables by value.
        if kind == UsageKind::Read {
            let mut current = scope;
            while self.table.scope(current).kind == ScopeKind::ArrowFunction {
                let Some(parent) = self.table.scope(current).parent else {
                    break;
                };
                let outer = self.table.variable_scope(parent);
                if let Resolution::Resolved(id) = self.table.lookup(outer, NameSpace::Variable, name) {
                    return id;
                }
                current = outer;
            }
        }

        self.table
            .declare(scope, NameSpace::Variable, SymbolKind::Variable, name, None)
    }

    fn bind_variable(&mut self, name: &str, span: Span, kind: UsageKind, guarded: bool) -> SymbolId {
        let id = self.variable_symbol(name, kind);
        let symbol = self.table.symbol_mut(id);
        if kind.is_write() && symbol.declarations.is_empty() {
            symbol.declarations.push(span);
        }
        self.table.add_usage(id, Usage { span, kind, guarded });
        self.table.record(span, Resolution::Resolved(id));
        id
    }

    /// Declare a variable bound by a construct rather than an assignment.
    fn declare_variable(&mut self, name: &str, span: Span) -> SymbolId {
        let scope = self.variable_scope();
        let id = self
            .table
            .declare(scope, NameSpace::Variable, SymbolKind::Variable, name, Some(span));
        self.table.add_usage(id, Usage { span, kind: UsageKind::Write, guarded: false });
        self.table.record(span, Resolution::Resolved(id));
        id
    }

    fn declare_this(&mut self) {
        let scope = self.scope;
        let id = self
            .table
            .declare(scope, NameSpace::Variable, SymbolKind::Variable, "this", None);
        self.table.symbol_mut(id).flags.is_implicit = true;
    }

    fn bind_global(&mut self, name: &str, span: Span) {
        let global = self.table.global_scope();
        let global_id = self
            .table
            .declare(global, NameSpace::Variable, SymbolKind::Variable, name, None);
        self.table
            .add_usage(global_id, Usage { span, kind: UsageKind::Read, guarded: true });

        if self.variable_scope() == global {
            self.table.record(span, Resolution::Resolved(global_id));
            return;
        }
        let id = self.declare_variable(name, span);
        let symbol = self.table.symbol_mut(id);
        symbol.flags.is_global = true;
        symbol.imported_from = Some(global_id);
    }

    fn declare_params(&mut self, params: &[Param]) {
        for param in params {
            if let Some(hint) = &param.type_hint {
                self.visit_type_hint(hint);
            }
            if let Some(default) = &param.default {
                self.visit_expr(default);
            }
            let id = self.declare_variable(&param.name, param.span);
            let flags = &mut self.table.symbol_mut(id).flags;
            flags.is_parameter = true;
            flags.is_by_ref = param.by_ref;
        }
    }

    /// Visit an expression in assignment-target position.
    fn visit_target(&mut self, expr: &Expr, kind: UsageKind) {
        match &expr.kind {
            ExprKind::Variable(name) => {
                self.bind_variable(name, expr.span, kind, false);
            }
            ExprKind::ArrayAccess(access) => {
                self.visit_target(&access.array, kind);
                if let Some(index) = &access.index {
                    self.visit_expr(index);
                }
            }
            ExprKind::Array(elements) => {
                for element in elements {
                    if let Some(key) = &element.key {
                        self.visit_expr(key);
                    }
                    self.visit_target(&element.value, kind);
                }
            }
            ExprKind::PropertyAccess(access) => {
                self.visit_expr(&access.object);
                self.visit_member(expr.span, &access.object, &access.property, NameSpace::Property, kind);
            }
            ExprKind::Parenthesized(inner) => self.visit_target(inner, kind),
            _ => self.visit_expr(expr),
        }
    }

    fn visit_guarded(&mut self, expr: &Expr) {
        let saved = std::mem::replace(&mut self.guarded, true);
        self.visit_expr(expr);
        self.guarded = saved;
    }

    fn visit_args(&mut self, args: &[Arg]) {
        for arg in args {
            match &arg.value.kind {
                // Possibly an out-parameter such as preg_match's third argument.
                ExprKind::Variable(name) => {
                    self.bind_variable(name, arg.value.span, UsageKind::Read, true);
                }
                _ => self.visit_expr(&arg.value),
            }
        }
    }

    // -- names ----------------------------------------------------------------

    fn resolve_class(&self, raw: &str) -> Resolution {
        if raw.eq_ignore_ascii_case("self") || raw.eq_ignore_ascii_case("static") {
            return self.current_class().map_or(Resolution::Unresolved, Resolution::Resolved);
        }
        if raw.eq_ignore_ascii_case("parent") {
            return self
                .current_class()
                .and_then(|class| self.table.class_info(class))
                .and_then(|info| info.parent)
                .unwrap_or(Resolution::Unresolved);
        }
        let global = self.table.global_scope();
        self.table
            .lookup(global, NameSpace::Class, &self.names.class_name(raw))
    }

    fn resolve_candidates(&self, space: NameSpace, candidates: Vec<String>) -> Resolution {
        let global = self.table.global_scope();
        candidates
            .iter()
            .map(|name| self.table.lookup(global, space, name))
            .find(|r| matches!(r, Resolution::Resolved(_)))
            .unwrap_or(Resolution::Unresolved)
    }

    fn reference(&mut self, span: Span, resolution: Resolution, kind: UsageKind) {
        self.table.record(span, resolution);
        if let Resolution::Resolved(id) = resolution {
            self.table
                .add_usage(id, Usage { span, kind, guarded: self.guarded });
        }
    }

    /// Record a class reference and return the class it names.
    fn visit_class_ref(&mut self, expr: &Expr) -> Option<SymbolId> {
        match &expr.kind {
            ExprKind::Identifier(raw) => {
                let resolution = self.resolve_class(raw);
                self.reference(expr.span, resolution, UsageKind::Read);
                resolution.symbol()
            }
            _ => {
                self.visit_expr(expr);
                None
            }
        }
    }

    fn visit_class_name(&mut self, name: &Name) {
        let raw = name_text(name);
        if BUILTIN_TYPES.contains(raw.to_ascii_lowercase().as_str()) {
            return;
        }
        let resolution = self.resolve_class(&raw);
        self.reference(name.span, resolution, UsageKind::Read);
    }

    fn visit_type_hint(&mut self, hint: &TypeHint) {
        match &hint.kind {
            TypeHintKind::Named(name) => self.visit_class_name(name),
            TypeHintKind::Nullable(inner) => self.visit_type_hint(inner),
            TypeHintKind::Union(hints) | TypeHintKind::Intersection(hints) => {
                for hint in hints {
                    self.visit_type_hint(hint);
                }
            }
        }
    }

    fn static_member(&mut self, span: Span, class: Option<SymbolId>, space: NameSpace, name: &str, kind: UsageKind) {
        let resolution = match class {
            Some(class) => self.table.lookup_member(class, space, name),
            None => Resolution::Unresolved,
        };
        self.reference(span, resolution, kind);
    }

    /// `$object->member`: only members of `$this` can be bound statically.
    /// A dynamic member marks the whole access at `access` as not applicable.
    fn visit_member(&mut self, access: Span, object: &Expr, member: &Expr, space: NameSpace, kind: UsageKind) {
        match &member.kind {
            ExprKind::Identifier(name) => {
                let class = match &object.kind {
                    ExprKind::Variable(var) if var == "this" => self.current_class(),
                    _ => None,
                };
                self.static_member(member.span, class, space, name, kind);
            }
            _ => {
                self.table.record(access, Resolution::NotApplicable);
                self.visit_expr(member);
            }
        }
    }

    // -- declarations -----------------------------------------------------------

    fn visit_function_like(
        &mut self,
        kind: ScopeKind,
        owner: Span,
        name: Option<String>,
        params: &[Param],
        has_this: bool,
        body: &[Stmt],
    ) {
        let saved = self.enter_scope(kind, owner, name);
        if has_this {
            self.declare_this();
        }
        self.declare_params(params);
        for stmt in body {
            self.visit_stmt(stmt);
        }
        self.scope = saved;
    }

    fn visit_method(&mut self, method: &MethodDecl, span: Span) {
        if let Some(hint) = &method.return_type {
            self.visit_type_hint(hint);
        }
        let has_this = !method.modifiers.is_static;
        let body = method.body.as_deref().unwrap_or(&[]);
        self.visit_function_like(
            ScopeKind::Method,
            span,
            Some(method.name.clone()),
            &method.params,
            has_this,
            body,
        );
        for param in &method.params {
            for hook in &param.hooks {
                self.visit_hook(hook, &param.name);
            }
        }
    }

    fn visit_hook(&mut self, hook: &PropertyHook, property: &str) {
        let saved = self.enter_scope(ScopeKind::Method, hook.span, Some(property.to_string()));
        self.declare_this();
        if hook.kind == PropertyHookKind::Set && hook.params.is_empty() {
            let id = self.declare_variable("value", hook.span);
            self.table.symbol_mut(id).flags.is_parameter = true;
        }
        self.declare_params(&hook.params);
        match &hook.body {
            PropertyHookBody::Block(stmts) => {
                for stmt in stmts {
                    self.visit_stmt(stmt);
                }
            }
            PropertyHookBody::Expression(expr) => self.visit_expr(expr),
            PropertyHookBody::Abstract => {}
        }
        self.scope = saved;
    }

    /// Walk a class-like body whose scope was created during hoisting, or a
    /// fresh one for anonymous classes.
    fn visit_class_body(&mut self, owner: Span, members: &[ClassMember]) {
        let symbol = self.table.declared_at(owner);
        let Some(scope) = self.table.scope_owned_by(owner) else {
            return;
        };
        self.classes.push(ClassFrame { symbol });
        let saved = std::mem::replace(&mut self.scope, scope);
        for member in members {
            self.visit_class_member(member);
        }
        self.scope = saved;
        self.classes.pop();
    }

    fn visit_anonymous_class(&mut self, span: Span, class: &ClassDecl) {
        let parent_scope = self.scope;
        let symbol = self
            .table
            .declare_unnamed(parent_scope, SymbolKind::Class, "class@anonymous", span);
        let scope = self
            .table
            .add_scope(ScopeKind::Class, Some(parent_scope), span, None);
        let mut traits = Vec::new();
        for member in &class.members {
            match &member.kind {
                ClassMemberKind::TraitUse(used) => {
                    for name in &used.traits {
                        traits.push(self.resolve_class(&name_text(name)));
                    }
                }
                _ => declare_member(self.table, scope, member),
            }
        }
        let parent = class.extends.as_ref().map(|name| {
            let resolution = self.resolve_class(&name_text(name));
            self.reference(name.span, resolution, UsageKind::Read);
            resolution
        });
        let interfaces = class
            .implements
            .iter()
            .map(|name| {
                let resolution = self.resolve_class(&name_text(name));
                self.reference(name.span, resolution, UsageKind::Read);
                resolution
            })
            .collect();
        self.table.set_class_info(ClassInfo {
            symbol,
            scope,
            parent,
            interfaces,
            traits,
        });
        self.visit_class_body(span, &class.members);
    }

    fn visit_closure(&mut self, span: Span, closure: &ClosureExpr) {
        if let Some(hint) = &closure.return_type {
            self.visit_type_hint(hint);
        }
        // Captured values are read in the defining scope.
        let captures: Vec<(SymbolId, &ClosureUseVar)> = closure
            .use_vars
            .iter()
            .map(|var| {
                let kind = if var.by_ref { UsageKind::ReadWrite } else { UsageKind::Read };
                (self.bind_variable(&var.name, var.span, kind, var.by_ref), var)
            })
            .collect();

        let has_this = !closure.is_static && self.current_class().is_some();
        let saved = self.enter_scope(ScopeKind::Closure, span, None);
        if has_this {
            self.declare_this();
        }
        let scope = self.scope;
        for (outer, var) in captures {
            let id = self
                .table
                .declare(scope, NameSpace::Variable, SymbolKind::Variable, &var.name, Some(var.span));
            let symbol = self.table.symbol_mut(id);
            symbol.flags.is_captured = true;
            symbol.flags.is_by_ref = var.by_ref;
            symbol.imported_from = Some(outer);
        }
        self.declare_params(&closure.params);
        for stmt in &closure.body {
            self.visit_stmt(stmt);
        }
        self.scope = saved;
    }

    fn visit_arrow_function(&mut self, span: Span, arrow: &ArrowFunctionExpr) {
        if let Some(hint) = &arrow.return_type {
            self.visit_type_hint(hint);
        }
        let saved = self.enter_scope(ScopeKind::ArrowFunction, span, None);
        self.declare_params(&arrow.params);
        self.visit_expr(&arrow.body);
        self.scope = saved;
    }
}

impl Visitor for Resolver<'_> {
    fn visit_stmt(&mut self, stmt: &Stmt) {
        match &stmt.kind {
            StmtKind::Namespace(ns) => {
                self.names.enter_namespace(ns.name.as_ref());
                if let NamespaceBody::Braced(_) = ns.body {
                    visitor::walk_stmt(self, stmt);
                    self.names = NameContext::default();
                }
            }
            StmtKind::Use(decl) => self.names.add_use(decl),
            StmtKind::Function(func) => {
                if let Some(hint) = &func.return_type {
                    self.visit_type_hint(hint);
                }
                let name = self.names.declared(&func.name);
                self.visit_function_like(ScopeKind::Function, stmt.span, Some(name), &func.params, false, &func.body);
            }
            StmtKind::Class(class) => {
                if class.name.is_some() {
                    self.visit_class_body(stmt.span, &class.members);
                }
            }
            StmtKind::Interface(iface) => self.visit_class_body(stmt.span, &iface.members),
            StmtKind::Trait(trait_decl) => self.visit_class_body(stmt.span, &trait_decl.members),
            StmtKind::Enum(enum_decl) => self.visit_class_body(stmt.span, &enum_decl.members),
            StmtKind::Global(exprs) => {
                for expr in exprs {
                    match &expr.kind {
                        ExprKind::Variable(name) => self.bind_global(name, expr.span),
                        _ => self.visit_expr(expr),
                    }
                }
            }
            StmtKind::StaticVar(vars) => {
                for var in vars {
                    if let Some(default) = &var.default {
                        self.visit_expr(default);
                    }
                    let id = self.declare_variable(&var.name, var.span);
                    self.table.symbol_mut(id).flags.is_static = true;
                }
            }
            StmtKind::Foreach(foreach) => {
                self.visit_expr(&foreach.expr);
                if let Some(key) = &foreach.key {
                    self.visit_target(key, UsageKind::Write);
                }
                self.visit_target(&foreach.value, UsageKind::Write);
                if let (true, ExprKind::Variable(name)) = (foreach.by_ref, &foreach.value.kind) {
                    let scope = self.variable_scope();
                    if let Resolution::Resolved(id) = self.table.lookup(scope, NameSpace::Variable, name) {
                        self.table.symbol_mut(id).flags.is_by_ref = true;
                    }
                }
                self.visit_stmt(&foreach.body);
            }
            StmtKind::Unset(exprs) => {
                for expr in exprs {
                    self.visit_target(expr, UsageKind::Write);
                }
            }
            StmtKind::Try(try_stmt) => {
                for stmt in &try_stmt.body {
                    self.visit_stmt(stmt);
                }
                for catch in &try_stmt.catches {
                    for name in &catch.types {
                        self.visit_class_name(name);
                    }
                    let saved = self.enter_scope(ScopeKind::Catch, catch.span, None);
                    if let (Some(var), Some(span)) = (&catch.var, catch.var_span) {
                        self.declare_variable(var, span);
                    }
                    for stmt in &catch.body {
                        self.visit_stmt(stmt);
                    }
                    self.scope = saved;
                }
                if let Some(finally) = &try_stmt.finally {
                    for stmt in finally {
                        self.visit_stmt(stmt);
                    }
                }
            }
            _ => visitor::walk_stmt(self, stmt),
        }
    }

    fn visit_class_member(&mut self, member: &ClassMember) {
        match &member.kind {
            ClassMemberKind::Method(method) => self.visit_method(method, member.span),
            ClassMemberKind::Property(prop) => {
                if let Some(hint) = &prop.type_hint {
                    self.visit_type_hint(hint);
                }
                if let Some(default) = &prop.default {
                    self.visit_expr(default);
                }
                for hook in &prop.hooks {
                    self.visit_hook(hook, &prop.name);
                }
            }
            ClassMemberKind::ClassConst(constant) => {
                if let Some(hint) = &constant.type_hint {
                    self.visit_type_hint(hint);
                }
                self.visit_expr(&constant.value);
            }
            ClassMemberKind::EnumCase(case) => {
                if let Some(value) = &case.value {
                    self.visit_expr(value);
                }
            }
            ClassMemberKind::TraitUse(_) => {}
        }
    }

    fn visit_expr(&mut self, expr: &Expr) {
        match &expr.kind {
            ExprKind::Variable(name) => {
                let guarded = self.guarded;
                self.bind_variable(name, expr.span, UsageKind::Read, guarded);
            }
            ExprKind::VariableVariable(inner) => {
                self.mark_dynamic();
                self.table.record(expr.span, Resolution::NotApplicable);
                self.visit_expr(inner);
            }
            ExprKind::Assign(assign) => {
                let kind = match assign.op {
                    AssignOp::Assign => UsageKind::Write,
                    _ => UsageKind::ReadWrite,
                };
                self.visit_target(&assign.target, kind);
                self.visit_expr(&assign.value);
                if assign.by_ref {
                    if let ExprKind::Variable(_) = assign.target.kind {
                        if let Resolution::Resolved(id) = self.table.symbol_at(assign.target.span) {
                            self.table.symbol_mut(id).flags.is_by_ref = true;
                        }
                    }
                }
            }
            ExprKind::Unary(unary) if unary.op.mutates() => {
                self.visit_target(&unary.operand, UsageKind::ReadWrite);
            }
            ExprKind::Isset(exprs) => {
                for expr in exprs {
                    self.visit_guarded(expr);
                }
            }
            ExprKind::Empty(inner) => self.visit_guarded(inner),
            ExprKind::NullCoalesce(coalesce) => {
                self.visit_guarded(&coalesce.left);
                self.visit_expr(&coalesce.right);
            }
            ExprKind::Include(_, inner) | ExprKind::Eval(inner) => {
                self.mark_dynamic();
                self.visit_expr(inner);
            }
            ExprKind::FunctionCall(call) => {
                match &call.name.kind {
                    ExprKind::Identifier(raw) => {
                        let resolution = self.resolve_candidates(NameSpace::Function, self.names.function_candidates(raw));
                        self.reference(call.name.span, resolution, UsageKind::Read);
                        let bare = raw.trim_start_matches('\\').to_ascii_lowercase();
                        if SCOPE_INTROSPECTION.contains(bare.as_str()) {
                            self.mark_dynamic();
                        }
                    }
                    _ => self.visit_expr(&call.name),
                }
                self.visit_args(&call.args);
            }
            ExprKind::New(new) => {
                self.visit_class_ref(&new.class);
                self.visit_args(&new.args);
            }
            ExprKind::StaticMethodCall(call) => {
                let class = self.visit_class_ref(&call.class);
                self.static_member(expr.span, class, NameSpace::Method, &call.method, UsageKind::Read);
                self.visit_args(&call.args);
            }
            ExprKind::StaticPropertyAccess(access) => {
                let class = self.visit_class_ref(&access.class);
                self.static_member(expr.span, class, NameSpace::Property, &access.member, UsageKind::Read);
            }
            ExprKind::ClassConstAccess(access) => {
                let class = self.visit_class_ref(&access.class);
                if access.member.eq_ignore_ascii_case("class") {
                    self.table.record(expr.span, Resolution::NotApplicable);
                } else {
                    self.static_member(expr.span, class, NameSpace::Constant, &access.member, UsageKind::Read);
                }
            }
            ExprKind::ClassConstAccessDynamic { class, member }
            | ExprKind::StaticPropertyAccessDynamic { class, member } => {
                self.visit_class_ref(class);
                self.table.record(expr.span, Resolution::NotApplicable);
                self.visit_expr(member);
            }
            ExprKind::PropertyAccess(access) => {
                self.visit_expr(&access.object);
                self.visit_member(expr.span, &access.object, &access.property, NameSpace::Property, UsageKind::Read);
            }
            ExprKind::MethodCall(call) => {
                self.visit_expr(&call.object);
                self.visit_member(expr.span, &call.object, &call.method, NameSpace::Method, UsageKind::Read);
                self.visit_args(&call.args);
            }
            ExprKind::Binary(binary) if binary.op == BinaryOp::Instanceof => {
                self.visit_expr(&binary.left);
                self.visit_class_ref(&binary.right);
            }
            ExprKind::CallableCreate(callable) => match &callable.kind {
                CallableCreateKind::Function(name) => match &name.kind {
                    ExprKind::Identifier(raw) => {
                        let resolution = self.resolve_candidates(NameSpace::Function, self.names.function_candidates(raw));
                        self.reference(name.span, resolution, UsageKind::Read);
                    }
                    _ => self.visit_expr(name),
                },
                CallableCreateKind::Method { object, method, .. } => {
                    self.visit_expr(object);
                    self.visit_member(expr.span, object, method, NameSpace::Method, UsageKind::Read);
                }
                CallableCreateKind::StaticMethod { class, method } => {
                    let class = self.visit_class_ref(class);
                    self.static_member(expr.span, class, NameSpace::Method, method, UsageKind::Read);
                }
            },
            ExprKind::Closure(closure) => self.visit_closure(expr.span, closure),
            ExprKind::ArrowFunction(arrow) => self.visit_arrow_function(expr.span, arrow),
            ExprKind::AnonymousClass(class) => self.visit_anonymous_class(expr.span, class),
            ExprKind::Identifier(raw) => {
                let resolution = if is_class_keyword(raw) {
                    self.resolve_class(raw)
                } else {
                    self.resolve_candidates(NameSpace::Constant, self.names.constant_candidates(raw))
                };
                self.reference(expr.span, resolution, UsageKind::Read);
            }
            _ => visitor::walk_expr(self, expr),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve_source(source: &str) -> (Program, SymbolTable) {
        let result = php_parser::parse(source);
        assert!(result.errors.is_empty(), "{:?}", result.errors);
        let table = resolve(&result.program);
        (result.program, table)
    }

    fn span_of(source: &str, needle: &str, nth: usize) -> Span {
        let start = source
            .match_indices(needle)
            .nth(nth)
            .map(|(i, _)| i)
            .expect("needle present");
        Span::new(start as u32, (start + needle.len()) as u32)
    }

    #[test]
    fn test_name_context_imports() {
        let mut names = NameContext::default();
        names.namespace = "App".to_string();
        names.classes.insert("model".to_string(), "Lib\\Model".to_string());
        assert_eq!(names.class_name("Model"), "Lib\\Model");
        assert_eq!(names.class_name("model\\User"), "Lib\\Model\\User");
        assert_eq!(names.class_name("Other"), "App\\Other");
        assert_eq!(names.class_name("\\Other"), "Other");
        assert_eq!(names.class_name("namespace\\Sub\\X"), "App\\Sub\\X");
        assert_eq!(names.function_candidates("strlen"), vec!["App\\strlen", "strlen"]);
    }

    #[test]
    fn test_parameters_and_locals() {
        let source = "<?php function f($p) { $a = $p; return $a; }";
        let (_, table) = resolve_source(source);
        let p_use = table.symbol_at(span_of(source, "$p", 1));
        let p_decl = table.symbol_at(span_of(source, "$p", 0));
        assert_eq!(p_use, p_decl);
        let p = table.symbol(p_use.symbol().unwrap());
        assert!(p.flags.is_parameter);
        let a = table.symbol(table.symbol_at(span_of(source, "$a", 1)).symbol().unwrap());
        assert_eq!(a.usages.len(), 2);
        assert_eq!(a.usages[0].kind, UsageKind::Write);
        assert_eq!(a.usages[1].kind, UsageKind::Read);
    }

    #[test]
    fn test_use_before_assignment_binds_same_symbol() {
        let source = "<?php function f() { echo $x; $x = 1; }";
        let (_, table) = resolve_source(source);
        assert_eq!(
            table.symbol_at(span_of(source, "$x", 0)),
            table.symbol_at(span_of(source, "$x", 1))
        );
    }

    #[test]
    fn test_superglobal_resolves_to_global_scope() {
        let source = "<?php function f() { return $_GET['a']; }";
        let (_, table) = resolve_source(source);
        let id = table.symbol_at(span_of(source, "$_GET", 0)).symbol().unwrap();
        assert_eq!(table.symbol(id).scope, table.global_scope());
        assert!(table.symbol(id).flags.is_superglobal);
    }

    #[test]
    fn test_global_statement_imports() {
        let source = "<?php $config = 1; function f() { global $config; return $config; }";
        let (_, table) = resolve_source(source);
        let outer = table.symbol_at(span_of(source, "$config", 0)).symbol().unwrap();
        let inner = table.symbol_at(span_of(source, "$config", 2)).symbol().unwrap();
        assert_ne!(outer, inner);
        assert!(table.symbol(inner).flags.is_global);
        assert_eq!(table.symbol(inner).imported_from, Some(outer));
    }

    #[test]
    fn test_closure_use_captures() {
        let source = "<?php function f() { $n = 1; $g = function () use (&$n) { return $n; }; }";
        let (_, table) = resolve_source(source);
        let outer = table.symbol_at(span_of(source, "$n", 0)).symbol().unwrap();
        assert_eq!(table.symbol_at(span_of(source, "&$n", 0)), Resolution::Resolved(outer));
        let inner = table.symbol_at(span_of(source, "$n", 2)).symbol().unwrap();
        assert_ne!(inner, outer);
        let inner = table.symbol(inner);
        assert!(inner.flags.is_captured && inner.flags.is_by_ref);
        assert_eq!(inner.imported_from, Some(outer));
    }

    #[test]
    fn test_arrow_function_reads_enclosing_scope() {
        let source = "<?php function f() { $k = 2; return fn($v) => $v * $k; }";
        let (_, table) = resolve_source(source);
        let outer = table.symbol_at(span_of(source, "$k", 0));
        assert_eq!(table.symbol_at(span_of(source, "$k", 1)), outer);
        let v = table.symbol_at(span_of(source, "$v", 1)).symbol().unwrap();
        assert_eq!(table.scope(table.symbol(v).scope).kind, ScopeKind::ArrowFunction);
    }

    #[test]
    fn test_dynamic_names_are_not_applicable() {
        let source = "<?php function f($o, $p) { $n = 'x'; echo $$n; echo $o->$p; }";
        let (_, table) = resolve_source(source);
        assert_eq!(table.symbol_at(span_of(source, "$$n", 0)), Resolution::NotApplicable);
        assert_eq!(table.symbol_at(span_of(source, "$o->$p", 0)), Resolution::NotApplicable);
        assert_eq!(table.symbol_at(span_of(source, "$p", 1)), table.symbol_at(span_of(source, "$p", 0)));
        let f_scope = table.scope_of(span_of(source, "$$n", 0));
        assert!(table.scope(f_scope).has_dynamic_variables);
    }

    #[test]
    fn test_function_namespace_fallback() {
        let source = "<?php namespace App; function helper() {} helper(); strlen('x'); \\App\\helper();";
        let (_, table) = resolve_source(source);
        let helper = table.symbol_at(span_of(source, "helper", 1));
        assert!(matches!(helper, Resolution::Resolved(_)));
        assert_eq!(table.symbol(helper.symbol().unwrap()).name, "App\\helper");
        assert_eq!(table.symbol_at(span_of(source, "strlen", 0)), Resolution::Unresolved);
        assert_eq!(table.symbol_at(span_of(source, "\\App\\helper", 0)), helper);
    }

    #[test]
    fn test_self_and_parent_members() {
        let source = "<?php
class Base { const A = 1; public function run() {} }
class Child extends Base {
    public function go() { $this->run(); return self::A + parent::A; }
}";
        let (_, table) = resolve_source(source);
        let run_call = table.symbol_at(span_of(source, "run", 1));
        assert_eq!(table.symbol(run_call.symbol().unwrap()).kind, SymbolKind::Method);
        let self_a = table.symbol_at(span_of(source, "self::A", 0));
        assert_eq!(table.symbol(self_a.symbol().unwrap()).kind, SymbolKind::ClassConstant);
        assert_eq!(table.symbol_at(span_of(source, "parent::A", 0)), self_a);
    }

    #[test]
    fn test_unknown_base_class_is_unresolved() {
        let source = "<?php class A extends Missing { function f() { return parent::X; } }";
        let (_, table) = resolve_source(source);
        assert_eq!(table.symbol_at(span_of(source, "Missing", 0)), Resolution::Unresolved);
        assert_eq!(table.symbol_at(span_of(source, "parent::X", 0)), Resolution::Unresolved);
        let class = table.declared_at(span_of(source, "class A extends Missing { function f() { return parent::X; } }", 0)).unwrap();
        assert!(table.class_chain(class).incomplete);
    }

    #[test]
    fn test_this_is_implicit_in_methods() {
        let source = "<?php class A { public $v; function get() { return $this->v; } static function s() {} }";
        let (_, table) = resolve_source(source);
        let this = table.symbol(table.symbol_at(span_of(source, "$this", 0)).symbol().unwrap());
        assert!(this.flags.is_implicit);
        let arrow = span_of(source, "->v", 0);
        let v = table.symbol_at(Span::new(arrow.start + 2, arrow.end));
        assert_eq!(table.symbol(v.symbol().unwrap()).kind, SymbolKind::Field);
    }

    #[test]
    fn test_constants_and_define() {
        let source = "<?php const A = 1; define('B', 2); echo A, B, C;";
        let (_, table) = resolve_source(source);
        assert!(matches!(table.symbol_at(span_of(source, "A", 1)), Resolution::Resolved(_)));
        assert!(matches!(table.symbol_at(span_of(source, "B", 1)), Resolution::Resolved(_)));
        assert_eq!(table.symbol_at(span_of(source, "C", 0)), Resolution::Unresolved);
    }

    #[test]
    fn test_catch_variable_lives_in_function() {
        let source = "<?php function f() { try {} catch (\\Exception $e) {} return $e; }";
        let (_, table) = resolve_source(source);
        let e = table.symbol_at(span_of(source, "$e", 0)).symbol().unwrap();
        assert_eq!(table.symbol_at(span_of(source, "$e", 1)), Resolution::Resolved(e));
        assert_eq!(table.scope(table.symbol(e).scope).kind, ScopeKind::Function);
        let catch_scope = table.scope_of(span_of(source, "$e", 0));
        assert_eq!(table.scope(catch_scope).kind, ScopeKind::Catch);
    }

    #[test]
    fn test_list_destructuring_writes() {
        let source = "<?php function f($r) { [$a, [$b]] = $r; list(, $c) = $r; }";
        let (_, table) = resolve_source(source);
        for name in ["$a", "$b", "$c"] {
            let id = table.symbol_at(span_of(source, name, 0)).symbol().unwrap();
            assert_eq!(table.symbol(id).usages[0].kind, UsageKind::Write, "{name}");
        }
    }
}
