use std::collections::HashMap;

use php_ast::Span;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ScopeId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SymbolId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ScopeKind {
    Global,
    Function,
    Method,
    Class,
    Closure,
    ArrowFunction,
    /// Recorded for `catch (E $e)`. The variable itself lives in the
    /// enclosing function scope.
    Catch,
}

impl ScopeKind {
    /// Scopes that own a separate variable namespace.
    pub fn is_function_like(self) -> bool {
        matches!(
            self,
            ScopeKind::Global
                | ScopeKind::Function
                | ScopeKind::Method
                | ScopeKind::Closure
                | ScopeKind::ArrowFunction
        )
    }
}

/// PHP keeps variables, functions, classes and constants in separate tables,
/// so `$foo`, `foo()` and `FOO` never collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum NameSpace {
    Variable,
    Function,
    Class,
    Constant,
    Property,
    Method,
}

impl NameSpace {
    /// Normalize `name` into its lookup key. Functions, classes and methods
    /// are case-insensitive; a namespaced constant is case-insensitive in its
    /// namespace part only.
    pub fn key(self, name: &str) -> String {
        let name = name.trim_start_matches('\\');
        match self {
            NameSpace::Function | NameSpace::Class | NameSpace::Method => name.to_ascii_lowercase(),
            NameSpace::Constant => match name.rfind('\\') {
                Some(pos) => format!("{}{}", name[..pos].to_ascii_lowercase(), &name[pos..]),
                None => name.to_string(),
            },
            NameSpace::Variable | NameSpace::Property => name.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SymbolKey {
    pub space: NameSpace,
    pub name: String,
}

impl SymbolKey {
    pub fn new(space: NameSpace, name: &str) -> Self {
        Self {
            space,
            name: space.key(name),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Scope {
    pub id: ScopeId,
    pub kind: ScopeKind,
    pub parent: Option<ScopeId>,
    /// Span of the declaring node. `None` only for the global scope.
    pub owner: Option<Span>,
    pub name: Option<String>,
    pub symbols: HashMap<SymbolKey, SymbolId>,
    /// Set when the body uses `$$x`, `extract()`, `compact()`, `include` or
    /// similar constructs that make the variable set unknowable.
    pub has_dynamic_variables: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SymbolKind {
    Variable,
    Function,
    Class,
    Interface,
    Trait,
    Enum,
    Constant,
    Field,
    Method,
    ClassConstant,
    EnumCase,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum UsageKind {
    Read,
    Write,
    ReadWrite,
}

impl UsageKind {
    pub fn is_read(self) -> bool {
        matches!(self, UsageKind::Read | UsageKind::ReadWrite)
    }

    pub fn is_write(self) -> bool {
        matches!(self, UsageKind::Write | UsageKind::ReadWrite)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Usage {
    pub span: Span,
    pub kind: UsageKind,
    /// A read where an undefined value is tolerated or may be filled in by
    /// the callee: `isset()`/`empty()` operands, the left side of `??`, and
    /// bare variables passed as call arguments.
    pub guarded: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct VariableFlags {
    pub is_parameter: bool,
    pub is_by_ref: bool,
    pub is_captured: bool,
    pub is_global: bool,
    pub is_static: bool,
    pub is_superglobal: bool,
    /// `$this`
    pub is_implicit: bool,
}

#[derive(Debug, Clone)]
pub struct Symbol {
    pub id: SymbolId,
    pub kind: SymbolKind,
    pub name: String,
    pub scope: ScopeId,
    /// Every declaration site. A redeclaration appends here instead of
    /// creating a second symbol.
    pub declarations: Vec<Span>,
    pub usages: Vec<Usage>,
    pub flags: VariableFlags,
    /// The outer symbol a `global`/`use` binding refers to.
    pub imported_from: Option<SymbolId>,
}

impl Symbol {
    pub fn is_written(&self) -> bool {
        self.usages.iter().any(|u| u.kind.is_write())
    }
}

/// Outcome of a name lookup. Checks must treat `Unresolved` as "not enough
/// information", never as "does not exist".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Resolution {
    Resolved(SymbolId),
    /// A concrete name whose declaration is not visible (other file, builtin,
    /// missing base class).
    Unresolved,
    /// Dynamic names such as `$$x` or `$obj->$prop`.
    NotApplicable,
}

impl Resolution {
    pub fn symbol(self) -> Option<SymbolId> {
        match self {
            Resolution::Resolved(id) => Some(id),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClassInfo {
    pub symbol: SymbolId,
    pub scope: ScopeId,
    pub parent: Option<Resolution>,
    pub interfaces: Vec<Resolution>,
    pub traits: Vec<Resolution>,
}

/// A class followed by its resolved ancestors, nearest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassChain {
    pub classes: Vec<SymbolId>,
    /// Some ancestor or used trait could not be resolved, so a missing
    /// member is not proof of absence.
    pub incomplete: bool,
}

#[derive(Debug, Clone)]
pub struct SymbolTable {
    scopes: Vec<Scope>,
    symbols: Vec<Symbol>,
    references: HashMap<Span, Resolution>,
    scope_by_owner: HashMap<Span, ScopeId>,
    declared_at: HashMap<Span, SymbolId>,
    classes: HashMap<SymbolId, ClassInfo>,
}

impl SymbolTable {
    pub(crate) fn new(program_span: Span) -> Self {
        let global = Scope {
            id: ScopeId(0),
            kind: ScopeKind::Global,
            parent: None,
            owner: None,
            name: None,
            symbols: HashMap::new(),
            has_dynamic_variables: false,
        };
        let mut scope_by_owner = HashMap::new();
        scope_by_owner.insert(program_span, ScopeId(0));
        Self {
            scopes: vec![global],
            symbols: Vec::new(),
            references: HashMap::new(),
            scope_by_owner,
            declared_at: HashMap::new(),
            classes: HashMap::new(),
        }
    }

    pub fn global_scope(&self) -> ScopeId {
        ScopeId(0)
    }

    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.0]
    }

    pub fn symbol(&self, id: SymbolId) -> &Symbol {
        &self.symbols[id.0]
    }

    pub fn scopes(&self) -> &[Scope] {
        &self.scopes
    }

    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    /// Resolution recorded for the identifier or variable at `span`.
    /// Spans the resolver never saw are `NotApplicable`.
    pub fn symbol_at(&self, span: Span) -> Resolution {
        self.references
            .get(&span)
            .copied()
            .unwrap_or(Resolution::NotApplicable)
    }

    pub fn usages(&self, id: SymbolId) -> &[Usage] {
        &self.symbols[id.0].usages
    }

    /// Scope declared by the node at `owner` (function, method, closure,
    /// class or catch clause).
    pub fn scope_owned_by(&self, owner: Span) -> Option<ScopeId> {
        self.scope_by_owner.get(&owner).copied()
    }

    /// Symbol introduced by the declaration node at `span`.
    pub fn declared_at(&self, span: Span) -> Option<SymbolId> {
        self.declared_at.get(&span).copied()
    }

    /// Innermost scope whose owning declaration encloses `span`.
    pub fn scope_of(&self, span: Span) -> ScopeId {
        self.scopes
            .iter()
            .filter_map(|scope| {
                let owner = scope.owner?;
                owner.encloses(span).then_some((owner.len(), scope.id))
            })
            .min()
            .map_or(ScopeId(0), |(_, id)| id)
    }

    /// Nearest scope, starting at `scope`, that owns variables.
    pub fn variable_scope(&self, mut scope: ScopeId) -> ScopeId {
        loop {
            let s = &self.scopes[scope.0];
            if s.kind.is_function_like() {
                return scope;
            }
            match s.parent {
                Some(parent) => scope = parent,
                None => return scope,
            }
        }
    }

    pub fn lookup(&self, scope: ScopeId, space: NameSpace, name: &str) -> Resolution {
        match self.scopes[scope.0].symbols.get(&SymbolKey::new(space, name)) {
            Some(&id) => Resolution::Resolved(id),
            None => Resolution::Unresolved,
        }
    }

    /// Look up `$name` following PHP rules: the variable scope of `scope`
    /// only, except for superglobals.
    pub fn lookup_variable(&self, scope: ScopeId, name: &str) -> Resolution {
        let name = name.trim_start_matches('$');
        let scope = self.variable_scope(scope);
        match self.lookup(scope, NameSpace::Variable, name) {
            Resolution::Unresolved if crate::resolver::is_superglobal(name) => {
                self.lookup(self.global_scope(), NameSpace::Variable, name)
            }
            other => other,
        }
    }

    pub fn symbols_in(&self, scope: ScopeId) -> impl Iterator<Item = &Symbol> + '_ {
        let mut ids: Vec<SymbolId> = self.scopes[scope.0].symbols.values().copied().collect();
        ids.sort();
        ids.into_iter().map(move |id| &self.symbols[id.0])
    }

    pub fn class_info(&self, class: SymbolId) -> Option<&ClassInfo> {
        self.classes.get(&class)
    }

    /// Walk `extends` links from `class`. Cycles stop the walk.
    pub fn class_chain(&self, class: SymbolId) -> ClassChain {
        let mut chain = ClassChain {
            classes: vec![class],
            incomplete: false,
        };
        let mut current = class;
        while let Some(info) = self.classes.get(&current) {
            if info.traits.iter().any(|t| t.symbol().is_none()) {
                chain.incomplete = true;
            }
            match info.parent {
                None => break,
                Some(Resolution::Resolved(parent)) if !chain.classes.contains(&parent) => {
                    chain.classes.push(parent);
                    current = parent;
                }
                Some(Resolution::Resolved(_)) => break,
                Some(_) => {
                    chain.incomplete = true;
                    break;
                }
            }
        }
        chain
    }

    /// Find a method, property or constant on `class`, its used traits, or
    /// an ancestor.
    pub fn lookup_member(&self, class: SymbolId, space: NameSpace, name: &str) -> Resolution {
        let chain = self.class_chain(class);
        for id in &chain.classes {
            let Some(info) = self.classes.get(id) else {
                continue;
            };
            if let found @ Resolution::Resolved(_) = self.lookup(info.scope, space, name) {
                return found;
            }
            for used in info.traits.iter().filter_map(|t| t.symbol()) {
                if let Some(trait_info) = self.classes.get(&used) {
                    if let found @ Resolution::Resolved(_) = self.lookup(trait_info.scope, space, name) {
                        return found;
                    }
                }
            }
        }
        Resolution::Unresolved
    }

    pub(crate) fn add_scope(
        &mut self,
        kind: ScopeKind,
        parent: Option<ScopeId>,
        owner: Span,
        name: Option<String>,
    ) -> ScopeId {
        let id = ScopeId(self.scopes.len());
        self.scopes.push(Scope {
            id,
            kind,
            parent,
            owner: Some(owner),
            name,
            symbols: HashMap::new(),
            has_dynamic_variables: false,
        });
        self.scope_by_owner.insert(owner, id);
        id
    }

    pub(crate) fn mark_dynamic(&mut self, scope: ScopeId) {
        self.scopes[scope.0].has_dynamic_variables = true;
    }

    /// Declare `name` in `scope`, or attach another declaration site to the
    /// existing symbol.
    pub(crate) fn declare(
        &mut self,
        scope: ScopeId,
        space: NameSpace,
        kind: SymbolKind,
        name: &str,
        declaration: Option<Span>,
    ) -> SymbolId {
        let key = SymbolKey::new(space, name);
        if let Some(&id) = self.scopes[scope.0].symbols.get(&key) {
            if let Some(span) = declaration {
                self.symbols[id.0].declarations.push(span);
                self.declared_at.entry(span).or_insert(id);
            }
            return id;
        }
        let id = self.push_symbol(scope, kind, name, declaration);
        self.scopes[scope.0].symbols.insert(key, id);
        id
    }

    /// A symbol that lives in `scope` without being reachable by name,
    /// such as an anonymous class.
    pub(crate) fn declare_unnamed(&mut self, scope: ScopeId, kind: SymbolKind, name: &str, declaration: Span) -> SymbolId {
        self.push_symbol(scope, kind, name, Some(declaration))
    }

    fn push_symbol(&mut self, scope: ScopeId, kind: SymbolKind, name: &str, declaration: Option<Span>) -> SymbolId {
        let id = SymbolId(self.symbols.len());
        if let Some(span) = declaration {
            self.declared_at.entry(span).or_insert(id);
        }
        self.symbols.push(Symbol {
            id,
            kind,
            name: name.to_string(),
            scope,
            declarations: declaration.into_iter().collect(),
            usages: Vec::new(),
            flags: VariableFlags::default(),
            imported_from: None,
        });
        id
    }

    pub(crate) fn symbol_mut(&mut self, id: SymbolId) -> &mut Symbol {
        &mut self.symbols[id.0]
    }

    pub(crate) fn add_usage(&mut self, id: SymbolId, usage: Usage) {
        self.symbols[id.0].usages.push(usage);
    }

    pub(crate) fn record(&mut self, span: Span, resolution: Resolution) {
        self.references.insert(span, resolution);
    }

    pub(crate) fn set_class_info(&mut self, info: ClassInfo) {
        self.classes.insert(info.symbol, info);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_follow_php_case_rules() {
        assert_eq!(NameSpace::Function.key("\\App\\DoThing"), "app\\dothing");
        assert_eq!(NameSpace::Class.key("Foo"), "foo");
        assert_eq!(NameSpace::Constant.key("App\\Sub\\MAX_Size"), "app\\sub\\MAX_Size");
        assert_eq!(NameSpace::Constant.key("MAX"), "MAX");
        assert_eq!(NameSpace::Variable.key("Foo"), "Foo");
    }

    #[test]
    fn test_redeclaration_appends_declaration() {
        let mut table = SymbolTable::new(Span::new(0, 100));
        let global = table.global_scope();
        let first = table.declare(global, NameSpace::Constant, SymbolKind::Constant, "A", Some(Span::new(1, 2)));
        let second = table.declare(global, NameSpace::Constant, SymbolKind::Constant, "A", Some(Span::new(5, 6)));
        assert_eq!(first, second);
        assert_eq!(table.symbol(first).declarations, vec![Span::new(1, 2), Span::new(5, 6)]);
    }

    #[test]
    fn test_scope_of_picks_innermost() {
        let mut table = SymbolTable::new(Span::new(0, 100));
        let outer = table.add_scope(ScopeKind::Function, Some(ScopeId(0)), Span::new(10, 90), None);
        let inner = table.add_scope(ScopeKind::Closure, Some(outer), Span::new(20, 40), None);
        assert_eq!(table.scope_of(Span::new(25, 26)), inner);
        assert_eq!(table.scope_of(Span::new(50, 51)), outer);
        assert_eq!(table.scope_of(Span::new(95, 96)), ScopeId(0));
    }

    #[test]
    fn test_variable_lookup_stops_at_function_scope() {
        let mut table = SymbolTable::new(Span::new(0, 100));
        let global = table.global_scope();
        let outer = table.declare(global, NameSpace::Variable, SymbolKind::Variable, "x", Some(Span::new(1, 3)));
        let get = table.declare(global, NameSpace::Variable, SymbolKind::Variable, "_GET", None);
        let function = table.add_scope(ScopeKind::Function, Some(global), Span::new(10, 90), None);

        assert_eq!(table.lookup_variable(global, "$x"), Resolution::Resolved(outer));
        assert_eq!(table.lookup_variable(function, "$x"), Resolution::Unresolved);
        assert_eq!(table.lookup_variable(function, "$_GET"), Resolution::Resolved(get));

        let local = table.declare(function, NameSpace::Variable, SymbolKind::Variable, "x", Some(Span::new(20, 22)));
        assert_eq!(table.lookup_variable(function, "x"), Resolution::Resolved(local));

        let names: Vec<_> = table.symbols_in(global).map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["x", "_GET"]);
        assert_eq!(table.symbols_in(function).count(), 1);
    }

    #[test]
    fn test_unknown_span_is_not_applicable() {
        let table = SymbolTable::new(Span::new(0, 10));
        assert_eq!(table.symbol_at(Span::new(3, 4)), Resolution::NotApplicable);
    }
}
