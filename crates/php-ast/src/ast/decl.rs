use serde::Serialize;

use super::{Attribute, Expr, Name, Stmt, TypeHint};
use crate::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Visibility {
    Public,
    Protected,
    Private,
}

/// Modifier keywords as written on a member or a promoted parameter.
/// Combinations PHP rejects are still recorded; the parser reports them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MemberModifiers {
    pub visibility: Option<Visibility>,
    /// Write visibility of `public private(set) $x`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub set_visibility: Option<Visibility>,
    pub is_static: bool,
    pub is_abstract: bool,
    pub is_final: bool,
    pub is_readonly: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct FunctionDecl {
    pub name: String,
    pub params: Vec<Param>,
    pub body: Vec<Stmt>,
    pub return_type: Option<TypeHint>,
    /// `function &f()`
    pub by_ref: bool,
    pub attributes: Vec<Attribute>,
}

/// A parameter of any function-like. `visibility` marks constructor
/// promotion; `hooks` only appear on promoted parameters.
#[derive(Debug, Clone, Serialize)]
pub struct Param {
    pub name: String,
    pub type_hint: Option<TypeHint>,
    pub default: Option<Expr>,
    pub by_ref: bool,
    pub variadic: bool,
    /// Non-empty only for promoted constructor parameters.
    pub modifiers: MemberModifiers,
    pub attributes: Vec<Attribute>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub hooks: Vec<PropertyHook>,
    pub span: Span,
}

impl Param {
    pub fn is_promoted(&self) -> bool {
        let m = &self.modifiers;
        m.visibility.is_some() || m.set_visibility.is_some() || m.is_readonly
    }
}

/// Named classes and `new class { ... }` share this node; `name` is `None`
/// for the anonymous form.
#[derive(Debug, Clone, Serialize)]
pub struct ClassDecl {
    pub name: Option<String>,
    pub modifiers: ClassModifiers,
    pub extends: Option<Name>,
    pub implements: Vec<Name>,
    pub members: Vec<ClassMember>,
    pub attributes: Vec<Attribute>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ClassModifiers {
    pub is_abstract: bool,
    pub is_final: bool,
    pub is_readonly: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct InterfaceDecl {
    pub name: String,
    pub extends: Vec<Name>,
    pub members: Vec<ClassMember>,
    pub attributes: Vec<Attribute>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TraitDecl {
    pub name: String,
    pub members: Vec<ClassMember>,
    pub attributes: Vec<Attribute>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EnumDecl {
    pub name: String,
    /// `int` or `string` for backed enums.
    pub scalar_type: Option<Name>,
    pub implements: Vec<Name>,
    pub members: Vec<ClassMember>,
    pub attributes: Vec<Attribute>,
}

/// Member of a class-like body. Enum cases only occur inside enums.
#[derive(Debug, Clone, Serialize)]
pub struct ClassMember {
    pub kind: ClassMemberKind,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize)]
pub enum ClassMemberKind {
    Property(PropertyDecl),
    Method(MethodDecl),
    ClassConst(ClassConstDecl),
    TraitUse(TraitUseDecl),
    EnumCase(EnumCase),
}

#[derive(Debug, Clone, Serialize)]
pub struct PropertyDecl {
    pub name: String,
    pub modifiers: MemberModifiers,
    pub type_hint: Option<TypeHint>,
    pub default: Option<Expr>,
    pub attributes: Vec<Attribute>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub hooks: Vec<PropertyHook>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MethodDecl {
    pub name: String,
    pub modifiers: MemberModifiers,
    pub by_ref: bool,
    pub params: Vec<Param>,
    pub return_type: Option<TypeHint>,
    /// `None` for abstract and interface methods.
    pub body: Option<Vec<Stmt>>,
    pub attributes: Vec<Attribute>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClassConstDecl {
    pub name: String,
    pub modifiers: MemberModifiers,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_hint: Option<TypeHint>,
    pub value: Expr,
    pub attributes: Vec<Attribute>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EnumCase {
    pub name: String,
    pub value: Option<Expr>,
    pub attributes: Vec<Attribute>,
}

/// `get` / `set` hook of a PHP 8.4 property.
#[derive(Debug, Clone, Serialize)]
pub struct PropertyHook {
    pub kind: PropertyHookKind,
    pub body: PropertyHookBody,
    pub is_final: bool,
    pub by_ref: bool,
    pub params: Vec<Param>,
    pub attributes: Vec<Attribute>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PropertyHookKind {
    Get,
    Set,
}

#[derive(Debug, Clone, Serialize)]
pub enum PropertyHookBody {
    Block(Vec<Stmt>),
    /// `get => expr;`
    Expression(Expr),
    /// `get;`
    Abstract,
}

#[derive(Debug, Clone, Serialize)]
pub struct TraitUseDecl {
    pub traits: Vec<Name>,
    pub adaptations: Vec<TraitAdaptation>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TraitAdaptation {
    pub kind: TraitAdaptationKind,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize)]
pub enum TraitAdaptationKind {
    /// `A::foo insteadof B, C;`
    Precedence {
        trait_name: Name,
        method: String,
        insteadof: Vec<Name>,
    },
    /// `foo as bar;`, `A::foo as protected bar;`, `foo as protected;`
    Alias {
        trait_name: Option<Name>,
        method: String,
        new_modifier: Option<Visibility>,
        new_name: Option<String>,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct NamespaceDecl {
    pub name: Option<Name>,
    pub body: NamespaceBody,
}

#[derive(Debug, Clone, Serialize)]
pub enum NamespaceBody {
    Braced(Vec<Stmt>),
    /// `namespace Foo;`: the namespace runs to the next one or the end of
    /// the file.
    Simple,
}

#[derive(Debug, Clone, Serialize)]
pub struct UseDecl {
    pub kind: UseKind,
    pub uses: Vec<UseItem>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UseKind {
    Normal,
    Function,
    Const,
}

/// One imported name. Inside a mixed group (`use A\{function f, B}`) an
/// item may override the statement's kind.
#[derive(Debug, Clone, Serialize)]
pub struct UseItem {
    pub name: Name,
    pub alias: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<UseKind>,
    pub span: Span,
}

impl UseItem {
    /// The name the import binds in the file: the alias, or the last part.
    pub fn local_name(&self) -> &str {
        self.alias.as_deref().unwrap_or_else(|| self.name.last())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ConstItem {
    pub name: String,
    pub value: Expr,
    pub span: Span,
}
