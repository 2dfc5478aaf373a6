//! Owned syntax tree. Every node carries the [`Span`] of the source text it
//! was parsed from; side tables elsewhere in the workspace key on it.

mod decl;
mod expr;
mod stmt;

use serde::Serialize;

use crate::Span;

pub use decl::*;
pub use expr::*;
pub use stmt::*;

#[derive(Debug, Clone, Serialize)]
pub struct Program {
    pub stmts: Vec<Stmt>,
    pub span: Span,
}

/// A possibly qualified name as written: `Foo`, `Foo\Bar`, `\Foo`,
/// `namespace\Foo`. Resolution against imports happens later.
#[derive(Debug, Clone, Serialize)]
pub struct Name {
    pub parts: Vec<String>,
    pub kind: NameKind,
    pub span: Span,
}

impl Name {
    /// The parts joined with `\`, without any leading separator.
    pub fn joined(&self) -> String {
        self.parts.join("\\")
    }

    pub fn last(&self) -> &str {
        self.parts.last().map_or("", String::as_str)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NameKind {
    Unqualified,
    Qualified,
    FullyQualified,
    /// `namespace\Foo`
    Relative,
}

#[derive(Debug, Clone, Serialize)]
pub struct TypeHint {
    pub kind: TypeHintKind,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize)]
pub enum TypeHintKind {
    Named(Name),
    Nullable(Box<TypeHint>),
    Union(Vec<TypeHint>),
    Intersection(Vec<TypeHint>),
}

/// Call argument. `name` is set for `f(label: $x)`, `unpack` for `f(...$xs)`.
#[derive(Debug, Clone, Serialize)]
pub struct Arg {
    pub name: Option<String>,
    pub value: Expr,
    pub unpack: bool,
    pub span: Span,
}

/// One attribute inside a `#[...]` group.
#[derive(Debug, Clone, Serialize)]
pub struct Attribute {
    pub name: Name,
    pub args: Vec<Arg>,
    pub span: Span,
}
