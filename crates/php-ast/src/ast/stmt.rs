use serde::Serialize;

use super::{
    ClassDecl, ConstItem, EnumDecl, Expr, FunctionDecl, InterfaceDecl, Name, NamespaceDecl, TraitDecl, UseDecl,
};
use crate::Span;

#[derive(Debug, Clone, Serialize)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

impl Stmt {
    pub fn new(kind: StmtKind, span: Span) -> Self {
        Self { kind, span }
    }

    pub fn error(span: Span) -> Self {
        Self::new(StmtKind::Error, span)
    }
}

#[derive(Debug, Clone, Serialize)]
#[allow(clippy::large_enum_variant)]
pub enum StmtKind {
    Expression(Expr),
    Echo(Vec<Expr>),
    Return(Option<Expr>),
    /// `{ ... }`, and the body of an alternate-syntax construct
    /// (`if (...): ... endif;`).
    Block(Vec<Stmt>),
    If(IfStmt),
    While(WhileStmt),
    DoWhile(DoWhileStmt),
    For(ForStmt),
    Foreach(ForeachStmt),
    Switch(SwitchStmt),
    /// `break` with its optional level.
    Break(Option<Expr>),
    Continue(Option<Expr>),
    Goto(String),
    Label(String),
    Declare(DeclareStmt),
    Unset(Vec<Expr>),
    Throw(Expr),
    Try(TryStmt),
    Global(Vec<Expr>),
    StaticVar(Vec<StaticVar>),

    Function(FunctionDecl),
    Class(ClassDecl),
    Interface(InterfaceDecl),
    Trait(TraitDecl),
    Enum(EnumDecl),
    Namespace(NamespaceDecl),
    Use(UseDecl),
    Const(Vec<ConstItem>),

    /// Everything after `__halt_compiler();`, verbatim.
    HaltCompiler(String),
    /// A lone `;`
    Nop,
    InlineHtml(String),
    /// Placeholder for a statement that failed to parse.
    Error,
}

#[derive(Debug, Clone, Serialize)]
pub struct IfStmt {
    pub condition: Expr,
    pub then_branch: Box<Stmt>,
    pub elseifs: Vec<ElseIf>,
    pub else_branch: Option<Box<Stmt>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ElseIf {
    pub condition: Expr,
    pub body: Stmt,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize)]
pub struct WhileStmt {
    pub condition: Expr,
    pub body: Box<Stmt>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DoWhileStmt {
    pub body: Box<Stmt>,
    pub condition: Expr,
}

/// Each clause is a comma list; an empty `condition` loops forever.
#[derive(Debug, Clone, Serialize)]
pub struct ForStmt {
    pub init: Vec<Expr>,
    pub condition: Vec<Expr>,
    pub update: Vec<Expr>,
    pub body: Box<Stmt>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ForeachStmt {
    pub expr: Expr,
    pub key: Option<Expr>,
    pub value: Expr,
    /// `as &$v`
    pub by_ref: bool,
    pub body: Box<Stmt>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SwitchStmt {
    pub subject: Expr,
    pub cases: Vec<SwitchCase>,
}

/// `value` is `None` for `default:`.
#[derive(Debug, Clone, Serialize)]
pub struct SwitchCase {
    pub value: Option<Expr>,
    pub body: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeclareStmt {
    pub directives: Vec<DeclareDirective>,
    /// `declare(ticks=1) { ... }`; `None` for the statement form.
    pub body: Option<Box<Stmt>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeclareDirective {
    pub name: String,
    pub value: Expr,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize)]
pub struct TryStmt {
    pub body: Vec<Stmt>,
    pub catches: Vec<CatchClause>,
    pub finally: Option<Vec<Stmt>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CatchClause {
    pub types: Vec<Name>,
    /// Without the `$`. PHP 8 allows omitting the variable.
    pub var: Option<String>,
    pub var_span: Option<Span>,
    pub body: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize)]
pub struct StaticVar {
    pub name: String,
    pub default: Option<Expr>,
    pub span: Span,
}
