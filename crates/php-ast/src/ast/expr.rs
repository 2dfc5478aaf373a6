use serde::Serialize;

use super::{Arg, Attribute, ClassDecl, Param, Stmt, TypeHint};
use crate::Span;

#[derive(Debug, Clone, Serialize)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Placeholder for an expression that failed to parse.
    pub fn error(span: Span) -> Self {
        Self::new(ExprKind::Error, span)
    }

    pub fn is_error(&self) -> bool {
        matches!(self.kind, ExprKind::Error)
    }
}

#[derive(Debug, Clone, Serialize)]
pub enum ExprKind {
    // --- literals ---
    Int(i64),
    Float(f64),
    Bool(bool),
    Null,
    /// Single-quoted or escape-processed double-quoted string.
    String(String),
    /// Double-quoted string with `$var` / `{$expr}` parts.
    InterpolatedString(Vec<StringPart>),
    Heredoc {
        label: String,
        parts: Vec<StringPart>,
    },
    Nowdoc {
        label: String,
        value: String,
    },
    /// `` `ls $dir` ``
    ShellExec(Vec<StringPart>),
    MagicConst(MagicConstKind),
    /// `[...]` or `array(...)`; also the target of a destructuring
    /// assignment (`[$a, $b] = ...`, `list($a, $b) = ...`).
    Array(Vec<ArrayElement>),

    // --- names ---
    /// `$name`, without the `$`.
    Variable(String),
    /// `$$name`, `${expr}`
    VariableVariable(Box<Expr>),
    /// A bare name: constant, function or class reference as written.
    Identifier(String),

    // --- operators ---
    Assign(AssignExpr),
    Binary(BinaryExpr),
    Unary(UnaryExpr),
    /// `cond ? a : b` and `cond ?: b`
    Ternary(TernaryExpr),
    NullCoalesce(NullCoalesceExpr),
    Cast(CastKind, Box<Expr>),
    /// `@expr`
    ErrorSuppress(Box<Expr>),
    Parenthesized(Box<Expr>),

    // --- calls and access ---
    FunctionCall(FunctionCallExpr),
    ArrayAccess(ArrayAccessExpr),
    /// `$o->p` and `$o?->p`
    PropertyAccess(PropertyAccessExpr),
    /// `$o->m()` and `$o?->m()`
    MethodCall(MethodCallExpr),
    /// `A::$p`
    StaticPropertyAccess(StaticAccessExpr),
    /// `A::$$p`, `A::${expr}`
    StaticPropertyAccessDynamic {
        class: Box<Expr>,
        member: Box<Expr>,
    },
    StaticMethodCall(StaticMethodCallExpr),
    /// `A::B`, including `A::class`
    ClassConstAccess(StaticAccessExpr),
    /// `A::{expr}`
    ClassConstAccessDynamic {
        class: Box<Expr>,
        member: Box<Expr>,
    },
    /// `f(...)`, `$o->m(...)`, `A::m(...)`
    CallableCreate(CallableCreateExpr),
    New(NewExpr),
    AnonymousClass(ClassDecl),
    Clone(Box<Expr>),

    // --- language constructs ---
    Print(Box<Expr>),
    Isset(Vec<Expr>),
    Empty(Box<Expr>),
    Include(IncludeKind, Box<Expr>),
    Eval(Box<Expr>),
    /// `exit`, `exit(1)`, `die('msg')`
    Exit(Option<Box<Expr>>),
    /// `throw` in expression position.
    ThrowExpr(Box<Expr>),
    Yield(YieldExpr),
    /// `yield from expr`
    YieldFrom(Box<Expr>),

    // --- function-likes ---
    Closure(ClosureExpr),
    ArrowFunction(ArrowFunctionExpr),
    Match(MatchExpr),

    /// Placeholder for an expression that failed to parse.
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CastKind {
    Int,
    Float,
    String,
    Bool,
    Array,
    Object,
    Unset,
    Void,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum IncludeKind {
    Include,
    IncludeOnce,
    Require,
    RequireOnce,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MagicConstKind {
    Class,
    Dir,
    File,
    Function,
    Line,
    Method,
    Namespace,
    Trait,
    Property,
}

#[derive(Debug, Clone, Serialize)]
pub struct AssignExpr {
    pub target: Box<Expr>,
    pub op: AssignOp,
    pub value: Box<Expr>,
    /// `$a = &$b`
    pub by_ref: bool,
}

/// `=` and the compound forms `+=`, `.=`, `??=`, ...
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AssignOp {
    Assign,
    Plus,
    Minus,
    Mul,
    Div,
    Mod,
    Pow,
    Concat,
    BitwiseAnd,
    BitwiseOr,
    BitwiseXor,
    ShiftLeft,
    ShiftRight,
    Coalesce,
}

#[derive(Debug, Clone, Serialize)]
pub struct BinaryExpr {
    pub left: Box<Expr>,
    pub op: BinaryOp,
    pub right: Box<Expr>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    Concat,
    Equal,
    NotEqual,
    Identical,
    NotIdentical,
    Less,
    Greater,
    LessOrEqual,
    GreaterOrEqual,
    Spaceship,
    BooleanAnd,
    BooleanOr,
    BitwiseAnd,
    BitwiseOr,
    BitwiseXor,
    ShiftLeft,
    ShiftRight,
    /// `and`, `or`, `xor`
    LogicalAnd,
    LogicalOr,
    LogicalXor,
    Instanceof,
    /// `|>`
    Pipe,
}

#[derive(Debug, Clone, Serialize)]
pub struct UnaryExpr {
    pub op: UnaryOp,
    pub operand: Box<Expr>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UnaryOp {
    Negate,
    Plus,
    BooleanNot,
    BitwiseNot,
    PreIncrement,
    PreDecrement,
    PostIncrement,
    PostDecrement,
}

impl UnaryOp {
    /// `++` and `--` in either position; the operand is read and written.
    pub fn mutates(self) -> bool {
        matches!(
            self,
            UnaryOp::PreIncrement | UnaryOp::PreDecrement | UnaryOp::PostIncrement | UnaryOp::PostDecrement
        )
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TernaryExpr {
    pub condition: Box<Expr>,
    /// `None` for `cond ?: else`
    pub then_expr: Option<Box<Expr>>,
    pub else_expr: Box<Expr>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NullCoalesceExpr {
    pub left: Box<Expr>,
    pub right: Box<Expr>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FunctionCallExpr {
    pub name: Box<Expr>,
    pub args: Vec<Arg>,
}

/// `key => value`, `&$value` or `...$spread`. A skipped slot in a
/// destructuring target (`[, $b]`) holds a `Null` value.
#[derive(Debug, Clone, Serialize)]
pub struct ArrayElement {
    pub key: Option<Expr>,
    pub value: Expr,
    pub by_ref: bool,
    pub unpack: bool,
    pub span: Span,
}

/// `$a[i]`, `$a{i}`, and `$a[]` (no index) on the write side.
#[derive(Debug, Clone, Serialize)]
pub struct ArrayAccessExpr {
    pub array: Box<Expr>,
    pub index: Option<Box<Expr>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewExpr {
    pub class: Box<Expr>,
    pub args: Vec<Arg>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PropertyAccessExpr {
    pub object: Box<Expr>,
    /// `Identifier` for `->name`; any expression for `->$p` and `->{...}`.
    pub property: Box<Expr>,
    pub nullsafe: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct MethodCallExpr {
    pub object: Box<Expr>,
    pub method: Box<Expr>,
    pub args: Vec<Arg>,
    pub nullsafe: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct StaticAccessExpr {
    pub class: Box<Expr>,
    pub member: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct StaticMethodCallExpr {
    pub class: Box<Expr>,
    pub method: String,
    pub args: Vec<Arg>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CallableCreateExpr {
    pub kind: CallableCreateKind,
}

#[derive(Debug, Clone, Serialize)]
pub enum CallableCreateKind {
    Function(Box<Expr>),
    Method {
        object: Box<Expr>,
        method: Box<Expr>,
        nullsafe: bool,
    },
    StaticMethod {
        class: Box<Expr>,
        method: String,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct ClosureExpr {
    pub is_static: bool,
    pub by_ref: bool,
    pub params: Vec<Param>,
    pub use_vars: Vec<ClosureUseVar>,
    pub return_type: Option<TypeHint>,
    pub body: Vec<Stmt>,
    pub attributes: Vec<Attribute>,
}

/// `use ($x, &$y)`
#[derive(Debug, Clone, Serialize)]
pub struct ClosureUseVar {
    pub name: String,
    pub by_ref: bool,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize)]
pub struct ArrowFunctionExpr {
    pub is_static: bool,
    pub by_ref: bool,
    pub params: Vec<Param>,
    pub return_type: Option<TypeHint>,
    pub body: Box<Expr>,
    pub attributes: Vec<Attribute>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchExpr {
    pub subject: Box<Expr>,
    pub arms: Vec<MatchArm>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchArm {
    /// `None` for `default`
    pub conditions: Option<Vec<Expr>>,
    pub body: Expr,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize)]
pub struct YieldExpr {
    pub key: Option<Box<Expr>>,
    pub value: Option<Box<Expr>>,
}

#[derive(Debug, Clone, Serialize)]
pub enum StringPart {
    Literal(String),
    Expr(Expr),
}
