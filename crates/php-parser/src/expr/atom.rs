use php_ast::{
    CallableCreateExpr, CallableCreateKind, CastKind, Expr, ExprKind, FunctionCallExpr, IncludeKind, MagicConstKind,
    Span, UnaryExpr, YieldExpr,
};
use php_lexer::{PhpVersion, TokenKind};

use crate::diagnostics::ParseError;
use crate::parser::Parser;
use crate::precedence::{self, ASSIGNMENT_BP, PREFIX_BP};

/// `(type)` casts; the names are case-insensitive.
const CASTS: &[(&str, CastKind)] = &[
    ("int", CastKind::Int),
    ("integer", CastKind::Int),
    ("float", CastKind::Float),
    ("double", CastKind::Float),
    ("real", CastKind::Float),
    ("string", CastKind::String),
    ("binary", CastKind::String),
    ("bool", CastKind::Bool),
    ("boolean", CastKind::Bool),
    ("array", CastKind::Array),
    ("object", CastKind::Object),
    ("unset", CastKind::Unset),
    ("void", CastKind::Void),
];

const MAGIC_CONSTANTS: &[(TokenKind, MagicConstKind)] = &[
    (TokenKind::MagicClass, MagicConstKind::Class),
    (TokenKind::MagicDir, MagicConstKind::Dir),
    (TokenKind::MagicFile, MagicConstKind::File),
    (TokenKind::MagicFunction, MagicConstKind::Function),
    (TokenKind::MagicLine, MagicConstKind::Line),
    (TokenKind::MagicMethod, MagicConstKind::Method),
    (TokenKind::MagicNamespace, MagicConstKind::Namespace),
    (TokenKind::MagicTrait, MagicConstKind::Trait),
    (TokenKind::MagicProperty, MagicConstKind::Property),
];

impl<'src> Parser<'src> {
    pub(super) fn parse_atom(&mut self) -> Expr {
        let kind = self.kind();

        // `list\of\names`: since PHP 8 a keyword glued to `\` is a name.
        if kind.is_semi_reserved() && self.peek() == TokenKind::Backslash && self.peek_adjacent() {
            return self.name_expr();
        }
        if let Some(op) = precedence::prefix(kind) {
            return self.prefix(self.start(), |operand| {
                ExprKind::Unary(UnaryExpr {
                    op,
                    operand: Box::new(operand),
                })
            });
        }
        if let Some(&(_, magic)) = MAGIC_CONSTANTS.iter().find(|(k, _)| *k == kind) {
            let token = self.bump();
            return Expr::new(ExprKind::MagicConst(magic), token.span);
        }
        if kind.is_numeric_literal() {
            return self.number();
        }

        let start = self.start();
        match kind {
            TokenKind::Variable => {
                let token = self.bump();
                let name = token.text(self.source())[1..].to_string();
                Expr::new(ExprKind::Variable(name), token.span)
            }
            TokenKind::Dollar => self.variable_variable(),
            TokenKind::SingleQuotedString
            | TokenKind::DoubleQuotedString
            | TokenKind::BacktickString
            | TokenKind::Heredoc
            | TokenKind::Nowdoc => self.string_literal(),
            TokenKind::True | TokenKind::False => {
                let token = self.bump();
                Expr::new(ExprKind::Bool(kind == TokenKind::True), token.span)
            }
            TokenKind::Null => Expr::new(ExprKind::Null, self.bump().span),

            TokenKind::Identifier | TokenKind::Backslash => self.name_expr(),
            TokenKind::Namespace if self.peek() == TokenKind::Backslash => self.name_expr(),
            TokenKind::Self_ | TokenKind::Parent_ | TokenKind::Readonly | TokenKind::Enum_ | TokenKind::From => {
                let token = self.bump();
                let text = token.text(self.source());
                let name = match kind {
                    TokenKind::Self_ | TokenKind::Parent_ => text.to_ascii_lowercase(),
                    _ => text.to_string(),
                };
                Expr::new(ExprKind::Identifier(name), token.span)
            }

            TokenKind::LeftParen => self.paren_or_cast(),
            TokenKind::LeftBracket => self.short_array(),
            TokenKind::Array | TokenKind::List => self.long_array(),
            TokenKind::At => self.prefix(start, |operand| ExprKind::ErrorSuppress(Box::new(operand))),
            TokenKind::Clone => self.prefix(start, |operand| ExprKind::Clone(Box::new(operand))),
            TokenKind::New => self.new_expr(),

            TokenKind::Print => {
                self.bump();
                let operand = self.parse_expr_bp(ASSIGNMENT_BP);
                Expr::new(ExprKind::Print(Box::new(operand)), self.span_from(start))
            }
            TokenKind::Throw => {
                let token = self.bump();
                self.require_version("throw expression", PhpVersion::Php80, token.span);
                let operand = self.parse_expr_bp(ASSIGNMENT_BP);
                Expr::new(ExprKind::ThrowExpr(Box::new(operand)), self.span_from(start))
            }
            TokenKind::Include | TokenKind::IncludeOnce | TokenKind::Require | TokenKind::RequireOnce => {
                let include = match self.bump().kind {
                    TokenKind::Include => IncludeKind::Include,
                    TokenKind::IncludeOnce => IncludeKind::IncludeOnce,
                    TokenKind::Require => IncludeKind::Require,
                    _ => IncludeKind::RequireOnce,
                };
                let path = self.parse_expr_bp(ASSIGNMENT_BP);
                Expr::new(ExprKind::Include(include, Box::new(path)), self.span_from(start))
            }
            TokenKind::Isset => {
                self.bump();
                let open = self.open(TokenKind::LeftParen);
                let vars = self.comma_list(TokenKind::RightParen, Self::parse_expr);
                self.close(TokenKind::RightParen, open);
                Expr::new(ExprKind::Isset(vars), self.span_from(start))
            }
            TokenKind::Empty | TokenKind::Eval => {
                self.bump();
                let operand = Box::new(self.paren_expr());
                let kind = if kind == TokenKind::Empty {
                    ExprKind::Empty(operand)
                } else {
                    ExprKind::Eval(operand)
                };
                Expr::new(kind, self.span_from(start))
            }
            TokenKind::Exit | TokenKind::Die => self.exit_expr(),
            TokenKind::Yield_ => self.yield_expr(),

            TokenKind::Function | TokenKind::Fn_ => self.closure(start, false, Vec::new()),
            TokenKind::Static if matches!(self.peek(), TokenKind::Function | TokenKind::Fn_) => {
                self.bump();
                self.closure(start, true, Vec::new())
            }
            TokenKind::Static => Expr::new(ExprKind::Identifier("static".to_string()), self.bump().span),
            TokenKind::HashBracket => {
                let attributes = self.parse_attributes();
                let is_static = self.eat(TokenKind::Static).is_some();
                if !self.at_any(&[TokenKind::Function, TokenKind::Fn_]) {
                    self.expected("closure after attributes");
                    return Expr::error(self.span_from(start));
                }
                self.closure(start, is_static, attributes)
            }
            TokenKind::Match_ => self.match_expr(),

            TokenKind::Error | TokenKind::BadCharacter | TokenKind::InvalidNumericLiteral => {
                // Already reported by the lexer.
                Expr::error(self.bump().span)
            }
            _ => {
                let span = self.span();
                self.error(ParseError::ExpectedExpression { span });
                Expr::error(Span::new(span.start, span.start))
            }
        }
    }

    /// Consumes a prefix operator and its operand, which binds at the shared
    /// prefix power.
    fn prefix(&mut self, start: u32, build: impl FnOnce(Expr) -> ExprKind) -> Expr {
        self.bump();
        let operand = self.parse_expr_bp(PREFIX_BP);
        Expr::new(build(operand), self.span_from(start))
    }

    /// `$$name`, `${expr}`, `$$$name`, ...
    pub(super) fn variable_variable(&mut self) -> Expr {
        let start = self.start();
        self.bump();
        let inner = match self.kind() {
            TokenKind::LeftBrace => {
                let open = self.bump();
                let expr = self.parse_expr();
                self.close(TokenKind::RightBrace, open.span);
                expr
            }
            TokenKind::Variable => {
                let token = self.bump();
                let name = token.text(self.source())[1..].to_string();
                Expr::new(ExprKind::Variable(name), token.span)
            }
            TokenKind::Dollar => self.nested(Expr::error, Self::variable_variable),
            _ => {
                self.expected("variable name after '$'");
                Expr::error(self.span())
            }
        };
        Expr::new(ExprKind::VariableVariable(Box::new(inner)), self.span_from(start))
    }

    /// `( expr )` of `if`, `while`, `switch`, `empty`, ...
    pub(crate) fn paren_expr(&mut self) -> Expr {
        let open = self.open(TokenKind::LeftParen);
        let expr = self.parse_expr();
        self.close(TokenKind::RightParen, open);
        expr
    }

    fn paren_or_cast(&mut self) -> Expr {
        let start = self.start();
        if self.peek2() == TokenKind::RightParen
            && matches!(self.peek(), TokenKind::Identifier | TokenKind::Array | TokenKind::Unset)
        {
            let name = self.peek_text();
            if let Some(&(_, cast)) = CASTS.iter().find(|(n, _)| n.eq_ignore_ascii_case(name)) {
                self.bump();
                self.bump();
                return self.prefix(start, |operand| ExprKind::Cast(cast, Box::new(operand)));
            }
        }
        let inner = self.paren_expr();
        Expr::new(ExprKind::Parenthesized(Box::new(inner)), self.span_from(start))
    }

    /// `exit`, `exit(2)`, `die("msg")`. Other argument shapes are calls to
    /// the `exit()` function.
    fn exit_expr(&mut self) -> Expr {
        let token = self.bump();
        if !self.at(TokenKind::LeftParen) {
            return Expr::new(ExprKind::Exit(None), token.span);
        }
        let name = token.text(self.source()).to_string();
        let callee = Box::new(Expr::new(ExprKind::Identifier(name), token.span));
        let kind = match self.call_args() {
            None => ExprKind::CallableCreate(CallableCreateExpr {
                kind: CallableCreateKind::Function(callee),
            }),
            Some(args) if args.is_empty() => ExprKind::Exit(None),
            Some(mut args) if args.len() == 1 && args[0].name.is_none() && !args[0].unpack => {
                ExprKind::Exit(args.pop().map(|arg| Box::new(arg.value)))
            }
            Some(args) => ExprKind::FunctionCall(FunctionCallExpr { name: callee, args }),
        };
        Expr::new(kind, self.span_from(token.span.start))
    }

    fn yield_expr(&mut self) -> Expr {
        let start = self.bump().span.start;
        if self.eat(TokenKind::From).is_some() {
            let source = self.parse_expr_bp(ASSIGNMENT_BP);
            return Expr::new(ExprKind::YieldFrom(Box::new(source)), self.span_from(start));
        }

        let bare = self.at_any(&[
            TokenKind::Semicolon,
            TokenKind::RightParen,
            TokenKind::RightBracket,
            TokenKind::RightBrace,
            TokenKind::Comma,
            TokenKind::CloseTag,
            TokenKind::Eof,
        ]) || precedence::is_binary_only(self.kind());
        if bare {
            let span = self.span_from(start);
            return Expr::new(ExprKind::Yield(YieldExpr { key: None, value: None }), span);
        }

        let first = self.parse_expr_bp(ASSIGNMENT_BP);
        let (key, value) = if self.eat(TokenKind::FatArrow).is_some() {
            (Some(Box::new(first)), self.parse_expr_bp(ASSIGNMENT_BP))
        } else {
            (None, first)
        };
        let span = self.span_from(start);
        Expr::new(
            ExprKind::Yield(YieldExpr {
                key,
                value: Some(Box::new(value)),
            }),
            span,
        )
    }
}
