use php_ast::{
    Arg, ArrayAccessExpr, CallableCreateExpr, CallableCreateKind, Expr, ExprKind, FunctionCallExpr, MethodCallExpr,
    PropertyAccessExpr, StaticAccessExpr, StaticMethodCallExpr,
};
use php_lexer::{PhpVersion, TokenKind};

use crate::parser::Parser;

impl<'src> Parser<'src> {
    /// Tokens that extend the expression before them: calls, `[...]`,
    /// `->`, `?->` and `::`. `$s{0}` indexing was dropped in PHP 8.
    pub(super) fn at_access(&self) -> bool {
        match self.kind() {
            TokenKind::LeftParen
            | TokenKind::LeftBracket
            | TokenKind::Arrow
            | TokenKind::NullsafeArrow
            | TokenKind::DoubleColon => true,
            TokenKind::LeftBrace => self.version() < PhpVersion::Php80,
            _ => false,
        }
    }

    pub(super) fn access(&mut self, lhs: Expr) -> Expr {
        let start = lhs.span.start;
        let kind = match self.kind() {
            TokenKind::LeftParen => match self.call_args() {
                Some(args) => ExprKind::FunctionCall(FunctionCallExpr {
                    name: Box::new(lhs),
                    args,
                }),
                None => callable(CallableCreateKind::Function(Box::new(lhs))),
            },
            TokenKind::LeftBracket | TokenKind::LeftBrace => {
                let close = if self.at(TokenKind::LeftBracket) {
                    TokenKind::RightBracket
                } else {
                    TokenKind::RightBrace
                };
                let open = self.bump();
                let index = if self.at(close) {
                    None
                } else {
                    Some(Box::new(self.parse_expr()))
                };
                self.close(close, open.span);
                ExprKind::ArrayAccess(ArrayAccessExpr {
                    array: Box::new(lhs),
                    index,
                })
            }
            TokenKind::Arrow | TokenKind::NullsafeArrow => {
                let nullsafe = self.bump().kind == TokenKind::NullsafeArrow;
                let member = Box::new(self.member_name());
                let object = Box::new(lhs);
                if !self.at(TokenKind::LeftParen) {
                    ExprKind::PropertyAccess(PropertyAccessExpr {
                        object,
                        property: member,
                        nullsafe,
                    })
                } else {
                    match self.call_args() {
                        Some(args) => ExprKind::MethodCall(MethodCallExpr {
                            object,
                            method: member,
                            args,
                            nullsafe,
                        }),
                        None => callable(CallableCreateKind::Method {
                            object,
                            method: member,
                            nullsafe,
                        }),
                    }
                }
            }
            _ => {
                self.bump();
                self.static_member(lhs)
            }
        };
        Expr::new(kind, self.span_from(start))
    }

    /// The name after `->`: a label, `$var` or `{expr}`.
    pub(super) fn member_name(&mut self) -> Expr {
        let start = self.start();
        match self.kind() {
            TokenKind::Variable => {
                let token = self.bump();
                let name = token.text(self.source())[1..].to_string();
                Expr::new(ExprKind::Variable(name), token.span)
            }
            TokenKind::LeftBrace => {
                let open = self.bump();
                let expr = self.parse_expr();
                self.close(TokenKind::RightBrace, open.span);
                expr
            }
            _ => match self.ident() {
                Some((name, span)) => Expr::new(ExprKind::Identifier(name), span),
                None => {
                    self.expected("property or method name");
                    Expr::error(self.span_from(start))
                }
            },
        }
    }

    /// What follows `Class::`.
    fn static_member(&mut self, class: Expr) -> ExprKind {
        let class = Box::new(class);
        match self.kind() {
            TokenKind::Variable => {
                let token = self.bump();
                let member = token.text(self.source())[1..].to_string();
                ExprKind::StaticPropertyAccess(StaticAccessExpr { class, member })
            }
            TokenKind::Dollar => ExprKind::StaticPropertyAccessDynamic {
                class,
                member: Box::new(self.variable_variable()),
            },
            TokenKind::LeftBrace => {
                let open = self.bump();
                let member = Box::new(self.parse_expr());
                self.close(TokenKind::RightBrace, open.span);
                ExprKind::ClassConstAccessDynamic { class, member }
            }
            _ => {
                let Some((name, _)) = self.ident() else {
                    self.expected("member name after '::'");
                    return ExprKind::Error;
                };
                if !self.at(TokenKind::LeftParen) {
                    let member = if name.eq_ignore_ascii_case("class") {
                        "class".to_string()
                    } else {
                        name
                    };
                    return ExprKind::ClassConstAccess(StaticAccessExpr { class, member });
                }
                match self.call_args() {
                    Some(args) => ExprKind::StaticMethodCall(StaticMethodCallExpr {
                        class,
                        method: name,
                        args,
                    }),
                    None => callable(CallableCreateKind::StaticMethod { class, method: name }),
                }
            }
        }
    }

    /// `(args)`, or `None` for the first-class callable form `(...)`.
    pub(crate) fn call_args(&mut self) -> Option<Vec<Arg>> {
        let open = self.open(TokenKind::LeftParen);
        if self.at(TokenKind::Ellipsis) && self.peek() == TokenKind::RightParen {
            self.bump();
            self.close(TokenKind::RightParen, open);
            return None;
        }
        let args = self.comma_list(TokenKind::RightParen, Self::arg);
        self.close(TokenKind::RightParen, open);
        Some(args)
    }

    fn arg(&mut self) -> Arg {
        let start = self.start();
        let labelled = self.at(TokenKind::Identifier) || self.kind().is_semi_reserved();
        let name = if labelled && self.peek() == TokenKind::Colon {
            let name = self.ident().map(|(name, _)| name);
            self.bump();
            name
        } else {
            None
        };
        let unpack = self.eat(TokenKind::Ellipsis).is_some();
        if let Some(amp) = self.eat(TokenKind::Ampersand) {
            self.forbidden("call-time pass-by-reference has been removed", amp.span);
        }
        let value = self.parse_expr();
        Arg {
            name,
            value,
            unpack,
            span: self.span_from(start),
        }
    }
}

fn callable(kind: CallableCreateKind) -> ExprKind {
    ExprKind::CallableCreate(CallableCreateExpr { kind })
}
