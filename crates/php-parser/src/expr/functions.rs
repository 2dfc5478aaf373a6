use php_ast::{
    Arg, ArrowFunctionExpr, Attribute, ClassModifiers, ClosureExpr, ClosureUseVar, Expr, ExprKind, MatchArm, MatchExpr,
    NewExpr, Param, PropertyAccessExpr, StaticAccessExpr, TypeHint,
};
use php_lexer::TokenKind;

use crate::diagnostics::ParseError;
use crate::names::MISSING;
use crate::parser::Parser;

impl<'src> Parser<'src> {
    /// `function (...) use (...) { ... }` or `fn (...) => expr`, at the
    /// keyword. `start` covers any attributes and `static` already read.
    pub(crate) fn closure(&mut self, start: u32, is_static: bool, attributes: Vec<Attribute>) -> Expr {
        let arrow = self.bump().kind == TokenKind::Fn_;
        let by_ref = self.eat(TokenKind::Ampersand).is_some();
        let params = self.params();

        if arrow {
            let return_type = self.return_type();
            self.expect(TokenKind::FatArrow);
            let body = Box::new(self.parse_expr());
            let arrow = ArrowFunctionExpr {
                is_static,
                by_ref,
                params,
                return_type,
                body,
                attributes,
            };
            return Expr::new(ExprKind::ArrowFunction(arrow), self.span_from(start));
        }

        let use_vars = if self.eat(TokenKind::Use).is_some() {
            let open = self.open(TokenKind::LeftParen);
            let vars = self.comma_list(TokenKind::RightParen, Self::closure_use);
            self.close(TokenKind::RightParen, open);
            vars
        } else {
            Vec::new()
        };
        let return_type = self.return_type();
        let body = self.braced_body();
        let closure = ClosureExpr {
            is_static,
            by_ref,
            params,
            use_vars,
            return_type,
            body,
            attributes,
        };
        Expr::new(ExprKind::Closure(closure), self.span_from(start))
    }

    fn closure_use(&mut self) -> ClosureUseVar {
        let start = self.start();
        let by_ref = self.eat(TokenKind::Ampersand).is_some();
        let name = match self.variable() {
            Some((name, _)) => name,
            None => {
                self.expected("variable");
                MISSING.to_string()
            }
        };
        ClosureUseVar {
            name,
            by_ref,
            span: self.span_from(start),
        }
    }

    pub(crate) fn return_type(&mut self) -> Option<TypeHint> {
        self.eat(TokenKind::Colon)?;
        Some(self.parse_type())
    }

    pub(crate) fn params(&mut self) -> Vec<Param> {
        let open = self.open(TokenKind::LeftParen);
        let params = self.comma_list(TokenKind::RightParen, Self::param);
        self.close(TokenKind::RightParen, open);
        params
    }

    fn param(&mut self) -> Param {
        let start = self.start();
        let attributes = self.parse_attributes();
        let modifiers = self.modifiers();
        if let Some(span) = modifiers.is_static.or(modifiers.is_abstract) {
            self.forbidden("parameters cannot be static or abstract", span);
        }

        let type_hint = self.at_type_start().then(|| self.parse_type());
        let by_ref = self.eat(TokenKind::Ampersand).is_some();
        let variadic = self.eat(TokenKind::Ellipsis).is_some();
        let name = match self.variable() {
            Some((name, _)) => name,
            None => {
                self.expected("parameter variable");
                MISSING.to_string()
            }
        };
        let default = self.eat(TokenKind::Equals).map(|_| self.parse_expr());

        let mut param = Param {
            name,
            type_hint,
            default,
            by_ref,
            variadic,
            modifiers: modifiers.written(),
            attributes,
            hooks: Vec::new(),
            span: self.span_from(start),
        };
        if param.is_promoted() && self.at(TokenKind::LeftBrace) {
            param.hooks = self.property_hooks();
            param.span = self.span_from(start);
        }
        param
    }

    pub(super) fn match_expr(&mut self) -> Expr {
        let start = self.bump().span.start;
        let subject = Box::new(self.paren_expr());
        let open = self.open(TokenKind::LeftBrace);
        let arms = self.comma_list(TokenKind::RightBrace, Self::match_arm);
        self.close(TokenKind::RightBrace, open);
        Expr::new(ExprKind::Match(MatchExpr { subject, arms }), self.span_from(start))
    }

    fn match_arm(&mut self) -> MatchArm {
        let start = self.start();
        let conditions = if self.eat(TokenKind::Default).is_some() {
            None
        } else {
            let conditions = self.comma_list(TokenKind::FatArrow, Self::parse_expr);
            if conditions.is_empty() {
                let span = self.span();
                self.error(ParseError::ExpectedExpression { span });
            }
            Some(conditions)
        };
        self.expect(TokenKind::FatArrow);
        let body = self.parse_expr();
        MatchArm {
            conditions,
            body,
            span: self.span_from(start),
        }
    }

    pub(super) fn new_expr(&mut self) -> Expr {
        let start = self.bump().span.start;
        if self.at_any(&[TokenKind::HashBracket, TokenKind::Class])
            || (self.at(TokenKind::Readonly) && self.peek() == TokenKind::Class)
        {
            return self.anonymous_class(start);
        }

        let class = Box::new(self.class_reference());
        let args = if self.at(TokenKind::LeftParen) {
            self.constructor_args()
        } else {
            Vec::new()
        };
        Expr::new(ExprKind::New(NewExpr { class, args }), self.span_from(start))
    }

    fn constructor_args(&mut self) -> Vec<Arg> {
        let at = self.span();
        self.call_args().unwrap_or_else(|| {
            self.forbidden("cannot create a closure from a 'new' expression", at);
            Vec::new()
        })
    }

    /// The class after `new`: a name, or a variable with property, static
    /// property and index accesses but no calls (`new $this->cls`).
    fn class_reference(&mut self) -> Expr {
        let start = self.start();
        match self.kind() {
            TokenKind::Variable | TokenKind::Dollar => {
                let mut class = self.parse_atom();
                loop {
                    match self.kind() {
                        TokenKind::LeftBracket => class = self.access(class),
                        TokenKind::Arrow | TokenKind::NullsafeArrow => {
                            let nullsafe = self.bump().kind == TokenKind::NullsafeArrow;
                            let property = Box::new(self.member_name());
                            let access = PropertyAccessExpr {
                                object: Box::new(class),
                                property,
                                nullsafe,
                            };
                            class = Expr::new(ExprKind::PropertyAccess(access), self.span_from(start));
                        }
                        TokenKind::DoubleColon if self.peek() == TokenKind::Variable => {
                            self.bump();
                            let member = self.variable().map(|(name, _)| name).unwrap_or_default();
                            let access = StaticAccessExpr {
                                class: Box::new(class),
                                member,
                            };
                            class = Expr::new(ExprKind::StaticPropertyAccess(access), self.span_from(start));
                        }
                        _ => break class,
                    }
                }
            }
            TokenKind::LeftParen => {
                let inner = self.paren_expr();
                Expr::new(ExprKind::Parenthesized(Box::new(inner)), self.span_from(start))
            }
            TokenKind::Static => Expr::new(ExprKind::Identifier("static".to_string()), self.bump().span),
            TokenKind::Self_ | TokenKind::Parent_ => {
                let token = self.bump();
                let name = token.text(self.source()).to_ascii_lowercase();
                Expr::new(ExprKind::Identifier(name), token.span)
            }
            _ => self.name_expr(),
        }
    }

    fn anonymous_class(&mut self, start: u32) -> Expr {
        let attributes = self.parse_attributes();
        let class_start = self.start();
        let is_readonly = self.eat(TokenKind::Readonly).is_some();
        self.expect(TokenKind::Class);
        let args = if self.at(TokenKind::LeftParen) {
            self.constructor_args()
        } else {
            Vec::new()
        };
        let modifiers = ClassModifiers {
            is_readonly,
            ..ClassModifiers::default()
        };
        let decl = self.class_rest(None, modifiers, attributes);
        let class = Box::new(Expr::new(ExprKind::AnonymousClass(decl), self.span_from(class_start)));
        Expr::new(ExprKind::New(NewExpr { class, args }), self.span_from(start))
    }
}
