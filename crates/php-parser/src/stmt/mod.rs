//! Statements. `mod.rs` dispatches on the leading token; the grammar for
//! each family lives in a submodule.

mod control;
mod decl;
mod members;
mod namespace;
mod simple;

use php_ast::{Attribute, Expr, Stmt, StmtKind};
use php_lexer::TokenKind;

use crate::diagnostics::ParseError;
use crate::parser::Parser;

impl<'src> Parser<'src> {
    pub(crate) fn parse_stmt(&mut self) -> Stmt {
        self.nested(Stmt::error, Self::statement)
    }

    /// Parses one statement into `stmts`. A token nothing could start is
    /// skipped so the caller's loop always advances.
    pub(crate) fn push_stmt(&mut self, stmts: &mut Vec<Stmt>) {
        let before = self.span();
        stmts.push(self.parse_stmt());
        if self.span() == before && !self.at_eof() {
            self.bump();
        }
    }

    /// Statements up to (not including) one of `ends`.
    pub(crate) fn stmts_until(&mut self, ends: &[TokenKind]) -> Vec<Stmt> {
        let mut stmts = Vec::new();
        while !self.at_eof() && !self.at_any(ends) {
            if self.at_template_boundary() {
                stmts.extend(self.template_segment());
            } else {
                self.push_stmt(&mut stmts);
            }
        }
        stmts
    }

    /// `{ ... }` body of a function-like or `try` clause.
    pub(crate) fn braced_body(&mut self) -> Vec<Stmt> {
        if !self.at(TokenKind::LeftBrace) {
            self.expected("'{'");
            return Vec::new();
        }
        let open = self.bump();
        self.block_depth += 1;
        let stmts = self.stmts_until(&[TokenKind::RightBrace]);
        self.block_depth -= 1;
        self.close(TokenKind::RightBrace, open.span);
        stmts
    }

    fn statement(&mut self) -> Stmt {
        let start = self.start();
        match self.kind() {
            TokenKind::LeftBrace => {
                let stmts = self.braced_body();
                Stmt::new(StmtKind::Block(stmts), self.span_from(start))
            }
            TokenKind::Semicolon => Stmt::new(StmtKind::Nop, self.bump().span),

            TokenKind::If => self.if_stmt(),
            TokenKind::While => self.while_stmt(),
            TokenKind::Do => self.do_while_stmt(),
            TokenKind::For => self.for_stmt(),
            TokenKind::Foreach => self.foreach_stmt(),
            TokenKind::Switch => self.switch_stmt(),
            TokenKind::Try => self.try_stmt(),
            TokenKind::Declare => self.declare_stmt(),

            TokenKind::Echo => self.echo_stmt(),
            TokenKind::Return => self.return_stmt(),
            TokenKind::Break | TokenKind::Continue => self.jump_stmt(),
            TokenKind::Throw => self.throw_stmt(),
            TokenKind::Goto => self.goto_stmt(),
            TokenKind::Unset => self.unset_stmt(),
            TokenKind::Global => self.global_stmt(),
            TokenKind::Static if self.peek() == TokenKind::Variable => self.static_stmt(),
            TokenKind::Identifier if self.peek() == TokenKind::Colon => {
                let label = self.bump();
                self.bump();
                let name = label.text(self.source()).to_string();
                Stmt::new(StmtKind::Label(name), self.span_from(start))
            }

            TokenKind::Function if !self.closure_ahead() => self.function_decl(start, Vec::new()),
            TokenKind::Abstract | TokenKind::Final | TokenKind::Class => self.class_decl(start, Vec::new()),
            TokenKind::Readonly
                if matches!(self.peek(), TokenKind::Class | TokenKind::Abstract | TokenKind::Final) =>
            {
                self.class_decl(start, Vec::new())
            }
            TokenKind::Interface => self.interface_decl(start, Vec::new()),
            TokenKind::Trait => self.trait_decl(start, Vec::new()),
            TokenKind::Enum_ if self.peek() == TokenKind::Identifier || self.peek().is_semi_reserved() => {
                self.enum_decl(start, Vec::new())
            }
            TokenKind::HashBracket => self.attributed_stmt(),

            TokenKind::Namespace if self.peek() != TokenKind::Backslash => self.namespace_stmt(),
            TokenKind::Use => self.use_stmt(),
            TokenKind::Const => self.const_stmt(),
            TokenKind::HaltCompiler => self.halt_compiler_stmt(),

            TokenKind::CloseTag | TokenKind::InlineHtml | TokenKind::OpenTag => {
                while self.at_template_boundary() {
                    if let Some(stmt) = self.template_segment() {
                        return stmt;
                    }
                }
                Stmt::new(StmtKind::Nop, self.span_from(start))
            }
            TokenKind::RightBrace => {
                let token = self.bump();
                self.error(ParseError::Unexpected {
                    found: token.kind,
                    span: token.span,
                });
                Stmt::error(token.span)
            }
            TokenKind::Eof => {
                self.error(ParseError::ExpectedStatement { span: self.span() });
                Stmt::error(self.span())
            }
            _ => self.expression_stmt(),
        }
    }

    /// `function (` and `function &(` start a closure, not a declaration.
    fn closure_ahead(&mut self) -> bool {
        match self.peek() {
            TokenKind::LeftParen => true,
            TokenKind::Ampersand => self.peek2() == TokenKind::LeftParen,
            _ => false,
        }
    }

    fn expression_stmt(&mut self) -> Stmt {
        let start = self.start();
        let expr = self.parse_expr();
        self.finish_expression_stmt(start, expr)
    }

    fn finish_expression_stmt(&mut self, start: u32, expr: Expr) -> Stmt {
        if expr.is_error() {
            self.resync();
            return Stmt::error(self.span_from(start));
        }
        self.expect_semi("expression");
        Stmt::new(StmtKind::Expression(expr), self.span_from(start))
    }

    /// Attributes in front of a declaration, or of a closure used as a
    /// statement.
    fn attributed_stmt(&mut self) -> Stmt {
        let start = self.start();
        let attributes = self.parse_attributes();
        match self.kind() {
            TokenKind::Function if !self.closure_ahead() => self.function_decl(start, attributes),
            TokenKind::Abstract | TokenKind::Final | TokenKind::Readonly | TokenKind::Class => {
                self.class_decl(start, attributes)
            }
            TokenKind::Interface => self.interface_decl(start, attributes),
            TokenKind::Trait => self.trait_decl(start, attributes),
            TokenKind::Enum_ => self.enum_decl(start, attributes),
            TokenKind::Const => {
                let stmt = self.const_stmt();
                if let StmtKind::Const(items) = &stmt.kind {
                    if items.len() > 1 {
                        self.forbidden("cannot use attributes on multi-constant declaration", stmt.span);
                    }
                }
                stmt
            }
            TokenKind::Function | TokenKind::Fn_ => self.closure_stmt(start, false, attributes),
            TokenKind::Static if matches!(self.peek(), TokenKind::Function | TokenKind::Fn_) => {
                self.bump();
                self.closure_stmt(start, true, attributes)
            }
            _ => {
                self.expected("declaration after attributes");
                self.resync();
                Stmt::error(self.span_from(start))
            }
        }
    }

    fn closure_stmt(&mut self, start: u32, is_static: bool, attributes: Vec<Attribute>) -> Stmt {
        let closure = self.closure(start, is_static, attributes);
        let expr = self.continue_expr(closure, 0);
        self.finish_expression_stmt(start, expr)
    }
}
