//! Single-line statements: `echo`, `return`, jumps, `unset`, `global`,
//! `static` and `__halt_compiler`.

use php_ast::{Expr, ExprKind, StaticVar, Stmt, StmtKind};
use php_lexer::TokenKind;

use crate::diagnostics::ParseError;
use crate::names::MISSING;
use crate::parser::Parser;

impl<'src> Parser<'src> {
    /// Expressions up to the statement end, comma separated.
    fn operand_list(&mut self) -> Vec<Expr> {
        let mut exprs = vec![self.parse_expr()];
        while self.eat(TokenKind::Comma).is_some() {
            if self.at_any(&[TokenKind::Semicolon, TokenKind::CloseTag]) {
                break;
            }
            exprs.push(self.parse_expr());
        }
        exprs
    }

    fn at_statement_end(&self) -> bool {
        self.at_any(&[TokenKind::Semicolon, TokenKind::CloseTag, TokenKind::Eof])
    }

    pub(super) fn echo_stmt(&mut self) -> Stmt {
        let start = self.bump().span.start;
        let exprs = self.operand_list();
        self.expect_semi("echo");
        Stmt::new(StmtKind::Echo(exprs), self.span_from(start))
    }

    pub(super) fn return_stmt(&mut self) -> Stmt {
        let start = self.bump().span.start;
        let value = (!self.at_statement_end()).then(|| self.parse_expr());
        self.expect_semi("return");
        Stmt::new(StmtKind::Return(value), self.span_from(start))
    }

    /// `break` and `continue`, with an optional level.
    pub(super) fn jump_stmt(&mut self) -> Stmt {
        let keyword = self.bump();
        let word = if keyword.kind == TokenKind::Break { "break" } else { "continue" };
        let level = (!self.at_statement_end()).then(|| self.parse_expr());
        if let Some(level) = &level {
            if !matches!(level.kind, ExprKind::Int(n) if n > 0) {
                self.forbidden(format!("'{word}' operator accepts only positive integers"), level.span);
            }
        }
        self.expect_semi(word);
        let kind = if keyword.kind == TokenKind::Break {
            StmtKind::Break(level)
        } else {
            StmtKind::Continue(level)
        };
        Stmt::new(kind, self.span_from(keyword.span.start))
    }

    pub(super) fn throw_stmt(&mut self) -> Stmt {
        let start = self.bump().span.start;
        let value = self.parse_expr();
        self.expect_semi("throw");
        Stmt::new(StmtKind::Throw(value), self.span_from(start))
    }

    pub(super) fn goto_stmt(&mut self) -> Stmt {
        let start = self.bump().span.start;
        let label = match self.eat(TokenKind::Identifier) {
            Some(token) => token.text(self.source()).to_string(),
            None => {
                self.expected("label");
                MISSING.to_string()
            }
        };
        self.expect_semi("goto");
        Stmt::new(StmtKind::Goto(label), self.span_from(start))
    }

    pub(super) fn unset_stmt(&mut self) -> Stmt {
        let start = self.bump().span.start;
        let open = self.open(TokenKind::LeftParen);
        let targets = self.comma_list(TokenKind::RightParen, Self::parse_expr);
        self.close(TokenKind::RightParen, open);
        self.expect_semi("unset");
        Stmt::new(StmtKind::Unset(targets), self.span_from(start))
    }

    pub(super) fn global_stmt(&mut self) -> Stmt {
        let start = self.bump().span.start;
        let vars = self.operand_list();
        for var in &vars {
            if !matches!(var.kind, ExprKind::Variable(_) | ExprKind::VariableVariable(_)) {
                self.error(ParseError::Expected {
                    expected: "variable".to_string(),
                    found: TokenKind::Global,
                    span: var.span,
                });
            }
        }
        self.expect_semi("global");
        Stmt::new(StmtKind::Global(vars), self.span_from(start))
    }

    /// `static $a = 1, $b;` inside a function body.
    pub(super) fn static_stmt(&mut self) -> Stmt {
        let start = self.bump().span.start;
        let mut vars = Vec::new();
        loop {
            let var_start = self.start();
            let name = match self.variable() {
                Some((name, _)) => name,
                None => {
                    self.expected("variable");
                    MISSING.to_string()
                }
            };
            let default = self.eat(TokenKind::Equals).map(|_| self.parse_expr());
            vars.push(StaticVar {
                name,
                default,
                span: self.span_from(var_start),
            });
            if self.eat(TokenKind::Comma).is_none() || !self.at(TokenKind::Variable) {
                break;
            }
        }
        self.expect_semi("static declaration");
        Stmt::new(StmtKind::StaticVar(vars), self.span_from(start))
    }

    /// `__halt_compiler();` and the raw data after it. Nothing that follows
    /// is parsed.
    pub(super) fn halt_compiler_stmt(&mut self) -> Stmt {
        let keyword = self.bump();
        if self.block_depth > 0 {
            self.forbidden("__halt_compiler() can only be used from the outermost scope", keyword.span);
        }
        let open = self.open(TokenKind::LeftParen);
        self.close(TokenKind::RightParen, open);
        if self.eat(TokenKind::Semicolon).is_none() && self.eat(TokenKind::CloseTag).is_none() {
            self.error(ParseError::ExpectedAfter {
                expected: "';' or '?>'".to_string(),
                after: "__halt_compiler()".to_string(),
                span: self.span(),
            });
        }
        let data = match self.eat(TokenKind::HaltCompilerData) {
            Some(token) => token.text(self.source()).to_string(),
            None => String::new(),
        };
        while !self.at_eof() {
            self.bump();
        }
        Stmt::new(StmtKind::HaltCompiler(data), self.span_from(keyword.span.start))
    }
}
