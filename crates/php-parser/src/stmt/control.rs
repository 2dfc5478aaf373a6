//! Branches, loops, `switch`, `try` and `declare`. Every construct with an
//! alternate form (`if (...): ... endif;`) builds the same node as its
//! brace form; the alternate body becomes a `Block`.

use php_ast::{
    CatchClause, DeclareDirective, DeclareStmt, DoWhileStmt, ElseIf, Expr, ForStmt, ForeachStmt, IfStmt, Stmt,
    StmtKind, SwitchCase, SwitchStmt, TryStmt, WhileStmt,
};
use php_lexer::{PhpVersion, TokenKind};

use crate::diagnostics::ParseError;
use crate::parser::Parser;

const IF_ENDS: &[TokenKind] = &[TokenKind::ElseIf, TokenKind::Else, TokenKind::EndIf];

impl<'src> Parser<'src> {
    /// Body of a loop or `declare`: a statement, or `: ... end;` when the
    /// alternate syntax is used.
    fn loop_body(&mut self, end: TokenKind, what: &str) -> Stmt {
        let start = self.start();
        if self.eat(TokenKind::Colon).is_none() {
            return self.parse_stmt();
        }
        let stmts = self.stmts_until(&[end]);
        let body = Stmt::new(StmtKind::Block(stmts), self.span_from(start));
        self.expect_after(end, what);
        self.expect_semi(what);
        body
    }

    /// Statements of one alternate-syntax `if` section, as a block.
    fn alt_section(&mut self, start: u32, ends: &[TokenKind]) -> Stmt {
        let stmts = self.stmts_until(ends);
        Stmt::new(StmtKind::Block(stmts), self.span_from(start))
    }

    pub(super) fn if_stmt(&mut self) -> Stmt {
        let start = self.bump().span.start;
        let condition = self.paren_expr();

        if let Some(colon) = self.eat(TokenKind::Colon) {
            let then_branch = Box::new(self.alt_section(colon.span.start, IF_ENDS));
            let mut elseifs = Vec::new();
            while self.at(TokenKind::ElseIf) {
                let branch_start = self.bump().span.start;
                let condition = self.paren_expr();
                self.expect(TokenKind::Colon);
                let body = self.alt_section(branch_start, IF_ENDS);
                elseifs.push(ElseIf {
                    condition,
                    span: body.span,
                    body,
                });
            }
            let else_branch = self.eat(TokenKind::Else).map(|token| {
                self.expect(TokenKind::Colon);
                Box::new(self.alt_section(token.span.start, &[TokenKind::EndIf]))
            });
            self.expect_after(TokenKind::EndIf, "alternate if");
            self.expect_semi("endif");
            return self.if_node(start, condition, then_branch, elseifs, else_branch);
        }

        let then_branch = Box::new(self.parse_stmt());
        // `else if` stays an `else` holding a nested `if`.
        let mut elseifs = Vec::new();
        while self.at(TokenKind::ElseIf) {
            let branch_start = self.bump().span.start;
            let condition = self.paren_expr();
            let body = self.parse_stmt();
            elseifs.push(ElseIf {
                condition,
                body,
                span: self.span_from(branch_start),
            });
        }
        let else_branch = self
            .eat(TokenKind::Else)
            .map(|_| Box::new(self.parse_stmt()));
        self.if_node(start, condition, then_branch, elseifs, else_branch)
    }

    fn if_node(
        &mut self,
        start: u32,
        condition: Expr,
        then_branch: Box<Stmt>,
        elseifs: Vec<ElseIf>,
        else_branch: Option<Box<Stmt>>,
    ) -> Stmt {
        let stmt = IfStmt {
            condition,
            then_branch,
            elseifs,
            else_branch,
        };
        Stmt::new(StmtKind::If(stmt), self.span_from(start))
    }

    pub(super) fn while_stmt(&mut self) -> Stmt {
        let start = self.bump().span.start;
        let condition = self.paren_expr();
        let body = Box::new(self.loop_body(TokenKind::EndWhile, "alternate while"));
        Stmt::new(StmtKind::While(WhileStmt { condition, body }), self.span_from(start))
    }

    pub(super) fn do_while_stmt(&mut self) -> Stmt {
        let start = self.bump().span.start;
        let body = Box::new(self.parse_stmt());
        self.expect_after(TokenKind::While, "do body");
        let condition = self.paren_expr();
        self.expect_semi("do-while");
        Stmt::new(StmtKind::DoWhile(DoWhileStmt { body, condition }), self.span_from(start))
    }

    pub(super) fn for_stmt(&mut self) -> Stmt {
        let start = self.bump().span.start;
        let open = self.open(TokenKind::LeftParen);
        let init = self.comma_list(TokenKind::Semicolon, Self::parse_expr);
        self.expect(TokenKind::Semicolon);
        let condition = self.comma_list(TokenKind::Semicolon, Self::parse_expr);
        self.expect(TokenKind::Semicolon);
        let update = self.comma_list(TokenKind::RightParen, Self::parse_expr);
        self.close(TokenKind::RightParen, open);
        let body = Box::new(self.loop_body(TokenKind::EndFor, "alternate for"));
        let stmt = ForStmt {
            init,
            condition,
            update,
            body,
        };
        Stmt::new(StmtKind::For(stmt), self.span_from(start))
    }

    pub(super) fn foreach_stmt(&mut self) -> Stmt {
        let start = self.bump().span.start;
        let open = self.open(TokenKind::LeftParen);
        let expr = self.parse_expr();
        self.expect_after(TokenKind::As, "foreach subject");

        let mut by_ref = self.eat(TokenKind::Ampersand).is_some();
        let first = self.parse_expr();
        let (key, value) = if self.eat(TokenKind::FatArrow).is_some() {
            if by_ref {
                self.forbidden("key element cannot be a reference", first.span);
            }
            by_ref = self.eat(TokenKind::Ampersand).is_some();
            (Some(first), self.parse_expr())
        } else {
            (None, first)
        };
        self.close(TokenKind::RightParen, open);

        let body = Box::new(self.loop_body(TokenKind::EndForeach, "alternate foreach"));
        let stmt = ForeachStmt {
            expr,
            key,
            value,
            by_ref,
            body,
        };
        Stmt::new(StmtKind::Foreach(stmt), self.span_from(start))
    }

    pub(super) fn switch_stmt(&mut self) -> Stmt {
        let start = self.bump().span.start;
        let subject = self.paren_expr();

        let (end, open) = match self.eat(TokenKind::Colon) {
            Some(colon) => (TokenKind::EndSwitch, colon.span),
            None => (TokenKind::RightBrace, self.open(TokenKind::LeftBrace)),
        };
        // `switch ($x) {;` is tolerated by PHP.
        while self.eat(TokenKind::Semicolon).is_some() {}

        let mut cases = Vec::new();
        while !self.at(end) && !self.at_eof() {
            let case_start = self.start();
            let value = match self.kind() {
                TokenKind::Case => {
                    self.bump();
                    Some(self.parse_expr())
                }
                TokenKind::Default => {
                    self.bump();
                    None
                }
                _ => {
                    self.expected("'case' or 'default'");
                    let before = self.span();
                    self.resync();
                    if self.span() == before {
                        self.bump();
                    }
                    continue;
                }
            };
            if self.eat(TokenKind::Colon).is_none() && self.eat(TokenKind::Semicolon).is_none() {
                self.expected("':' after case label");
            }
            let body = self.stmts_until(&[TokenKind::Case, TokenKind::Default, end]);
            cases.push(SwitchCase {
                value,
                body,
                span: self.span_from(case_start),
            });
        }

        if end == TokenKind::EndSwitch {
            self.expect_after(TokenKind::EndSwitch, "alternate switch");
            self.expect_semi("endswitch");
        } else {
            self.close(TokenKind::RightBrace, open);
        }
        Stmt::new(StmtKind::Switch(SwitchStmt { subject, cases }), self.span_from(start))
    }

    pub(super) fn try_stmt(&mut self) -> Stmt {
        let start = self.bump().span.start;
        let body = self.braced_body();

        let mut catches = Vec::new();
        while self.at(TokenKind::Catch) {
            let catch_start = self.bump().span.start;
            let open = self.open(TokenKind::LeftParen);
            let mut types = vec![self.parse_name()];
            while self.eat(TokenKind::Pipe).is_some() {
                types.push(self.parse_name());
            }
            let variable = self.variable();
            if variable.is_none() {
                let span = self.span();
                self.require_version("catch without a variable", PhpVersion::Php80, span);
            }
            self.close(TokenKind::RightParen, open);
            let body = self.braced_body();
            let (var, var_span) = variable.map_or((None, None), |(name, span)| (Some(name), Some(span)));
            catches.push(CatchClause {
                types,
                var,
                var_span,
                body,
                span: self.span_from(catch_start),
            });
        }

        let finally = self.eat(TokenKind::Finally).map(|_| self.braced_body());
        if catches.is_empty() && finally.is_none() {
            self.error(ParseError::Expected {
                expected: "'catch' or 'finally'".to_string(),
                found: self.kind(),
                span: self.span(),
            });
        }
        let stmt = TryStmt {
            body,
            catches,
            finally,
        };
        Stmt::new(StmtKind::Try(stmt), self.span_from(start))
    }

    pub(super) fn declare_stmt(&mut self) -> Stmt {
        let start = self.bump().span.start;
        let open = self.open(TokenKind::LeftParen);
        let directives = self.comma_list(TokenKind::RightParen, |p| {
            let directive_start = p.start();
            let name = p.ident_or("directive name");
            p.expect(TokenKind::Equals);
            let value = p.parse_expr();
            DeclareDirective {
                name,
                value,
                span: p.span_from(directive_start),
            }
        });
        self.close(TokenKind::RightParen, open);

        let body = if self.eat(TokenKind::Semicolon).is_some() || self.at(TokenKind::CloseTag) {
            None
        } else {
            Some(Box::new(self.loop_body(TokenKind::EndDeclare, "alternate declare")))
        };
        Stmt::new(StmtKind::Declare(DeclareStmt { directives, body }), self.span_from(start))
    }
}
