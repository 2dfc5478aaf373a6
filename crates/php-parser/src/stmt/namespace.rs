//! `namespace`, `use` imports and top-level `const`.

use php_ast::{ConstItem, Name, NameKind, NamespaceBody, NamespaceDecl, Stmt, StmtKind, UseDecl, UseItem, UseKind};
use php_lexer::TokenKind;

use crate::parser::Parser;

impl<'src> Parser<'src> {
    pub(super) fn namespace_stmt(&mut self) -> Stmt {
        let start = self.bump().span.start;
        let name = (!self.at(TokenKind::LeftBrace)).then(|| self.parse_name());

        let body = match self.eat(TokenKind::LeftBrace) {
            Some(open) => {
                let stmts = self.stmts_until(&[TokenKind::RightBrace]);
                self.close(TokenKind::RightBrace, open.span);
                NamespaceBody::Braced(stmts)
            }
            None => {
                if name.is_none() {
                    self.expected("namespace name");
                }
                self.expect_semi("namespace declaration");
                NamespaceBody::Simple
            }
        };
        if self.block_depth > 0 {
            self.forbidden("namespace declaration must be at the top level", self.span_from(start));
        }
        Stmt::new(StmtKind::Namespace(NamespaceDecl { name, body }), self.span_from(start))
    }

    pub(super) fn use_stmt(&mut self) -> Stmt {
        let start = self.bump().span.start;
        let kind = self.use_kind().unwrap_or(UseKind::Normal);

        let item_start = self.start();
        let prefix = self.parse_name();
        let uses = if self.at(TokenKind::Backslash) && self.peek() == TokenKind::LeftBrace {
            self.bump();
            self.group_use(prefix)
        } else {
            let first = self.use_item_rest(item_start, prefix, None);
            let mut uses = vec![first];
            while self.eat(TokenKind::Comma).is_some() && !self.at(TokenKind::Semicolon) {
                let item_start = self.start();
                let name = self.parse_name();
                uses.push(self.use_item_rest(item_start, name, None));
            }
            uses
        };
        self.expect_semi("use declaration");
        Stmt::new(StmtKind::Use(UseDecl { kind, uses }), self.span_from(start))
    }

    fn use_kind(&mut self) -> Option<UseKind> {
        match self.kind() {
            TokenKind::Function => {
                self.bump();
                Some(UseKind::Function)
            }
            TokenKind::Const => {
                self.bump();
                Some(UseKind::Const)
            }
            _ => None,
        }
    }

    /// `use A\B\{C, function d, E as F};`. Each item gets the prefix
    /// prepended, so imports look the same as the ungrouped form.
    fn group_use(&mut self, prefix: Name) -> Vec<UseItem> {
        let open = self.bump();
        let items = self.comma_list(TokenKind::RightBrace, |p| {
            let item_start = p.start();
            let kind = p.use_kind();
            let tail = p.parse_name();
            if tail.kind == NameKind::FullyQualified {
                p.forbidden("group use items cannot be fully qualified", tail.span);
            }
            let mut parts = prefix.parts.clone();
            parts.extend(tail.parts);
            let name = Name {
                parts,
                kind: match prefix.kind {
                    NameKind::FullyQualified => NameKind::FullyQualified,
                    _ => NameKind::Qualified,
                },
                span: tail.span,
            };
            p.use_item_rest(item_start, name, kind)
        });
        if items.is_empty() {
            self.expected("at least one import in group use");
        }
        self.close(TokenKind::RightBrace, open.span);
        items
    }

    fn use_item_rest(&mut self, start: u32, name: Name, kind: Option<UseKind>) -> UseItem {
        let alias = self.eat(TokenKind::As).map(|_| self.ident_or("alias"));
        UseItem {
            name,
            alias,
            kind,
            span: self.span_from(start),
        }
    }

    /// `const A = 1, B = 2;` outside a class.
    pub(super) fn const_stmt(&mut self) -> Stmt {
        let start = self.bump().span.start;
        let items = self.const_items();
        self.expect_semi("const declaration");
        Stmt::new(StmtKind::Const(items), self.span_from(start))
    }

    pub(super) fn const_items(&mut self) -> Vec<ConstItem> {
        self.comma_list(TokenKind::Semicolon, |p| {
            let item_start = p.start();
            let name = p.ident_or("constant name");
            p.expect(TokenKind::Equals);
            let value = p.parse_expr();
            ConstItem {
                name,
                value,
                span: p.span_from(item_start),
            }
        })
    }
}
