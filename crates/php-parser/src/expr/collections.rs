use php_ast::{ArrayElement, Expr, ExprKind, Span};
use php_lexer::TokenKind;

use crate::parser::Parser;

impl<'src> Parser<'src> {
    /// `[1, 'k' => 2]`, also a destructuring target `[$a, , $c] = ...`.
    pub(super) fn short_array(&mut self) -> Expr {
        let open = self.bump();
        let elements = self.array_elements(TokenKind::RightBracket);
        self.close(TokenKind::RightBracket, open.span);
        Expr::new(ExprKind::Array(elements), self.span_from(open.span.start))
    }

    /// `array(...)` and `list(...)`; both build an `Array` node.
    pub(super) fn long_array(&mut self) -> Expr {
        let start = self.bump().span.start;
        let open = self.open(TokenKind::LeftParen);
        let elements = self.array_elements(TokenKind::RightParen);
        self.close(TokenKind::RightParen, open);
        Expr::new(ExprKind::Array(elements), self.span_from(start))
    }

    fn array_elements(&mut self, close: TokenKind) -> Vec<ArrayElement> {
        let mut elements = Vec::new();
        while !self.at(close) && !self.at_eof() {
            if self.at(TokenKind::Comma) {
                let at = self.span().start;
                let span = Span::new(at, at);
                elements.push(ArrayElement {
                    key: None,
                    value: Expr::new(ExprKind::Null, span),
                    by_ref: false,
                    unpack: false,
                    span,
                });
                self.bump();
                continue;
            }
            elements.push(self.array_element());
            if self.eat(TokenKind::Comma).is_none() {
                break;
            }
        }
        elements
    }

    fn array_element(&mut self) -> ArrayElement {
        let start = self.start();
        if self.eat(TokenKind::Ellipsis).is_some() {
            let value = self.parse_expr();
            return ArrayElement {
                key: None,
                value,
                by_ref: false,
                unpack: true,
                span: self.span_from(start),
            };
        }

        let mut by_ref = self.eat(TokenKind::Ampersand).is_some();
        let first = self.parse_expr();
        let (key, value) = if !by_ref && self.eat(TokenKind::FatArrow).is_some() {
            by_ref = self.eat(TokenKind::Ampersand).is_some();
            (Some(first), self.parse_expr())
        } else {
            (None, first)
        };
        ArrayElement {
            key,
            value,
            by_ref,
            unpack: false,
            span: self.span_from(start),
        }
    }
}
