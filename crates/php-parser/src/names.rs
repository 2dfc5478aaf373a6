use php_ast::{Attribute, Expr, ExprKind, Name, NameKind, Span, TypeHint, TypeHintKind};
use php_lexer::TokenKind;

use crate::parser::Parser;

/// Placeholder text for a name the source did not provide.
pub(crate) const MISSING: &str = "<error>";

/// Keywords that are valid in type position.
const KEYWORD_TYPES: &[TokenKind] = &[
    TokenKind::Array,
    TokenKind::Self_,
    TokenKind::Parent_,
    TokenKind::Static,
    TokenKind::Null,
    TokenKind::True,
    TokenKind::False,
];

impl<'src> Parser<'src> {
    /// An identifier, or a keyword standing where PHP accepts any label
    /// (member names, constants, named arguments).
    pub(crate) fn ident(&mut self) -> Option<(String, Span)> {
        if self.at(TokenKind::Identifier) || self.kind().is_semi_reserved() {
            let token = self.bump();
            return Some((token.text(self.source()).to_string(), token.span));
        }
        None
    }

    /// Like [`Parser::ident`], reporting `what` when the label is missing.
    pub(crate) fn ident_or(&mut self, what: &str) -> String {
        match self.ident() {
            Some((name, _)) => name,
            None => {
                self.expected(what);
                MISSING.to_string()
            }
        }
    }

    /// `$name` without the sigil, or `None` when not at a variable.
    pub(crate) fn variable(&mut self) -> Option<(String, Span)> {
        let token = self.eat(TokenKind::Variable)?;
        Some((token.text(self.source())[1..].to_string(), token.span))
    }

    pub(crate) fn parse_name(&mut self) -> Name {
        let start = self.start();
        let kind = if self.eat(TokenKind::Backslash).is_some() {
            NameKind::FullyQualified
        } else if self.at(TokenKind::Namespace) && self.peek() == TokenKind::Backslash {
            self.bump();
            self.bump();
            NameKind::Relative
        } else {
            NameKind::Unqualified
        };

        let mut parts = vec![self.ident_or("identifier")];
        while self.at(TokenKind::Backslash) && self.peek_is_label() {
            self.bump();
            parts.extend(self.ident().map(|(part, _)| part));
        }

        let kind = match kind {
            NameKind::Unqualified if parts.len() > 1 => NameKind::Qualified,
            kind => kind,
        };
        Name {
            parts,
            kind,
            span: self.span_from(start),
        }
    }

    /// A name as an expression atom: `Foo\bar`, `\strlen`, `namespace\X`.
    pub(crate) fn name_expr(&mut self) -> Expr {
        let name = self.parse_name();
        let joined = name.joined();
        let text = match name.kind {
            NameKind::FullyQualified => format!("\\{joined}"),
            NameKind::Relative => format!("namespace\\{joined}"),
            NameKind::Unqualified | NameKind::Qualified => joined,
        };
        Expr::new(ExprKind::Identifier(text), name.span)
    }

    pub(crate) fn name_list(&mut self, close: TokenKind) -> Vec<Name> {
        self.comma_list(close, Self::parse_name)
    }

    fn peek_is_label(&mut self) -> bool {
        let next = self.peek();
        next == TokenKind::Identifier || next.is_semi_reserved()
    }

    // --- types ---

    pub(crate) fn at_type_start(&self) -> bool {
        matches!(
            self.kind(),
            TokenKind::Identifier
                | TokenKind::Question
                | TokenKind::Backslash
                | TokenKind::Namespace
                | TokenKind::LeftParen
        ) || KEYWORD_TYPES.contains(&self.kind())
    }

    /// `?T`, `A|B`, `A&B` and the DNF form `(A&B)|null`.
    pub(crate) fn parse_type(&mut self) -> TypeHint {
        let start = self.start();
        if self.eat(TokenKind::Question).is_some() {
            let inner = self.type_atom();
            return TypeHint {
                kind: TypeHintKind::Nullable(Box::new(inner)),
                span: self.span_from(start),
            };
        }

        let first = self.type_atom();
        if self.at(TokenKind::Pipe) {
            let mut members = vec![first];
            while self.eat(TokenKind::Pipe).is_some() {
                members.push(self.type_atom());
            }
            return TypeHint {
                kind: TypeHintKind::Union(members),
                span: self.span_from(start),
            };
        }
        if self.at_intersection_amp() {
            let mut members = vec![first];
            while self.at_intersection_amp() {
                self.bump();
                members.push(self.type_atom());
            }
            return TypeHint {
                kind: TypeHintKind::Intersection(members),
                span: self.span_from(start),
            };
        }
        first
    }

    /// `&` joins an intersection unless it is the by-reference marker of
    /// the parameter that follows (`A &$x`, `A &...$xs`).
    fn at_intersection_amp(&mut self) -> bool {
        self.at(TokenKind::Ampersand) && !matches!(self.peek(), TokenKind::Variable | TokenKind::Ellipsis)
    }

    fn type_atom(&mut self) -> TypeHint {
        let start = self.start();
        if let Some(open) = self.eat(TokenKind::LeftParen) {
            let mut members = vec![self.type_atom()];
            while self.eat(TokenKind::Ampersand).is_some() {
                members.push(self.type_atom());
            }
            self.close(TokenKind::RightParen, open.span);
            return TypeHint {
                kind: TypeHintKind::Intersection(members),
                span: self.span_from(start),
            };
        }
        if KEYWORD_TYPES.contains(&self.kind()) {
            let token = self.bump();
            let name = Name {
                parts: vec![token.text(self.source()).to_ascii_lowercase()],
                kind: NameKind::Unqualified,
                span: token.span,
            };
            return TypeHint {
                kind: TypeHintKind::Named(name),
                span: token.span,
            };
        }
        let name = self.parse_name();
        TypeHint {
            span: name.span,
            kind: TypeHintKind::Named(name),
        }
    }

    // --- attributes ---

    /// Any number of `#[A, B(1)]` groups, flattened.
    pub(crate) fn parse_attributes(&mut self) -> Vec<Attribute> {
        let mut attributes = Vec::new();
        while self.at(TokenKind::HashBracket) {
            let open = self.bump();
            let group = self.comma_list(TokenKind::RightBracket, |p| {
                let start = p.start();
                let name = p.parse_name();
                let args = if p.at(TokenKind::LeftParen) {
                    p.call_args().unwrap_or_default()
                } else {
                    Vec::new()
                };
                Attribute {
                    name,
                    args,
                    span: p.span_from(start),
                }
            });
            attributes.extend(group);
            self.close(TokenKind::RightBracket, open.span);
        }
        attributes
    }
}
