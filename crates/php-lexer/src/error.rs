use php_ast::Span;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum LexErrorKind {
    UnterminatedString,
    UnterminatedHeredoc,
    UnterminatedComment,
    InvalidNumericLiteral,
    UnexpectedCharacter,
}

/// A lexical error. `span.start` is the exact offset of the offending
/// construct; lexing always continues after it.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("{}", self.message())]
pub struct LexError {
    pub kind: LexErrorKind,
    pub span: Span,
}

impl LexError {
    pub fn new(kind: LexErrorKind, span: Span) -> Self {
        Self { kind, span }
    }

    pub fn message(&self) -> &'static str {
        match self.kind {
            LexErrorKind::UnterminatedString => "unterminated string literal",
            LexErrorKind::UnterminatedHeredoc => "unterminated heredoc",
            LexErrorKind::UnterminatedComment => "unterminated comment",
            LexErrorKind::InvalidNumericLiteral => "invalid numeric literal",
            LexErrorKind::UnexpectedCharacter => "unexpected character",
        }
    }
}
