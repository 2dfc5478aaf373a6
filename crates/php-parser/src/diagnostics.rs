use std::fmt;

use miette::{Diagnostic, LabeledSpan};
use php_ast::Span;
use php_lexer::{LexError, PhpVersion, TokenKind};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum ParseError {
    #[error("expected {expected}, found {found}")]
    Expected {
        expected: String,
        found: TokenKind,
        span: Span,
    },

    #[error("unexpected token {found}")]
    Unexpected { found: TokenKind, span: Span },

    #[error("expected expression")]
    ExpectedExpression { span: Span },

    #[error("expected statement")]
    ExpectedStatement { span: Span },

    #[error("expected opening PHP tag")]
    ExpectedOpenTag { span: Span },

    #[error("expected {expected} after {after}")]
    ExpectedAfter {
        expected: String,
        after: String,
        span: Span,
    },

    #[error("unclosed {delimiter} opened at {opened_at:?}")]
    UnclosedDelimiter {
        delimiter: String,
        opened_at: Span,
        span: Span,
    },

    #[error("{message}")]
    Forbidden { message: String, span: Span },

    #[error("{0}")]
    Lex(LexError),

    #[error("{feature} requires PHP {required} or later, targeting {target}")]
    UnsupportedFeature {
        feature: &'static str,
        required: PhpVersion,
        target: PhpVersion,
        span: Span,
    },
}

impl ParseError {
    pub fn span(&self) -> Span {
        match self {
            ParseError::Expected { span, .. }
            | ParseError::Unexpected { span, .. }
            | ParseError::ExpectedExpression { span }
            | ParseError::ExpectedStatement { span }
            | ParseError::ExpectedOpenTag { span }
            | ParseError::ExpectedAfter { span, .. }
            | ParseError::UnclosedDelimiter { span, .. }
            | ParseError::Forbidden { span, .. }
            | ParseError::UnsupportedFeature { span, .. } => *span,
            ParseError::Lex(err) => err.span,
        }
    }

    /// Stable, machine-readable identifier of the error class.
    pub fn code(&self) -> &'static str {
        match self {
            ParseError::Expected { .. } | ParseError::ExpectedAfter { .. } => "php::expected",
            ParseError::Unexpected { .. } => "php::unexpected",
            ParseError::ExpectedExpression { .. } => "php::expected_expression",
            ParseError::ExpectedStatement { .. } => "php::expected_statement",
            ParseError::ExpectedOpenTag { .. } => "php::expected_open_tag",
            ParseError::UnclosedDelimiter { .. } => "php::unclosed_delimiter",
            ParseError::Forbidden { .. } => "php::forbidden",
            ParseError::Lex(_) => "php::lex",
            ParseError::UnsupportedFeature { .. } => "php::unsupported_feature",
        }
    }
}

impl Diagnostic for ParseError {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new(ParseError::code(self)))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        match self {
            ParseError::UnsupportedFeature { required, .. } => {
                Some(Box::new(format!("raise the configured PHP version to {required}")))
            }
            _ => None,
        }
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let span = self.span();
        let mut labels = vec![LabeledSpan::new_with_span(
            Some("here".to_string()),
            (span.start as usize, span.len() as usize),
        )];
        if let ParseError::UnclosedDelimiter { opened_at, .. } = self {
            labels.push(LabeledSpan::new_with_span(
                Some("opened here".to_string()),
                (opened_at.start as usize, opened_at.len() as usize),
            ));
        }
        Some(Box::new(labels.into_iter()))
    }
}

/// A construction limit was hit; the caller should abandon the file.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
pub enum LimitExceeded {
    #[error("nesting depth exceeds the limit of {limit}")]
    NestingDepth { limit: u32, span: Span },

    #[error("file is {size} bytes, over the limit of {limit} bytes")]
    FileSize { size: usize, limit: usize },
}

#[cfg(test)]
mod tests {
    use super::*;
    use php_lexer::LexErrorKind;

    #[test]
    fn test_lex_errors_keep_their_span() {
        let err = ParseError::Lex(LexError::new(LexErrorKind::UnterminatedComment, Span::new(4, 9)));
        assert_eq!(err.span(), Span::new(4, 9));
        assert_eq!(err.to_string(), "unterminated comment");
        assert_eq!(err.code(), "php::lex");
    }

    #[test]
    fn test_unclosed_delimiter_has_two_labels() {
        let err = ParseError::UnclosedDelimiter {
            delimiter: "'}'".to_string(),
            opened_at: Span::new(10, 11),
            span: Span::new(30, 30),
        };
        let labels: Vec<_> = Diagnostic::labels(&err).into_iter().flatten().collect();
        assert_eq!(labels.len(), 2);
        assert_eq!(labels[1].offset(), 10);
    }

    #[test]
    fn test_unsupported_feature_message() {
        let err = ParseError::UnsupportedFeature {
            feature: "enum declarations",
            required: PhpVersion::Php81,
            target: PhpVersion::Php74,
            span: Span::DUMMY,
        };
        assert_eq!(
            err.to_string(),
            "enum declarations requires PHP 8.1 or later, targeting 7.4"
        );
        assert!(Diagnostic::help(&err).is_some());
    }
}
