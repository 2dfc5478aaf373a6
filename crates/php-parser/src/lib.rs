//! Error-recovering PHP parser.
//!
//! Parsing never fails: malformed regions become `Error` nodes, every
//! problem lands in [`ParseResult::errors`], and the full token stream
//! (trivia included) is kept so the source can be rebuilt byte for byte.

pub mod config;
pub mod diagnostics;
mod expr;
mod interpolation;
mod names;
mod parser;
mod precedence;
mod stmt;

pub use config::ParserConfig;
pub use diagnostics::{LimitExceeded, ParseError};
pub use php_lexer::{PhpVersion, Token, TokenKind};

use php_ast::{Program, Span};

#[derive(Debug, Clone)]
pub struct ParseResult {
    pub program: Program,
    pub errors: Vec<ParseError>,
    /// Every token of the input in order, trivia included, ending with `Eof`.
    pub tokens: Vec<Token>,
    /// Set when parsing stopped early on a construction limit. The program
    /// then covers only a prefix of the input.
    pub limit_exceeded: Option<LimitExceeded>,
    /// Tokens of the expressions inside interpolated strings, heredocs and
    /// backticks (`{$a->b()}`, `${name}`), ordered by start offset. They
    /// overlap the string tokens in `tokens` and take no part in
    /// [`ParseResult::reconstruct`].
    pub embedded_tokens: Vec<Token>,
}

impl ParseResult {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Concatenated token text. Equals the parsed source unless the file
    /// was rejected for its size.
    pub fn reconstruct(&self, source: &str) -> String {
        let mut out = String::with_capacity(source.len());
        for token in &self.tokens {
            out.push_str(token.text(source));
        }
        out
    }

    pub fn text<'s>(&self, source: &'s str, span: Span) -> &'s str {
        source.get(span.as_range()).unwrap_or("")
    }

    /// Tokens lying entirely inside `span`.
    pub fn tokens_in(&self, span: Span) -> &[Token] {
        let first = self.tokens.partition_point(|t| t.span.start < span.start);
        let len = self.tokens[first..].partition_point(|t| t.span.end <= span.end && t.kind != TokenKind::Eof);
        &self.tokens[first..first + len]
    }

    /// Embedded tokens lying entirely inside `span`, such as the tokens of
    /// every interpolated expression of one string literal.
    pub fn embedded_tokens_in(&self, span: Span) -> impl Iterator<Item = &Token> {
        let first = self.embedded_tokens.partition_point(|t| t.span.start < span.start);
        self.embedded_tokens[first..]
            .iter()
            .take_while(move |t| t.span.start < span.end)
            .filter(move |t| t.span.end <= span.end)
    }

    /// Whitespace and comments directly before `span`.
    pub fn leading_trivia(&self, span: Span) -> &[Token] {
        let end = self.tokens.partition_point(|t| t.span.start < span.start);
        let start = self.tokens[..end]
            .iter()
            .rposition(|t| !t.is_trivia())
            .map_or(0, |i| i + 1);
        &self.tokens[start..end]
    }

    /// Whitespace and comments directly after `span`.
    pub fn trailing_trivia(&self, span: Span) -> &[Token] {
        let start = self.tokens.partition_point(|t| t.span.start < span.end);
        let len = self.tokens[start..]
            .iter()
            .position(|t| !t.is_trivia())
            .unwrap_or(self.tokens.len() - start);
        &self.tokens[start..start + len]
    }
}

/// Parse with the default configuration (latest PHP version).
pub fn parse(source: &str) -> ParseResult {
    parse_with(source, &ParserConfig::default())
}

pub fn parse_with(source: &str, config: &ParserConfig) -> ParseResult {
    if source.len() > config.max_file_size {
        let end = source.len() as u32;
        return ParseResult {
            program: Program {
                stmts: Vec::new(),
                span: Span::new(0, end),
            },
            errors: Vec::new(),
            tokens: Vec::new(),
            embedded_tokens: Vec::new(),
            limit_exceeded: Some(LimitExceeded::FileSize {
                size: source.len(),
                limit: config.max_file_size,
            }),
        };
    }

    let mut parser = parser::Parser::new(source, config.clone());
    let program = parser.parse_program();
    let output = parser.finish();
    let mut embedded_tokens = output.embedded;
    embedded_tokens.sort_by_key(|t| t.span.start);
    ParseResult {
        program,
        errors: output.errors,
        tokens: output.tokens,
        limit_exceeded: output.limit,
        embedded_tokens,
    }
}
