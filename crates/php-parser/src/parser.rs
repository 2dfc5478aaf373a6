use std::ops::Range;

use php_ast::{Program, Span, Stmt, StmtKind};
use php_lexer::{Lexer, PhpVersion, Token, TokenKind};

use crate::config::ParserConfig;
use crate::diagnostics::{LimitExceeded, ParseError};

/// Tokens that begin a statement. Error recovery stops in front of them.
const RESYNC_POINTS: &[TokenKind] = &[
    TokenKind::If,
    TokenKind::While,
    TokenKind::Do,
    TokenKind::For,
    TokenKind::Foreach,
    TokenKind::Function,
    TokenKind::Return,
    TokenKind::Echo,
    TokenKind::Break,
    TokenKind::Continue,
    TokenKind::Switch,
    TokenKind::Try,
    TokenKind::Throw,
    TokenKind::Goto,
    TokenKind::Declare,
    TokenKind::Unset,
    TokenKind::Global,
    TokenKind::Class,
    TokenKind::Abstract,
    TokenKind::Final,
    TokenKind::Interface,
    TokenKind::Trait,
    TokenKind::Enum_,
    TokenKind::Namespace,
    TokenKind::Use,
    TokenKind::HaltCompiler,
    TokenKind::HashBracket,
    TokenKind::RightBrace,
    TokenKind::CloseTag,
];

/// Recursive-descent state: a one-token window over the significant tokens
/// plus the diagnostics gathered so far.
///
/// Productions live in `impl Parser` blocks next to the grammar they cover
/// (`names`, `expr`, `stmt`).
pub(crate) struct Parser<'src> {
    lexer: Lexer<'src>,
    current: Token,
    source: &'src str,
    config: ParserConfig,
    errors: Vec<ParseError>,
    prev_end: u32,
    /// Block depth; 0 at the top level of the file.
    pub(crate) block_depth: u32,
    /// Depth of the tree under construction, checked against
    /// `max_nesting_depth`.
    pub(crate) nesting: u32,
    limit: Option<LimitExceeded>,
    /// Tokens of code embedded in interpolated strings, gathered from range
    /// parsers.
    embedded: Vec<Token>,
}

/// What a parser leaves behind once its input is consumed.
pub(crate) struct Output {
    pub(crate) errors: Vec<ParseError>,
    pub(crate) tokens: Vec<Token>,
    pub(crate) embedded: Vec<Token>,
    pub(crate) limit: Option<LimitExceeded>,
}

impl<'src> Parser<'src> {
    pub(crate) fn new(source: &'src str, config: ParserConfig) -> Self {
        Self::from_lexer(Lexer::with_version(source, config.version), config, 0)
    }

    /// Parser for the code in `source[range]`, which has no open tag. The
    /// nesting budget already used by `outer` carries over.
    pub(crate) fn for_range(outer: &Parser<'src>, range: Range<usize>) -> Self {
        let lexer = Lexer::for_range(outer.source, range, outer.config.version);
        Self::from_lexer(lexer, outer.config.clone(), outer.nesting)
    }

    fn from_lexer(mut lexer: Lexer<'src>, config: ParserConfig, nesting: u32) -> Self {
        let source = lexer.source();
        let current = lexer.next_token();
        let errors = lexer.errors.drain(..).map(ParseError::Lex).collect();
        Self {
            lexer,
            current,
            source,
            config,
            errors,
            prev_end: current.span.start,
            block_depth: 0,
            nesting,
            limit: None,
            embedded: Vec::new(),
        }
    }

    pub(crate) fn version(&self) -> PhpVersion {
        self.config.version
    }

    pub(crate) fn source(&self) -> &'src str {
        self.source
    }

    /// Everything the lexer produced, with the errors and the limit that
    /// stopped parsing, if any.
    pub(crate) fn finish(mut self) -> Output {
        let tokens = self.lexer.finish();
        self.errors.extend(self.lexer.errors.drain(..).map(ParseError::Lex));
        Output {
            errors: self.errors,
            tokens,
            embedded: self.embedded,
            limit: self.limit,
        }
    }

    /// Folds a range parser back in: its diagnostics join ours, its tokens
    /// join the embedded set and a limit it hit stops us too.
    pub(crate) fn absorb(&mut self, inner: Parser<'src>) {
        let output = inner.finish();
        self.errors.extend(output.errors);
        self.embedded
            .extend(output.tokens.into_iter().filter(|t| t.kind != TokenKind::Eof));
        self.embedded.extend(output.embedded);
        if let Some(limit) = output.limit {
            self.abandon(limit);
        }
    }

    // --- cursor ---

    pub(crate) fn kind(&self) -> TokenKind {
        self.current.kind
    }

    pub(crate) fn span(&self) -> Span {
        self.current.span
    }

    pub(crate) fn text(&self) -> &'src str {
        self.current.text(self.source)
    }

    pub(crate) fn at(&self, kind: TokenKind) -> bool {
        self.current.kind == kind
    }

    pub(crate) fn at_any(&self, kinds: &[TokenKind]) -> bool {
        kinds.contains(&self.current.kind)
    }

    pub(crate) fn at_eof(&self) -> bool {
        self.current.kind == TokenKind::Eof
    }

    /// True when the current token is the contextual word `word`
    /// (`insteadof`, `get`, `set`, `var`).
    pub(crate) fn at_word(&self, word: &str) -> bool {
        self.at(TokenKind::Identifier) && self.text().eq_ignore_ascii_case(word)
    }

    pub(crate) fn peek(&mut self) -> TokenKind {
        self.lexer.peek().kind
    }

    pub(crate) fn peek2(&mut self) -> TokenKind {
        self.lexer.peek2().kind
    }

    /// True when the next token starts right where the current one ends.
    pub(crate) fn peek_adjacent(&mut self) -> bool {
        self.lexer.peek().span.start == self.current.span.end
    }

    pub(crate) fn peek_text(&mut self) -> &'src str {
        let token = self.lexer.peek();
        token.text(self.source)
    }

    /// Consumes the current token. Once a limit is hit the cursor stays on
    /// `Eof`.
    pub(crate) fn bump(&mut self) -> Token {
        if self.limit.is_some() {
            return self.current;
        }
        let next = self.lexer.next_token();
        let token = std::mem::replace(&mut self.current, next);
        self.prev_end = token.span.end;
        self.errors.extend(self.lexer.errors.drain(..).map(ParseError::Lex));
        token
    }

    pub(crate) fn eat(&mut self, kind: TokenKind) -> Option<Token> {
        self.at(kind).then(|| self.bump())
    }

    pub(crate) fn expect(&mut self, kind: TokenKind) -> Option<Token> {
        if self.at(kind) {
            return Some(self.bump());
        }
        self.error(ParseError::Expected {
            expected: kind.to_string(),
            found: self.kind(),
            span: self.span(),
        });
        None
    }

    pub(crate) fn expect_after(&mut self, kind: TokenKind, after: &str) -> Option<Token> {
        if self.at(kind) {
            return Some(self.bump());
        }
        self.error(ParseError::ExpectedAfter {
            expected: kind.to_string(),
            after: after.to_string(),
            span: self.span(),
        });
        None
    }

    /// Statement terminator. `?>` also ends a statement; it is left in
    /// place for the template handling.
    pub(crate) fn expect_semi(&mut self, after: &str) {
        if self.at(TokenKind::CloseTag) || self.eat(TokenKind::Semicolon).is_some() {
            return;
        }
        self.error(ParseError::ExpectedAfter {
            expected: "';'".to_string(),
            after: after.to_string(),
            span: self.span(),
        });
    }

    /// Opening delimiter whose span is needed to report a missing closer.
    pub(crate) fn open(&mut self, kind: TokenKind) -> Span {
        match self.expect(kind) {
            Some(token) => token.span,
            None => self.span(),
        }
    }

    /// Closing delimiter; returns the offset the construct ends at.
    pub(crate) fn close(&mut self, kind: TokenKind, opened_at: Span) -> u32 {
        if let Some(token) = self.eat(kind) {
            return token.span.end;
        }
        self.error(ParseError::UnclosedDelimiter {
            delimiter: kind.to_string(),
            opened_at,
            span: self.span(),
        });
        self.prev_end
    }

    /// `item, item, ...` up to (not including) `close`. A trailing comma is
    /// accepted.
    pub(crate) fn comma_list<T>(&mut self, close: TokenKind, mut item: impl FnMut(&mut Self) -> T) -> Vec<T> {
        let mut items = Vec::new();
        while !self.at(close) && !self.at_eof() {
            items.push(item(self));
            if self.eat(TokenKind::Comma).is_none() {
                break;
            }
        }
        items
    }

    pub(crate) fn start(&self) -> u32 {
        self.current.span.start
    }

    /// From `start` to the end of the last consumed token, so trailing
    /// trivia never lands inside a node.
    pub(crate) fn span_from(&self, start: u32) -> Span {
        Span::new(start, self.prev_end.max(start))
    }

    // --- diagnostics ---

    /// Records `err` unless a limit already stopped the parse; what follows
    /// the abandon point is noise.
    pub(crate) fn error(&mut self, err: ParseError) {
        if self.limit.is_none() {
            self.errors.push(err);
        }
    }

    pub(crate) fn expected(&mut self, what: &str) {
        self.error(ParseError::Expected {
            expected: what.to_string(),
            found: self.kind(),
            span: self.span(),
        });
    }

    pub(crate) fn forbidden(&mut self, message: impl Into<String>, span: Span) {
        self.error(ParseError::Forbidden {
            message: message.into(),
            span,
        });
    }

    /// Reports `feature` when the configured version predates `required`.
    /// The construct is parsed either way.
    pub(crate) fn require_version(&mut self, feature: &'static str, required: PhpVersion, span: Span) {
        if self.config.version < required {
            self.error(ParseError::UnsupportedFeature {
                feature,
                required,
                target: self.config.version,
                span,
            });
        }
    }

    /// Skips to the next likely statement start, eating one `;`.
    pub(crate) fn resync(&mut self) {
        while !self.at_eof() && !self.at_any(RESYNC_POINTS) {
            if self.bump().kind == TokenKind::Semicolon {
                break;
            }
        }
    }

    // --- construction limits ---

    /// Runs `parse` one recursion level deeper. Past the configured depth
    /// the parse is abandoned and `fallback` builds a placeholder.
    pub(crate) fn nested<T>(&mut self, fallback: impl FnOnce(Span) -> T, parse: impl FnOnce(&mut Self) -> T) -> T {
        let span = self.span();
        if !self.deepen() {
            return fallback(span);
        }
        let node = parse(self);
        self.nesting -= 1;
        node
    }

    /// Takes one level of the nesting budget. Once the budget is spent the
    /// parse is abandoned and this returns false. The caller gives the
    /// level back.
    pub(crate) fn deepen(&mut self) -> bool {
        if self.limit.is_some() {
            return false;
        }
        if self.nesting >= self.config.max_nesting_depth {
            let span = self.span();
            self.abandon(LimitExceeded::NestingDepth {
                limit: self.config.max_nesting_depth,
                span,
            });
            return false;
        }
        self.nesting += 1;
        true
    }

    fn abandon(&mut self, reason: LimitExceeded) {
        self.limit = Some(reason);
        self.current = Token::eof(self.source.len() as u32);
    }

    // --- file level ---

    pub(crate) fn at_template_boundary(&self) -> bool {
        self.at_any(&[TokenKind::CloseTag, TokenKind::InlineHtml, TokenKind::OpenTag])
    }

    /// One `?>`, inline HTML or open tag. HTML becomes an `InlineHtml`
    /// statement and `<?= expr` an echo.
    pub(crate) fn template_segment(&mut self) -> Option<Stmt> {
        match self.kind() {
            TokenKind::InlineHtml => {
                let token = self.bump();
                Some(Stmt::new(StmtKind::InlineHtml(token.text(self.source).to_string()), token.span))
            }
            TokenKind::OpenTag => {
                let tag = self.bump();
                let short_echo = tag.text(self.source) == "<?=";
                if !short_echo || self.at_eof() || self.at(TokenKind::CloseTag) {
                    return None;
                }
                let value = self.parse_expr();
                self.expect_semi("short echo tag");
                Some(Stmt::new(StmtKind::Echo(vec![value]), self.span_from(tag.span.start)))
            }
            TokenKind::CloseTag => {
                self.bump();
                None
            }
            _ => None,
        }
    }

    pub(crate) fn parse_program(&mut self) -> Program {
        let start = self.start();
        let mut stmts = Vec::new();

        if self.at(TokenKind::InlineHtml) {
            stmts.extend(self.template_segment());
        }
        if self.at(TokenKind::OpenTag) {
            stmts.extend(self.template_segment());
        } else if !self.at_eof() {
            self.error(ParseError::ExpectedOpenTag { span: self.span() });
        }

        while !self.at_eof() {
            if self.at_template_boundary() {
                stmts.extend(self.template_segment());
            } else {
                self.push_stmt(&mut stmts);
            }
        }

        let end = stmts.last().map_or(self.prev_end.max(start), |s| s.span.end);
        Program {
            stmts,
            span: Span::new(start, end),
        }
    }
}
