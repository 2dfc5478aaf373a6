use std::collections::VecDeque;

use logos::Logos;
use php_ast::Span;
use serde::Serialize;

use crate::error::{LexError, LexErrorKind};
use crate::token::{line_comment_len, resolve_keyword, scan_number, TokenKind};
use crate::version::PhpVersion;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }

    pub fn eof(offset: u32) -> Self {
        Self {
            kind: TokenKind::Eof,
            span: Span::new(offset, offset),
        }
    }

    pub fn is_trivia(&self) -> bool {
        self.kind.is_trivia()
    }

    /// Template text outside `<?php ... ?>`.
    pub fn is_inline_html(&self) -> bool {
        self.kind == TokenKind::InlineHtml
    }

    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.span.as_range()]
    }
}

/// Every token of a file, trivia included, plus the lexical errors met on
/// the way.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TokenStream {
    pub tokens: Vec<Token>,
    pub errors: Vec<LexError>,
}

impl TokenStream {
    /// Tokens the parser sees: everything except whitespace and comments.
    pub fn significant(&self) -> impl DoubleEndedIterator<Item = &Token> {
        self.tokens.iter().filter(|t| !t.is_trivia())
    }

    /// Concatenates the text of every token. Equals `source` for any input.
    pub fn reconstruct(&self, source: &str) -> String {
        let mut out = String::with_capacity(source.len());
        for token in &self.tokens {
            out.push_str(token.text(source));
        }
        out
    }
}

/// Lex `source` eagerly into a full-fidelity token stream.
pub fn tokenize(source: &str, version: PhpVersion) -> TokenStream {
    let mut lexer = Lexer::with_version(source, version);
    let tokens = lexer.finish();
    TokenStream {
        tokens,
        errors: std::mem::take(&mut lexer.errors),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LexerMode {
    InlineHtml,
    Php,
    /// Everything after `__halt_compiler();`
    HaltData,
}

/// Progress through `__halt_compiler ( ) ;`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HaltState {
    Idle,
    Keyword,
    Open,
    Close,
}

/// Single forward pass over the source. `next_token` hands the parser
/// significant tokens only; every raw token, trivia included, is recorded
/// in order and returned by `finish`.
pub struct Lexer<'src> {
    source: &'src str,
    version: PhpVersion,
    mode: LexerMode,
    pos: usize,
    halt: HaltState,
    /// Significant tokens read ahead of the parser.
    lookahead: VecDeque<Token>,
    tokens: Vec<Token>,
    reached_eof: bool,
    pub errors: Vec<LexError>,
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str) -> Self {
        Self::with_version(source, PhpVersion::default())
    }

    pub fn with_version(source: &'src str, version: PhpVersion) -> Self {
        Self {
            source,
            version,
            mode: LexerMode::InlineHtml,
            pos: 0,
            halt: HaltState::Idle,
            lookahead: VecDeque::with_capacity(2),
            tokens: Vec::new(),
            reached_eof: false,
            errors: Vec::new(),
        }
    }

    /// Lexes `source[range]` as PHP code with no open tag, such as the
    /// `{$a->b()}` part of a double-quoted string. Token spans stay
    /// relative to the whole `source`.
    pub fn for_range(source: &'src str, range: std::ops::Range<usize>, version: PhpVersion) -> Self {
        let end = range.end.min(source.len());
        Self {
            mode: LexerMode::Php,
            pos: range.start.min(end),
            ..Self::with_version(&source[..end], version)
        }
    }

    pub fn source(&self) -> &'src str {
        self.source
    }

    pub fn version(&self) -> PhpVersion {
        self.version
    }

    /// The significant token `n` places ahead, without consuming anything.
    /// Past the end this keeps answering `Eof`.
    fn lookahead(&mut self, n: usize) -> Token {
        while self.lookahead.len() <= n {
            let token = self.read_significant();
            self.lookahead.push_back(token);
        }
        self.lookahead[n]
    }

    pub fn peek(&mut self) -> Token {
        self.lookahead(0)
    }

    /// The token after the next one.
    pub fn peek2(&mut self) -> Token {
        self.lookahead(1)
    }

    pub fn next_token(&mut self) -> Token {
        match self.lookahead.pop_front() {
            Some(token) => token,
            None => self.read_significant(),
        }
    }

    pub fn token_text(&self, token: &Token) -> &'src str {
        &self.source[token.span.as_range()]
    }

    /// Lex the rest of the input and hand over every token read so far.
    pub fn finish(&mut self) -> Vec<Token> {
        while !self.reached_eof {
            self.read_significant();
        }
        std::mem::take(&mut self.tokens)
    }

    fn read_significant(&mut self) -> Token {
        loop {
            let token = self.read_raw();
            self.record(token);
            if !token.is_trivia() {
                return token;
            }
        }
    }

    fn record(&mut self, token: Token) {
        if token.kind == TokenKind::Eof {
            if self.reached_eof {
                return;
            }
            self.reached_eof = true;
        }
        self.tokens.push(token);
    }

    fn read_raw(&mut self) -> Token {
        if self.pos >= self.source.len() {
            return Token::eof(self.source.len() as u32);
        }

        match self.mode {
            LexerMode::InlineHtml => self.lex_inline_html(),
            LexerMode::Php => {
                let token = self.lex_php();
                self.track_halt_compiler(token.kind);
                token
            }
            LexerMode::HaltData => {
                let span = Span::new(self.pos as u32, self.source.len() as u32);
                self.pos = self.source.len();
                Token::new(TokenKind::HaltCompilerData, span)
            }
        }
    }

    fn lex_inline_html(&mut self) -> Token {
        let start = self.pos;
        let bytes = self.source.as_bytes();

        if start == 0 && bytes.starts_with(b"#!") {
            let end = memchr::memchr(b'\n', bytes).map_or(bytes.len(), |i| i + 1);
            self.pos = end;
            return Token::new(TokenKind::Shebang, Span::new(0, end as u32));
        }

        match find_open_tag(&bytes[start..]) {
            Some((0, tag_len)) => {
                self.pos = start + tag_len;
                self.mode = LexerMode::Php;
                Token::new(TokenKind::OpenTag, Span::new(start as u32, self.pos as u32))
            }
            Some((offset, _)) => {
                self.pos = start + offset;
                Token::new(TokenKind::InlineHtml, Span::new(start as u32, self.pos as u32))
            }
            None => {
                self.pos = bytes.len();
                Token::new(TokenKind::InlineHtml, Span::new(start as u32, self.pos as u32))
            }
        }
    }

    fn lex_php(&mut self) -> Token {
        let start = self.pos;
        let remaining = &self.source[start..];

        if remaining.starts_with("<<<") || remaining.starts_with("b<<<") || remaining.starts_with("B<<<") {
            if let Some(token) = self.try_lex_heredoc() {
                return token;
            }
        }

        if let Some(token) = self.number(start) {
            return token;
        }

        let mut inner = TokenKind::lexer(remaining);
        match inner.next() {
            Some(Ok(kind)) => {
                let end = start + inner.span().end;
                self.classify(kind, start, end)
            }
            Some(Err(())) => self.recover(start),
            None => Token::eof(self.source.len() as u32),
        }
    }

    /// A number literal at `start`, measured by PHP's grammar rather than
    /// logos, whose longest-match fallback can hand back a prefix such as
    /// `1e` as an integer. `None` when no number starts here.
    fn number(&mut self, start: usize) -> Option<Token> {
        let bytes = self.source.as_bytes();
        let (kind, len) = scan_number(&bytes[start..])?;
        let end = start + len;
        if kind != TokenKind::InvalidNumericLiteral && bytes.get(end) != Some(&b'_') {
            self.pos = end;
            return Some(Token::new(kind, Span::new(start as u32, end as u32)));
        }
        self.pos = start + number_run_len(&bytes[start..]).max(len);
        let span = Span::new(start as u32, self.pos as u32);
        self.errors.push(LexError::new(LexErrorKind::InvalidNumericLiteral, span));
        Some(Token::new(TokenKind::InvalidNumericLiteral, span))
    }

    /// Post-process a token logos produced: keywords, version toggles,
    /// doc comments and tag handling.
    fn classify(&mut self, kind: TokenKind, start: usize, end: usize) -> Token {
        self.pos = end;
        let bytes = self.source.as_bytes();

        let kind = match kind {
            TokenKind::HashBracket if !self.version.has_attributes() => {
                self.pos = start + 1 + line_comment_len(&bytes[start + 1..]);
                TokenKind::LineComment
            }
            TokenKind::BlockComment => {
                let is_doc = bytes[start..end].starts_with(b"/**")
                    && bytes.get(start + 3).is_some_and(|b| b.is_ascii_whitespace());
                if is_doc {
                    TokenKind::DocComment
                } else {
                    TokenKind::BlockComment
                }
            }
            TokenKind::CloseTag => {
                // A single newline directly after `?>` belongs to the tag.
                if bytes[end..].starts_with(b"\r\n") {
                    self.pos = end + 2;
                } else if bytes.get(end) == Some(&b'\n') {
                    self.pos = end + 1;
                }
                self.mode = LexerMode::InlineHtml;
                TokenKind::CloseTag
            }
            TokenKind::Identifier => match resolve_keyword(&self.source[start..end]) {
                Some(TokenKind::Fn_) if !self.version.has_arrow_functions() => TokenKind::Identifier,
                Some(TokenKind::Match_) if !self.version.has_match() => TokenKind::Identifier,
                Some(keyword) => keyword,
                None => TokenKind::Identifier,
            },
            other => other,
        };

        Token::new(kind, Span::new(start as u32, self.pos as u32))
    }

    /// Logos rejected the input at `start`: an unterminated literal or
    /// comment, or a character no rule accepts.
    fn recover(&mut self, start: usize) -> Token {
        let bytes = &self.source.as_bytes()[start..];
        let string_opener = match bytes {
            [b'\'' | b'"' | b'`', ..] => Some(1),
            [b'b' | b'B', b'\'' | b'"', ..] => Some(2),
            _ => None,
        };

        if let Some(opener) = string_opener {
            return self.error_token(LexErrorKind::UnterminatedString, start, opener);
        }
        if bytes.starts_with(b"/*") {
            return self.error_token(LexErrorKind::UnterminatedComment, start, 2);
        }

        let width = self.source[start..].chars().next().map_or(1, char::len_utf8);
        self.pos = start + width;
        let span = Span::new(start as u32, self.pos as u32);
        self.errors.push(LexError::new(LexErrorKind::UnexpectedCharacter, span));
        Token::new(TokenKind::BadCharacter, span)
    }

    /// Emit an `Error` token from `start` up to the next `;` or `}` found
    /// after the opening delimiter (left for the next token) or EOF.
    fn error_token(&mut self, kind: LexErrorKind, start: usize, opener_len: usize) -> Token {
        let search_from = (start + opener_len).min(self.source.len());
        let end = memchr::memchr2(b';', b'}', &self.source.as_bytes()[search_from..])
            .map_or(self.source.len(), |i| search_from + i);
        self.pos = end;
        let span = Span::new(start as u32, end as u32);
        self.errors.push(LexError::new(kind, span));
        Token::new(TokenKind::Error, span)
    }

    fn track_halt_compiler(&mut self, kind: TokenKind) {
        if kind.is_trivia() {
            return;
        }
        self.halt = match (self.halt, kind) {
            (_, TokenKind::HaltCompiler) => HaltState::Keyword,
            (HaltState::Keyword, TokenKind::LeftParen) => HaltState::Open,
            (HaltState::Open, TokenKind::RightParen) => HaltState::Close,
            (HaltState::Close, TokenKind::Semicolon | TokenKind::CloseTag) => {
                self.mode = LexerMode::HaltData;
                HaltState::Idle
            }
            _ => HaltState::Idle,
        };
    }

    /// Lex `<<<LABEL`, `<<<"LABEL"` or `<<<'LABEL'` through the closing
    /// label. Returns None when the input is not a heredoc opener at all.
    fn try_lex_heredoc(&mut self) -> Option<Token> {
        let start = self.pos;
        let rest = &self.source[start..];
        let prefix_len = usize::from(rest.starts_with('b') || rest.starts_with('B'));
        let after_arrows = rest[prefix_len..].strip_prefix("<<<")?;
        let after_ws = after_arrows.trim_start_matches([' ', '\t']);
        let header_ws = after_arrows.len() - after_ws.len();

        let (label, label_len, is_nowdoc) = if let Some(quoted) = after_ws.strip_prefix('\'') {
            let close = quoted.find('\'')?;
            (&quoted[..close], close + 2, true)
        } else if let Some(quoted) = after_ws.strip_prefix('"') {
            let close = quoted.find('"')?;
            (&quoted[..close], close + 2, false)
        } else {
            let len = after_ws.find(|c: char| !is_label_char(c)).unwrap_or(after_ws.len());
            (&after_ws[..len], len, false)
        };
        if label.is_empty() || label.starts_with(|c: char| c.is_ascii_digit()) {
            return None;
        }

        let after_label = &after_ws[label_len..];
        let newline_len = if after_label.starts_with("\r\n") {
            2
        } else if after_label.starts_with('\n') {
            1
        } else {
            return None;
        };

        let body_start = start + prefix_len + 3 + header_ws + label_len + newline_len;
        match find_heredoc_end(&self.source[body_start..], label) {
            Some(end) => {
                self.pos = body_start + end;
                let kind = if is_nowdoc { TokenKind::Nowdoc } else { TokenKind::Heredoc };
                Some(Token::new(kind, Span::new(start as u32, self.pos as u32)))
            }
            None => Some(self.error_token(LexErrorKind::UnterminatedHeredoc, start, body_start - start)),
        }
    }
}

/// Length of the whole digit-like run starting at a malformed number, so
/// the error token covers all of it. A sign only continues the run right
/// after an exponent marker.
fn number_run_len(bytes: &[u8]) -> usize {
    let mut len = 0;
    while let Some(&byte) = bytes.get(len) {
        let continues = match byte {
            b'+' | b'-' => len > 0 && matches!(bytes[len - 1], b'e' | b'E'),
            _ => byte.is_ascii_alphanumeric() || byte == b'_' || byte == b'.',
        };
        if !continues {
            break;
        }
        len += 1;
    }
    len
}

fn is_label_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || !c.is_ascii()
}

/// Offset just past the closing label: the first line whose content,
/// after optional indentation, is the label not followed by another label
/// character.
fn find_heredoc_end(body: &str, label: &str) -> Option<usize> {
    let mut line_start = 0;
    loop {
        let line = &body[line_start..];
        let indent = line.len() - line.trim_start_matches([' ', '\t']).len();
        let candidate = &line[indent..];
        if candidate.starts_with(label) && !candidate[label.len()..].starts_with(is_label_char) {
            return Some(line_start + indent + label.len());
        }
        let newline = memchr::memchr(b'\n', line.as_bytes())?;
        line_start += newline + 1;
    }
}

/// Position and length of the first `<?php` (followed by whitespace or EOF)
/// or `<?=` open tag.
fn find_open_tag(bytes: &[u8]) -> Option<(usize, usize)> {
    for at in memchr::memmem::find_iter(bytes, b"<?") {
        let rest = &bytes[at + 2..];
        if rest.first() == Some(&b'=') {
            return Some((at, 3));
        }
        if rest.len() >= 3 && rest[..3].eq_ignore_ascii_case(b"php") {
            match rest.get(3) {
                None => return Some((at, 5)),
                Some(c) if c.is_ascii_whitespace() => return Some((at, 5)),
                _ => {}
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect_tokens(source: &str) -> Vec<Token> {
        let mut lexer = Lexer::new(source);
        let mut tokens = Vec::new();
        loop {
            let token = lexer.next_token();
            if token.kind == TokenKind::Eof {
                tokens.push(token);
                break;
            }
            tokens.push(token);
        }
        tokens
    }

    fn collect_kinds(source: &str) -> Vec<TokenKind> {
        collect_tokens(source).into_iter().map(|t| t.kind).collect()
    }

    fn raw_kinds(source: &str, version: PhpVersion) -> Vec<(TokenKind, String)> {
        tokenize(source, version)
            .tokens
            .iter()
            .filter(|t| t.kind != TokenKind::Whitespace && t.kind != TokenKind::Eof)
            .map(|t| (t.kind, t.text(source).to_string()))
            .collect()
    }

    #[test]
    fn test_modes_switch_at_tags() {
        use TokenKind::*;
        assert_eq!(collect_kinds(""), vec![Eof]);
        assert_eq!(collect_kinds("<ul><li>only markup</li></ul>"), vec![InlineHtml, Eof]);
        assert_eq!(
            collect_kinds("<b><?php $n = 3; ?></b>"),
            vec![InlineHtml, OpenTag, Variable, Equals, IntLiteral, Semicolon, CloseTag, InlineHtml, Eof]
        );
        assert_eq!(collect_kinds("<?= $title ?>"), vec![OpenTag, Variable, CloseTag, Eof]);

        let html: Vec<_> = collect_tokens("<p><?php ?>\n</p>")
            .into_iter()
            .map(|t| t.is_inline_html())
            .collect();
        assert_eq!(html, vec![true, false, false, true, false]);
    }

    #[test]
    fn test_keywords_any_case() {
        use TokenKind::*;
        assert_eq!(
            collect_kinds("<?php While ENDWHILE instanceOf xor New self"),
            vec![OpenTag, While, EndWhile, Instanceof, Xor, New, Self_, Eof]
        );
    }

    #[test]
    fn test_lookahead_is_not_consumed() {
        let source = "<?php $a->b";
        let mut lexer = Lexer::new(source);
        assert_eq!(lexer.peek2().kind, TokenKind::Variable);
        assert_eq!(lexer.peek().kind, TokenKind::OpenTag);
        assert_eq!(lexer.next_token().kind, TokenKind::OpenTag);
        let var = lexer.next_token();
        assert_eq!(lexer.token_text(&var), "$a");
        assert_eq!(var.span, Span::new(6, 8));
        assert_eq!(lexer.peek2().kind, TokenKind::Identifier);
        assert_eq!(lexer.next_token().kind, TokenKind::Arrow);
        assert_eq!(lexer.next_token().kind, TokenKind::Identifier);
        assert_eq!(lexer.peek2().kind, TokenKind::Eof);
        assert_eq!(lexer.next_token().kind, TokenKind::Eof);
    }

    #[test]
    fn test_longest_operator_wins() {
        use TokenKind::*;
        assert_eq!(
            collect_kinds("<?php ??= ?-> ... <=> **= !== |>"),
            vec![
                OpenTag,
                CoalesceEquals,
                NullsafeArrow,
                Ellipsis,
                Spaceship,
                StarStarEquals,
                BangEqualsEquals,
                PipeArrow,
                Eof
            ]
        );
    }

    #[test]
    fn test_malformed_numbers() {
        let source = "<?php 1__0; 0x_1F; 2.5_e3; 1e5_;";
        let stream = tokenize(source, PhpVersion::LATEST);
        let bad: Vec<_> = stream
            .tokens
            .iter()
            .filter(|t| t.kind == TokenKind::InvalidNumericLiteral)
            .map(|t| t.text(source))
            .collect();
        assert_eq!(bad, vec!["1__0", "0x_1F", "2.5_e3", "1e5_"]);
        assert_eq!(stream.errors.len(), 4);
        assert!(stream.errors.iter().all(|e| e.kind == LexErrorKind::InvalidNumericLiteral));
    }

    #[test]
    fn test_incomplete_numbers_are_not_integers() {
        let source = "<?php 1e; 2E+; 08; 0_9; 0x; 0b2; 0o; 1.; 0_7;";
        let kinds = raw_kinds(source, PhpVersion::LATEST);
        let numbers: Vec<_> = kinds
            .iter()
            .filter(|(kind, _)| !matches!(kind, TokenKind::OpenTag | TokenKind::Semicolon))
            .map(|(kind, text)| (*kind, text.as_str()))
            .collect();
        assert_eq!(
            numbers,
            vec![
                (TokenKind::IntLiteral, "1"),
                (TokenKind::Identifier, "e"),
                (TokenKind::IntLiteral, "2"),
                (TokenKind::Identifier, "E"),
                (TokenKind::Plus, "+"),
                (TokenKind::InvalidNumericLiteral, "08"),
                (TokenKind::InvalidNumericLiteral, "0_9"),
                (TokenKind::InvalidNumericLiteral, "0x"),
                (TokenKind::InvalidNumericLiteral, "0b2"),
                (TokenKind::InvalidNumericLiteral, "0o"),
                (TokenKind::FloatLiteral, "1."),
                (TokenKind::OctIntLiteral, "0_7"),
            ]
        );
        let errors = tokenize(source, PhpVersion::LATEST).errors;
        assert_eq!(errors.len(), 5);
        assert!(errors.iter().all(|e| e.kind == LexErrorKind::InvalidNumericLiteral));
    }

    #[test]
    fn test_number_run_stops_at_operator() {
        assert_eq!(number_run_len(b"1_0+2"), 3);
        assert_eq!(number_run_len(b"1e_5-2"), 4);
        assert_eq!(number_run_len(b"1e-5_;"), 5);
    }

    #[test]
    fn test_trivia_is_recorded() {
        let source = "<?php\n// NOSONAR\n/** @var int */\n$x = 1; # done\n";
        assert_eq!(
            raw_kinds(source, PhpVersion::LATEST),
            vec![
                (TokenKind::OpenTag, "<?php".to_string()),
                (TokenKind::LineComment, "// NOSONAR".to_string()),
                (TokenKind::DocComment, "/** @var int */".to_string()),
                (TokenKind::Variable, "$x".to_string()),
                (TokenKind::Equals, "=".to_string()),
                (TokenKind::IntLiteral, "1".to_string()),
                (TokenKind::Semicolon, ";".to_string()),
                (TokenKind::LineComment, "# done".to_string()),
            ]
        );
    }

    #[test]
    fn test_round_trip_is_exact() {
        let sources = [
            "",
            "plain html only",
            "#!/usr/bin/env php\n<?php echo 1;",
            "<p><?= $title ?>\n</p><?php if ($a): ?>x<?php endif;",
            "<?php $s = \"a {$o->m(\"x\")} b\"; /* c */ $t = <<<EOT\n  hi $name\n  EOT;\n",
            "<?php $broken = 'never closed; $y = 2; }",
            "<?php /* open comment ; tail",
            "<?php $x = 1 \u{7} 2; // bell\n",
            "<?php __halt_compiler(); raw \0 bytes <?php",
            "<?php $bad = 1_000_; $ok = 0x1F;",
        ];
        for source in sources {
            let stream = tokenize(source, PhpVersion::LATEST);
            assert_eq!(stream.reconstruct(source), source, "round trip failed for {source:?}");
        }
    }

    #[test]
    fn test_unterminated_string_resyncs_at_semicolon() {
        let source = "<?php $a = 'oops; $b = 2;";
        let stream = tokenize(source, PhpVersion::LATEST);
        assert_eq!(stream.errors.len(), 1);
        let error = &stream.errors[0];
        assert_eq!(error.kind, LexErrorKind::UnterminatedString);
        assert_eq!(error.span.start, 11);
        assert_eq!(&source[error.span.as_range()], "'oops");
        let kinds: Vec<_> = stream.significant().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::OpenTag,
                TokenKind::Variable,
                TokenKind::Equals,
                TokenKind::Error,
                TokenKind::Semicolon,
                TokenKind::Variable,
                TokenKind::Equals,
                TokenKind::IntLiteral,
                TokenKind::Semicolon,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_unterminated_comment_resyncs_at_brace() {
        let source = "<?php function f() { /* never closed }";
        let stream = tokenize(source, PhpVersion::LATEST);
        assert_eq!(stream.errors[0].kind, LexErrorKind::UnterminatedComment);
        assert_eq!(&source[stream.errors[0].span.as_range()], "/* never closed ");
        assert_eq!(
            stream.significant().map(|t| t.kind).nth_back(1),
            Some(TokenKind::RightBrace)
        );
    }

    #[test]
    fn test_unterminated_heredoc() {
        let source = "<?php $x = <<<EOT\nbody without end\n";
        let stream = tokenize(source, PhpVersion::LATEST);
        assert_eq!(stream.errors[0].kind, LexErrorKind::UnterminatedHeredoc);
        assert_eq!(stream.errors[0].span.start, 11);
        assert_eq!(stream.errors[0].span.end as usize, source.len());
    }

    #[test]
    fn test_bad_character_keeps_utf8_boundaries() {
        // `€` is a valid identifier start, so only control characters end up as bad input
        let source = "<?php $a = 1 € 2;";
        let stream = tokenize(source, PhpVersion::LATEST);
        assert!(stream.tokens.iter().all(|t| t.kind != TokenKind::BadCharacter));

        let source = "<?php $a = 1 \u{1} 2;";
        let stream = tokenize(source, PhpVersion::LATEST);
        assert_eq!(stream.errors[0].kind, LexErrorKind::UnexpectedCharacter);
        assert_eq!(stream.errors[0].span.len(), 1);
    }

    #[test]
    fn test_heredoc_and_nowdoc() {
        let kinds = raw_kinds("<?php foo(<<<EOT\n  a\n  EOT, <<<'RAW'\nb\nRAW);", PhpVersion::LATEST);
        assert_eq!(kinds[3], (TokenKind::Heredoc, "<<<EOT\n  a\n  EOT".to_string()));
        assert_eq!(kinds[4].0, TokenKind::Comma);
        assert_eq!(kinds[5], (TokenKind::Nowdoc, "<<<'RAW'\nb\nRAW".to_string()));
    }

    #[test]
    fn test_attribute_is_comment_before_php8() {
        let old = raw_kinds("<?php #[Attr]\n$x;", PhpVersion::Php74);
        assert_eq!(old[1], (TokenKind::LineComment, "#[Attr]".to_string()));
        let new = raw_kinds("<?php #[Attr]\n$x;", PhpVersion::Php80);
        assert_eq!(new[1].0, TokenKind::HashBracket);
    }

    #[test]
    fn test_version_gated_keywords() {
        let php73 = raw_kinds("<?php fn match", PhpVersion::Php73);
        assert_eq!(php73[1].0, TokenKind::Identifier);
        assert_eq!(php73[2].0, TokenKind::Identifier);
        let php74 = raw_kinds("<?php fn match", PhpVersion::Php74);
        assert_eq!(php74[1].0, TokenKind::Fn_);
        assert_eq!(php74[2].0, TokenKind::Identifier);
        let php80 = raw_kinds("<?php fn match", PhpVersion::Php80);
        assert_eq!(php80[2].0, TokenKind::Match_);
    }

    #[test]
    fn test_halt_compiler_data() {
        let source = "<?php foo(); __halt_compiler(); <?php not code ?>";
        let kinds = raw_kinds(source, PhpVersion::LATEST);
        assert_eq!(
            kinds.last(),
            Some(&(TokenKind::HaltCompilerData, " <?php not code ?>".to_string()))
        );
    }

    #[test]
    fn test_shebang_and_close_tag_newline() {
        let source = "#!/usr/bin/php\n<?php echo 1 ?>\nafter";
        let kinds = raw_kinds(source, PhpVersion::LATEST);
        assert_eq!(kinds[0], (TokenKind::Shebang, "#!/usr/bin/php\n".to_string()));
        assert_eq!(kinds[4], (TokenKind::CloseTag, "?>\n".to_string()));
        assert_eq!(kinds[5], (TokenKind::InlineHtml, "after".to_string()));
    }

    #[test]
    fn test_open_tag_detection() {
        assert_eq!(find_open_tag(b"abc<?PHP\n"), Some((3, 5)));
        assert_eq!(find_open_tag(b"<?xml ?><?= 1"), Some((8, 3)));
        assert_eq!(find_open_tag(b"<?phpx"), None);
        assert_eq!(find_open_tag(b"<?php"), Some((0, 5)));
    }

    #[test]
    fn test_range_lexer_keeps_file_offsets() {
        let source = r#"<?php "x{$a->b()}y";"#;
        let mut lexer = Lexer::for_range(source, 9..16, PhpVersion::LATEST);
        let first = lexer.next_token();
        assert_eq!((first.kind, first.text(source)), (TokenKind::Variable, "$a"));
        assert_eq!(lexer.next_token().kind, TokenKind::Arrow);
        lexer.next_token();
        lexer.next_token();
        assert_eq!(lexer.next_token().kind, TokenKind::RightParen);
        assert_eq!(lexer.next_token(), Token::eof(16));
    }
}
