use logos::Logos;
use serde::Serialize;

/// Extends the current token by `consumed` bytes, or rejects it when the
/// scanner found no terminator.
fn advance(lex: &mut logos::Lexer<TokenKind>, consumed: Option<usize>) -> bool {
    match consumed {
        Some(len) => {
            lex.bump(len);
            true
        }
        None => false,
    }
}

fn single_quoted(lex: &mut logos::Lexer<TokenKind>) -> bool {
    let consumed = scan_single_quoted(lex.remainder().as_bytes());
    advance(lex, consumed)
}

fn double_quoted(lex: &mut logos::Lexer<TokenKind>) -> bool {
    let consumed = scan_interpolated(lex.remainder().as_bytes(), b'"');
    advance(lex, consumed)
}

fn backtick(lex: &mut logos::Lexer<TokenKind>) -> bool {
    let consumed = scan_interpolated(lex.remainder().as_bytes(), b'`');
    advance(lex, consumed)
}

fn line_comment(lex: &mut logos::Lexer<TokenKind>) -> bool {
    let consumed = line_comment_len(lex.remainder().as_bytes());
    advance(lex, Some(consumed))
}

fn block_comment(lex: &mut logos::Lexer<TokenKind>) -> bool {
    let consumed = memchr::memmem::find(lex.remainder().as_bytes(), b"*/").map(|idx| idx + 2);
    advance(lex, consumed)
}

/// Length of a line comment body starting right after `//` or `#`. The
/// comment ends before a newline or before a `?>` close tag.
pub(crate) fn line_comment_len(bytes: &[u8]) -> usize {
    let mut from = 0;
    while let Some(idx) = memchr::memchr3(b'\n', b'\r', b'?', &bytes[from..]) {
        let at = from + idx;
        if bytes[at] != b'?' || bytes.get(at + 1) == Some(&b'>') {
            return at;
        }
        from = at + 1;
    }
    bytes.len()
}

/// Bytes consumed by a single-quoted body, including the closing quote.
pub(crate) fn scan_single_quoted(bytes: &[u8]) -> Option<usize> {
    let mut i = 0;
    while let Some(&byte) = bytes.get(i) {
        match byte {
            b'\'' => return Some(i + 1),
            b'\\' => i += 2,
            _ => i += 1,
        }
    }
    None
}

/// Bytes consumed by an interpolating body (`"` or backtick), including the
/// closing quote. Quotes nested inside `{$ ... }` and `${ ... }` do not
/// terminate the literal.
pub(crate) fn scan_interpolated(bytes: &[u8], quote: u8) -> Option<usize> {
    let mut i = 0;
    while let Some(&byte) = bytes.get(i) {
        let next = bytes.get(i + 1).copied();
        i += match (byte, next) {
            (b'\\', _) => 2,
            (b'{', Some(b'$')) => matching_brace(&bytes[i + 1..]).map_or(1, |len| len + 1),
            (b'$', Some(b'{')) => matching_brace(&bytes[i + 2..]).map_or(2, |len| len + 2),
            (c, _) if c == quote => return Some(i + 1),
            _ => 1,
        };
    }
    None
}

/// `bytes` starts just after an opening `{`; returns the length up to and
/// including the matching `}`. Gives up at a newline.
fn matching_brace(bytes: &[u8]) -> Option<usize> {
    let mut depth = 1u32;
    let mut i = 0;
    while let Some(&byte) = bytes.get(i) {
        i += match byte {
            b'\n' => return None,
            b'{' => {
                depth += 1;
                1
            }
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i + 1);
                }
                1
            }
            b'\'' => 1 + scan_single_quoted(&bytes[i + 1..])?,
            b'"' => 1 + scan_interpolated(&bytes[i + 1..], b'"')?,
            _ => 1,
        };
    }
    None
}

/// Length of a digit run in `radix` where single `_` separators may sit
/// between digits.
fn digit_run(bytes: &[u8], radix: u32) -> usize {
    let is_digit = |byte: u8| char::from(byte).is_digit(radix);
    let mut len = 0;
    while let Some(&byte) = bytes.get(len) {
        if is_digit(byte) {
            len += 1;
        } else if byte == b'_' && len > 0 && bytes.get(len + 1).is_some_and(|&next| is_digit(next)) {
            len += 2;
        } else {
            break;
        }
    }
    len
}

/// Kind and length of the number literal at the start of `bytes`, by PHP's
/// grammar. A radix prefix without digits and a legacy octal holding `8`
/// or `9` are `InvalidNumericLiteral`. An exponent marker without digits
/// is not part of the number, so `1e` is `1` followed by a name.
pub(crate) fn scan_number(bytes: &[u8]) -> Option<(TokenKind, usize)> {
    let radix = match bytes {
        [b'0', b'x' | b'X', ..] => Some((TokenKind::HexIntLiteral, 16)),
        [b'0', b'b' | b'B', ..] => Some((TokenKind::BinIntLiteral, 2)),
        [b'0', b'o' | b'O', ..] => Some((TokenKind::OctIntLiteral, 8)),
        _ => None,
    };
    if let Some((kind, radix)) = radix {
        return Some(match digit_run(&bytes[2..], radix) {
            0 => (TokenKind::InvalidNumericLiteral, 2),
            digits => (kind, 2 + digits),
        });
    }

    let whole = digit_run(bytes, 10);
    let mut len = whole;
    let mut is_float = false;
    if bytes.get(len) == Some(&b'.') {
        let fraction = digit_run(&bytes[len + 1..], 10);
        if whole > 0 || fraction > 0 {
            len += 1 + fraction;
            is_float = true;
        }
    }
    if len == 0 {
        return None;
    }
    if let [b'e' | b'E', rest @ ..] = &bytes[len..] {
        let sign = usize::from(matches!(rest.first(), Some(b'+' | b'-')));
        let exponent = digit_run(&rest[sign..], 10);
        if exponent > 0 {
            len += 1 + sign + exponent;
            is_float = true;
        }
    }

    let kind = if is_float {
        TokenKind::FloatLiteral
    } else if bytes[0] == b'0' && len > 1 {
        if bytes[..len].iter().any(|b| matches!(b, b'8' | b'9')) {
            TokenKind::InvalidNumericLiteral
        } else {
            TokenKind::OctIntLiteral
        }
    } else {
        TokenKind::IntLiteral
    };
    Some((kind, len))
}

/// Every token the lexer can produce.
///
/// Logos matches the punctuation, literal and trivia variants directly.
/// Keywords come out of logos as `Identifier` and are resolved through
/// [`resolve_keyword`]; tags, inline HTML and heredocs are produced by the
/// mode-aware [`crate::Lexer`] wrapper.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum TokenKind {
    #[regex(r"[ \t\r\n\f]+")]
    Whitespace,
    #[token("//", line_comment)]
    #[token("#", line_comment)]
    LineComment,
    /// Reclassified as `DocComment` by the lexer when it starts with `/**`.
    #[token("/*", block_comment)]
    BlockComment,
    DocComment,
    /// `#!` line at the very start of a file.
    Shebang,

    #[regex(r"[0-9](_?[0-9])*", priority = 1)]
    IntLiteral,
    #[regex(r"0[xX][0-9a-fA-F](_?[0-9a-fA-F])*")]
    HexIntLiteral,
    #[regex(r"0[bB][01](_?[01])*")]
    BinIntLiteral,
    /// Both `0o17` and the legacy `017`.
    #[regex(r"0[oO][0-7](_?[0-7])*", priority = 4)]
    #[regex(r"0[0-7]+", priority = 3)]
    OctIntLiteral,
    /// `1.5`, `.5`, `1e3` and `1.5e-3`.
    #[regex(r"[0-9](_?[0-9])*\.[0-9](_?[0-9])*", priority = 4)]
    #[regex(r"\.[0-9](_?[0-9])*([eE][+-]?[0-9](_?[0-9])*)?", priority = 4)]
    #[regex(r"[0-9](_?[0-9])*(\.[0-9](_?[0-9])*)?[eE][+-]?[0-9](_?[0-9])*", priority = 5)]
    FloatLiteral,
    /// A digit run the lexer rejected, such as `1_000_`.
    InvalidNumericLiteral,

    #[regex(r"[bB]?'", single_quoted)]
    SingleQuotedString,
    #[regex(r#"[bB]?""#, double_quoted)]
    DoubleQuotedString,
    #[token("`", backtick)]
    BacktickString,
    Heredoc,
    Nowdoc,

    #[regex(r"\$[a-zA-Z_\x{80}-\x{10FFFF}][a-zA-Z0-9_\x{80}-\x{10FFFF}]*")]
    Variable,
    #[regex(r"[a-zA-Z_\x{80}-\x{10FFFF}][a-zA-Z0-9_\x{80}-\x{10FFFF}]*")]
    Identifier,

    // Keywords. `If` and `HaltCompiler` bound the range checked by
    // `is_keyword`, so new keywords go between them.
    If,
    Else,
    ElseIf,
    EndIf,
    Switch,
    Case,
    Default,
    EndSwitch,
    Match_,
    While,
    EndWhile,
    Do,
    For,
    EndFor,
    Foreach,
    EndForeach,
    As,
    Break,
    Continue,
    Goto,
    Return,
    Yield_,
    From,
    Throw,
    Try,
    Catch,
    Finally,
    Declare,
    EndDeclare,
    Function,
    Fn_,
    Class,
    Interface,
    Trait,
    Enum_,
    Extends,
    Implements,
    New,
    Clone,
    Instanceof,
    Namespace,
    Use,
    Const,
    Global,
    Abstract,
    Final,
    Readonly,
    Public,
    Protected,
    Private,
    Static,
    Self_,
    Parent_,
    Echo,
    Print,
    Array,
    List,
    Isset,
    Empty,
    Unset,
    Eval,
    Exit,
    Die,
    Include,
    IncludeOnce,
    Require,
    RequireOnce,
    True,
    False,
    Null,
    And,
    Or,
    Xor,
    MagicClass,
    MagicDir,
    MagicFile,
    MagicFunction,
    MagicLine,
    MagicMethod,
    MagicNamespace,
    MagicTrait,
    MagicProperty,
    HaltCompiler,

    #[token("(")]
    LeftParen,
    #[token(")")]
    RightParen,
    #[token("[")]
    LeftBracket,
    #[token("]")]
    RightBracket,
    #[token("{")]
    LeftBrace,
    #[token("}")]
    RightBrace,
    #[token(";")]
    Semicolon,
    #[token(",")]
    Comma,
    #[token("\\")]
    Backslash,
    #[token("#[")]
    HashBracket,
    #[token("$")]
    Dollar,
    #[token("@")]
    At,
    #[token("...")]
    Ellipsis,
    #[token("->")]
    Arrow,
    #[token("?->")]
    NullsafeArrow,
    #[token("::")]
    DoubleColon,
    #[token("=>")]
    FatArrow,
    #[token("?")]
    Question,
    #[token(":")]
    Colon,

    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("**")]
    StarStar,
    #[token(".")]
    Dot,
    #[token("&")]
    Ampersand,
    #[token("|")]
    Pipe,
    #[token("^")]
    Caret,
    #[token("~")]
    Tilde,
    #[token("<<")]
    ShiftLeft,
    #[token(">>")]
    ShiftRight,
    #[token("!")]
    Bang,
    #[token("&&")]
    AmpersandAmpersand,
    #[token("||")]
    PipePipe,
    #[token("??")]
    QuestionQuestion,
    #[token("|>")]
    PipeArrow,
    #[token("++")]
    PlusPlus,
    #[token("--")]
    MinusMinus,

    #[token("==")]
    EqualsEquals,
    #[token("!=")]
    BangEquals,
    #[token("===")]
    EqualsEqualsEquals,
    #[token("!==")]
    BangEqualsEquals,
    #[token("<")]
    LessThan,
    #[token("<=")]
    LessThanEquals,
    #[token(">")]
    GreaterThan,
    #[token(">=")]
    GreaterThanEquals,
    #[token("<=>")]
    Spaceship,

    // Assignment operators, `Equals` through `CoalesceEquals`.
    #[token("=")]
    Equals,
    #[token("+=")]
    PlusEquals,
    #[token("-=")]
    MinusEquals,
    #[token("*=")]
    StarEquals,
    #[token("/=")]
    SlashEquals,
    #[token("%=")]
    PercentEquals,
    #[token("**=")]
    StarStarEquals,
    #[token(".=")]
    DotEquals,
    #[token("&=")]
    AmpersandEquals,
    #[token("|=")]
    PipeEquals,
    #[token("^=")]
    CaretEquals,
    #[token("<<=")]
    ShiftLeftEquals,
    #[token(">>=")]
    ShiftRightEquals,
    #[token("??=")]
    CoalesceEquals,

    /// `<?php` or `<?=`.
    OpenTag,
    #[token("?>")]
    CloseTag,
    InlineHtml,
    /// Raw bytes following `__halt_compiler();`
    HaltCompilerData,
    /// A single character no other rule accepts.
    BadCharacter,
    /// An unterminated string, heredoc or comment up to the resync point.
    Error,
    Eof,
}

/// Keyword spellings. Lookup ignores ASCII case, so the magic constants are
/// listed in their conventional upper case.
const KEYWORDS: &[(&str, TokenKind)] = &[
    ("if", TokenKind::If),
    ("else", TokenKind::Else),
    ("elseif", TokenKind::ElseIf),
    ("endif", TokenKind::EndIf),
    ("switch", TokenKind::Switch),
    ("case", TokenKind::Case),
    ("default", TokenKind::Default),
    ("endswitch", TokenKind::EndSwitch),
    ("match", TokenKind::Match_),
    ("while", TokenKind::While),
    ("endwhile", TokenKind::EndWhile),
    ("do", TokenKind::Do),
    ("for", TokenKind::For),
    ("endfor", TokenKind::EndFor),
    ("foreach", TokenKind::Foreach),
    ("endforeach", TokenKind::EndForeach),
    ("as", TokenKind::As),
    ("break", TokenKind::Break),
    ("continue", TokenKind::Continue),
    ("goto", TokenKind::Goto),
    ("return", TokenKind::Return),
    ("yield", TokenKind::Yield_),
    ("from", TokenKind::From),
    ("throw", TokenKind::Throw),
    ("try", TokenKind::Try),
    ("catch", TokenKind::Catch),
    ("finally", TokenKind::Finally),
    ("declare", TokenKind::Declare),
    ("enddeclare", TokenKind::EndDeclare),
    ("function", TokenKind::Function),
    ("fn", TokenKind::Fn_),
    ("class", TokenKind::Class),
    ("interface", TokenKind::Interface),
    ("trait", TokenKind::Trait),
    ("enum", TokenKind::Enum_),
    ("extends", TokenKind::Extends),
    ("implements", TokenKind::Implements),
    ("new", TokenKind::New),
    ("clone", TokenKind::Clone),
    ("instanceof", TokenKind::Instanceof),
    ("namespace", TokenKind::Namespace),
    ("use", TokenKind::Use),
    ("const", TokenKind::Const),
    ("global", TokenKind::Global),
    ("abstract", TokenKind::Abstract),
    ("final", TokenKind::Final),
    ("readonly", TokenKind::Readonly),
    ("public", TokenKind::Public),
    ("protected", TokenKind::Protected),
    ("private", TokenKind::Private),
    ("static", TokenKind::Static),
    ("self", TokenKind::Self_),
    ("parent", TokenKind::Parent_),
    ("echo", TokenKind::Echo),
    ("print", TokenKind::Print),
    ("array", TokenKind::Array),
    ("list", TokenKind::List),
    ("isset", TokenKind::Isset),
    ("empty", TokenKind::Empty),
    ("unset", TokenKind::Unset),
    ("eval", TokenKind::Eval),
    ("exit", TokenKind::Exit),
    ("die", TokenKind::Die),
    ("include", TokenKind::Include),
    ("include_once", TokenKind::IncludeOnce),
    ("require", TokenKind::Require),
    ("require_once", TokenKind::RequireOnce),
    ("true", TokenKind::True),
    ("false", TokenKind::False),
    ("null", TokenKind::Null),
    ("and", TokenKind::And),
    ("or", TokenKind::Or),
    ("xor", TokenKind::Xor),
    ("__CLASS__", TokenKind::MagicClass),
    ("__DIR__", TokenKind::MagicDir),
    ("__FILE__", TokenKind::MagicFile),
    ("__FUNCTION__", TokenKind::MagicFunction),
    ("__LINE__", TokenKind::MagicLine),
    ("__METHOD__", TokenKind::MagicMethod),
    ("__NAMESPACE__", TokenKind::MagicNamespace),
    ("__TRAIT__", TokenKind::MagicTrait),
    ("__PROPERTY__", TokenKind::MagicProperty),
    ("__halt_compiler", TokenKind::HaltCompiler),
];

const PUNCTUATION: &[(&str, TokenKind)] = &[
    ("(", TokenKind::LeftParen),
    (")", TokenKind::RightParen),
    ("[", TokenKind::LeftBracket),
    ("]", TokenKind::RightBracket),
    ("{", TokenKind::LeftBrace),
    ("}", TokenKind::RightBrace),
    (";", TokenKind::Semicolon),
    (",", TokenKind::Comma),
    ("\\", TokenKind::Backslash),
    ("#[", TokenKind::HashBracket),
    ("$", TokenKind::Dollar),
    ("@", TokenKind::At),
    ("...", TokenKind::Ellipsis),
    ("->", TokenKind::Arrow),
    ("?->", TokenKind::NullsafeArrow),
    ("::", TokenKind::DoubleColon),
    ("=>", TokenKind::FatArrow),
    ("?", TokenKind::Question),
    (":", TokenKind::Colon),
    ("+", TokenKind::Plus),
    ("-", TokenKind::Minus),
    ("*", TokenKind::Star),
    ("/", TokenKind::Slash),
    ("%", TokenKind::Percent),
    ("**", TokenKind::StarStar),
    (".", TokenKind::Dot),
    ("&", TokenKind::Ampersand),
    ("|", TokenKind::Pipe),
    ("^", TokenKind::Caret),
    ("~", TokenKind::Tilde),
    ("<<", TokenKind::ShiftLeft),
    (">>", TokenKind::ShiftRight),
    ("!", TokenKind::Bang),
    ("&&", TokenKind::AmpersandAmpersand),
    ("||", TokenKind::PipePipe),
    ("??", TokenKind::QuestionQuestion),
    ("|>", TokenKind::PipeArrow),
    ("++", TokenKind::PlusPlus),
    ("--", TokenKind::MinusMinus),
    ("==", TokenKind::EqualsEquals),
    ("!=", TokenKind::BangEquals),
    ("===", TokenKind::EqualsEqualsEquals),
    ("!==", TokenKind::BangEqualsEquals),
    ("<", TokenKind::LessThan),
    ("<=", TokenKind::LessThanEquals),
    (">", TokenKind::GreaterThan),
    (">=", TokenKind::GreaterThanEquals),
    ("<=>", TokenKind::Spaceship),
    ("=", TokenKind::Equals),
    ("+=", TokenKind::PlusEquals),
    ("-=", TokenKind::MinusEquals),
    ("*=", TokenKind::StarEquals),
    ("/=", TokenKind::SlashEquals),
    ("%=", TokenKind::PercentEquals),
    ("**=", TokenKind::StarStarEquals),
    (".=", TokenKind::DotEquals),
    ("&=", TokenKind::AmpersandEquals),
    ("|=", TokenKind::PipeEquals),
    ("^=", TokenKind::CaretEquals),
    ("<<=", TokenKind::ShiftLeftEquals),
    (">>=", TokenKind::ShiftRightEquals),
    ("??=", TokenKind::CoalesceEquals),
    ("<?php", TokenKind::OpenTag),
    ("?>", TokenKind::CloseTag),
];

/// Keyword for an identifier, ignoring ASCII case as PHP does.
pub fn resolve_keyword(text: &str) -> Option<TokenKind> {
    KEYWORDS
        .iter()
        .find(|(spelling, _)| spelling.eq_ignore_ascii_case(text))
        .map(|&(_, kind)| kind)
}

impl TokenKind {
    /// Whitespace and comments. These never reach the parser.
    pub fn is_trivia(&self) -> bool {
        self.is_comment() || matches!(self, TokenKind::Whitespace | TokenKind::Shebang)
    }

    pub fn is_comment(&self) -> bool {
        matches!(
            self,
            TokenKind::LineComment | TokenKind::BlockComment | TokenKind::DocComment
        )
    }

    pub fn is_numeric_literal(&self) -> bool {
        (TokenKind::IntLiteral..=TokenKind::FloatLiteral).contains(self)
    }

    /// Reserved words. The lexer only produces these from identifier text.
    pub fn is_keyword(&self) -> bool {
        (TokenKind::If..=TokenKind::HaltCompiler).contains(self)
    }

    /// Keywords that may still name a member, constant or named argument,
    /// as in `$obj->list()` or `Foo::DEFAULT`.
    pub fn is_semi_reserved(&self) -> bool {
        self.is_keyword() && *self != TokenKind::HaltCompiler
    }

    pub fn is_assignment_op(&self) -> bool {
        (TokenKind::Equals..=TokenKind::CoalesceEquals).contains(self)
    }

    /// Source text of a keyword or punctuation token.
    pub fn fixed_text(&self) -> Option<&'static str> {
        let table = if self.is_keyword() { KEYWORDS } else { PUNCTUATION };
        table
            .iter()
            .find(|(_, kind)| kind == self)
            .map(|&(spelling, _)| spelling)
    }

    fn category(&self) -> &'static str {
        match self {
            TokenKind::Whitespace => "whitespace",
            TokenKind::LineComment | TokenKind::BlockComment => "comment",
            TokenKind::DocComment => "doc comment",
            TokenKind::Shebang => "shebang line",
            TokenKind::IntLiteral => "integer",
            TokenKind::HexIntLiteral => "hex integer",
            TokenKind::BinIntLiteral => "binary integer",
            TokenKind::OctIntLiteral => "octal integer",
            TokenKind::FloatLiteral => "float",
            TokenKind::InvalidNumericLiteral => "invalid numeric literal",
            TokenKind::SingleQuotedString | TokenKind::DoubleQuotedString => "string",
            TokenKind::BacktickString => "backtick string",
            TokenKind::Heredoc => "heredoc",
            TokenKind::Nowdoc => "nowdoc",
            TokenKind::Variable => "variable",
            TokenKind::Identifier => "identifier",
            TokenKind::InlineHtml => "inline HTML",
            TokenKind::HaltCompilerData => "__halt_compiler data",
            TokenKind::BadCharacter => "unexpected character",
            TokenKind::Eof => "end of file",
            _ => "invalid token",
        }
    }
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.fixed_text() {
            Some(text) => write!(f, "'{text}'"),
            None => f.write_str(self.category()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn significant(source: &str) -> Vec<(TokenKind, &str)> {
        let mut lex = TokenKind::lexer(source);
        let mut out = Vec::new();
        while let Some(Ok(kind)) = lex.next() {
            if kind != TokenKind::Whitespace {
                out.push((kind, lex.slice()));
            }
        }
        out
    }

    #[test]
    fn keywords_ignore_case() {
        assert_eq!(resolve_keyword("foreach"), Some(TokenKind::Foreach));
        assert_eq!(resolve_keyword("ForEach"), Some(TokenKind::Foreach));
        assert_eq!(resolve_keyword("__class__"), Some(TokenKind::MagicClass));
        assert_eq!(resolve_keyword("__HALT_COMPILER"), Some(TokenKind::HaltCompiler));
        assert_eq!(resolve_keyword("foreachx"), None);
        assert_eq!(resolve_keyword("Closure"), None);
    }

    #[test]
    fn every_keyword_is_in_the_keyword_range() {
        for &(spelling, kind) in KEYWORDS {
            assert!(kind.is_keyword(), "{spelling}");
            assert_eq!(kind.fixed_text(), Some(spelling));
        }
        assert!(!TokenKind::HaltCompiler.is_semi_reserved());
        assert!(TokenKind::List.is_semi_reserved());
        assert!(!TokenKind::Identifier.is_keyword());
        assert!(!TokenKind::LeftParen.is_keyword());
    }

    #[test]
    fn punctuation_table_agrees_with_logos() {
        for &(spelling, kind) in PUNCTUATION {
            if kind == TokenKind::OpenTag {
                continue;
            }
            assert_eq!(significant(spelling), vec![(kind, spelling)]);
        }
    }

    #[test]
    fn assignment_range() {
        assert!(TokenKind::Equals.is_assignment_op());
        assert!(TokenKind::CoalesceEquals.is_assignment_op());
        assert!(!TokenKind::EqualsEquals.is_assignment_op());
        assert!(!TokenKind::FatArrow.is_assignment_op());
    }

    #[test]
    fn display_quotes_fixed_text() {
        assert_eq!(TokenKind::LeftBrace.to_string(), "'{'");
        assert_eq!(TokenKind::Fn_.to_string(), "'fn'");
        assert_eq!(TokenKind::Variable.to_string(), "variable");
        assert_eq!(TokenKind::Eof.to_string(), "end of file");
    }

    #[test]
    fn numbers() {
        assert_eq!(
            significant("7 0x1F 0b11 0755 0o755 1_000 2.5 .5 6e23 1.5E-3"),
            vec![
                (TokenKind::IntLiteral, "7"),
                (TokenKind::HexIntLiteral, "0x1F"),
                (TokenKind::BinIntLiteral, "0b11"),
                (TokenKind::OctIntLiteral, "0755"),
                (TokenKind::OctIntLiteral, "0o755"),
                (TokenKind::IntLiteral, "1_000"),
                (TokenKind::FloatLiteral, "2.5"),
                (TokenKind::FloatLiteral, ".5"),
                (TokenKind::FloatLiteral, "6e23"),
                (TokenKind::FloatLiteral, "1.5E-3"),
            ]
        );
        assert!(significant("1.5").iter().all(|(kind, _)| kind.is_numeric_literal()));
    }

    #[test]
    fn number_grammar() {
        let cases: &[(&str, Option<(TokenKind, usize)>)] = &[
            ("42;", Some((TokenKind::IntLiteral, 2))),
            ("1_000", Some((TokenKind::IntLiteral, 5))),
            ("1e", Some((TokenKind::IntLiteral, 1))),
            ("1e+", Some((TokenKind::IntLiteral, 1))),
            ("1e-3", Some((TokenKind::FloatLiteral, 4))),
            ("1.e3", Some((TokenKind::FloatLiteral, 4))),
            ("7.", Some((TokenKind::FloatLiteral, 2))),
            (".5)", Some((TokenKind::FloatLiteral, 2))),
            ("0755", Some((TokenKind::OctIntLiteral, 4))),
            ("08", Some((TokenKind::InvalidNumericLiteral, 2))),
            ("0x", Some((TokenKind::InvalidNumericLiteral, 2))),
            ("0xfF_0", Some((TokenKind::HexIntLiteral, 6))),
            ("0b", Some((TokenKind::InvalidNumericLiteral, 2))),
            ("0b012", Some((TokenKind::BinIntLiteral, 4))),
            ("0o", Some((TokenKind::InvalidNumericLiteral, 2))),
            ("0O17", Some((TokenKind::OctIntLiteral, 4))),
            ("1__0", Some((TokenKind::IntLiteral, 1))),
            (".", None),
            ("x1", None),
        ];
        for &(input, expected) in cases {
            assert_eq!(scan_number(input.as_bytes()), expected, "{input}");
        }
    }

    #[test]
    fn strings_and_variables() {
        assert_eq!(
            significant(r#"$row 'it\'s' b"say \"hi\"" `ls`"#),
            vec![
                (TokenKind::Variable, "$row"),
                (TokenKind::SingleQuotedString, r"'it\'s'"),
                (TokenKind::DoubleQuotedString, r#"b"say \"hi\"""#),
                (TokenKind::BacktickString, "`ls`"),
            ]
        );
    }

    #[test]
    fn comments_stop_at_close_tag() {
        assert_eq!(
            significant("1 // a\n/* b */# c ?>"),
            vec![
                (TokenKind::IntLiteral, "1"),
                (TokenKind::LineComment, "// a"),
                (TokenKind::BlockComment, "/* b */"),
                (TokenKind::LineComment, "# c "),
                (TokenKind::CloseTag, "?>"),
            ]
        );
    }

    #[test]
    fn attribute_opener_is_not_a_comment() {
        assert_eq!(TokenKind::lexer("#[Pure]").next(), Some(Ok(TokenKind::HashBracket)));
    }

    #[test]
    fn unterminated_bodies_fail() {
        assert_eq!(TokenKind::lexer("'open").next(), Some(Err(())));
        assert_eq!(TokenKind::lexer("\"open").next(), Some(Err(())));
        assert_eq!(TokenKind::lexer("/* open").next(), Some(Err(())));
    }

    #[test]
    fn braces_inside_interpolation_hide_quotes() {
        let source = r#""x {$m["k"]} ${a["b"]} y";"#;
        let mut lex = TokenKind::lexer(source);
        assert_eq!(lex.next(), Some(Ok(TokenKind::DoubleQuotedString)));
        assert_eq!(lex.slice(), r#""x {$m["k"]} ${a["b"]} y""#);
    }

    #[test]
    fn line_comment_lengths() {
        assert_eq!(line_comment_len(b" a ? b\nrest"), 6);
        assert_eq!(line_comment_len(b" a ?> b"), 3);
        assert_eq!(line_comment_len(b" x\r\n"), 2);
        assert_eq!(line_comment_len(b" tail"), 5);
    }

    #[test]
    fn non_ascii_names() {
        assert_eq!(
            significant("$naïve 日本"),
            vec![(TokenKind::Variable, "$naïve"), (TokenKind::Identifier, "日本")]
        );
    }
}
