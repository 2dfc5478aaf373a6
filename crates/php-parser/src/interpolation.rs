//! String bodies: escape sequences, heredoc layout and the `$var` /
//! `{$expr}` / `${name}` interpolation forms.
//!
//! Everything works on absolute byte ranges of the file, so embedded
//! expressions get their real spans without any rebasing.

use std::ops::Range;

use php_ast::{ArrayAccessExpr, Expr, ExprKind, PropertyAccessExpr, Span, StringPart};

use crate::diagnostics::ParseError;
use crate::parser::Parser;

/// Which escapes apply to a body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Quote {
    Double,
    Backtick,
    Heredoc,
}

impl Quote {
    fn escapes(self, byte: u8) -> bool {
        match self {
            Quote::Double => byte == b'"',
            Quote::Backtick => byte == b'`',
            Quote::Heredoc => false,
        }
    }
}

/// Where the parts of a heredoc or nowdoc token sit in the file.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct DocLayout {
    pub label: String,
    /// Between the header line and the newline before the closing label.
    pub body: Range<usize>,
    /// Width of the closing label's indentation, removed from every line.
    pub indent: usize,
}

impl DocLayout {
    /// `text` is the whole token, starting at `offset` in the file.
    pub(crate) fn of(text: &str, offset: usize) -> Self {
        let header_end = text.find('\n').unwrap_or(text.len());
        let header = text[..header_end].trim_end_matches('\r');
        let label = header
            .trim_start_matches(['b', 'B'])
            .trim_start_matches("<<<")
            .trim_matches([' ', '\t'])
            .trim_matches(['"', '\''])
            .to_string();

        let body_start = (header_end + 1).min(text.len());
        let last_newline = text.rfind('\n').unwrap_or(header_end);
        let closing = &text[(last_newline + 1).min(text.len())..];
        let indent = closing.len() - closing.trim_start_matches([' ', '\t']).len();

        let body_end = if last_newline < body_start {
            body_start
        } else if text[..last_newline].ends_with('\r') {
            (last_newline - 1).max(body_start)
        } else {
            last_newline
        };
        DocLayout {
            label,
            body: offset + body_start..offset + body_end,
            indent,
        }
    }
}

/// Strips up to `indent` leading blanks from each line.
pub(crate) fn dedent(body: &str, indent: usize) -> String {
    if indent == 0 {
        return body.to_string();
    }
    let mut out = String::with_capacity(body.len());
    for (i, line) in body.split('\n').enumerate() {
        if i > 0 {
            out.push('\n');
        }
        out.push_str(strip_indent(line, indent));
    }
    out
}

fn strip_indent(line: &str, indent: usize) -> &str {
    let blanks = line
        .bytes()
        .take(indent)
        .take_while(|b| matches!(b, b' ' | b'\t'))
        .count();
    &line[blanks..]
}

/// Single-quoted strings only know `\'` and `\\`.
pub(crate) fn unescape_single(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(&next) = chars.peek() {
                if next == '\'' || next == '\\' {
                    out.push(next);
                    chars.next();
                    continue;
                }
            }
        }
        out.push(c);
    }
    out
}

fn is_label_start(byte: u8) -> bool {
    byte.is_ascii_alphabetic() || byte == b'_' || byte >= 0x80
}

fn is_label_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'_' || byte >= 0x80
}

/// Walks a string body, collecting literal text and embedded expressions.
struct Walker<'src> {
    src: &'src str,
    bytes: &'src [u8],
    pos: usize,
    end: usize,
    literal: String,
    parts: Vec<StringPart>,
}

impl<'src> Walker<'src> {
    fn byte(&self, at: usize) -> Option<u8> {
        (at < self.end).then(|| self.bytes[at])
    }

    fn label_end(&self, from: usize) -> usize {
        let mut at = from;
        while self.byte(at).is_some_and(is_label_byte) {
            at += 1;
        }
        at
    }

    fn flush(&mut self) {
        if !self.literal.is_empty() {
            self.parts.push(StringPart::Literal(std::mem::take(&mut self.literal)));
        }
    }

    fn push_expr(&mut self, expr: Expr) {
        self.flush();
        self.parts.push(StringPart::Expr(expr));
    }

    /// Copies one character of literal text.
    fn copy_char(&mut self) {
        if let Some(c) = self.src[self.pos..self.end].chars().next() {
            self.literal.push(c);
            self.pos += c.len_utf8();
        } else {
            self.pos = self.end;
        }
    }

    /// An escape sequence at `pos`, which holds the backslash.
    fn escape(&mut self, quote: Quote) {
        let Some(next) = self.byte(self.pos + 1) else {
            self.literal.push('\\');
            self.pos += 1;
            return;
        };
        let simple = match next {
            b'n' => Some('\n'),
            b't' => Some('\t'),
            b'r' => Some('\r'),
            b'v' => Some('\x0B'),
            b'e' => Some('\x1B'),
            b'f' => Some('\x0C'),
            b'\\' => Some('\\'),
            b'$' => Some('$'),
            b if quote.escapes(b) => Some(char::from(b)),
            _ => None,
        };
        if let Some(c) = simple {
            self.literal.push(c);
            self.pos += 2;
            return;
        }

        match next {
            b'x' if self.byte(self.pos + 2).is_some_and(|b| b.is_ascii_hexdigit()) => {
                let digits = self.digits(self.pos + 2, 2, 16);
                self.push_byte(&digits, 16);
            }
            b'0'..=b'7' => {
                let digits = self.digits(self.pos + 1, 3, 8);
                self.push_byte(&digits, 8);
            }
            b'u' if self.byte(self.pos + 2) == Some(b'{') => {
                let open = self.pos + 3;
                let close = self.src[open..self.end].find('}').map(|i| open + i);
                let decoded = close
                    .and_then(|close| u32::from_str_radix(&self.src[open..close], 16).ok().map(|v| (close, v)))
                    .and_then(|(close, v)| char::from_u32(v).map(|c| (close, c)));
                match decoded {
                    Some((close, c)) => {
                        self.literal.push(c);
                        self.pos = close + 1;
                    }
                    None => {
                        self.literal.push('\\');
                        self.pos += 1;
                    }
                }
            }
            _ => {
                self.literal.push('\\');
                self.pos += 1;
            }
        }
    }

    /// Up to `max` digits of `radix` from `from`; leaves `pos` after them.
    fn digits(&mut self, from: usize, max: usize, radix: u32) -> String {
        let mut at = from;
        while at < from + max && self.byte(at).is_some_and(|b| char::from(b).is_digit(radix)) {
            at += 1;
        }
        self.pos = at;
        self.src[from..at].to_string()
    }

    fn push_byte(&mut self, digits: &str, radix: u32) {
        let value = u32::from_str_radix(digits, radix).unwrap_or(0) & 0xFF;
        self.literal.push(char::from(value as u8));
    }

    /// The key of `$a[...]` inside a string: a number, a bare word or a
    /// variable, followed by `]`.
    fn simple_offset(&self, from: usize) -> Option<(Expr, usize)> {
        let (kind, end) = match self.byte(from)? {
            b'$' if self.byte(from + 1).is_some_and(is_label_start) => {
                let end = self.label_end(from + 1);
                (ExprKind::Variable(self.src[from + 1..end].to_string()), end)
            }
            b'-' | b'0'..=b'9' => {
                let digits_from = from + usize::from(self.byte(from) == Some(b'-'));
                let mut end = digits_from;
                while self.byte(end).is_some_and(|b| b.is_ascii_digit()) {
                    end += 1;
                }
                if end == digits_from {
                    return None;
                }
                let text = &self.src[from..end];
                let kind = match text.parse::<i64>() {
                    Ok(value) => ExprKind::Int(value),
                    Err(_) => ExprKind::String(text.to_string()),
                };
                (kind, end)
            }
            b if is_label_start(b) => {
                let end = self.label_end(from);
                (ExprKind::String(self.src[from..end].to_string()), end)
            }
            _ => return None,
        };
        if self.byte(end) != Some(b']') {
            return None;
        }
        Some((Expr::new(kind, span(from..end)), end))
    }

    /// Offset of the `}` closing the brace at `open`, skipping nested
    /// braces and quoted strings.
    fn matching_brace(&self, open: usize) -> Option<usize> {
        let mut depth = 0usize;
        let mut at = open;
        while at < self.end {
            match self.bytes[at] {
                b'{' => depth += 1,
                b'}' => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(at);
                    }
                }
                quote @ (b'\'' | b'"') => {
                    at += 1;
                    while at < self.end && self.bytes[at] != quote {
                        if self.bytes[at] == b'\\' {
                            at += 1;
                        }
                        at += 1;
                    }
                }
                _ => {}
            }
            at += 1;
        }
        None
    }
}

impl<'src> Parser<'src> {
    /// Splits `source[body]` into literal text and embedded expressions.
    /// `indent` blanks are removed from the start of every line.
    pub(crate) fn interpolate(&mut self, body: Range<usize>, quote: Quote, indent: usize) -> Vec<StringPart> {
        let src = self.source();
        let mut w = Walker {
            src,
            bytes: src.as_bytes(),
            pos: body.start,
            end: body.end,
            literal: String::new(),
            parts: Vec::new(),
        };
        let mut line_start = true;

        while w.pos < w.end {
            if line_start && indent > 0 {
                let line = &src[w.pos..w.end];
                w.pos += line.len() - strip_indent(line, indent).len();
                line_start = false;
                continue;
            }
            let byte = w.bytes[w.pos];
            match byte {
                b'\\' => w.escape(quote),
                b'$' if w.byte(w.pos + 1).is_some_and(is_label_start) => {
                    let expr = self.simple_interpolation(&mut w);
                    w.push_expr(expr);
                }
                b'$' if w.byte(w.pos + 1) == Some(b'{') => {
                    let expr = self.dollar_brace(&mut w);
                    w.push_expr(expr);
                }
                b'{' if w.byte(w.pos + 1) == Some(b'$') => {
                    let expr = self.braced_interpolation(&mut w);
                    w.push_expr(expr);
                }
                _ => {
                    line_start = byte == b'\n';
                    w.copy_char();
                }
            }
        }
        w.flush();
        w.parts
    }

    /// `$name`, `$name[key]`, `$name->prop`, `$name?->prop`.
    fn simple_interpolation(&mut self, w: &mut Walker<'src>) -> Expr {
        let start = w.pos;
        let name_end = w.label_end(start + 1);
        let var = Expr::new(
            ExprKind::Variable(w.src[start + 1..name_end].to_string()),
            span(start..name_end),
        );
        w.pos = name_end;

        match w.byte(name_end) {
            Some(b'[') => match w.simple_offset(name_end + 1) {
                Some((index, close)) => {
                    w.pos = close + 1;
                    let access = ArrayAccessExpr {
                        array: Box::new(var),
                        index: Some(Box::new(index)),
                    };
                    Expr::new(ExprKind::ArrayAccess(access), span(start..close + 1))
                }
                None => var,
            },
            Some(b'-' | b'?') => {
                let arrow = if w.byte(name_end) == Some(b'?') { "?->" } else { "->" };
                let prop_start = name_end + arrow.len();
                let is_access = w.src[name_end..w.end].starts_with(arrow) && w.byte(prop_start).is_some_and(is_label_start);
                if !is_access {
                    return var;
                }
                let prop_end = w.label_end(prop_start);
                w.pos = prop_end;
                let property = Expr::new(
                    ExprKind::Identifier(w.src[prop_start..prop_end].to_string()),
                    span(prop_start..prop_end),
                );
                let access = PropertyAccessExpr {
                    object: Box::new(var),
                    property: Box::new(property),
                    nullsafe: arrow == "?->",
                };
                Expr::new(ExprKind::PropertyAccess(access), span(start..prop_end))
            }
            _ => var,
        }
    }

    /// `{$expr}`: everything between the braces is a full expression.
    fn braced_interpolation(&mut self, w: &mut Walker<'src>) -> Expr {
        let open = w.pos;
        let close = self.closing_brace(w, open);
        w.pos = (close + 1).min(w.end);
        self.embedded_expr(open + 1..close)
    }

    /// `${name}`, `${name[expr]}` and the variable-variable `${expr}`.
    fn dollar_brace(&mut self, w: &mut Walker<'src>) -> Expr {
        let start = w.pos;
        let close = self.closing_brace(w, start + 1);
        w.pos = (close + 1).min(w.end);
        let inner = self.embedded_expr(start + 2..close);
        let whole = span(start..w.pos);
        match inner.kind {
            ExprKind::Identifier(name) => Expr::new(ExprKind::Variable(name), inner.span),
            ExprKind::ArrayAccess(mut access) => {
                if let ExprKind::Identifier(name) = &access.array.kind {
                    access.array = Box::new(Expr::new(ExprKind::Variable(name.clone()), access.array.span));
                }
                Expr::new(ExprKind::ArrayAccess(access), whole)
            }
            kind => Expr::new(ExprKind::VariableVariable(Box::new(Expr::new(kind, inner.span))), whole),
        }
    }

    fn closing_brace(&mut self, w: &Walker<'src>, open: usize) -> usize {
        match w.matching_brace(open) {
            Some(close) => close,
            None => {
                self.error(ParseError::UnclosedDelimiter {
                    delimiter: "'}'".to_string(),
                    opened_at: span(open..open + 1),
                    span: span(w.end..w.end),
                });
                w.end
            }
        }
    }

    fn embedded_expr(&mut self, range: Range<usize>) -> Expr {
        let mut inner = Parser::for_range(self, range);
        let expr = inner.parse_expr();
        if !inner.at_eof() {
            inner.error(ParseError::Unexpected {
                found: inner.kind(),
                span: inner.span(),
            });
        }
        self.absorb(inner);
        expr
    }
}

fn span(range: Range<usize>) -> Span {
    Span::new(range.start as u32, range.end as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heredoc_layout_finds_body_and_indent() {
        let text = "<<<EOT\n    a\n      b\n    EOT";
        let doc = DocLayout::of(text, 10);
        assert_eq!(doc.label, "EOT");
        assert_eq!(doc.indent, 4);
        assert_eq!(&text[doc.body.start - 10..doc.body.end - 10], "    a\n      b");
        assert_eq!(dedent("    a\n      b", doc.indent), "a\n  b");
    }

    #[test]
    fn quoted_labels_and_empty_bodies() {
        let doc = DocLayout::of("<<<'RAW'\nRAW", 0);
        assert_eq!(doc.label, "RAW");
        assert!(doc.body.is_empty());

        let doc = DocLayout::of("b<<< \"X\"\r\nline\r\nX", 0);
        assert_eq!(doc.label, "X");
        assert_eq!(doc.body, 10..14);
    }

    #[test]
    fn single_quotes_keep_unknown_escapes() {
        assert_eq!(unescape_single(r"it\'s"), "it's");
        assert_eq!(unescape_single(r"a\\b"), r"a\b");
        assert_eq!(unescape_single(r"a\nb"), r"a\nb");
    }
}
