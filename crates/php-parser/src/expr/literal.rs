use php_ast::{Expr, ExprKind, StringPart};
use php_lexer::TokenKind;

use crate::interpolation::{self, DocLayout, Quote};
use crate::parser::Parser;

impl<'src> Parser<'src> {
    pub(super) fn number(&mut self) -> Expr {
        let token = self.bump();
        let text = token.text(self.source());
        let kind = match token.kind {
            TokenKind::FloatLiteral => ExprKind::Float(text.replace('_', "").parse().unwrap_or(0.0)),
            TokenKind::HexIntLiteral => integer(&text[2..], 16),
            TokenKind::BinIntLiteral => integer(&text[2..], 2),
            TokenKind::OctIntLiteral => {
                let digits = text.strip_prefix("0o").or_else(|| text.strip_prefix("0O"));
                integer(digits.unwrap_or(&text[1..]), 8)
            }
            _ => integer(text, 10),
        };
        Expr::new(kind, token.span)
    }

    pub(super) fn string_literal(&mut self) -> Expr {
        let token = self.bump();
        let text = token.text(self.source());
        let start = token.span.start as usize;
        // `b"..."` binary prefix
        let prefix = usize::from(text.starts_with(['b', 'B']));

        let kind = match token.kind {
            TokenKind::SingleQuotedString => ExprKind::String(interpolation::unescape_single(quoted(text, prefix))),
            TokenKind::DoubleQuotedString => {
                let body = start + prefix + 1..start + prefix + quoted(text, prefix).len() + 1;
                collapse(self.interpolate(body, Quote::Double, 0))
            }
            TokenKind::BacktickString => {
                let body = start + 1..start + quoted(text, 0).len() + 1;
                ExprKind::ShellExec(self.interpolate(body, Quote::Backtick, 0))
            }
            TokenKind::Heredoc => {
                let doc = DocLayout::of(text, start);
                let parts = self.interpolate(doc.body, Quote::Heredoc, doc.indent);
                ExprKind::Heredoc { label: doc.label, parts }
            }
            _ => {
                let doc = DocLayout::of(text, start);
                let value = interpolation::dedent(&self.source()[doc.body], doc.indent);
                ExprKind::Nowdoc { label: doc.label, value }
            }
        };
        Expr::new(kind, token.span)
    }
}

/// The text between the quotes. An unterminated literal has no closing
/// quote to strip.
fn quoted(text: &str, prefix: usize) -> &str {
    let inner = &text[prefix + 1..];
    let quote = text.as_bytes()[prefix];
    match inner.as_bytes().last() {
        Some(&last) if last == quote && !inner.is_empty() => &inner[..inner.len() - 1],
        _ => inner,
    }
}

/// Decimal, hex, octal and binary integers overflow into floats as in PHP.
fn integer(digits: &str, radix: u32) -> ExprKind {
    let digits = digits.replace('_', "");
    match i64::from_str_radix(&digits, radix) {
        Ok(value) => ExprKind::Int(value),
        Err(_) => ExprKind::Float(
            digits
                .chars()
                .filter_map(|c| c.to_digit(radix))
                .fold(0.0, |acc, d| acc * f64::from(radix) + f64::from(d)),
        ),
    }
}

/// A string without interpolated parts is a plain literal.
fn collapse(parts: Vec<StringPart>) -> ExprKind {
    if parts.iter().any(|part| matches!(part, StringPart::Expr(_))) {
        return ExprKind::InterpolatedString(parts);
    }
    let mut text = String::new();
    for part in parts {
        if let StringPart::Literal(literal) = part {
            text.push_str(&literal);
        }
    }
    ExprKind::String(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integers_overflow_to_float() {
        assert!(matches!(integer("9223372036854775807", 10), ExprKind::Int(i64::MAX)));
        assert!(matches!(integer("9223372036854775808", 10), ExprKind::Float(_)));
        assert!(matches!(integer("ff", 16), ExprKind::Int(255)));
        assert!(matches!(integer("1_000", 10), ExprKind::Int(1000)));
    }

    #[test]
    fn unterminated_literal_keeps_its_text() {
        assert_eq!(quoted("'abc'", 0), "abc");
        assert_eq!(quoted("b\"x\"", 1), "x");
        assert_eq!(quoted("'abc", 0), "abc");
        assert_eq!(quoted("'", 0), "");
    }
}
