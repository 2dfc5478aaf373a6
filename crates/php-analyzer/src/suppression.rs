//! Inline suppression markers.
//!
//! `// NOSONAR` silences every check on the comment's line. A doc comment
//! carrying `@SuppressWarnings("key")` or `@SuppressWarnings({"a", "b"})`
//! silences the named checks on every line of the declaration it documents.
//! The map only answers lookups; deciding what to drop is the caller's job.

use std::collections::HashMap;

use php_ast::visitor::{self, Visitor};
use php_ast::{ClassMember, LineIndex, Program, Span, Stmt};
use php_lexer::{Token, TokenKind};
use serde::Serialize;

const NOSONAR: &str = "NOSONAR";
const SUPPRESS_WARNINGS: &str = "@SuppressWarnings";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Suppression {
    /// `NOSONAR`: every check.
    All,
    /// One check key from `@SuppressWarnings`.
    Check(String),
}

impl Suppression {
    pub fn covers(&self, key: &str) -> bool {
        match self {
            Suppression::All => true,
            Suppression::Check(suppressed) => {
                let suppressed = suppressed.strip_prefix("php:").unwrap_or(suppressed);
                suppressed.eq_ignore_ascii_case(key)
            }
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SuppressionMap {
    lines: HashMap<u32, Vec<Suppression>>,
}

impl SuppressionMap {
    pub fn build(source: &str, tokens: &[Token], program: &Program, lines: &LineIndex) -> Self {
        let mut map = SuppressionMap::default();
        let mut declarations: Option<HashMap<u32, Span>> = None;

        for (index, token) in tokens.iter().enumerate() {
            let text = token.text(source);
            match token.kind {
                TokenKind::LineComment | TokenKind::BlockComment if has_nosonar(text) => {
                    map.add(lines.line(token.span.start), Suppression::All);
                }
                TokenKind::DocComment => {
                    let keys = suppressed_keys(text);
                    if keys.is_empty() {
                        continue;
                    }
                    let declarations = declarations.get_or_insert_with(|| declaration_spans(program));
                    let target = tokens[index + 1..]
                        .iter()
                        .find(|t| !t.is_trivia())
                        .and_then(|next| declarations.get(&next.span.start))
                        .copied()
                        .unwrap_or(token.span);
                    for line in lines.lines(target) {
                        for key in &keys {
                            map.add(line, Suppression::Check(key.clone()));
                        }
                    }
                }
                _ => {}
            }
        }
        map
    }

    fn add(&mut self, line: u32, suppression: Suppression) {
        let entry = self.lines.entry(line).or_default();
        if !entry.contains(&suppression) {
            entry.push(suppression);
        }
    }

    pub fn directives_at(&self, line: u32) -> &[Suppression] {
        self.lines.get(&line).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_suppressed(&self, line: u32, key: &str) -> bool {
        self.directives_at(line).iter().any(|s| s.covers(key))
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

fn has_nosonar(comment: &str) -> bool {
    let body = comment
        .trim_start_matches("//")
        .trim_start_matches('#')
        .trim_start_matches("/*")
        .trim_start();
    body.starts_with(NOSONAR)
}

/// Check keys named by every `@SuppressWarnings(...)` in a doc comment.
fn suppressed_keys(comment: &str) -> Vec<String> {
    let mut keys = Vec::new();
    let mut rest = comment;
    while let Some(pos) = rest.find(SUPPRESS_WARNINGS) {
        rest = &rest[pos + SUPPRESS_WARNINGS.len()..];
        let Some(args) = rest.trim_start().strip_prefix('(') else {
            continue;
        };
        let Some(close) = args.find(')') else {
            break;
        };
        keys.extend(
            args[..close]
                .split(',')
                .map(|key| key.trim().trim_matches(|c| matches!(c, '{' | '}' | '"' | '\'' | ' ')))
                .filter(|key| !key.is_empty())
                .map(str::to_string),
        );
        rest = &args[close..];
    }
    keys
}

/// Spans of statements and members keyed by start offset. When several
/// nodes start at the same offset the outermost wins.
fn declaration_spans(program: &Program) -> HashMap<u32, Span> {
    struct Collector(HashMap<u32, Span>);

    impl Collector {
        fn add(&mut self, span: Span) {
            let entry = self.0.entry(span.start).or_insert(span);
            if span.end > entry.end {
                *entry = span;
            }
        }
    }

    impl Visitor for Collector {
        fn visit_stmt(&mut self, stmt: &Stmt) {
            self.add(stmt.span);
            visitor::walk_stmt(self, stmt);
        }

        fn visit_class_member(&mut self, member: &ClassMember) {
            self.add(member.span);
            visitor::walk_class_member(self, member);
        }
    }

    let mut collector = Collector(HashMap::new());
    collector.visit_program(program);
    collector.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(source: &str) -> SuppressionMap {
        let result = php_parser::parse(source);
        SuppressionMap::build(source, &result.tokens, &result.program, &LineIndex::new(source))
    }

    #[test]
    fn test_nosonar_covers_its_line_only() {
        let map = build("<?php\n$a = 1; // NOSONAR legacy\n$b = 2;\n# NOSONAR\n");
        assert_eq!(map.directives_at(2), &[Suppression::All]);
        assert!(map.is_suppressed(2, "anything"));
        assert!(!map.is_suppressed(3, "anything"));
        assert!(map.is_suppressed(4, "anything"));
    }

    #[test]
    fn test_plain_comment_is_not_a_marker() {
        let map = build("<?php\n// remove the NOSONAR marker later\n");
        assert!(map.is_empty());
    }

    #[test]
    fn test_suppress_warnings_spans_following_declaration() {
        let source = "<?php\n/**\n * @SuppressWarnings(\"php:undefined-variable\")\n */\nfunction f() {\n  echo $x;\n}\necho $y;\n";
        let map = build(source);
        assert!(map.is_suppressed(5, "undefined-variable"));
        assert!(map.is_suppressed(6, "undefined-variable"));
        assert!(map.is_suppressed(7, "undefined-variable"));
        assert!(!map.is_suppressed(6, "unreachable-code"));
        assert!(!map.is_suppressed(8, "undefined-variable"));
    }

    #[test]
    fn test_suppress_warnings_list_on_method() {
        let source = "<?php\nclass A {\n    /** @SuppressWarnings({\"a\", \"b\"}) */\n    public function m() {\n        return 1;\n    }\n}\n";
        let map = build(source);
        assert!(map.is_suppressed(4, "a"));
        assert!(map.is_suppressed(5, "b"));
        assert!(!map.is_suppressed(2, "a"));
    }

    #[test]
    fn test_key_extraction() {
        assert_eq!(suppressed_keys("/** @SuppressWarnings(\"x\") */"), vec!["x"]);
        assert_eq!(
            suppressed_keys("/** @SuppressWarnings({\"x\", 'y'}) @SuppressWarnings(\"z\") */"),
            vec!["x", "y", "z"]
        );
        assert!(suppressed_keys("/** @SuppressWarnings */").is_empty());
    }
}
