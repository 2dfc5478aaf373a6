//! Operator table for the Pratt loop in `expr`.
//!
//! Binding powers, loosest first: `or`, `xor`, `and`, assignment, `? :`,
//! `??`, `||`, `&&`, `|`, `^`, `&`, equality, comparison and `instanceof`,
//! `|>`, `.`, shifts, additive, multiplicative, `**`, prefix operators,
//! postfix `++`/`--`, then member access and calls.

use php_ast::{AssignOp, BinaryOp, UnaryOp};
use php_lexer::TokenKind;

pub(crate) const ASSIGNMENT_BP: u8 = 8;
pub(crate) const TERNARY_BP: u8 = 10;
pub(crate) const PREFIX_BP: u8 = 41;
pub(crate) const POSTFIX_BP: u8 = 43;
pub(crate) const ACCESS_BP: u8 = 44;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Infix {
    Binary(BinaryOp),
    Coalesce,
    Assign(AssignOp),
    Ternary,
}

/// `left` is compared against the caller's minimum; the right operand is
/// parsed at `right`. `left > right` makes an operator right-associative.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Operator {
    pub left: u8,
    pub right: u8,
    pub op: Infix,
}

const fn left(bp: u8, op: Infix) -> Operator {
    Operator {
        left: bp,
        right: bp + 1,
        op,
    }
}

const fn right(bp: u8, op: Infix) -> Operator {
    Operator {
        left: bp,
        right: bp - 1,
        op,
    }
}

pub(crate) fn infix(kind: TokenKind) -> Option<Operator> {
    use BinaryOp as B;
    use Infix::{Assign, Binary};

    let operator = match kind {
        TokenKind::Or => left(1, Binary(B::LogicalOr)),
        TokenKind::Xor => left(3, Binary(B::LogicalXor)),
        TokenKind::And => left(5, Binary(B::LogicalAnd)),
        TokenKind::Question => left(TERNARY_BP, Infix::Ternary),
        TokenKind::QuestionQuestion => right(14, Infix::Coalesce),
        TokenKind::PipePipe => left(15, Binary(B::BooleanOr)),
        TokenKind::AmpersandAmpersand => left(17, Binary(B::BooleanAnd)),
        TokenKind::Pipe => left(19, Binary(B::BitwiseOr)),
        TokenKind::Caret => left(21, Binary(B::BitwiseXor)),
        TokenKind::Ampersand => left(23, Binary(B::BitwiseAnd)),
        TokenKind::EqualsEquals => left(25, Binary(B::Equal)),
        TokenKind::BangEquals => left(25, Binary(B::NotEqual)),
        TokenKind::EqualsEqualsEquals => left(25, Binary(B::Identical)),
        TokenKind::BangEqualsEquals => left(25, Binary(B::NotIdentical)),
        TokenKind::Spaceship => left(25, Binary(B::Spaceship)),
        TokenKind::LessThan => left(27, Binary(B::Less)),
        TokenKind::GreaterThan => left(27, Binary(B::Greater)),
        TokenKind::LessThanEquals => left(27, Binary(B::LessOrEqual)),
        TokenKind::GreaterThanEquals => left(27, Binary(B::GreaterOrEqual)),
        TokenKind::Instanceof => left(27, Binary(B::Instanceof)),
        TokenKind::PipeArrow => left(29, Binary(B::Pipe)),
        TokenKind::Dot => left(31, Binary(B::Concat)),
        TokenKind::ShiftLeft => left(33, Binary(B::ShiftLeft)),
        TokenKind::ShiftRight => left(33, Binary(B::ShiftRight)),
        TokenKind::Plus => left(35, Binary(B::Add)),
        TokenKind::Minus => left(35, Binary(B::Sub)),
        TokenKind::Star => left(37, Binary(B::Mul)),
        TokenKind::Slash => left(37, Binary(B::Div)),
        TokenKind::Percent => left(37, Binary(B::Mod)),
        TokenKind::StarStar => right(40, Binary(B::Pow)),
        kind => return assign_op(kind).map(|op| Operator {
            left: ASSIGNMENT_BP,
            right: ASSIGNMENT_BP,
            op: Assign(op),
        }),
    };
    Some(operator)
}

fn assign_op(kind: TokenKind) -> Option<AssignOp> {
    let op = match kind {
        TokenKind::Equals => AssignOp::Assign,
        TokenKind::PlusEquals => AssignOp::Plus,
        TokenKind::MinusEquals => AssignOp::Minus,
        TokenKind::StarEquals => AssignOp::Mul,
        TokenKind::SlashEquals => AssignOp::Div,
        TokenKind::PercentEquals => AssignOp::Mod,
        TokenKind::StarStarEquals => AssignOp::Pow,
        TokenKind::DotEquals => AssignOp::Concat,
        TokenKind::AmpersandEquals => AssignOp::BitwiseAnd,
        TokenKind::PipeEquals => AssignOp::BitwiseOr,
        TokenKind::CaretEquals => AssignOp::BitwiseXor,
        TokenKind::ShiftLeftEquals => AssignOp::ShiftLeft,
        TokenKind::ShiftRightEquals => AssignOp::ShiftRight,
        TokenKind::CoalesceEquals => AssignOp::Coalesce,
        _ => return None,
    };
    Some(op)
}

/// Prefix operators that build a `Unary` node. `@`, casts, `clone` and
/// `new` are atoms with their own handling.
pub(crate) fn prefix(kind: TokenKind) -> Option<UnaryOp> {
    match kind {
        TokenKind::Minus => Some(UnaryOp::Negate),
        TokenKind::Plus => Some(UnaryOp::Plus),
        TokenKind::Bang => Some(UnaryOp::BooleanNot),
        TokenKind::Tilde => Some(UnaryOp::BitwiseNot),
        TokenKind::PlusPlus => Some(UnaryOp::PreIncrement),
        TokenKind::MinusMinus => Some(UnaryOp::PreDecrement),
        _ => None,
    }
}

pub(crate) fn postfix(kind: TokenKind) -> Option<UnaryOp> {
    match kind {
        TokenKind::PlusPlus => Some(UnaryOp::PostIncrement),
        TokenKind::MinusMinus => Some(UnaryOp::PostDecrement),
        _ => None,
    }
}

/// Tokens that can only continue an expression, never start one.
pub(crate) fn is_binary_only(kind: TokenKind) -> bool {
    infix(kind).is_some() && prefix(kind).is_none()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bp(kind: TokenKind) -> (u8, u8) {
        let op = infix(kind).unwrap();
        (op.left, op.right)
    }

    #[test]
    fn multiplicative_binds_tighter_than_additive() {
        assert!(bp(TokenKind::Star).0 > bp(TokenKind::Plus).0);
    }

    #[test]
    fn power_is_right_associative() {
        let (l, r) = bp(TokenKind::StarStar);
        assert!(l > r);
        assert!(l > bp(TokenKind::Star).0);
    }

    #[test]
    fn coalesce_is_right_associative() {
        let (l, r) = bp(TokenKind::QuestionQuestion);
        assert!(l > r);
    }

    #[test]
    fn concat_binds_looser_than_shift() {
        assert!(bp(TokenKind::Dot).0 < bp(TokenKind::ShiftLeft).0);
        assert!(bp(TokenKind::LessThan).0 < bp(TokenKind::Dot).0);
    }

    #[test]
    fn keyword_logic_is_loosest() {
        assert!(bp(TokenKind::Or).0 < bp(TokenKind::Xor).0);
        assert!(bp(TokenKind::And).0 < ASSIGNMENT_BP);
        assert!(ASSIGNMENT_BP < TERNARY_BP);
        assert!(TERNARY_BP < bp(TokenKind::QuestionQuestion).0);
    }

    #[test]
    fn every_compound_assignment_is_an_assignment() {
        for kind in [
            TokenKind::Equals,
            TokenKind::DotEquals,
            TokenKind::CoalesceEquals,
            TokenKind::ShiftRightEquals,
        ] {
            assert!(kind.is_assignment_op());
            assert!(matches!(infix(kind).unwrap().op, Infix::Assign(_)));
        }
    }

    #[test]
    fn minus_starts_and_continues_expressions() {
        assert!(!is_binary_only(TokenKind::Minus));
        assert!(is_binary_only(TokenKind::Star));
        assert!(is_binary_only(TokenKind::Question));
    }
}
