//! Expressions: a Pratt loop over the table in `precedence`, with atoms,
//! postfix chains and the function-like forms in submodules.

mod atom;
mod collections;
mod functions;
mod literal;
mod postfix;

use php_ast::{
    AssignExpr, AssignOp, BinaryExpr, Expr, ExprKind, NullCoalesceExpr, TernaryExpr, UnaryExpr,
};
use php_lexer::TokenKind;

use crate::parser::Parser;
use crate::precedence::{self, Infix, Operator, ACCESS_BP, ASSIGNMENT_BP, POSTFIX_BP, TERNARY_BP};

impl<'src> Parser<'src> {
    pub(crate) fn parse_expr(&mut self) -> Expr {
        self.parse_expr_bp(0)
    }

    /// An expression whose operators all bind at least as tightly as
    /// `min_bp`.
    pub(crate) fn parse_expr_bp(&mut self, min_bp: u8) -> Expr {
        self.nested(Expr::error, |p| {
            let lhs = p.parse_atom();
            p.continue_expr(lhs, min_bp)
        })
    }

    /// Applies postfix and infix operators to an already parsed `lhs`.
    /// Every fold nests the tree one level deeper on the left, so each one
    /// is charged against the nesting budget.
    pub(crate) fn continue_expr(&mut self, mut lhs: Expr, min_bp: u8) -> Expr {
        let outer = self.nesting;
        loop {
            if self.at_access() {
                if ACCESS_BP < min_bp || !self.deepen() {
                    break;
                }
                lhs = self.access(lhs);
                continue;
            }

            let kind = self.kind();
            if let Some(op) = precedence::postfix(kind) {
                if POSTFIX_BP < min_bp || !self.deepen() {
                    break;
                }
                self.bump();
                let span = self.span_from(lhs.span.start);
                let operand = Box::new(lhs);
                lhs = Expr::new(ExprKind::Unary(UnaryExpr { op, operand }), span);
                continue;
            }

            let Some(operator) = precedence::infix(kind) else {
                break;
            };
            // `!$a = f()` assigns before negating, whatever the context.
            let assigns_to_lhs = matches!(operator.op, Infix::Assign(_)) && is_assignable(&lhs);
            if operator.left < min_bp && !assigns_to_lhs || !self.deepen() {
                break;
            }
            self.bump();
            lhs = self.infix(lhs, operator);
        }
        self.nesting = outer;
        lhs
    }

    fn infix(&mut self, lhs: Expr, operator: Operator) -> Expr {
        let start = lhs.span.start;
        let left = Box::new(lhs);
        let kind = match operator.op {
            Infix::Binary(op) => {
                let right = Box::new(self.parse_expr_bp(operator.right));
                ExprKind::Binary(BinaryExpr { left, op, right })
            }
            Infix::Coalesce => {
                let right = Box::new(self.parse_expr_bp(operator.right));
                ExprKind::NullCoalesce(NullCoalesceExpr { left, right })
            }
            Infix::Assign(op) => {
                let by_ref = op == AssignOp::Assign && self.eat(TokenKind::Ampersand).is_some();
                let value = Box::new(self.parse_expr_bp(ASSIGNMENT_BP));
                ExprKind::Assign(AssignExpr {
                    target: left,
                    op,
                    value,
                    by_ref,
                })
            }
            Infix::Ternary => {
                let then_expr = if self.eat(TokenKind::Colon).is_some() {
                    None
                } else {
                    let then_expr = self.parse_expr();
                    self.expect(TokenKind::Colon);
                    Some(Box::new(then_expr))
                };
                let else_expr = Box::new(self.parse_expr_bp(TERNARY_BP + 1));
                ExprKind::Ternary(TernaryExpr {
                    condition: left,
                    then_expr,
                    else_expr,
                })
            }
        };
        Expr::new(kind, self.span_from(start))
    }
}

fn is_assignable(expr: &Expr) -> bool {
    matches!(
        expr.kind,
        ExprKind::Variable(_)
            | ExprKind::VariableVariable(_)
            | ExprKind::ArrayAccess(_)
            | ExprKind::PropertyAccess(_)
            | ExprKind::StaticPropertyAccess(_)
            | ExprKind::StaticPropertyAccessDynamic { .. }
    )
}
