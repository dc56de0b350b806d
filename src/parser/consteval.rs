//! Integer constant expression evaluation
//!
//! Used for enumerator discriminants. Arithmetic is checked: overflow,
//! division by zero and anything that is not an integer constant expression
//! evaluate to `None` rather than a value.

use super::ast::{BinaryOp, CastStyle, Expr, ExprKind, UnaryOp};
use super::scope::TypeNameTable;
use rustc_hash::FxHashMap;

/// Known enumerator values, keyed by name.
pub type ConstEnv = FxHashMap<String, i64>;

/// Source of enumerator values for identifiers.
pub trait ConstLookup {
    fn constant(&self, name: &str) -> Option<i64>;
}

impl ConstLookup for ConstEnv {
    fn constant(&self, name: &str) -> Option<i64> {
        self.get(name).copied()
    }
}

impl ConstLookup for TypeNameTable {
    fn constant(&self, name: &str) -> Option<i64> {
        TypeNameTable::constant(self, name)
    }
}

pub fn eval_const<E: ConstLookup + ?Sized>(expr: &Expr, env: &E) -> Option<i64> {
    match &expr.kind {
        ExprKind::IntLiteral { value, .. } => i64::try_from(*value).ok(),
        ExprKind::CharLiteral { value, .. } => Some(i64::from(*value)),
        ExprKind::BoolLiteral(b) => Some(i64::from(*b)),
        ExprKind::Identifier(name) => env.constant(&name.path()),
        ExprKind::Unary { op, operand } => {
            let v = eval_const(operand, env)?;
            match op {
                UnaryOp::Neg => v.checked_neg(),
                UnaryOp::Plus => Some(v),
                UnaryOp::Not => Some(i64::from(v == 0)),
                UnaryOp::BitNot => Some(!v),
                _ => None,
            }
        }
        ExprKind::Binary { op, lhs, rhs } => eval_binary(*op, lhs, rhs, env),
        ExprKind::Ternary {
            cond,
            then_expr,
            else_expr,
        } => {
            if eval_const(cond, env)? != 0 {
                eval_const(then_expr, env)
            } else {
                eval_const(else_expr, env)
            }
        }
        ExprKind::Cast { style, expr, .. } if *style != CastStyle::Dynamic => eval_const(expr, env),
        _ => None,
    }
}

fn eval_binary<E>(op: BinaryOp, lhs: &Expr, rhs: &Expr, env: &E) -> Option<i64>
where
    E: ConstLookup + ?Sized,
{
    let a = eval_const(lhs, env)?;
    // Short-circuit operators only need the right side when it matters.
    match op {
        BinaryOp::LogicalAnd if a == 0 => return Some(0),
        BinaryOp::LogicalOr if a != 0 => return Some(1),
        _ => {}
    }
    let b = eval_const(rhs, env)?;
    match op {
        BinaryOp::Add => a.checked_add(b),
        BinaryOp::Sub => a.checked_sub(b),
        BinaryOp::Mul => a.checked_mul(b),
        BinaryOp::Div => a.checked_div(b),
        BinaryOp::Mod => a.checked_rem(b),
        BinaryOp::Shl => u32::try_from(b).ok().and_then(|s| a.checked_shl(s)),
        BinaryOp::Shr => u32::try_from(b).ok().and_then(|s| a.checked_shr(s)),
        BinaryOp::Lt => Some(i64::from(a < b)),
        BinaryOp::Le => Some(i64::from(a <= b)),
        BinaryOp::Gt => Some(i64::from(a > b)),
        BinaryOp::Ge => Some(i64::from(a >= b)),
        BinaryOp::Eq => Some(i64::from(a == b)),
        BinaryOp::Ne => Some(i64::from(a != b)),
        BinaryOp::BitAnd => Some(a & b),
        BinaryOp::BitXor => Some(a ^ b),
        BinaryOp::BitOr => Some(a | b),
        BinaryOp::LogicalAnd | BinaryOp::LogicalOr => Some(i64::from(b != 0)),
        BinaryOp::Comma => Some(b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ast::{QualifiedName, Span};

    fn int(value: u64) -> Expr {
        Expr::new(
            ExprKind::IntLiteral {
                value,
                text: value.to_string(),
            },
            Span::default(),
        )
    }

    fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Expr {
        Expr::new(
            ExprKind::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            },
            Span::default(),
        )
    }

    #[test]
    fn test_arithmetic() {
        let env = ConstEnv::default();
        let e = binary(BinaryOp::Shl, int(1), binary(BinaryOp::Add, int(2), int(3)));
        assert_eq!(eval_const(&e, &env), Some(32));
    }

    #[test]
    fn test_identifiers_from_env() {
        let mut env = ConstEnv::default();
        env.insert("RED".to_string(), 4);
        let red = Expr::new(ExprKind::Identifier(QualifiedName::simple("RED")), Span::default());
        assert_eq!(eval_const(&binary(BinaryOp::Mul, red, int(2)), &env), Some(8));
    }

    #[test]
    fn test_division_by_zero_is_not_constant() {
        let env = ConstEnv::default();
        assert_eq!(eval_const(&binary(BinaryOp::Div, int(1), int(0)), &env), None);
    }
}
