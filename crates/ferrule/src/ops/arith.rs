//! Scalar arithmetic for compound assignment

use super::CompoundOp;
use crate::cow::ensure_unique;
use crate::error::{Result, RuntimeError};
use crate::value::{Displaced, FloatNode, IntegerNode, Node, Value};

/// True if the value holds a float, boxed or not.
pub(crate) fn is_float(value: &Value) -> bool {
    matches!(value, Value::Float(_) | Value::Node(Node::Float(_)))
}

/// Integer form of a compound operator. Wraps on overflow.
pub(crate) fn int_op(op: CompoundOp, a: i64, b: i64) -> Result<i64> {
    Ok(match op {
        CompoundOp::Add => a.wrapping_add(b),
        CompoundOp::Sub => a.wrapping_sub(b),
        CompoundOp::Mul => a.wrapping_mul(b),
        CompoundOp::Div => {
            if b == 0 {
                return Err(RuntimeError::DivisionByZero { op: "division" });
            }
            a.wrapping_div(b)
        }
        CompoundOp::Rem => {
            if b == 0 {
                return Err(RuntimeError::DivisionByZero { op: "modulo" });
            }
            a.wrapping_rem(b)
        }
        CompoundOp::BitAnd => a & b,
        CompoundOp::BitOr => a | b,
        CompoundOp::BitXor => a ^ b,
        CompoundOp::Shl => {
            if (0..64).contains(&b) {
                a << b
            } else {
                0
            }
        }
        CompoundOp::Shr => {
            if (0..64).contains(&b) {
                a >> b
            } else if a < 0 {
                -1
            } else {
                0
            }
        }
    })
}

/// Float form of an arithmetic operator (IEEE semantics, no failures).
pub(crate) fn float_op(op: CompoundOp, a: f64, b: f64) -> f64 {
    match op {
        CompoundOp::Add => a + b,
        CompoundOp::Sub => a - b,
        CompoundOp::Mul => a * b,
        CompoundOp::Div => a / b,
        // integer-only operators never reach here
        _ => a,
    }
}

/// Store an integer result, in place when the cell already holds one.
pub(crate) fn store_int(cell: &mut Value, displaced: &mut Displaced, result: i64) {
    match cell {
        Value::Int(n) => *n = result,
        Value::Node(Node::Integer(_)) => ensure_unique::<IntegerNode>(cell, displaced).0 = result,
        _ => displaced.replace(cell, Value::Int(result)),
    }
}

/// Store a float result, in place when the cell already holds one.
pub(crate) fn store_float(cell: &mut Value, displaced: &mut Displaced, result: f64) {
    match cell {
        Value::Float(n) => *n = result,
        Value::Node(Node::Float(_)) => ensure_unique::<FloatNode>(cell, displaced).0 = result,
        _ => displaced.replace(cell, Value::Float(result)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrapping() {
        assert_eq!(int_op(CompoundOp::Add, i64::MAX, 1).unwrap(), i64::MIN);
        assert_eq!(int_op(CompoundOp::Div, i64::MIN, -1).unwrap(), i64::MIN);
        assert_eq!(int_op(CompoundOp::Rem, i64::MIN, -1).unwrap(), 0);
    }

    #[test]
    fn test_shifts_out_of_range() {
        assert_eq!(int_op(CompoundOp::Shl, 1, 3).unwrap(), 8);
        assert_eq!(int_op(CompoundOp::Shl, 1, 64).unwrap(), 0);
        assert_eq!(int_op(CompoundOp::Shr, -8, 1).unwrap(), -4);
        assert_eq!(int_op(CompoundOp::Shr, -8, 99).unwrap(), -1);
        assert_eq!(int_op(CompoundOp::Shr, 8, -1).unwrap(), 0);
    }

    #[test]
    fn test_integer_division_by_zero() {
        let err = int_op(CompoundOp::Div, 1, 0).unwrap_err();
        assert_eq!(err.code(), "DIVISION-BY-ZERO");
        assert!(int_op(CompoundOp::Rem, 1, 0).is_err());
    }

    #[test]
    fn test_store_int_in_place() {
        let mut cell = Value::Int(1);
        let mut displaced = Displaced::new();
        store_int(&mut cell, &mut displaced, 5);
        assert!(matches!(cell, Value::Int(5)));

        let mut boxed = Value::boxed_int(1);
        let alias = boxed.clone();
        store_int(&mut boxed, &mut displaced, 2);
        assert_eq!(boxed, Value::Int(2));
        assert_eq!(alias, Value::Int(1));
        assert_eq!(displaced.len(), 1);
    }

    #[test]
    fn test_store_float_replaces_other_kinds() {
        let mut cell = Value::text("x");
        let mut displaced = Displaced::new();
        store_float(&mut cell, &mut displaced, 0.5);
        assert!(matches!(cell, Value::Float(f) if f == 0.5));
        assert_eq!(displaced.len(), 1);
    }
}
