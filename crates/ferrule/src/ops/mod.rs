//! Mutation operators applied through a slot
//!
//! Scalars of the operator's natural kind are updated in place. Boxed
//! scalars and containers go through the copy-on-write guard first, so no
//! alias ever observes the change.

mod arith;
mod splice;

use std::fmt;

use arith::{float_op, int_op, is_float, store_float, store_int};

use crate::cow::ensure_unique;
use crate::error::Result;
use crate::slot::Slot;
use crate::value::{Binary, Displaced, Map, Node, NodeKind, Sequence, Text, Value};

/// A compound assignment operator (`+=`, `-=`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompoundOp {
    /// `+=`
    Add,
    /// `-=`
    Sub,
    /// `*=`
    Mul,
    /// `/=`
    Div,
    /// `%=`
    Rem,
    /// `&=`
    BitAnd,
    /// `|=`
    BitOr,
    /// `^=`
    BitXor,
    /// `<<=`
    Shl,
    /// `>>=`
    Shr,
}

impl CompoundOp {
    /// True for operators whose natural kind may be float
    pub fn is_arithmetic(self) -> bool {
        matches!(
            self,
            CompoundOp::Add | CompoundOp::Sub | CompoundOp::Mul | CompoundOp::Div
        )
    }

    /// Source form of the operator
    pub fn symbol(self) -> &'static str {
        match self {
            CompoundOp::Add => "+=",
            CompoundOp::Sub => "-=",
            CompoundOp::Mul => "*=",
            CompoundOp::Div => "/=",
            CompoundOp::Rem => "%=",
            CompoundOp::BitAnd => "&=",
            CompoundOp::BitOr => "|=",
            CompoundOp::BitXor => "^=",
            CompoundOp::Shl => "<<=",
            CompoundOp::Shr => ">>=",
        }
    }
}

impl fmt::Display for CompoundOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Increment and decrement operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IncDec {
    /// `++x`: yields the new value
    PreIncrement,
    /// `x++`: yields the value before the update
    PostIncrement,
    /// `--x`: yields the new value
    PreDecrement,
    /// `x--`: yields the value before the update
    PostDecrement,
}

impl IncDec {
    fn delta(self) -> i64 {
        match self {
            IncDec::PreIncrement | IncDec::PostIncrement => 1,
            IncDec::PreDecrement | IncDec::PostDecrement => -1,
        }
    }

    fn is_post(self) -> bool {
        matches!(self, IncDec::PostIncrement | IncDec::PostDecrement)
    }
}

impl Slot {
    /// Apply a compound operator with `operand` and return the new value.
    pub fn apply(&mut self, op: CompoundOp, operand: &Value) -> Result<Value> {
        let (cell, displaced) = self.target_mut();
        let result = match (op, cell.kind()) {
            (CompoundOp::Add, Some(kind)) if is_container(kind) => {
                append(cell, displaced, operand);
                cell.clone()
            }
            // an absent value takes a container operand as is
            (CompoundOp::Add, None)
                if cell.is_nothing() && operand.kind().is_some_and(is_container) =>
            {
                displaced.replace(cell, operand.clone());
                cell.clone()
            }
            (CompoundOp::Sub, Some(NodeKind::Map)) => {
                remove_keys(ensure_unique::<Map>(cell, displaced), displaced, operand);
                cell.clone()
            }
            _ if op.is_arithmetic() && (is_float(cell) || is_float(operand)) => {
                let r = float_op(op, cell.as_float(), operand.as_float());
                store_float(cell, displaced, r);
                Value::Float(r)
            }
            _ => {
                let r = int_op(op, cell.as_int(), operand.as_int())?;
                store_int(cell, displaced, r);
                Value::Int(r)
            }
        };
        self.touch();
        Ok(result)
    }

    /// Apply an increment or decrement.
    ///
    /// Pre forms return the updated value; post forms return the value
    /// exactly as it was before, without coercion.
    pub fn step(&mut self, kind: IncDec) -> Result<Value> {
        let (cell, displaced) = self.target_mut();
        let before = if kind.is_post() {
            Some(cell.clone())
        } else {
            None
        };
        let after = if is_float(cell) {
            let r = cell.as_float() + kind.delta() as f64;
            store_float(cell, displaced, r);
            Value::Float(r)
        } else {
            let r = cell.as_int().wrapping_add(kind.delta());
            store_int(cell, displaced, r);
            Value::Int(r)
        };
        self.touch();
        Ok(before.unwrap_or(after))
    }
}

fn is_container(kind: NodeKind) -> bool {
    matches!(
        kind,
        NodeKind::Sequence | NodeKind::Text | NodeKind::Binary | NodeKind::Map
    )
}

/// `+=` on a container: append to sequences, text and binary; merge maps.
fn append(cell: &mut Value, displaced: &mut Displaced, operand: &Value) {
    match cell {
        Value::Node(Node::Sequence(_)) => {
            let seq = ensure_unique::<Sequence>(cell, displaced);
            match operand.as_sequence() {
                Some(other) => seq.extend(other.iter().cloned()),
                None => seq.push(operand.clone()),
            }
        }
        Value::Node(Node::Text(_)) => {
            let text = operand.as_text();
            ensure_unique::<Text>(cell, displaced).push_str(&text);
        }
        Value::Node(Node::Binary(_)) => {
            let bin = ensure_unique::<Binary>(cell, displaced);
            match operand {
                Value::Node(Node::Binary(other)) => bin.extend_from_slice(other.as_bytes()),
                other => bin.extend_from_slice(other.as_text().as_bytes()),
            }
        }
        Value::Node(Node::Map(_)) => {
            if let Some(other) = operand.as_map() {
                let map = ensure_unique::<Map>(cell, displaced);
                for (k, v) in other.iter() {
                    if let Some(old) = map.insert(k, v.clone()) {
                        displaced.push(old);
                    }
                }
            }
        }
        _ => {}
    }
}

/// `-=` on a map: drop one key, or every key listed in a sequence.
fn remove_keys(map: &mut Map, displaced: &mut Displaced, operand: &Value) {
    let keys: Vec<String> = match operand {
        Value::Nothing => Vec::new(),
        Value::Node(Node::Sequence(seq)) => seq.iter().map(Value::as_text).collect(),
        other => vec![other.as_text()],
    };
    for key in keys {
        if let Some(old) = map.remove(&key) {
            displaced.push(old);
        }
    }
}
