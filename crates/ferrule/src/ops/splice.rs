//! Splice and the sequence end operators

use crate::cow::ensure_unique;
use crate::error::{type_name, Result, RuntimeError};
use crate::slot::Slot;
use crate::value::{Node, Sequence, Text, Value};

impl Slot {
    /// Remove `length` items starting at `offset` and insert `replacement`
    /// in their place. Works on sequences (element-wise) and text
    /// (character-wise). Returns what was removed.
    ///
    /// A negative offset counts from the end; no length removes through
    /// the end; a negative length stops that many items before the end.
    /// A sequence replacement is spliced in element by element; any other
    /// value goes in as a single element (or, for text, as its text).
    pub fn splice(
        &mut self,
        offset: i64,
        length: Option<i64>,
        replacement: Option<&Value>,
    ) -> Result<Value> {
        let (cell, displaced) = self.target_mut();
        let removed = match cell {
            Value::Node(Node::Sequence(_)) => {
                let items = match replacement {
                    None => Vec::new(),
                    Some(v) => match v.as_sequence() {
                        Some(seq) => seq.as_slice().to_vec(),
                        None => vec![v.clone()],
                    },
                };
                let seq = ensure_unique::<Sequence>(cell, displaced);
                Value::sequence(seq.splice(offset, length, items))
            }
            Value::Node(Node::Text(_)) => {
                let text = replacement.map(Value::as_text).unwrap_or_default();
                Value::text(ensure_unique::<Text>(cell, displaced).splice(offset, length, &text))
            }
            _ => {
                return Err(RuntimeError::Splice {
                    got: type_name(cell).to_string(),
                })
            }
        };
        self.touch();
        Ok(removed)
    }

    /// Append to the sequence in the slot. An absent value becomes a
    /// sequence first.
    pub fn push(&mut self, value: Value) -> Result<()> {
        self.with_sequence("push", |seq| seq.push(value))
    }

    /// Prepend to the sequence in the slot. An absent value becomes a
    /// sequence first.
    pub fn unshift(&mut self, value: Value) -> Result<()> {
        self.with_sequence("unshift", |seq| seq.unshift(value))
    }

    /// Remove and return the last element; `Nothing` if there is none or
    /// the slot does not hold a sequence.
    pub fn pop(&mut self) -> Value {
        self.take_end(Sequence::pop)
    }

    /// Remove and return the first element; `Nothing` if there is none or
    /// the slot does not hold a sequence.
    pub fn shift(&mut self) -> Value {
        self.take_end(Sequence::shift)
    }

    fn with_sequence(&mut self, op: &'static str, f: impl FnOnce(&mut Sequence)) -> Result<()> {
        let (cell, displaced) = self.target_mut();
        match cell {
            Value::Nothing | Value::Node(Node::Sequence(_)) => {
                f(ensure_unique::<Sequence>(cell, displaced));
            }
            _ => {
                return Err(RuntimeError::List {
                    op,
                    got: type_name(cell).to_string(),
                })
            }
        }
        self.touch();
        Ok(())
    }

    fn take_end(&mut self, f: impl FnOnce(&mut Sequence) -> Option<Value>) -> Value {
        if self.value().as_sequence().map_or(true, Sequence::is_empty) {
            return Value::Nothing;
        }
        let (cell, displaced) = self.target_mut();
        let removed = f(ensure_unique::<Sequence>(cell, displaced)).unwrap_or_default();
        self.touch();
        removed
    }
}
