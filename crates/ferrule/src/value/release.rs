//! Deferred release of values displaced while guards are held

use std::sync::Arc;

use super::{Node, Value};
use crate::error::ExceptionSink;

/// Values removed from storage while a lock chain was held.
///
/// Dropping the last reference to an object runs its destructor, which is
/// user code; that must never happen under a container guard. Anything
/// overwritten or copied away during a traversal is parked here and
/// released once the chain is gone.
#[derive(Debug, Default)]
pub struct Displaced {
    values: Vec<Value>,
}

impl Displaced {
    /// Create an empty list
    pub fn new() -> Self {
        Self::default()
    }

    /// Park a value for later release. Non-heap values need no release
    /// and are not kept.
    pub fn push(&mut self, value: Value) {
        if value.is_heap() {
            self.values.push(value);
        }
    }

    /// Overwrite `slot` with `value`, parking the previous contents.
    pub fn replace(&mut self, slot: &mut Value, value: Value) {
        let previous = std::mem::replace(slot, value);
        self.push(previous);
    }

    /// Number of parked values
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True if nothing is parked
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Release every parked value, in the order parked.
    pub fn release(self, sink: &mut ExceptionSink) {
        for value in self.values {
            release_value(value, sink);
        }
    }
}

/// Drop one reference to `value`.
///
/// If this was the last reference to a container its elements are released
/// the same way; an object reaching its last reference is torn down with
/// destructor failures raised on `sink` rather than logged.
pub fn release_value(value: Value, sink: &mut ExceptionSink) {
    let mut pending = vec![value];
    while let Some(value) = pending.pop() {
        let Value::Node(node) = value else {
            continue;
        };
        match node {
            Node::Sequence(seq) => {
                if let Ok(seq) = Arc::try_unwrap(seq) {
                    pending.extend(seq.into_items().into_iter().rev());
                }
            }
            Node::Map(map) => {
                if let Ok(map) = Arc::try_unwrap(map) {
                    let values: Vec<Value> = map.into_entries().map(|(_, v)| v).collect();
                    pending.extend(values.into_iter().rev());
                }
            }
            Node::Closure(closure) => {
                if let Ok(closure) = Arc::try_unwrap(closure) {
                    pending.extend(closure.captures.into_iter().rev());
                }
            }
            Node::Object(object) => {
                if let Ok(object) = Arc::try_unwrap(object) {
                    object.teardown(sink);
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Result, RuntimeError};
    use crate::value::{Class, Object};

    #[derive(Debug)]
    struct Failing;

    impl Class for Failing {
        fn name(&self) -> &str {
            "Failing"
        }

        fn destructor(&self, _object: &Object) -> Result<()> {
            Err(RuntimeError::raised("DESTRUCTOR-ERROR", "boom"))
        }
    }

    #[test]
    fn test_scalars_are_not_parked() {
        let mut displaced = Displaced::new();
        displaced.push(Value::Int(1));
        displaced.push(Value::Nothing);
        assert!(displaced.is_empty());
        displaced.push(Value::text("x"));
        assert_eq!(displaced.len(), 1);
    }

    #[test]
    fn test_replace_parks_previous() {
        let mut slot = Value::text("old");
        let mut displaced = Displaced::new();
        displaced.replace(&mut slot, Value::Int(2));
        assert_eq!(slot, Value::Int(2));
        assert_eq!(displaced.len(), 1);
    }

    #[test]
    fn test_release_surfaces_nested_destructor_error() {
        let obj = Object::new(Arc::new(Failing));
        let value = Value::sequence(vec![Value::Int(1), Value::object(obj)]);

        let mut sink = ExceptionSink::new();
        let mut displaced = Displaced::new();
        displaced.push(value);
        displaced.release(&mut sink);

        assert_eq!(sink.check().unwrap_err().code(), "DESTRUCTOR-ERROR");
    }

    #[test]
    fn test_shared_object_is_not_torn_down() {
        let obj = Object::new(Arc::new(Failing));
        let keep = obj.clone();

        let mut sink = ExceptionSink::new();
        release_value(Value::object(obj), &mut sink);
        assert!(sink.is_empty());
        assert!(keep.is_valid());

        release_value(Value::object(keep), &mut sink);
        assert_eq!(sink.len(), 1);
    }
}
