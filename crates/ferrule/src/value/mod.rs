//! Value representation for runtime values

mod display;
mod impls;
mod node;
mod object;
mod release;

pub use node::{Binary, Closure, FloatNode, IntegerNode, Map, Sequence, Text};
pub use object::{Class, Object, ObjectState, ObjectStatus};
pub use release::{release_value, Displaced};

use std::sync::Arc;

/// Runtime value representation.
///
/// Values are organized into two tiers:
/// - Tier 1: Unboxed scalars and the absent value (no allocation, ever)
/// - Tier 2: A strong reference to a reference-counted heap node
///
/// Copying a `Value` aliases its heap node (strong count + 1); it never
/// deep-copies. Duplication happens lazily in the copy-on-write guard
/// ([`crate::cow::ensure_unique`]) when a shared node is about to be written.
#[derive(Clone, Default)]
pub enum Value {
    /// The canonical absent value
    #[default]
    Nothing,

    /// Boolean
    Bool(bool),

    /// 64-bit signed integer
    Int(i64),

    /// 64-bit floating point
    Float(f64),

    /// Reference to a heap node
    Node(Node),
}

/// A strong reference to a heap node.
///
/// Closed set of built-in kinds; user classes plug in through the
/// [`Class`] trait object carried by `Object`.
#[derive(Clone)]
pub enum Node {
    /// Boxed integer
    Integer(Arc<IntegerNode>),

    /// Boxed float
    Float(Arc<FloatNode>),

    /// Character string
    Text(Arc<Text>),

    /// Binary blob
    Binary(Arc<Binary>),

    /// Growable sequence of values
    Sequence(Arc<Sequence>),

    /// Insertion-ordered string-keyed map
    Map(Arc<Map>),

    /// Closure with captured values
    Closure(Arc<Closure>),

    /// Live class instance (shared, mutable under its own guard)
    Object(Arc<Object>),
}

/// Runtime kind tag of a heap node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Boxed integer
    Integer,
    /// Boxed float
    Float,
    /// Character string
    Text,
    /// Binary blob
    Binary,
    /// Sequence
    Sequence,
    /// Map
    Map,
    /// Closure
    Closure,
    /// Class instance
    Object,
}

impl Node {
    /// The node's runtime kind.
    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Integer(_) => NodeKind::Integer,
            Node::Float(_) => NodeKind::Float,
            Node::Text(_) => NodeKind::Text,
            Node::Binary(_) => NodeKind::Binary,
            Node::Sequence(_) => NodeKind::Sequence,
            Node::Map(_) => NodeKind::Map,
            Node::Closure(_) => NodeKind::Closure,
            Node::Object(_) => NodeKind::Object,
        }
    }

    /// Number of live strong references to this node.
    pub fn refcount(&self) -> usize {
        match self {
            Node::Integer(n) => Arc::strong_count(n),
            Node::Float(n) => Arc::strong_count(n),
            Node::Text(n) => Arc::strong_count(n),
            Node::Binary(n) => Arc::strong_count(n),
            Node::Sequence(n) => Arc::strong_count(n),
            Node::Map(n) => Arc::strong_count(n),
            Node::Closure(n) => Arc::strong_count(n),
            Node::Object(n) => Arc::strong_count(n),
        }
    }

    /// True if both references point at the same node.
    pub fn ptr_eq(&self, other: &Node) -> bool {
        match (self, other) {
            (Node::Integer(a), Node::Integer(b)) => Arc::ptr_eq(a, b),
            (Node::Float(a), Node::Float(b)) => Arc::ptr_eq(a, b),
            (Node::Text(a), Node::Text(b)) => Arc::ptr_eq(a, b),
            (Node::Binary(a), Node::Binary(b)) => Arc::ptr_eq(a, b),
            (Node::Sequence(a), Node::Sequence(b)) => Arc::ptr_eq(a, b),
            (Node::Map(a), Node::Map(b)) => Arc::ptr_eq(a, b),
            (Node::Closure(a), Node::Closure(b)) => Arc::ptr_eq(a, b),
            (Node::Object(a), Node::Object(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Boolean coercion of the node.
    pub fn as_bool(&self) -> bool {
        match self {
            Node::Integer(n) => n.0 != 0,
            Node::Float(n) => n.0 != 0.0,
            Node::Text(t) => t.as_bool(),
            Node::Binary(b) => !b.is_empty(),
            Node::Sequence(s) => !s.is_empty(),
            Node::Map(m) => !m.is_empty(),
            Node::Closure(_) => true,
            Node::Object(o) => o.is_valid(),
        }
    }

    /// Integer coercion of the node.
    pub fn as_int(&self) -> i64 {
        match self {
            Node::Integer(n) => n.0,
            Node::Float(n) => n.0 as i64,
            Node::Text(t) => t.as_int(),
            _ => 0,
        }
    }

    /// Float coercion of the node.
    pub fn as_float(&self) -> f64 {
        match self {
            Node::Integer(n) => n.0 as f64,
            Node::Float(n) => n.0,
            Node::Text(t) => t.as_float(),
            _ => 0.0,
        }
    }

    /// Text coercion of the node.
    pub fn as_text(&self) -> String {
        match self {
            Node::Text(t) => t.as_str().to_string(),
            Node::Binary(b) => b.to_hex(),
            _ => Value::Node(self.clone()).to_string(),
        }
    }
}
