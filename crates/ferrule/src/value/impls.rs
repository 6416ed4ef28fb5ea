//! Value trait implementations: constructors, predicates, coercions, From traits, PartialEq

use std::sync::Arc;

use super::*;

// ═══════════════════════════════════════════════════════════════════
// Convenience Constructors
// ═══════════════════════════════════════════════════════════════════

impl Value {
    /// Create a text value
    pub fn text(s: impl Into<String>) -> Self {
        Value::Node(Node::Text(Arc::new(Text::new(s))))
    }

    /// Create a binary value
    pub fn binary(bytes: impl Into<Vec<u8>>) -> Self {
        Value::Node(Node::Binary(Arc::new(Binary::new(bytes))))
    }

    /// Create a sequence value
    pub fn sequence(items: Vec<Value>) -> Self {
        Value::Node(Node::Sequence(Arc::new(Sequence::from(items))))
    }

    /// Create a map value
    pub fn map(map: Map) -> Self {
        Value::Node(Node::Map(Arc::new(map)))
    }

    /// Create a heap-boxed integer
    pub fn boxed_int(n: i64) -> Self {
        Value::Node(Node::Integer(Arc::new(IntegerNode(n))))
    }

    /// Create a heap-boxed float
    pub fn boxed_float(n: f64) -> Self {
        Value::Node(Node::Float(Arc::new(FloatNode(n))))
    }

    /// Create a closure value
    pub fn closure(closure: Closure) -> Self {
        Value::Node(Node::Closure(Arc::new(closure)))
    }

    /// Wrap an object reference
    pub fn object(object: Arc<Object>) -> Self {
        Value::Node(Node::Object(object))
    }

    // ═══════════════════════════════════════════════════════════════════
    // Predicates and Introspection
    // ═══════════════════════════════════════════════════════════════════

    /// Check if this is the absent value
    pub fn is_nothing(&self) -> bool {
        matches!(self, Value::Nothing)
    }

    /// Check if the value references a heap node
    pub fn is_heap(&self) -> bool {
        matches!(self, Value::Node(_))
    }

    /// Runtime kind of the heap node, `None` for non-heap values
    pub fn kind(&self) -> Option<NodeKind> {
        match self {
            Value::Node(node) => Some(node.kind()),
            _ => None,
        }
    }

    /// Human-readable type name
    pub fn type_name(&self) -> &'static str {
        crate::error::type_name(self)
    }

    /// Strong count of the referenced node (0 for non-heap values)
    pub fn refcount(&self) -> usize {
        match self {
            Value::Node(node) => node.refcount(),
            _ => 0,
        }
    }

    /// True if both values reference the same heap node
    pub fn same_node(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Node(a), Value::Node(b)) => a.ptr_eq(b),
            _ => false,
        }
    }

    // ═══════════════════════════════════════════════════════════════════
    // Coercions
    // ═══════════════════════════════════════════════════════════════════

    /// Boolean coercion
    pub fn as_bool(&self) -> bool {
        match self {
            Value::Nothing => false,
            Value::Bool(b) => *b,
            Value::Int(n) => *n != 0,
            Value::Float(n) => *n != 0.0,
            Value::Node(node) => node.as_bool(),
        }
    }

    /// Integer coercion
    pub fn as_int(&self) -> i64 {
        match self {
            Value::Nothing => 0,
            Value::Bool(b) => i64::from(*b),
            Value::Int(n) => *n,
            Value::Float(n) => *n as i64,
            Value::Node(node) => node.as_int(),
        }
    }

    /// Float coercion
    pub fn as_float(&self) -> f64 {
        match self {
            Value::Nothing => 0.0,
            Value::Bool(b) => f64::from(u8::from(*b)),
            Value::Int(n) => *n as f64,
            Value::Float(n) => *n,
            Value::Node(node) => node.as_float(),
        }
    }

    /// Text coercion
    pub fn as_text(&self) -> String {
        match self {
            Value::Nothing => String::new(),
            Value::Node(node) => node.as_text(),
            other => other.to_string(),
        }
    }

    // ═══════════════════════════════════════════════════════════════════
    // Extractors (return Option for safe access)
    // ═══════════════════════════════════════════════════════════════════

    /// Borrow the text contents
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Node(Node::Text(t)) => Some(t.as_str()),
            _ => None,
        }
    }

    /// Borrow a sequence
    pub fn as_sequence(&self) -> Option<&Sequence> {
        match self {
            Value::Node(Node::Sequence(s)) => Some(s),
            _ => None,
        }
    }

    /// Borrow a map
    pub fn as_map(&self) -> Option<&Map> {
        match self {
            Value::Node(Node::Map(m)) => Some(m),
            _ => None,
        }
    }

    /// Borrow binary contents
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Node(Node::Binary(b)) => Some(b.as_bytes()),
            _ => None,
        }
    }

    /// Borrow the object reference
    pub fn as_object(&self) -> Option<&Arc<Object>> {
        match self {
            Value::Node(Node::Object(o)) => Some(o),
            _ => None,
        }
    }

    // ═══════════════════════════════════════════════════════════════════
    // Assignment
    // ═══════════════════════════════════════════════════════════════════

    /// Move `value` in and hand back the previous contents.
    ///
    /// The caller owns the returned value and is responsible for releasing
    /// it after any guards protecting `self` are gone.
    #[must_use = "the previous value must be released by the caller"]
    pub fn assign(&mut self, value: Value) -> Value {
        std::mem::replace(self, value)
    }

    /// Alias `value` in (strong count + 1), leaving the caller's reference
    /// intact. Returns the previous contents.
    #[must_use = "the previous value must be released by the caller"]
    pub fn assign_ref(&mut self, value: &Value) -> Value {
        self.assign(value.clone())
    }

    /// An aliasing copy of this value
    pub fn ref_self(&self) -> Value {
        self.clone()
    }
}

// ═══════════════════════════════════════════════════════════════════
// PartialEq Implementation
// ═══════════════════════════════════════════════════════════════════

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nothing, Value::Nothing) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,

            // Boxed and unboxed forms of the same scalar kind compare equal
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Int(a), Value::Node(Node::Integer(b)))
            | (Value::Node(Node::Integer(b)), Value::Int(a)) => *a == b.0,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Float(a), Value::Node(Node::Float(b)))
            | (Value::Node(Node::Float(b)), Value::Float(a)) => *a == b.0,

            (Value::Node(a), Value::Node(b)) => a == b,
            _ => false,
        }
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        if self.ptr_eq(other) {
            return true;
        }
        match (self, other) {
            (Node::Integer(a), Node::Integer(b)) => a.0 == b.0,
            (Node::Float(a), Node::Float(b)) => a.0 == b.0,
            (Node::Text(a), Node::Text(b)) => a == b,
            (Node::Binary(a), Node::Binary(b)) => a == b,
            (Node::Sequence(a), Node::Sequence(b)) => a.as_slice() == b.as_slice(),
            (Node::Map(a), Node::Map(b)) => {
                a.len() == b.len() && a.iter().all(|(k, v)| b.get(k) == Some(v))
            }
            // Closures and objects compare by identity only
            _ => false,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════
// From Trait Implementations
// ═══════════════════════════════════════════════════════════════════

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(i64::from(n))
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::text(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::text(s)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::sequence(v.into_iter().map(Into::into).collect())
    }
}

impl From<Map> for Value {
    fn from(m: Map) -> Self {
        Value::map(m)
    }
}

impl From<Arc<Object>> for Value {
    fn from(o: Arc<Object>) -> Self {
        Value::object(o)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Value::Nothing, Into::into)
    }
}
