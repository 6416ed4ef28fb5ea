//! Copy-on-write guard
//!
//! Every in-place mutation of a heap payload goes through [`ensure_unique`],
//! which guarantees the caller is the sole owner of the node it is about to
//! write. Aliases taken before the write keep observing the old contents.

use std::sync::Arc;

use crate::value::{
    Binary, Displaced, FloatNode, IntegerNode, Map, Node, NodeKind, Sequence, Text, Value,
};

/// A heap payload that can be duplicated on write.
pub trait CowKind: Clone + Default + Send + Sync + 'static {
    /// Runtime kind of nodes holding this payload
    const KIND: NodeKind;

    /// Build a payload from a value of a different kind.
    fn seed(value: &Value) -> Self;

    /// Borrow the node reference if `value` holds this kind.
    fn arc_mut(value: &mut Value) -> Option<&mut Arc<Self>>;

    /// Wrap a node reference back into a value.
    fn wrap(node: Arc<Self>) -> Value;
}

macro_rules! cow_kind {
    ($ty:ty, $variant:ident, |$v:ident| $seed:expr) => {
        impl CowKind for $ty {
            const KIND: NodeKind = NodeKind::$variant;

            fn seed($v: &Value) -> Self {
                $seed
            }

            fn arc_mut(value: &mut Value) -> Option<&mut Arc<Self>> {
                match value {
                    Value::Node(Node::$variant(node)) => Some(node),
                    _ => None,
                }
            }

            fn wrap(node: Arc<Self>) -> Value {
                Value::Node(Node::$variant(node))
            }
        }
    };
}

cow_kind!(IntegerNode, Integer, |v| IntegerNode(v.as_int()));
cow_kind!(FloatNode, Float, |v| FloatNode(v.as_float()));
cow_kind!(Text, Text, |v| Text::new(v.as_text()));
cow_kind!(Binary, Binary, |v| match v.as_str() {
    Some(s) => Binary::new(s.as_bytes()),
    None => Binary::default(),
});
cow_kind!(Sequence, Sequence, |_v| Sequence::new());
cow_kind!(Map, Map, |_v| Map::new());

enum Action<K> {
    InPlace,
    Install,
    Duplicate(K),
}

/// Make `value` a uniquely owned node of kind `K` and borrow its payload.
///
/// - `Nothing` becomes a fresh empty `K`;
/// - a value of another kind is replaced by a `K` seeded from it;
/// - a shared `K` is duplicated;
/// - a sole-owned `K` is returned as is.
///
/// Whatever is replaced goes to `displaced`; nothing is dropped here, so a
/// caller holding container guards never runs a destructor.
pub fn ensure_unique<'a, K: CowKind>(
    value: &'a mut Value,
    displaced: &mut Displaced,
) -> &'a mut K {
    let action = match K::arc_mut(value) {
        None => Action::Install,
        Some(node) => {
            if Arc::get_mut(node).is_some() {
                Action::InPlace
            } else {
                Action::Duplicate((**node).clone())
            }
        }
    };

    match action {
        Action::InPlace => {}
        Action::Install => {
            let fresh = if value.is_nothing() {
                K::default()
            } else {
                K::seed(value)
            };
            tracing::debug!(kind = ?K::KIND, from = value.type_name(), "installing fresh node");
            displaced.replace(value, K::wrap(Arc::new(fresh)));
        }
        Action::Duplicate(copy) => {
            tracing::debug!(
                kind = ?K::KIND,
                refcount = value.refcount(),
                "copy-on-write duplicate"
            );
            displaced.replace(value, K::wrap(Arc::new(copy)));
        }
    }

    match K::arc_mut(value).and_then(|node| Arc::get_mut(node)) {
        Some(payload) => payload,
        None => unreachable!("{:?} node is uniquely owned after ensure_unique", K::KIND),
    }
}
