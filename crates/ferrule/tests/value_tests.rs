//! Value representation tests

use std::sync::Arc;

use ferrule::*;
use pretty_assertions::assert_eq;

#[derive(Debug)]
struct Widget;

impl Class for Widget {
    fn name(&self) -> &str {
        "Widget"
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Construction and Kinds
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_kinds_and_type_names() {
    let cases = [
        (Value::Nothing, None, "nothing"),
        (Value::Bool(true), None, "bool"),
        (Value::Int(1), None, "int"),
        (Value::Float(1.0), None, "float"),
        (Value::boxed_int(1), Some(NodeKind::Integer), "int"),
        (Value::boxed_float(1.0), Some(NodeKind::Float), "float"),
        (Value::text("a"), Some(NodeKind::Text), "string"),
        (Value::binary(vec![0u8]), Some(NodeKind::Binary), "binary"),
        (Value::from(vec![1]), Some(NodeKind::Sequence), "list"),
        (Value::map(Map::new()), Some(NodeKind::Map), "hash"),
        (Value::closure(Closure::new("f")), Some(NodeKind::Closure), "closure"),
        (Value::object(Object::new(Arc::new(Widget))), Some(NodeKind::Object), "object"),
    ];
    for (value, kind, name) in cases {
        assert_eq!(value.kind(), kind);
        assert_eq!(value.type_name(), name);
        assert_eq!(value.is_heap(), kind.is_some());
    }
}

#[test]
fn test_from_conversions() {
    assert_eq!(Value::from(true), Value::Bool(true));
    assert_eq!(Value::from(7i32), Value::Int(7));
    assert_eq!(Value::from(2.5), Value::Float(2.5));
    assert_eq!(Value::from("s"), Value::text("s"));
    assert_eq!(Value::from(None::<i64>), Value::Nothing);
    assert_eq!(Value::from(Some(3i64)), Value::Int(3));
}

// ═══════════════════════════════════════════════════════════════════════
// Coercion
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_nothing_coerces_to_zero_values() {
    let v = Value::Nothing;
    assert!(!v.as_bool());
    assert_eq!(v.as_int(), 0);
    assert_eq!(v.as_float(), 0.0);
    assert_eq!(v.as_text(), "");
}

#[test]
fn test_text_coercions_use_leading_number() {
    let v = Value::text("  42abc");
    assert_eq!(v.as_int(), 42);
    assert!(v.as_bool());
    assert_eq!(Value::text("3.5e1x").as_float(), 35.0);
    assert_eq!(Value::text("abc").as_int(), 0);
    assert!(!Value::text("0").as_bool());
}

#[test]
fn test_scalar_coercions() {
    assert_eq!(Value::Float(3.9).as_int(), 3);
    assert_eq!(Value::Float(-3.9).as_int(), -3);
    assert_eq!(Value::Bool(true).as_int(), 1);
    assert_eq!(Value::Int(2).as_float(), 2.0);
    assert_eq!(Value::Int(-12).as_text(), "-12");
    assert_eq!(Value::boxed_float(0.5).as_text(), "0.5");
}

#[test]
fn test_container_coercions() {
    assert!(!Value::from(Vec::<i64>::new()).as_bool());
    assert!(Value::from(vec![0]).as_bool());
    assert_eq!(Value::from(vec![5]).as_int(), 0);
    assert_eq!(Value::binary(vec![0xabu8, 0x01]).as_text(), "ab01");
    assert!(Value::object(Object::new(Arc::new(Widget))).as_bool());
}

// ═══════════════════════════════════════════════════════════════════════
// Equality and Display
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_boxed_equals_unboxed() {
    assert_eq!(Value::boxed_int(4), Value::Int(4));
    assert_eq!(Value::Float(0.5), Value::boxed_float(0.5));
    assert_ne!(Value::Int(1), Value::Float(1.0));
    assert_ne!(Value::Int(0), Value::Nothing);
}

#[test]
fn test_objects_compare_by_identity() {
    let a = Object::new(Arc::new(Widget));
    let b = Object::new(Arc::new(Widget));
    assert_eq!(Value::object(a.clone()), Value::object(a.clone()));
    assert_ne!(Value::object(a), Value::object(b));
}

#[test]
fn test_debug_and_display_forms() {
    let map = Value::map(
        Map::new()
            .with("a", Value::from(vec![1, 2]))
            .with("b", Value::text("x")),
    );
    assert_eq!(format!("{:?}", map), r#"{"a": [1, 2], "b": "x"}"#);
    assert_eq!(format!("{:?}", Value::Nothing), "NOTHING");
    assert_eq!(format!("{}", Value::Nothing), "");
    assert_eq!(format!("{}", Value::text("x")), "x");
    assert_eq!(
        format!("{:?}", Value::object(Object::new(Arc::new(Widget)))),
        "<Widget object>"
    );
}

// ═══════════════════════════════════════════════════════════════════════
// Assignment
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_assign_hands_back_previous_value() {
    let mut cell = Value::text("old");
    let previous = cell.assign(Value::Int(1));
    assert_eq!(previous, Value::text("old"));
    assert_eq!(cell, Value::Int(1));
}

#[test]
fn test_assign_ref_aliases() {
    let source = Value::from(vec![1]);
    let mut cell = Value::Nothing;
    let previous = cell.assign_ref(&source);
    assert!(previous.is_nothing());
    assert!(cell.same_node(&source));
    assert_eq!(source.refcount(), 2);
}

#[test]
fn test_release_value_tears_down_nested_objects() {
    let obj = Object::new(Arc::new(Widget));
    let nested = Value::from(vec![Value::map(
        Map::new().with("o", Value::object(obj.clone())),
    )]);
    let mut sink = ExceptionSink::new();

    release_value(nested, &mut sink);
    // still referenced from the test
    assert!(obj.is_valid());

    release_value(Value::object(obj.clone()), &mut sink);
    assert!(obj.is_valid());
    assert!(sink.is_empty());
}
