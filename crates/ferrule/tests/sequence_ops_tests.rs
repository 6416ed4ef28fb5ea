//! Splice and list operator tests

use ferrule::*;
use pretty_assertions::assert_eq;

fn ctx_with(value: Value) -> ThreadContext {
    let mut ctx = Runtime::new().thread();
    ctx.env_mut().define("v", value);
    ctx
}

fn v() -> LvaluePath {
    LvaluePath::var("v")
}

// ═══════════════════════════════════════════════════════════════════════
// Splice
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_splice_sequence_middle() {
    let mut ctx = ctx_with(Value::from(vec![1, 2, 3, 4, 5]));
    let removed = ctx
        .splice(&v(), 1, Some(2), Some(&Value::from(vec![20, 30, 40])))
        .unwrap();
    assert_eq!(removed, Value::from(vec![2, 3]));
    assert_eq!(ctx.get(&v()).unwrap(), Value::from(vec![1, 20, 30, 40, 4, 5]));
}

#[test]
fn test_splice_offsets_and_lengths() {
    let mut ctx = ctx_with(Value::from(vec![1, 2, 3, 4, 5]));
    // negative offset counts from the end, no length runs to the end
    let removed = ctx.splice(&v(), -2, None, None).unwrap();
    assert_eq!(removed, Value::from(vec![4, 5]));
    assert_eq!(ctx.get(&v()).unwrap(), Value::from(vec![1, 2, 3]));

    // negative length stops short of the end
    let removed = ctx.splice(&v(), 0, Some(-1), None).unwrap();
    assert_eq!(removed, Value::from(vec![1, 2]));
    assert_eq!(ctx.get(&v()).unwrap(), Value::from(vec![3]));

    // offset beyond the end inserts at the end
    ctx.splice(&v(), 10, Some(0), Some(&Value::Int(9))).unwrap();
    assert_eq!(ctx.get(&v()).unwrap(), Value::from(vec![3, 9]));
}

#[test]
fn test_splice_text() {
    let mut ctx = ctx_with(Value::text("héllo world"));
    let removed = ctx
        .splice(&v(), 0, Some(5), Some(&Value::text("goodbye")))
        .unwrap();
    assert_eq!(removed, Value::text("héllo"));
    assert_eq!(ctx.get(&v()).unwrap(), Value::text("goodbye world"));
}

#[test]
fn test_splice_rejects_other_kinds() {
    for value in [Value::Int(1), Value::Nothing, Value::map(Map::new())] {
        let mut ctx = ctx_with(value);
        let err = ctx.splice(&v(), 0, None, None).unwrap_err();
        assert_eq!(err.code(), "SPLICE-ERROR");
    }
}

#[test]
fn test_splice_copies_shared_sequence() {
    let shared = Value::from(vec![1, 2, 3]);
    let mut ctx = ctx_with(shared.clone());
    ctx.splice(&v(), 0, Some(1), None).unwrap();
    assert_eq!(shared, Value::from(vec![1, 2, 3]));
    assert_eq!(ctx.get(&v()).unwrap(), Value::from(vec![2, 3]));
}

// ═══════════════════════════════════════════════════════════════════════
// Push / Pop / Shift / Unshift
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_push_and_unshift_vivify() {
    let mut ctx = ctx_with(Value::Nothing);
    ctx.push(&v(), Value::Int(2)).unwrap();
    ctx.unshift(&v(), Value::Int(1)).unwrap();
    ctx.push(&v().index(3), Value::text("deep")).unwrap();
    assert_eq!(
        ctx.get(&v()).unwrap(),
        Value::sequence(vec![
            Value::Int(1),
            Value::Int(2),
            Value::Nothing,
            Value::sequence(vec![Value::text("deep")]),
        ])
    );
}

#[test]
fn test_push_on_scalar_is_a_list_error() {
    let mut ctx = ctx_with(Value::text("no"));
    let err = ctx.push(&v(), Value::Int(1)).unwrap_err();
    assert_eq!(err.code(), "LIST-ERROR");
    let err = ctx.unshift(&v(), Value::Int(1)).unwrap_err();
    assert_eq!(err.code(), "LIST-ERROR");
    assert_eq!(ctx.get(&v()).unwrap(), Value::text("no"));
}

#[test]
fn test_pop_and_shift() {
    let mut ctx = ctx_with(Value::from(vec![1, 2, 3]));
    assert_eq!(ctx.pop(&v()).unwrap(), Value::Int(3));
    assert_eq!(ctx.shift(&v()).unwrap(), Value::Int(1));
    assert_eq!(ctx.get(&v()).unwrap(), Value::from(vec![2]));
    assert_eq!(ctx.pop(&v()).unwrap(), Value::Int(2));
    assert!(ctx.pop(&v()).unwrap().is_nothing());
    assert!(ctx.shift(&v()).unwrap().is_nothing());
}

#[test]
fn test_pop_leaves_non_sequences_alone() {
    let mut ctx = ctx_with(Value::Int(4));
    assert!(ctx.pop(&v()).unwrap().is_nothing());
    assert_eq!(ctx.get(&v()).unwrap(), Value::Int(4));

    // a missing path is not created
    let mut ctx = ctx_with(Value::Nothing);
    assert!(ctx.shift(&v().key("q")).unwrap().is_nothing());
    assert!(ctx.get(&v()).unwrap().is_nothing());
}

#[test]
fn test_pop_from_shared_sequence() {
    let shared = Value::from(vec![1, 2]);
    let mut ctx = ctx_with(shared.clone());
    assert_eq!(ctx.pop(&v()).unwrap(), Value::Int(2));
    assert_eq!(shared, Value::from(vec![1, 2]));
}
