//! Environment tests

use std::sync::Arc;

use ferrule::*;
use pretty_assertions::assert_eq;

fn value_of(env: &Environment, name: &str) -> Option<Value> {
    env.lookup(name).map(|var| var.snapshot())
}

// ═══════════════════════════════════════════════════════════════════════
// Basic Operations
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_environment_new_is_empty() {
    let env = Environment::new();
    assert!(env.is_empty());
    assert_eq!(env.len(), 0);
    assert_eq!(env.depth(), 1);
    assert!(env.receiver().is_none());
}

#[test]
fn test_define_and_lookup() {
    let mut env = Environment::new();
    env.define("x", Value::Int(42));

    assert_eq!(value_of(&env, "x"), Some(Value::Int(42)));
    assert_eq!(value_of(&env, "y"), None);
    assert!(env.contains("x"));
    assert!(!env.contains("y"));
}

#[test]
fn test_redefinition_shadows() {
    let mut env = Environment::new();
    env.define("x", Value::Int(1));
    env.define("x", Value::Int(2));

    assert_eq!(value_of(&env, "x"), Some(Value::Int(2)));
    assert_eq!(env.len(), 2);
}

// ═══════════════════════════════════════════════════════════════════════
// Frames
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_frames_scope_bindings() {
    let mut env = Environment::new();
    env.define("outer", Value::Int(1));

    env.push_frame();
    env.define("inner", Value::Int(2));
    assert_eq!(env.names_in_current_scope(), vec!["inner"]);
    assert!(env.contains("outer"));

    env.pop_frame();
    assert!(!env.contains("inner"));
    assert_eq!(env.names_in_current_scope(), vec!["outer"]);
}

#[test]
fn test_top_level_frame_is_never_popped() {
    let mut env = Environment::new();
    env.define("x", Value::Int(1));
    env.pop_frame();
    env.pop_frame();
    assert_eq!(env.depth(), 1);
    assert!(env.contains("x"));
}

#[test]
fn test_pop_frame_hands_back_bindings() {
    let mut env = Environment::new();
    env.define("kept", Value::Int(0));
    env.push_frame();
    env.define("a", Value::Int(1));
    env.define("b", Value::text("two"));

    let popped = env.pop_frame();
    let names: Vec<&str> = popped.iter().map(|b| b.name.as_str()).collect();
    assert_eq!(names, vec!["a", "b"]);
    assert_eq!(popped[1].variable.snapshot(), Value::text("two"));

    // the top-level frame gives nothing back
    assert!(env.pop_frame().is_empty());
    assert!(env.contains("kept"));
}

#[test]
fn test_variable_release_reaches_alias_target() {
    let mut sink = ExceptionSink::new();
    let owner = Variable::new("owner", Value::from(vec![1]));
    let alias = Variable::alias("alias", owner.clone(), false);
    let value = owner.snapshot();
    assert_eq!(value.refcount(), 2);

    // the owner is still held here, so nothing is freed yet
    alias.release(&mut sink);
    assert_eq!(value.refcount(), 2);

    owner.release(&mut sink);
    assert_eq!(value.refcount(), 1);
    assert!(sink.is_empty());
}

// ═══════════════════════════════════════════════════════════════════════
// Variables and Aliases
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_bind_shares_the_variable() {
    let mut env = Environment::new();
    let var = Variable::new("shared", Value::Int(7));
    env.bind("a", var.clone());
    env.bind("b", var.clone());

    let a = env.lookup("a").unwrap();
    let b = env.lookup("b").unwrap();
    assert!(Arc::ptr_eq(&a, &b));
}

#[test]
fn test_alias_follows_to_owner() {
    let owner = Variable::new("owner", Value::Int(3));
    let middle = Variable::alias("middle", owner.clone(), true);
    let outer = Variable::alias("outer", middle.clone(), false);

    let (target, read_only_via) = outer.target();
    assert!(Arc::ptr_eq(&target, &owner));
    assert_eq!(read_only_via.as_deref(), Some("middle"));
    assert!(outer.is_alias());
    assert!(!owner.is_alias());
    assert_eq!(outer.snapshot(), Value::Int(3));
}

#[test]
fn test_define_alias_reads_through() {
    let mut env = Environment::new();
    let owner = env.define("x", Value::text("hi"));
    env.define_alias("y", owner, false);
    assert_eq!(value_of(&env, "y"), Some(Value::text("hi")));
    assert_eq!(env.lookup("y").unwrap().name(), "y");
}

// ═══════════════════════════════════════════════════════════════════════
// Globals
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_globals_declare_get_undeclare() {
    let globals = Globals::new();
    assert!(globals.is_empty());

    globals.declare("b", Value::Int(2));
    globals.declare("a", Value::Int(1));
    assert_eq!(globals.len(), 2);
    assert_eq!(globals.names(), vec!["a", "b"]);
    assert_eq!(globals.get("a").unwrap().snapshot(), Value::Int(1));

    let removed = globals.undeclare("a").unwrap();
    assert_eq!(removed.name(), "a");
    assert!(!globals.contains("a"));
    assert!(globals.get("a").is_none());
}

#[test]
fn test_globals_redeclare_replaces() {
    let globals = Globals::new();
    let first = globals.declare("g", Value::Int(1));
    globals.declare("g", Value::Int(2));

    assert_eq!(globals.get("g").unwrap().snapshot(), Value::Int(2));
    // holders of the old variable keep it
    assert_eq!(first.snapshot(), Value::Int(1));
}

#[test]
fn test_globals_alias() {
    let globals = Globals::new();
    let owner = globals.declare("config", Value::from(vec![1]));
    let alias = globals.alias("cfg", owner, true);

    assert!(alias.is_alias());
    assert_eq!(globals.get("cfg").unwrap().snapshot(), Value::from(vec![1]));
}
