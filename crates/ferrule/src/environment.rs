//! Variable scopes: process-wide globals and per-thread local frames

use std::sync::Arc;

use dashmap::DashMap;

use crate::value::{Object, Value};
use crate::variable::Variable;

/// A single local binding: a name and the variable it refers to.
#[derive(Debug, Clone)]
pub struct Binding {
    /// The binding's name
    pub name: String,

    /// The bound variable (shared with any reference parameters)
    pub variable: Arc<Variable>,
}

// ═══════════════════════════════════════════════════════════════════
// Globals
// ═══════════════════════════════════════════════════════════════════

/// The process-wide variable table, shared by every thread of a runtime.
///
/// Lookups only clone the variable handle; the variable's value is
/// guarded by its own storage lock, never by the table.
#[derive(Debug, Default)]
pub struct Globals {
    vars: DashMap<String, Arc<Variable>>,
}

impl Globals {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare (or redeclare) a global holding `value`.
    pub fn declare(&self, name: impl Into<String>, value: Value) -> Arc<Variable> {
        let name = name.into();
        let var = Variable::new(name.clone(), value);
        self.vars.insert(name, Arc::clone(&var));
        var
    }

    /// Declare a global that aliases another variable.
    pub fn alias(
        &self,
        name: impl Into<String>,
        target: Arc<Variable>,
        read_only: bool,
    ) -> Arc<Variable> {
        let name = name.into();
        let var = Variable::alias(name.clone(), target, read_only);
        self.vars.insert(name, Arc::clone(&var));
        var
    }

    /// Look up a global.
    pub fn get(&self, name: &str) -> Option<Arc<Variable>> {
        self.vars.get(name).map(|entry| Arc::clone(entry.value()))
    }

    /// Check if a global exists.
    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    /// Remove a global, returning its variable.
    pub fn undeclare(&self, name: &str) -> Option<Arc<Variable>> {
        self.vars.remove(name).map(|(_, var)| var)
    }

    /// Number of globals
    pub fn len(&self) -> usize {
        self.vars.len()
    }

    /// True if no global is declared
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// All global names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.vars.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }
}

// ═══════════════════════════════════════════════════════════════════
// Environment
// ═══════════════════════════════════════════════════════════════════

/// The per-thread local environment.
///
/// Uses a flat scope design with frame boundaries for efficient
/// scope entry/exit, plus a stack of method receivers for resolving
/// `self` members.
///
/// # Example
///
/// ```
/// use ferrule::{Environment, Value};
///
/// let mut env = Environment::new();
/// env.define("x", Value::Int(1));
///
/// env.push_frame();
/// env.define("x", Value::Int(10)); // shadows the outer x
/// assert_eq!(env.lookup("x").map(|v| v.snapshot()), Some(Value::Int(10)));
///
/// env.pop_frame();
/// assert_eq!(env.lookup("x").map(|v| v.snapshot()), Some(Value::Int(1)));
/// ```
#[derive(Debug)]
pub struct Environment {
    /// All bindings in a flat array (most recent at end)
    bindings: Vec<Binding>,

    /// Frame boundaries (indices into bindings)
    frames: Vec<usize>,

    /// Receivers of the methods currently executing (innermost at end)
    receivers: Vec<Arc<Object>>,
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

impl Environment {
    /// Create a new environment with a single top-level frame.
    pub fn new() -> Self {
        Self {
            bindings: Vec::new(),
            frames: vec![0],
            receivers: Vec::new(),
        }
    }

    // ═══════════════════════════════════════════════════════════════════
    // Frame Management (Scope Entry/Exit)
    // ═══════════════════════════════════════════════════════════════════

    /// Enter a new scope (push a frame).
    pub fn push_frame(&mut self) {
        self.frames.push(self.bindings.len());
    }

    /// Exit the current scope (pop a frame).
    ///
    /// Removes all bindings defined since the matching `push_frame()` and
    /// hands them back, oldest first. Dropping them tears down their values
    /// with no exception channel; [`Variable::release`] routes failures to
    /// a sink instead. Never pops the top-level frame.
    pub fn pop_frame(&mut self) -> Vec<Binding> {
        if self.frames.len() > 1 {
            if let Some(boundary) = self.frames.pop() {
                return self.bindings.split_off(boundary);
            }
        }
        Vec::new()
    }

    /// Current scope depth (number of frames).
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    // ═══════════════════════════════════════════════════════════════════
    // Binding Definition
    // ═══════════════════════════════════════════════════════════════════

    /// Define a local in the current scope, shadowing any earlier one.
    pub fn define(&mut self, name: impl Into<String>, value: Value) -> Arc<Variable> {
        let name = name.into();
        let variable = Variable::new(name.clone(), value);
        self.bind(name, Arc::clone(&variable));
        variable
    }

    /// Define a local that aliases another variable (a reference
    /// parameter, or an import when `read_only`).
    pub fn define_alias(
        &mut self,
        name: impl Into<String>,
        target: Arc<Variable>,
        read_only: bool,
    ) -> Arc<Variable> {
        let name = name.into();
        let variable = Variable::alias(name.clone(), target, read_only);
        self.bind(name, Arc::clone(&variable));
        variable
    }

    /// Bind an existing variable under `name`.
    pub fn bind(&mut self, name: impl Into<String>, variable: Arc<Variable>) {
        self.bindings.push(Binding {
            name: name.into(),
            variable,
        });
    }

    // ═══════════════════════════════════════════════════════════════════
    // Binding Lookup
    // ═══════════════════════════════════════════════════════════════════

    /// Look up a local by name (most recent binding wins).
    pub fn lookup(&self, name: &str) -> Option<Arc<Variable>> {
        self.bindings
            .iter()
            .rev()
            .find(|b| b.name == name)
            .map(|b| Arc::clone(&b.variable))
    }

    /// Check if a local exists.
    pub fn contains(&self, name: &str) -> bool {
        self.bindings.iter().any(|b| b.name == name)
    }

    /// Names bound in the innermost scope.
    pub fn names_in_current_scope(&self) -> Vec<&str> {
        let frame_start = self.frames.last().copied().unwrap_or(0);
        self.bindings[frame_start..]
            .iter()
            .map(|b| b.name.as_str())
            .collect()
    }

    /// Number of local bindings.
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// True if there are no local bindings.
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    // ═══════════════════════════════════════════════════════════════════
    // Method Receivers
    // ═══════════════════════════════════════════════════════════════════

    /// The receiver of the innermost executing method.
    pub fn receiver(&self) -> Option<&Arc<Object>> {
        self.receivers.last()
    }

    pub(crate) fn push_receiver(&mut self, object: Arc<Object>) {
        self.receivers.push(object);
    }

    pub(crate) fn pop_receiver(&mut self) -> Option<Arc<Object>> {
        self.receivers.pop()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_globals_declare_and_get() {
        let globals = Globals::new();
        assert!(globals.is_empty());
        globals.declare("b", Value::Int(2));
        globals.declare("a", Value::Int(1));
        assert_eq!(globals.len(), 2);
        assert_eq!(globals.names(), vec!["a".to_string(), "b".to_string()]);
        assert_eq!(globals.get("a").map(|v| v.snapshot()), Some(Value::Int(1)));
        assert!(globals.undeclare("a").is_some());
        assert!(!globals.contains("a"));
    }

    #[test]
    fn test_pop_frame_removes_locals() {
        let mut env = Environment::new();
        env.define("outer", Value::Int(1));
        env.push_frame();
        env.define("inner", Value::Int(2));
        assert_eq!(env.names_in_current_scope(), vec!["inner"]);
        env.pop_frame();
        assert!(env.contains("outer"));
        assert!(!env.contains("inner"));

        // the top-level frame survives extra pops
        env.pop_frame();
        assert_eq!(env.depth(), 1);
        assert!(env.contains("outer"));
    }

    #[test]
    fn test_alias_shares_variable() {
        let mut env = Environment::new();
        let x = env.define("x", Value::Int(1));
        let r = env.define_alias("r", x.clone(), false);
        let (owner, _) = r.target();
        assert!(Arc::ptr_eq(&owner, &x));
        assert_eq!(env.len(), 2);
    }
}
