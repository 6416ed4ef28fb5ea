//! The consumer API: a shared runtime and per-thread contexts

mod scope;

pub use scope::{MethodGuard, ScopeGuard};

use std::ops::ControlFlow;
use std::sync::Arc;

use crate::context::RuntimeConfig;
use crate::environment::{Environment, Globals};
use crate::error::{ExceptionSink, Result, RuntimeError};
use crate::ops::{CompoundOp, IncDec};
use crate::path::LvaluePath;
use crate::resolve::{AccessMode, Lookup, Resolver};
use crate::slot::Slot;
use crate::value::{release_value, Object, Value};

#[derive(Debug)]
struct Shared {
    config: RuntimeConfig,
    globals: Globals,
}

/// A runtime instance: configuration plus the process-wide globals.
///
/// Cheap to clone; every clone shares the same globals. Each OS thread
/// works through its own [`ThreadContext`].
#[derive(Debug, Clone)]
pub struct Runtime {
    shared: Arc<Shared>,
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

impl Runtime {
    /// Create a runtime with the default configuration.
    pub fn new() -> Self {
        Self::with_config(RuntimeConfig::default())
    }

    /// Create a runtime with an explicit configuration.
    pub fn with_config(config: RuntimeConfig) -> Self {
        Self {
            shared: Arc::new(Shared {
                config,
                globals: Globals::new(),
            }),
        }
    }

    /// The runtime configuration
    pub fn config(&self) -> &RuntimeConfig {
        &self.shared.config
    }

    /// The process-wide variables
    pub fn globals(&self) -> &Globals {
        &self.shared.globals
    }

    /// Create a context for the calling thread.
    pub fn thread(&self) -> ThreadContext {
        ThreadContext::new(self)
    }
}

/// One thread's view of a runtime: its local scopes and its exception
/// channel.
///
/// Every operation resolves a fresh slot, performs the mutation, releases
/// the guards, then releases displaced values. Exceptions raised during
/// that release (destructors, member notifications) are reported by the
/// operation itself once the mutation has completed.
#[derive(Debug)]
pub struct ThreadContext {
    runtime: Runtime,
    env: Environment,
    sink: ExceptionSink,
}

impl ThreadContext {
    /// Create a context with an empty local environment.
    pub fn new(runtime: &Runtime) -> Self {
        Self {
            runtime: runtime.clone(),
            env: Environment::new(),
            sink: ExceptionSink::new(),
        }
    }

    /// The runtime this context belongs to
    pub fn runtime(&self) -> &Runtime {
        &self.runtime
    }

    /// The local environment
    pub fn env(&self) -> &Environment {
        &self.env
    }

    /// Mutable access to the local environment
    pub fn env_mut(&mut self) -> &mut Environment {
        &mut self.env
    }

    /// The exception channel
    pub fn exceptions(&mut self) -> &mut ExceptionSink {
        &mut self.sink
    }

    /// Run `f` as a method body with `receiver` bound to `self`.
    pub fn with_receiver<T>(
        &mut self,
        receiver: Arc<Object>,
        f: impl FnOnce(&mut ThreadContext) -> T,
    ) -> T {
        let mut method = self.method_scope(receiver);
        f(&mut *method)
    }

    // ═══════════════════════════════════════════════════════════════════
    // Local Scopes
    // ═══════════════════════════════════════════════════════════════════

    /// Enter a new local scope.
    pub fn push_frame(&mut self) {
        self.env.push_frame();
    }

    /// Leave the innermost local scope, releasing what its locals held and
    /// surfacing any error raised by that teardown.
    pub fn pop_frame(&mut self) -> Result<()> {
        self.release_frame();
        self.sink.check()
    }

    fn release_frame(&mut self) {
        // newest binding first
        for binding in self.env.pop_frame().into_iter().rev() {
            binding.variable.release(&mut self.sink);
        }
    }

    fn release_receiver(&mut self) {
        if let Some(receiver) = self.env.pop_receiver() {
            release_value(Value::object(receiver), &mut self.sink);
        }
    }

    fn resolver(&self) -> Resolver<'_> {
        Resolver::new(self.runtime.config(), self.runtime.globals(), &self.env)
    }

    // ═══════════════════════════════════════════════════════════════════
    // Slot Resolution
    // ═══════════════════════════════════════════════════════════════════

    /// Resolve a slot. `Write` always yields `Some`; `ReadExisting` yields
    /// `None` when some step of the path does not exist.
    pub fn resolve(&self, path: &LvaluePath, mode: AccessMode) -> Result<Option<Slot>> {
        self.resolver().resolve(path, mode)
    }

    /// Resolve a slot for writing.
    pub fn resolve_write(&self, path: &LvaluePath) -> Result<Slot> {
        self.resolver().write(path)
    }

    /// Release a slot and surface anything raised while doing so.
    pub fn release(&mut self, slot: Slot) -> Result<()> {
        slot.release(&mut self.sink);
        self.sink.check()
    }

    fn with_write<T>(
        &mut self,
        path: &LvaluePath,
        f: impl FnOnce(&mut Slot) -> Result<T>,
    ) -> Result<T> {
        let mut slot = self.resolver().write(path)?;
        let result = f(&mut slot);
        slot.release(&mut self.sink);
        let value = result?;
        self.sink.check()?;
        Ok(value)
    }

    fn with_existing<T>(
        &mut self,
        path: &LvaluePath,
        f: impl FnOnce(&mut Slot) -> Result<T>,
    ) -> Result<Option<T>> {
        let Some(mut slot) = self.resolver().read_existing(path)? else {
            return Ok(None);
        };
        let result = f(&mut slot);
        slot.release(&mut self.sink);
        let value = result?;
        self.sink.check()?;
        Ok(Some(value))
    }

    // ═══════════════════════════════════════════════════════════════════
    // Reads
    // ═══════════════════════════════════════════════════════════════════

    /// Read the value a path names, as an alias.
    ///
    /// A path that does not exist reads as `Nothing`; a missing object
    /// member is first offered to the class's member gate.
    pub fn get(&mut self, path: &LvaluePath) -> Result<Value> {
        let lookup = self.resolver().lookup(path, AccessMode::ReadExisting)?;
        match lookup {
            Lookup::Found(slot) => {
                let value = slot.value().clone();
                self.release(slot)?;
                Ok(value)
            }
            Lookup::Missing => Ok(Value::Nothing),
            Lookup::MissingMember(object, member) => {
                let gated = object.class().member_gate(&object, &member);
                release_value(Value::object(object), &mut self.sink);
                let value = gated?.unwrap_or_default();
                self.sink.check()?;
                Ok(value)
            }
        }
    }

    // ═══════════════════════════════════════════════════════════════════
    // Writes
    // ═══════════════════════════════════════════════════════════════════

    /// Store `value` at `path`, creating whatever is missing.
    pub fn assign(&mut self, path: &LvaluePath, value: Value) -> Result<()> {
        self.with_write(path, |slot| {
            slot.assign(value);
            Ok(())
        })
    }

    /// Store an alias of `value` at `path`.
    pub fn assign_ref(&mut self, path: &LvaluePath, value: &Value) -> Result<()> {
        self.assign(path, value.clone())
    }

    /// Apply a compound operator; returns the new value.
    pub fn apply(&mut self, path: &LvaluePath, op: CompoundOp, operand: &Value) -> Result<Value> {
        self.with_write(path, |slot| slot.apply(op, operand))
    }

    /// Apply an increment or decrement.
    pub fn step(&mut self, path: &LvaluePath, kind: IncDec) -> Result<Value> {
        self.with_write(path, |slot| slot.step(kind))
    }

    /// Splice a sequence or text; returns the removed portion.
    pub fn splice(
        &mut self,
        path: &LvaluePath,
        offset: i64,
        length: Option<i64>,
        replacement: Option<&Value>,
    ) -> Result<Value> {
        self.with_write(path, |slot| slot.splice(offset, length, replacement))
    }

    /// Append to the sequence at `path`.
    pub fn push(&mut self, path: &LvaluePath, value: Value) -> Result<()> {
        self.with_write(path, |slot| slot.push(value))
    }

    /// Prepend to the sequence at `path`.
    pub fn unshift(&mut self, path: &LvaluePath, value: Value) -> Result<()> {
        self.with_write(path, |slot| slot.unshift(value))
    }

    /// Remove the last element of the sequence at `path`.
    pub fn pop(&mut self, path: &LvaluePath) -> Result<Value> {
        Ok(self
            .with_existing(path, |slot| Ok(slot.pop()))?
            .unwrap_or_default())
    }

    /// Remove the first element of the sequence at `path`.
    pub fn shift(&mut self, path: &LvaluePath) -> Result<Value> {
        Ok(self
            .with_existing(path, |slot| Ok(slot.shift()))?
            .unwrap_or_default())
    }

    /// Take the value out of its container and return it.
    ///
    /// Map keys and object members are removed; sequence elements are
    /// left holding `Nothing`.
    pub fn remove(&mut self, path: &LvaluePath) -> Result<Value> {
        Ok(self
            .with_existing(path, |slot| Ok(slot.remove()))?
            .unwrap_or_default())
    }

    /// Remove the value and, if it is an object, delete it explicitly.
    ///
    /// The destructor runs after every guard has been released.
    pub fn delete(&mut self, path: &LvaluePath) -> Result<()> {
        let removed = self.with_existing(path, |slot| {
            if let Some(object) = slot.value().as_object() {
                if object.is_system() {
                    return Err(RuntimeError::SystemObject {
                        class: object.class_name().to_string(),
                    });
                }
            }
            Ok(slot.remove())
        })?;
        let Some(value) = removed else {
            return Ok(());
        };
        if let Some(object) = value.as_object() {
            object.delete(&mut self.sink)?;
        }
        release_value(value, &mut self.sink);
        self.sink.check()
    }

    // ═══════════════════════════════════════════════════════════════════
    // Iteration
    // ═══════════════════════════════════════════════════════════════════

    /// Iterate over the sequence at `path`, letting `body` modify each
    /// element in place.
    ///
    /// `body` runs with no guard held; each element is written back
    /// through its own slot right after `body` returns, so later reads see
    /// the update. A non-sequence value is visited once, as element 0 of
    /// itself. `Nothing` is not visited at all.
    pub fn for_each_ref(
        &mut self,
        path: &LvaluePath,
        mut body: impl FnMut(usize, &mut Value) -> ControlFlow<()>,
    ) -> Result<()> {
        let snapshot = self.get(path)?;
        let (items, whole) = match snapshot.as_sequence() {
            Some(seq) => (seq.iter().cloned().collect::<Vec<_>>(), false),
            None if snapshot.is_nothing() => (Vec::new(), false),
            None => (vec![snapshot.clone()], true),
        };
        release_value(snapshot, &mut self.sink);
        self.sink.check()?;

        for (index, mut item) in items.into_iter().enumerate() {
            let flow = body(index, &mut item);
            let target = if whole {
                path.clone()
            } else {
                path.clone().index(index as i64)
            };
            self.assign(&target, item)?;
            if flow.is_break() {
                break;
            }
        }
        Ok(())
    }
}
