//! Variable storage and aliases

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::ExceptionSink;
use crate::lock::LockId;
use crate::value::{release_value, Value};

/// Where a variable keeps its value.
pub enum Storage {
    /// The variable owns a guarded value cell
    Local {
        /// Guard identity of the cell
        id: LockId,
        /// The cell itself
        cell: Arc<Mutex<Value>>,
    },

    /// The variable forwards to another variable (an import or a
    /// reference parameter)
    Alias {
        /// The aliased variable
        target: Arc<Variable>,
        /// Writes through this alias are refused
        read_only: bool,
    },
}

/// A named variable.
pub struct Variable {
    name: String,
    storage: Storage,
}

impl Variable {
    /// Create a variable owning `value`.
    pub fn new(name: impl Into<String>, value: Value) -> Arc<Variable> {
        Arc::new(Variable {
            name: name.into(),
            storage: Storage::Local {
                id: LockId::next(),
                cell: Arc::new(Mutex::new(value)),
            },
        })
    }

    /// Create an alias of `target`.
    pub fn alias(
        name: impl Into<String>,
        target: Arc<Variable>,
        read_only: bool,
    ) -> Arc<Variable> {
        Arc::new(Variable {
            name: name.into(),
            storage: Storage::Alias { target, read_only },
        })
    }

    /// The variable's name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// How the variable stores its value
    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// True if this variable is an alias
    pub fn is_alias(&self) -> bool {
        matches!(self.storage, Storage::Alias { .. })
    }

    /// Follow aliases to the variable that owns the storage.
    ///
    /// Returns the owning variable, and the name of the first read-only
    /// alias crossed on the way (if any).
    pub fn target(self: &Arc<Self>) -> (Arc<Variable>, Option<String>) {
        let mut current = Arc::clone(self);
        let mut read_only_via = None;
        loop {
            let next = match &current.storage {
                Storage::Local { .. } => None,
                Storage::Alias { target, read_only } => {
                    if *read_only && read_only_via.is_none() {
                        read_only_via = Some(current.name.clone());
                    }
                    Some(Arc::clone(target))
                }
            };
            match next {
                Some(next) => current = next,
                None => return (current, read_only_via),
            }
        }
    }

    /// The guarded cell, for variables that own one.
    pub(crate) fn cell(&self) -> Option<(LockId, &Arc<Mutex<Value>>)> {
        match &self.storage {
            Storage::Local { id, cell } => Some((*id, cell)),
            Storage::Alias { .. } => None,
        }
    }

    /// An aliasing snapshot of the current value.
    ///
    /// Takes and releases the storage guard on its own; not for use while
    /// a chain holds it.
    pub fn snapshot(self: &Arc<Self>) -> Value {
        let (owner, _) = self.target();
        match owner.cell() {
            Some((_, cell)) => cell.lock().clone(),
            None => Value::Nothing,
        }
    }

    /// Drop this handle, releasing the stored value into `sink` if it was
    /// the last one.
    ///
    /// An alias releases its target the same way.
    pub fn release(self: Arc<Self>, sink: &mut ExceptionSink) {
        let mut next = Some(self);
        while let Some(var) = next.take() {
            let Ok(var) = Arc::try_unwrap(var) else {
                continue;
            };
            match var.storage {
                Storage::Local { cell, .. } => {
                    let value = match Arc::try_unwrap(cell) {
                        Ok(cell) => cell.into_inner(),
                        // a slot elsewhere still holds the guard
                        Err(cell) => std::mem::take(&mut *cell.lock()),
                    };
                    release_value(value, sink);
                }
                Storage::Alias { target, .. } => next = Some(target),
            }
        }
    }
}

impl fmt::Debug for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.storage {
            Storage::Local { id, .. } => write!(f, "${} (local {})", self.name, id),
            Storage::Alias { target, read_only } => write!(
                f,
                "${} -> ${}{}",
                self.name,
                target.name,
                if *read_only { " (read-only)" } else { "" }
            ),
        }
    }
}
