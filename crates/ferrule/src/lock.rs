//! Per-container guards and the lock chain held by a traversal

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::lock_api::ArcMutexGuard;
use parking_lot::{Mutex, RawMutex};

use crate::context::RuntimeConfig;
use crate::error::{Result, RuntimeError};
use crate::value::{Object, ObjectState, Value};

/// Process-unique identity of a lockable container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LockId(u64);

impl LockId {
    pub(crate) fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        LockId(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric id
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for LockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

enum Guard {
    Variable(ArcMutexGuard<RawMutex, Value>),
    Object(ArcMutexGuard<RawMutex, ObjectState>),
}

struct Link {
    id: LockId,
    depth: usize,
    guard: Guard,
}

/// The ordered set of container guards a single traversal holds.
///
/// Guards are acquired root to leaf and released leaf to root. A chain
/// belongs to one thread: the guards inside it cannot be sent elsewhere.
pub struct LockChain {
    links: Vec<Link>,
    order_checks: bool,
    timeout: Option<std::time::Duration>,
    trace: bool,
}

impl LockChain {
    /// Create an empty chain configured by `config`.
    pub fn new(config: &RuntimeConfig) -> Self {
        Self {
            links: Vec::new(),
            order_checks: config.lock_order_checks,
            timeout: config.lock_timeout,
            trace: config.trace_locks,
        }
    }

    /// Number of guards held
    pub fn len(&self) -> usize {
        self.links.len()
    }

    /// True if no guard is held
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// True if this chain already holds the container's guard
    pub fn holds(&self, id: LockId) -> bool {
        self.position(id).is_some()
    }

    fn position(&self, id: LockId) -> Option<usize> {
        self.links.iter().position(|link| link.id == id)
    }

    /// Lock a variable's storage. Returns the link index.
    pub fn enter_variable(
        &mut self,
        id: LockId,
        name: &str,
        storage: &Arc<Mutex<Value>>,
        depth: usize,
    ) -> Result<usize> {
        if let Some(index) = self.position(id) {
            return Ok(index);
        }
        self.check_order(id, depth);
        let guard = match self.timeout {
            None => storage.lock_arc(),
            Some(timeout) => storage
                .try_lock_arc_for(timeout)
                .ok_or_else(|| RuntimeError::Deadlock {
                    container: format!("variable ${}", name),
                    millis: timeout.as_millis(),
                })?,
        };
        Ok(self.push(id, depth, Guard::Variable(guard)))
    }

    /// Lock an object's state. Returns the link index.
    pub fn enter_object(&mut self, object: &Object, depth: usize) -> Result<usize> {
        let id = object.lock_id();
        if let Some(index) = self.position(id) {
            if self.trace {
                tracing::trace!(lock = %id, "re-entering held object guard");
            }
            return Ok(index);
        }
        self.check_order(id, depth);
        let state = object.state();
        let guard = match self.timeout {
            None => state.lock_arc(),
            Some(timeout) => {
                state
                    .try_lock_arc_for(timeout)
                    .ok_or_else(|| RuntimeError::Deadlock {
                        container: format!("object of class {}", object.class_name()),
                        millis: timeout.as_millis(),
                    })?
            }
        };
        Ok(self.push(id, depth, Guard::Object(guard)))
    }

    fn check_order(&self, id: LockId, depth: usize) {
        if !self.order_checks {
            return;
        }
        if let Some(last) = self.links.last() {
            if depth <= last.depth {
                panic!(
                    "lock order violation: acquiring {} at depth {} while holding {} at depth {}",
                    id, depth, last.id, last.depth
                );
            }
        }
    }

    fn push(&mut self, id: LockId, depth: usize, guard: Guard) -> usize {
        if self.trace {
            tracing::trace!(lock = %id, depth, held = self.links.len(), "acquired");
        }
        self.links.push(Link { id, depth, guard });
        self.links.len() - 1
    }

    /// The value a slot anchored at `index` starts from: the variable's
    /// value, or the named member of a locked object.
    pub(crate) fn root(&self, index: usize, member: Option<&str>) -> Option<&Value> {
        match (&self.links.get(index)?.guard, member) {
            (Guard::Variable(g), _) => Some(&**g),
            (Guard::Object(g), Some(m)) => g.member(m),
            (Guard::Object(_), None) => None,
        }
    }

    /// Mutable counterpart of [`LockChain::root`]; a missing object member
    /// is created holding `Nothing`.
    pub(crate) fn root_mut(&mut self, index: usize, member: Option<&str>) -> &mut Value {
        match (&mut self.links[index].guard, member) {
            (Guard::Variable(g), _) => &mut **g,
            (Guard::Object(g), Some(m)) => g.member_entry(m),
            (Guard::Object(_), None) => unreachable!("object anchor without a member"),
        }
    }

    /// State of a locked object
    pub(crate) fn object(&self, index: usize) -> Option<&ObjectState> {
        match &self.links.get(index)?.guard {
            Guard::Object(g) => Some(&**g),
            Guard::Variable(_) => None,
        }
    }

    pub(crate) fn object_mut(&mut self, index: usize) -> Option<&mut ObjectState> {
        match &mut self.links.get_mut(index)?.guard {
            Guard::Object(g) => Some(&mut **g),
            Guard::Variable(_) => None,
        }
    }

    /// Move the held guards out, leaving an empty chain with the same
    /// configuration behind.
    pub(crate) fn take(&mut self) -> LockChain {
        LockChain {
            links: std::mem::take(&mut self.links),
            order_checks: self.order_checks,
            timeout: self.timeout,
            trace: self.trace,
        }
    }

    /// Release every guard, leaf first.
    pub fn release(mut self) {
        self.unwind();
    }

    fn unwind(&mut self) {
        while let Some(link) = self.links.pop() {
            if self.trace {
                tracing::trace!(lock = %link.id, depth = link.depth, "released");
            }
            drop(link);
        }
    }
}

impl Drop for LockChain {
    fn drop(&mut self) {
        self.unwind();
    }
}

impl fmt::Debug for LockChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.links.iter().map(|link| (link.id, link.depth)))
            .finish()
    }
}
