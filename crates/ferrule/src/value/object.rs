//! Live class instances

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::Mutex;

use super::release::release_value;
use super::Value;
use crate::error::{ExceptionSink, Result, RuntimeError};
use crate::lock::LockId;

/// Behaviour a class system plugs into its instances.
///
/// Every hook runs with no container guard held by the calling traversal,
/// so hooks may freely read and write values, including the object itself.
pub trait Class: Send + Sync + fmt::Debug {
    /// The class name (used in messages)
    fn name(&self) -> &str;

    /// Teardown logic, run once when the object is deleted explicitly or
    /// its last reference is released. Members are still readable while
    /// this runs.
    fn destructor(&self, _object: &Object) -> Result<()> {
        Ok(())
    }

    /// Consulted by rvalue reads that find no member with this name.
    fn member_gate(&self, _object: &Object, _member: &str) -> Result<Option<Value>> {
        Ok(None)
    }

    /// Fired after a member was written through a slot, once the slot's
    /// guards have been released.
    fn member_notification(&self, _object: &Object, _member: &str) -> Result<()> {
        Ok(())
    }
}

/// Lifecycle of an object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectStatus {
    /// Normal state
    Live,
    /// The destructor is running
    Deleting,
    /// Torn down; every member access raises `OBJECT-ALREADY-DELETED`
    Deleted,
}

/// The guarded part of an object: its status and members.
#[derive(Debug)]
pub struct ObjectState {
    status: ObjectStatus,
    members: IndexMap<String, Value>,
}

impl ObjectState {
    /// Current lifecycle status
    pub fn status(&self) -> ObjectStatus {
        self.status
    }

    /// True unless the object has been torn down
    pub fn is_valid(&self) -> bool {
        self.status != ObjectStatus::Deleted
    }

    /// Look up a member
    pub fn member(&self, name: &str) -> Option<&Value> {
        self.members.get(name)
    }

    /// True if the member exists
    pub fn has_member(&self, name: &str) -> bool {
        self.members.contains_key(name)
    }

    pub(crate) fn member_entry(&mut self, name: &str) -> &mut Value {
        self.members.entry(name.to_string()).or_default()
    }

    pub(crate) fn remove_member(&mut self, name: &str) -> Option<Value> {
        self.members.shift_remove(name)
    }
}

/// A live instance of a user class.
///
/// Unlike sequences and maps, objects are never copied on write: every
/// alias sees the same members, serialized by the object's own guard.
pub struct Object {
    lock_id: LockId,
    class: Arc<dyn Class>,
    system: bool,
    state: Arc<Mutex<ObjectState>>,
}

impl Object {
    /// Create an object of the given class with no members.
    pub fn new(class: Arc<dyn Class>) -> Arc<Object> {
        Self::with_members(class, std::iter::empty())
    }

    /// Create an object with initial members.
    pub fn with_members(
        class: Arc<dyn Class>,
        members: impl IntoIterator<Item = (String, Value)>,
    ) -> Arc<Object> {
        Arc::new(Self::build(class, members, false))
    }

    /// Create a system object, which cannot be deleted explicitly.
    pub fn system(class: Arc<dyn Class>) -> Arc<Object> {
        Arc::new(Self::build(class, std::iter::empty(), true))
    }

    fn build(
        class: Arc<dyn Class>,
        members: impl IntoIterator<Item = (String, Value)>,
        system: bool,
    ) -> Object {
        Object {
            lock_id: LockId::next(),
            class,
            system,
            state: Arc::new(Mutex::new(ObjectState {
                status: ObjectStatus::Live,
                members: members.into_iter().collect(),
            })),
        }
    }

    /// Identity of this object's guard
    pub fn lock_id(&self) -> LockId {
        self.lock_id
    }

    /// The object's class
    pub fn class(&self) -> &Arc<dyn Class> {
        &self.class
    }

    /// The object's class name
    pub fn class_name(&self) -> &str {
        self.class.name()
    }

    /// True for system objects
    pub fn is_system(&self) -> bool {
        self.system
    }

    /// Current lifecycle status
    pub fn status(&self) -> ObjectStatus {
        self.state.lock().status
    }

    /// True unless the object has been torn down
    pub fn is_valid(&self) -> bool {
        self.state.lock().is_valid()
    }

    /// Read a member, returning an alias of its value.
    pub fn member(&self, name: &str) -> Result<Option<Value>> {
        let state = self.state.lock();
        if !state.is_valid() {
            return Err(self.deleted_error(name));
        }
        Ok(state.member(name).cloned())
    }

    /// Write a member, returning the previous value.
    ///
    /// The previous value is handed back rather than dropped here so that
    /// its release happens after the object's guard is gone.
    pub fn set_member(&self, name: &str, value: Value) -> Result<Value> {
        let mut state = self.state.lock();
        if !state.is_valid() {
            return Err(self.deleted_error(name));
        }
        Ok(std::mem::replace(state.member_entry(name), value))
    }

    /// Member names in definition order
    pub fn member_names(&self) -> Vec<String> {
        self.state.lock().members.keys().cloned().collect()
    }

    /// Explicitly delete the object: run its destructor and mark it
    /// deleted. Other aliases stay valid references to a dead object.
    ///
    /// Destructor failures are raised on `sink`.
    pub fn delete(&self, sink: &mut ExceptionSink) -> Result<()> {
        if self.system {
            return Err(RuntimeError::SystemObject {
                class: self.class_name().to_string(),
            });
        }
        self.teardown(sink);
        Ok(())
    }

    pub(crate) fn state(&self) -> &Arc<Mutex<ObjectState>> {
        &self.state
    }

    pub(crate) fn deleted_error(&self, member: &str) -> RuntimeError {
        RuntimeError::ObjectAlreadyDeleted {
            class: self.class_name().to_string(),
            member: member.to_string(),
        }
    }

    /// Run the destructor once and drop the members, outside the guard.
    pub(crate) fn teardown(&self, sink: &mut ExceptionSink) {
        {
            let mut state = self.state.lock();
            if state.status != ObjectStatus::Live {
                return;
            }
            state.status = ObjectStatus::Deleting;
        }

        tracing::debug!(class = self.class_name(), "running destructor");
        sink.absorb(self.class.destructor(self));

        let members = {
            let mut state = self.state.lock();
            state.status = ObjectStatus::Deleted;
            std::mem::take(&mut state.members)
        };
        for (_, value) in members {
            release_value(value, sink);
        }
    }
}

impl Drop for Object {
    fn drop(&mut self) {
        let mut sink = ExceptionSink::new();
        self.teardown(&mut sink);
        for e in sink.take_all() {
            tracing::warn!(
                class = self.class_name(),
                code = e.code(),
                "exception in destructor with no handler: {}",
                e
            );
        }
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Object")
            .field("class", &self.class_name())
            .field("lock_id", &self.lock_id)
            .field("system", &self.system)
            .finish_non_exhaustive()
    }
}
