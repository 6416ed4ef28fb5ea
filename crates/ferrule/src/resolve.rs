//! Slot resolution: locate (and, for writes, vivify) the cell a path names

use std::sync::Arc;

use crate::context::RuntimeConfig;
use crate::environment::{Environment, Globals};
use crate::error::{Result, RuntimeError};
use crate::lock::LockChain;
use crate::path::{LvaluePath, PathRoot, PathStep};
use crate::slot::{Slot, Step};
use crate::value::{Object, Sequence};

/// What the caller intends to do with the slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    /// Create missing containers and elements on the way
    Write,

    /// Only locate cells that already exist
    ReadExisting,
}

/// Outcome of a lookup, before it is narrowed for the public API.
pub(crate) enum Lookup {
    Found(Slot),
    Missing,
    /// An object had no such member; the class may still supply one
    MissingMember(Arc<Object>, String),
}

/// Resolves lvalue paths against one thread's scopes.
pub struct Resolver<'a> {
    config: &'a RuntimeConfig,
    globals: &'a Globals,
    env: &'a Environment,
}

impl<'a> Resolver<'a> {
    /// Create a resolver over the given scopes.
    pub fn new(config: &'a RuntimeConfig, globals: &'a Globals, env: &'a Environment) -> Self {
        Self {
            config,
            globals,
            env,
        }
    }

    /// Resolve `path`. In `Write` mode the result is always `Some`.
    pub fn resolve(&self, path: &LvaluePath, mode: AccessMode) -> Result<Option<Slot>> {
        match self.lookup(path, mode)? {
            Lookup::Found(slot) => Ok(Some(slot)),
            Lookup::Missing | Lookup::MissingMember(..) => Ok(None),
        }
    }

    /// Resolve `path` for writing, creating whatever is missing.
    pub fn write(&self, path: &LvaluePath) -> Result<Slot> {
        match self.lookup(path, AccessMode::Write)? {
            Lookup::Found(slot) => Ok(slot),
            Lookup::Missing | Lookup::MissingMember(..) => {
                unreachable!("write resolution of {} reported a missing cell", path)
            }
        }
    }

    /// Resolve `path` only if every step already exists.
    pub fn read_existing(&self, path: &LvaluePath) -> Result<Option<Slot>> {
        self.resolve(path, AccessMode::ReadExisting)
    }

    pub(crate) fn lookup(&self, path: &LvaluePath, mode: AccessMode) -> Result<Lookup> {
        let write = mode == AccessMode::Write;

        // A bad index anywhere fails the whole path before any container
        // is touched.
        for step in &path.steps {
            if let PathStep::Index(index) = step {
                if *index < 0 {
                    return Err(RuntimeError::NegativeListIndex { index: *index });
                }
                if write && *index as u64 >= Sequence::MAX_LEN as u64 {
                    return Err(RuntimeError::ListIndexTooLarge { index: *index });
                }
            }
        }

        let mut chain = LockChain::new(self.config);
        let mut depth = 0;

        let mut slot = match &path.root {
            PathRoot::Variable(name) => {
                let var = self
                    .env
                    .lookup(name)
                    .or_else(|| self.globals.get(name))
                    .ok_or_else(|| RuntimeError::UndefinedVariable { name: name.clone() })?;
                let (owner, read_only_via) = var.target();
                if let (true, Some(alias)) = (write, read_only_via) {
                    return Err(RuntimeError::ReadOnlyVariable { variable: alias });
                }
                let Some((id, cell)) = owner.cell() else {
                    unreachable!("alias target ${} owns no storage", owner.name())
                };
                let link = chain.enter_variable(id, owner.name(), cell, depth)?;
                Slot::new(chain, link)
            }
            PathRoot::SelfMember(member) => {
                let receiver = self
                    .env
                    .receiver()
                    .cloned()
                    .ok_or_else(|| RuntimeError::NoReceiver {
                        member: member.clone(),
                    })?;
                let link = chain.enter_object(&receiver, depth)?;
                let mut slot = Slot::new(chain, link);
                if !anchor_member(&mut slot, link, &receiver, member, write)? {
                    return Ok(Lookup::MissingMember(receiver, member.clone()));
                }
                slot
            }
        };

        for step in &path.steps {
            match step {
                PathStep::Index(index) => {
                    let index = *index as usize;
                    if !write {
                        match slot.value().as_sequence() {
                            Some(seq) if index < seq.len() => {}
                            _ => return Ok(Lookup::Missing),
                        }
                    }
                    slot.push_step(Step::Index(index));
                }
                PathStep::Key(key) => {
                    let object = slot.value().as_object().cloned();
                    if let Some(object) = object {
                        depth += 1;
                        let link = slot.chain_mut().enter_object(&object, depth)?;
                        if !anchor_member(&mut slot, link, &object, key, write)? {
                            return Ok(Lookup::MissingMember(object, key.clone()));
                        }
                        continue;
                    }
                    if !write {
                        match slot.value().as_map() {
                            Some(map) if map.contains_key(key) => {}
                            _ => return Ok(Lookup::Missing),
                        }
                    }
                    slot.push_step(Step::Key(key.clone()));
                }
            }
        }

        if write {
            // vivify every container and element the path names
            let _ = slot.target_mut();
        }
        tracing::trace!(path = %path, ?mode, locks = slot.lock_depth(), "resolved slot");
        Ok(Lookup::Found(slot))
    }
}

/// Point `slot` at `member` of the object locked at `link`.
///
/// A torn-down object is a hard failure in every mode; a missing member is
/// a soft failure (`false`) unless writing.
fn anchor_member(
    slot: &mut Slot,
    link: usize,
    object: &Arc<Object>,
    member: &str,
    write: bool,
) -> Result<bool> {
    if let Some(state) = slot.chain().object(link) {
        if !state.is_valid() {
            return Err(object.deleted_error(member));
        }
        if !write && !state.has_member(member) {
            return Ok(false);
        }
    }
    slot.reanchor(link, object, member);
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{Map, Value};

    fn resolver_parts() -> (RuntimeConfig, Globals, Environment) {
        (
            RuntimeConfig::default().lock_order_checks(true),
            Globals::new(),
            Environment::new(),
        )
    }

    #[test]
    fn test_write_vivifies_nested_containers() {
        let (config, globals, mut env) = resolver_parts();
        let v = env.define("v", Value::Nothing);
        let resolver = Resolver::new(&config, &globals, &env);

        let mut slot = resolver.write(&LvaluePath::var("v").index(2).key("k")).unwrap();
        slot.assign(Value::Int(9));
        drop(slot);

        let seq = v.snapshot();
        let seq = seq.as_sequence().unwrap();
        assert_eq!(seq.len(), 3);
        assert!(seq.get(0).is_some_and(Value::is_nothing));
        let map = seq.get(2).and_then(Value::as_map).unwrap();
        assert_eq!(map.get("k"), Some(&Value::Int(9)));
    }

    #[test]
    fn test_read_existing_soft_failures() {
        let (config, globals, mut env) = resolver_parts();
        env.define("m", Value::map(Map::new().with("a", Value::Int(1))));
        let resolver = Resolver::new(&config, &globals, &env);

        assert!(resolver
            .read_existing(&LvaluePath::var("m").key("b"))
            .unwrap()
            .is_none());
        assert!(resolver
            .read_existing(&LvaluePath::var("m").index(0))
            .unwrap()
            .is_none());
        let slot = resolver
            .read_existing(&LvaluePath::var("m").key("a"))
            .unwrap()
            .unwrap();
        assert_eq!(slot.value(), &Value::Int(1));
    }

    #[test]
    fn test_globals_are_found_after_locals() {
        let (config, globals, mut env) = resolver_parts();
        globals.declare("g", Value::Int(1));
        env.define("x", Value::Int(2));
        let resolver = Resolver::new(&config, &globals, &env);

        let slot = resolver.read_existing(&LvaluePath::var("g")).unwrap().unwrap();
        assert_eq!(slot.value(), &Value::Int(1));
        drop(slot);

        let err = resolver.read_existing(&LvaluePath::var("nope")).unwrap_err();
        assert_eq!(err.code(), "UNDEFINED-VARIABLE");
    }

    #[test]
    fn test_self_member_requires_receiver() {
        let (config, globals, env) = resolver_parts();
        let resolver = Resolver::new(&config, &globals, &env);
        let err = resolver
            .write(&LvaluePath::self_member("x"))
            .unwrap_err();
        assert_eq!(err.code(), "NO-RECEIVER");
    }
}
