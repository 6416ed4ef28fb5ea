//! Slot: a guarded handle on a located storage cell

use std::fmt;
use std::sync::Arc;

use crate::cow::ensure_unique;
use crate::error::ExceptionSink;
use crate::lock::LockChain;
use crate::value::{release_value, Displaced, Map, Object, Sequence, Value};

static NOTHING: Value = Value::Nothing;

/// A step below the slot's anchor, already validated by the resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Step {
    Index(usize),
    Key(String),
}

fn descend<'a>(cur: &'a mut Value, step: &Step, displaced: &mut Displaced) -> &'a mut Value {
    match step {
        Step::Index(i) => ensure_unique::<Sequence>(cur, displaced).entry_mut(*i),
        Step::Key(k) => ensure_unique::<Map>(cur, displaced).entry_mut(k),
    }
}

/// A located storage cell together with every guard protecting it.
///
/// The slot owns its lock chain: the guards are held exactly as long as
/// the slot lives. Everything the slot overwrites is parked and released
/// after the guards, together with the member notifications of every
/// object the path crossed, when the slot is released or dropped.
///
/// A slot stays on the thread that resolved it.
pub struct Slot {
    chain: LockChain,
    link: usize,
    member: Option<String>,
    steps: Vec<Step>,
    displaced: Displaced,
    notify: Vec<(Arc<Object>, String)>,
    written: bool,
}

impl Slot {
    pub(crate) fn new(chain: LockChain, link: usize) -> Self {
        Self {
            chain,
            link,
            member: None,
            steps: Vec::new(),
            displaced: Displaced::new(),
            notify: Vec::new(),
            written: false,
        }
    }

    pub(crate) fn chain_mut(&mut self) -> &mut LockChain {
        &mut self.chain
    }

    pub(crate) fn chain(&self) -> &LockChain {
        &self.chain
    }

    /// Move the anchor to a member of an object locked at `link`.
    ///
    /// Every member crossed keeps its notification; a write below `o.p.x`
    /// notifies both `o` of `p` and the inner object of `x`.
    pub(crate) fn reanchor(&mut self, link: usize, object: &Arc<Object>, member: &str) {
        self.link = link;
        self.member = Some(member.to_string());
        self.steps.clear();
        let seen = self
            .notify
            .iter()
            .any(|(o, m)| o.lock_id() == object.lock_id() && m == member);
        if !seen {
            self.notify.push((Arc::clone(object), member.to_string()));
        }
    }

    pub(crate) fn push_step(&mut self, step: Step) {
        self.steps.push(step);
    }

    /// The located cell and the displaced list, with every container on
    /// the way made uniquely owned.
    pub(crate) fn target_mut(&mut self) -> (&mut Value, &mut Displaced) {
        let mut cur = self.chain.root_mut(self.link, self.member.as_deref());
        for step in &self.steps {
            cur = descend(cur, step, &mut self.displaced);
        }
        (cur, &mut self.displaced)
    }

    /// Record that the cell was written.
    pub(crate) fn touch(&mut self) {
        self.written = true;
    }

    /// Number of container guards the slot holds
    pub fn lock_depth(&self) -> usize {
        self.chain.len()
    }

    /// The current value of the cell.
    pub fn value(&self) -> &Value {
        let mut cur = match self.chain.root(self.link, self.member.as_deref()) {
            Some(v) => v,
            None => return &NOTHING,
        };
        for step in &self.steps {
            let next = match step {
                Step::Index(i) => cur.as_sequence().and_then(|s| s.get(*i)),
                Step::Key(k) => cur.as_map().and_then(|m| m.get(k)),
            };
            cur = match next {
                Some(v) => v,
                None => return &NOTHING,
            };
        }
        cur
    }

    /// Store `value`, taking ownership of it.
    pub fn assign(&mut self, value: Value) {
        let (cell, displaced) = self.target_mut();
        displaced.replace(cell, value);
        self.touch();
    }

    /// Store an alias of `value`; the caller keeps its own reference.
    pub fn assign_ref(&mut self, value: &Value) {
        self.assign(value.clone());
    }

    /// Move the value out, leaving `Nothing` in the cell.
    pub fn take(&mut self) -> Value {
        let (cell, _) = self.target_mut();
        let value = std::mem::take(cell);
        self.touch();
        value
    }

    /// Remove the cell from its container and return its value.
    ///
    /// A map key or object member disappears; a sequence element becomes
    /// `Nothing` (the sequence shrinks when it was the last element); a
    /// variable is left holding `Nothing`.
    pub fn remove(&mut self) -> Value {
        self.touch();
        let Some((last, parents)) = self.steps.split_last() else {
            return match self.member.as_deref() {
                Some(m) => self
                    .chain
                    .object_mut(self.link)
                    .and_then(|state| state.remove_member(m))
                    .unwrap_or_default(),
                None => std::mem::take(self.chain.root_mut(self.link, None)),
            };
        };

        let mut cur = self.chain.root_mut(self.link, self.member.as_deref());
        for step in parents {
            cur = descend(cur, step, &mut self.displaced);
        }
        match last {
            Step::Index(i) => ensure_unique::<Sequence>(cur, &mut self.displaced)
                .take_entry(*i)
                .unwrap_or_default(),
            Step::Key(k) => ensure_unique::<Map>(cur, &mut self.displaced)
                .remove(k)
                .unwrap_or_default(),
        }
    }

    /// Release the guards, then every displaced value, then fire the
    /// member notifications, outermost object first. Errors from destructors and notifications
    /// are raised on `sink`.
    pub fn release(mut self, sink: &mut ExceptionSink) {
        self.finish(sink);
    }

    fn finish(&mut self, sink: &mut ExceptionSink) {
        self.chain.take().release();
        std::mem::take(&mut self.displaced).release(sink);
        for (object, member) in std::mem::take(&mut self.notify) {
            if self.written && object.is_valid() {
                sink.absorb(object.class().member_notification(&object, &member));
            }
            release_value(Value::object(object), sink);
        }
        self.written = false;
    }
}

impl Drop for Slot {
    fn drop(&mut self) {
        let mut sink = ExceptionSink::new();
        self.finish(&mut sink);
        for e in sink.take_all() {
            tracing::warn!(code = e.code(), "exception releasing slot with no handler: {}", e);
        }
    }
}

impl fmt::Debug for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Slot")
            .field("value", self.value())
            .field("chain", &self.chain)
            .field("member", &self.member)
            .field("steps", &self.steps)
            .finish()
    }
}
