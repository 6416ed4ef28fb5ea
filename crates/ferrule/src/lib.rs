//! # Ferrule
//!
//! The value core of an embeddable dynamic-language runtime.
//!
//! Ferrule stores, shares, duplicates and mutates runtime values. Heap
//! values are reference counted and copied only when written through a
//! shared alias; scalars live unboxed. Mutation goes through a [`Slot`]: a
//! guarded handle to one storage cell, located by resolving an
//! [`LvaluePath`] through variables, sequences, maps and live objects while
//! holding every container guard on the way.
//!
//! ## Architecture
//!
//! - **Values**: [`Value`] scalars and [`Node`] heap references
//! - **Copy-on-write**: [`ensure_unique`] gives a private payload before any write
//! - **Locking**: a [`LockChain`] holds the guards of every container a slot passes through
//! - **Resolution**: [`Resolver`] turns a path into a [`Slot`], vivifying in write mode
//! - **Operators**: compound assignment, increments, splice and list operators on [`Slot`]
//! - **Runtime**: [`Runtime`] and [`ThreadContext`], the consumer API
//! - **Front end**: [`frontend`] lowers Rust-syntax expressions with `syn`
//!
//! ## Example
//!
//! ```
//! use ferrule::{LvaluePath, Runtime, Value};
//!
//! let runtime = Runtime::new();
//! let mut ctx = runtime.thread();
//! ctx.env_mut().define("v", Value::Nothing);
//!
//! ctx.assign(&LvaluePath::var("v").index(2), Value::Int(7)).unwrap();
//! let v = ctx.get(&LvaluePath::var("v")).unwrap();
//! assert_eq!(v.as_sequence().map(|s| s.len()), Some(3));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod context;
pub mod cow;
pub mod environment;
pub mod error;
pub mod frontend;
pub mod lock;
pub mod ops;
pub mod path;
pub mod resolve;
pub mod runtime;
pub mod slot;
pub mod value;
pub mod variable;

// Re-export main types
pub use context::RuntimeConfig;
pub use cow::{ensure_unique, CowKind};
pub use environment::{Binding, Environment, Globals};
pub use error::{type_name, ExceptionSink, Result, RuntimeError};
pub use lock::{LockChain, LockId};
pub use ops::{CompoundOp, IncDec};
pub use path::{LvaluePath, PathRoot, PathStep};
pub use resolve::{AccessMode, Resolver};
pub use runtime::{MethodGuard, Runtime, ScopeGuard, ThreadContext};
pub use slot::Slot;
pub use value::{
    release_value, Binary, Class, Closure, Displaced, FloatNode, IntegerNode, Map, Node,
    NodeKind, Object, ObjectState, ObjectStatus, Sequence, Text, Value,
};
pub use variable::{Storage, Variable};

/// Ferrule version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_exists() {
        assert!(!VERSION.is_empty());
    }
}
