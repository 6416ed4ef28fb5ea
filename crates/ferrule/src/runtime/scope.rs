//! RAII guards for local scopes and method receivers

use std::sync::Arc;

use super::ThreadContext;
use crate::value::Object;

/// RAII guard that pops a frame of locals when dropped.
///
/// Whatever the frame's locals held is released into the context's
/// exception channel, so a destructor that fails at scope exit is reported
/// by the next operation on the context.
///
/// # Example
///
/// ```
/// use ferrule::{Runtime, Value};
///
/// let mut ctx = Runtime::new().thread();
/// ctx.env_mut().define("x", Value::Int(1));
///
/// {
///     let mut scope = ctx.scope();
///     scope.env_mut().define("y", Value::Int(2));
///     // y is visible here
/// }
/// // guard dropped, frame popped, y is gone
/// assert!(!ctx.env().contains("y"));
/// assert!(ctx.env().contains("x"));
/// ```
pub struct ScopeGuard<'a> {
    ctx: &'a mut ThreadContext,
}

/// RAII guard that makes an object the `self` receiver until dropped.
///
/// Also opens a frame, so locals defined in the method body vanish with it.
pub struct MethodGuard<'a> {
    ctx: &'a mut ThreadContext,
}

impl ThreadContext {
    /// Open a local scope that closes when the guard is dropped.
    pub fn scope(&mut self) -> ScopeGuard<'_> {
        self.env.push_frame();
        ScopeGuard { ctx: self }
    }

    /// Enter a method body with `receiver` as `self`.
    pub fn method_scope(&mut self, receiver: Arc<Object>) -> MethodGuard<'_> {
        self.env.push_frame();
        self.env.push_receiver(receiver);
        MethodGuard { ctx: self }
    }
}

impl<'a> Drop for ScopeGuard<'a> {
    fn drop(&mut self) {
        self.ctx.release_frame();
    }
}

impl<'a> Drop for MethodGuard<'a> {
    fn drop(&mut self) {
        self.ctx.release_receiver();
        self.ctx.release_frame();
    }
}

impl<'a> std::ops::Deref for ScopeGuard<'a> {
    type Target = ThreadContext;

    fn deref(&self) -> &Self::Target {
        self.ctx
    }
}

impl<'a> std::ops::DerefMut for ScopeGuard<'a> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.ctx
    }
}

impl<'a> std::ops::Deref for MethodGuard<'a> {
    type Target = ThreadContext;

    fn deref(&self) -> &Self::Target {
        self.ctx
    }
}

impl<'a> std::ops::DerefMut for MethodGuard<'a> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.ctx
    }
}
