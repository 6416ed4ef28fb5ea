//! Error types and the shared exception channel

use std::collections::VecDeque;

use thiserror::Error;

use crate::value::{Node, Value};

/// A language-level exception raised by the value core.
///
/// Every variant carries a symbolic code (see [`RuntimeError::code`]) that
/// the layers above match against, plus a human-readable message.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RuntimeError {
    /// A negative index was used to address a sequence element
    #[error("list index {index} is invalid (index must evaluate to a non-negative integer)")]
    NegativeListIndex {
        /// The offending index
        index: i64,
    },

    /// A sequence index too large for any sequence to hold
    #[error("list index {index} is beyond the largest possible list")]
    ListIndexTooLarge {
        /// The offending index
        index: i64,
    },

    /// A member of an object was accessed after the object was torn down
    #[error("attempt to access member \"{member}\" of an already-deleted object of class {class}")]
    ObjectAlreadyDeleted {
        /// Class name of the deleted object
        class: String,
        /// Member that was accessed
        member: String,
    },

    /// Write through a read-only variable alias
    #[error("attempt to write to read-only variable ${variable}")]
    ReadOnlyVariable {
        /// Name of the alias that was written through
        variable: String,
    },

    /// Variable not declared in any visible scope
    #[error("variable ${name} has not been declared")]
    UndefinedVariable {
        /// The variable name
        name: String,
    },

    /// A `self` member was addressed outside of a method body
    #[error("member \"{member}\" referenced outside of a method body")]
    NoReceiver {
        /// The member name
        member: String,
    },

    /// Integer division or modulo by zero
    #[error("integer {op} by zero")]
    DivisionByZero {
        /// The operator that failed ("division" or "modulo")
        op: &'static str,
    },

    /// Splice applied to something that is neither a sequence nor text
    #[error("first (lvalue) argument to the splice operator is not a list or a string (got {got})")]
    Splice {
        /// Type name of the lvalue's current value
        got: String,
    },

    /// A list operator (push, unshift) applied to a non-sequence
    #[error("{op} requires a list lvalue, got {got}")]
    List {
        /// The operator name
        op: &'static str,
        /// Type name of the lvalue's current value
        got: String,
    },

    /// Attempt to delete a system object
    #[error("you cannot delete a system constant object (class {class})")]
    SystemObject {
        /// Class name of the object
        class: String,
    },

    /// A container guard could not be acquired within the configured timeout
    #[error("timed out after {millis}ms waiting for the lock on {container}; possible lock cycle")]
    Deadlock {
        /// Description of the container being locked
        container: String,
        /// How long we waited
        millis: u128,
    },

    /// Source text could not be parsed
    #[error("parse error: {message}")]
    Parse {
        /// Parser message
        message: String,
    },

    /// An expression cannot be used as an assignment target
    #[error("expression `{expr}` is not a valid lvalue")]
    InvalidLvalue {
        /// Rendered expression
        expr: String,
    },

    /// An expression kind the lowering front end does not handle
    #[error("unsupported expression: {kind}")]
    UnsupportedExpression {
        /// Kind of expression
        kind: String,
    },

    /// An exception raised by user code (class hooks, destructors)
    #[error("{code}: {message}")]
    Raised {
        /// Symbolic code chosen by the raiser
        code: String,
        /// Description
        message: String,
    },
}

impl RuntimeError {
    /// Create a user-level exception with an arbitrary code.
    pub fn raised(code: impl Into<String>, message: impl Into<String>) -> Self {
        RuntimeError::Raised {
            code: code.into(),
            message: message.into(),
        }
    }

    /// The symbolic exception code.
    pub fn code(&self) -> &str {
        match self {
            RuntimeError::NegativeListIndex { .. } => "NEGATIVE-LIST-INDEX",
            RuntimeError::ListIndexTooLarge { .. } => "LIST-INDEX-TOO-LARGE",
            RuntimeError::ObjectAlreadyDeleted { .. } => "OBJECT-ALREADY-DELETED",
            RuntimeError::ReadOnlyVariable { .. } => "ACCESS-ERROR",
            RuntimeError::UndefinedVariable { .. } => "UNDEFINED-VARIABLE",
            RuntimeError::NoReceiver { .. } => "NO-RECEIVER",
            RuntimeError::DivisionByZero { .. } => "DIVISION-BY-ZERO",
            RuntimeError::Splice { .. } => "SPLICE-ERROR",
            RuntimeError::List { .. } => "LIST-ERROR",
            RuntimeError::SystemObject { .. } => "SYSTEM-OBJECT-ERROR",
            RuntimeError::Deadlock { .. } => "THREAD-DEADLOCK",
            RuntimeError::Parse { .. } => "PARSE-ERROR",
            RuntimeError::InvalidLvalue { .. } => "INVALID-LVALUE",
            RuntimeError::UnsupportedExpression { .. } => "UNSUPPORTED-EXPRESSION",
            RuntimeError::Raised { code, .. } => code,
        }
    }
}

/// Result type alias for value-core operations
pub type Result<T> = std::result::Result<T, RuntimeError>;

/// The exception channel.
///
/// Hard failures of an operation come back as `Err` directly. Errors that
/// happen while releasing displaced values (object destructors, mostly) run
/// after the operation's locks are gone and have no caller to return to, so
/// they are collected here instead.
#[derive(Debug, Default)]
pub struct ExceptionSink {
    pending: VecDeque<RuntimeError>,
}

impl ExceptionSink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an exception.
    pub fn raise(&mut self, error: RuntimeError) {
        tracing::debug!(code = error.code(), "exception raised: {}", error);
        self.pending.push_back(error);
    }

    /// Queue the error of a failed result, discarding a success.
    pub fn absorb(&mut self, result: Result<()>) {
        if let Err(e) = result {
            self.raise(e);
        }
    }

    /// True if any exception is pending.
    pub fn is_event(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Number of pending exceptions.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// True if nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Surface the oldest pending exception, leaving later ones queued.
    pub fn check(&mut self) -> Result<()> {
        match self.pending.pop_front() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Drain every pending exception in the order raised.
    pub fn take_all(&mut self) -> Vec<RuntimeError> {
        self.pending.drain(..).collect()
    }
}

/// Get a human-readable type name for a value (for error messages).
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Nothing => "nothing",
        Value::Bool(_) => "bool",
        Value::Int(_) => "int",
        Value::Float(_) => "float",
        Value::Node(node) => match node {
            Node::Integer(_) => "int",
            Node::Float(_) => "float",
            Node::Text(_) => "string",
            Node::Binary(_) => "binary",
            Node::Sequence(_) => "list",
            Node::Map(_) => "hash",
            Node::Closure(_) => "closure",
            Node::Object(_) => "object",
        },
    }
}
