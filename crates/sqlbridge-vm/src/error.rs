//! VM error types

use thiserror::Error;

/// VM execution errors
#[derive(Debug, Error)]
pub enum VmError {
    /// Type error (e.g., calling non-function)
    #[error("TypeError: {0}")]
    TypeError(String),

    /// Reference error (undefined global or property)
    #[error("ReferenceError: {0}")]
    ReferenceError(String),

    /// Internal error
    #[error("InternalError: {0}")]
    InternalError(String),

    /// Thrown script exception
    #[error("Uncaught exception: {0}")]
    Exception(Box<ThrownValue>),
}

impl VmError {
    /// Create a thrown exception carrying `message`.
    pub fn exception(message: impl Into<String>) -> Self {
        Self::Exception(Box::new(ThrownValue {
            message: message.into(),
        }))
    }

    /// Create a type error
    pub fn type_error(message: impl Into<String>) -> Self {
        Self::TypeError(message.into())
    }

    /// Message of a thrown exception, if this is one.
    pub fn thrown_message(&self) -> Option<&str> {
        match self {
            Self::Exception(thrown) => Some(&thrown.message),
            _ => None,
        }
    }
}

/// A thrown script value
#[derive(Debug, Clone, PartialEq)]
pub struct ThrownValue {
    /// The thrown value (as a string representation)
    pub message: String,
}

impl std::fmt::Display for ThrownValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Result type alias for VM operations
pub type VmResult<T> = Result<T, VmError>;
