//! Error types for the SQLite bindings

use sqlbridge_vm::VmError;
use thiserror::Error;

/// Tag prefixed to every message thrown into scripts.
pub const MODULE_TAG: &str = "[sqlmodule]";

/// Result type alias for the SQLite bindings
pub type SqliteResult<T> = Result<T, SqliteModuleError>;

#[derive(Debug, Error)]
pub enum SqliteModuleError {
    #[error("Database not open")]
    ConnectionNotOpen,

    #[error("Error in {op}: {message}")]
    Sql {
        op: &'static str,
        message: String,
        code: Option<i32>,
    },

    #[error("Unsupported column type {type_name} in column '{column}'")]
    UnsupportedColumnType {
        column: String,
        type_name: &'static str,
    },

    #[error("Error in escape: Memory allocation failed during string escaping")]
    EscapeAllocationFailure,

    #[error("Error in {op}: {message}")]
    InvalidArgument { op: &'static str, message: String },

    #[error("Expected a {expected} handle")]
    WrongHandleType { expected: &'static str },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl SqliteModuleError {
    /// Wrap a native failure raised while running `op`.
    pub fn sql(op: &'static str, err: rusqlite::Error) -> Self {
        let code = match &err {
            rusqlite::Error::SqliteFailure(e, _) => Some(e.extended_code),
            _ => None,
        };
        let message = match &err {
            // The engine's own text, without rusqlite's code prefix
            rusqlite::Error::SqliteFailure(_, Some(msg)) => msg.clone(),
            other => other.to_string(),
        };
        SqliteModuleError::Sql { op, message, code }
    }

    pub fn invalid_argument(op: &'static str, message: impl Into<String>) -> Self {
        SqliteModuleError::InvalidArgument {
            op,
            message: message.into(),
        }
    }

    /// Native result code, kept on the Rust side only.
    pub fn code(&self) -> Option<i32> {
        match self {
            SqliteModuleError::Sql { code, .. } => *code,
            _ => None,
        }
    }

    /// Convert into the exception a script observes.
    pub fn into_exception(self) -> VmError {
        VmError::exception(format!("{} {}", MODULE_TAG, self))
    }
}

impl From<SqliteModuleError> for VmError {
    fn from(err: SqliteModuleError) -> Self {
        err.into_exception()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exception_message_is_tagged() {
        let err: VmError = SqliteModuleError::ConnectionNotOpen.into();
        assert_eq!(err.thrown_message(), Some("[sqlmodule] Database not open"));
    }

    #[test]
    fn test_sql_error_keeps_native_text() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        let native = conn.prepare("SELEC 1").err().expect("malformed SQL");
        let err = SqliteModuleError::sql("query", native);

        assert!(err.code().is_some());
        let message = err.into_exception().thrown_message().unwrap().to_string();
        assert!(message.starts_with("[sqlmodule] Error in query: "));
        assert!(message.contains("syntax error"));
    }
}
