//! Value coercion across the native/script boundary
//!
//! Native cells become script values through [`coerce_column`]; script
//! arguments become native call parameters through [`Args`].

use rusqlite::types::ValueRef;
use sqlbridge_vm::{CallbackInfo, Value};

use crate::config::BlobPolicy;
use crate::error::{SqliteModuleError, SqliteResult};

/// One typed cell of a result row, copied out of the statement.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValue {
    Integer(i64),
    Float(f64),
    Text(String),
    Null,
    /// Bytes are never copied; only the length is kept.
    Blob(usize),
}

impl ColumnValue {
    /// Copy a cell out of the current row. Text is copied because the
    /// native buffer is only valid until the next step or finalize. Text
    /// that is not valid UTF-8 is decoded lossily, each bad sequence
    /// becoming U+FFFD.
    pub fn from_value_ref(value: ValueRef<'_>) -> Self {
        match value {
            ValueRef::Null => ColumnValue::Null,
            ValueRef::Integer(i) => ColumnValue::Integer(i),
            ValueRef::Real(f) => ColumnValue::Float(f),
            ValueRef::Text(t) => ColumnValue::Text(String::from_utf8_lossy(t).into_owned()),
            ValueRef::Blob(b) => ColumnValue::Blob(b.len()),
        }
    }

    /// Native storage class name
    pub fn type_name(&self) -> &'static str {
        match self {
            ColumnValue::Integer(_) => "INTEGER",
            ColumnValue::Float(_) => "FLOAT",
            ColumnValue::Text(_) => "TEXT",
            ColumnValue::Null => "NULL",
            ColumnValue::Blob(_) => "BLOB",
        }
    }
}

/// Convert one cell into a script value.
///
/// Total over every storage class: integers and floats become numbers, text
/// becomes a string, null becomes `null`. BLOBs follow `policy`.
///
/// Script strings are UTF-8, so TEXT holding invalid UTF-8 arrives here
/// already rewritten by [`ColumnValue::from_value_ref`]: each invalid
/// sequence is replaced with U+FFFD and the original bytes are lost.
pub fn coerce_column(column: &str, value: ColumnValue, policy: BlobPolicy) -> SqliteResult<Value> {
    match value {
        ColumnValue::Integer(i) => Ok(Value::Integer(i)),
        ColumnValue::Float(f) => Ok(Value::Number(f)),
        ColumnValue::Text(s) => Ok(Value::from(s)),
        ColumnValue::Null => Ok(Value::Null),
        ColumnValue::Blob(_) => match policy {
            BlobPolicy::Null => Ok(Value::Null),
            BlobPolicy::Error => Err(SqliteModuleError::UnsupportedColumnType {
                column: column.to_string(),
                type_name: value.type_name(),
            }),
        },
    }
}

/// Typed access to the arguments of one call.
pub struct Args<'a> {
    info: &'a CallbackInfo,
    op: &'static str,
}

impl<'a> Args<'a> {
    pub fn new(info: &'a CallbackInfo, op: &'static str) -> Self {
        Self { info, op }
    }

    fn required(&self, index: usize, name: &str) -> SqliteResult<Value> {
        match self.info.get(index) {
            Some(value) if !value.is_undefined() => Ok(value.clone()),
            _ => Err(SqliteModuleError::invalid_argument(
                self.op,
                format!("missing argument '{}'", name),
            )),
        }
    }

    /// Required argument, read with ToString semantics.
    pub fn string(&self, index: usize, name: &str) -> SqliteResult<String> {
        Ok(self.required(index, name)?.to_display_string())
    }

    /// Required argument, read with ToNumber semantics and truncated
    /// toward zero.
    pub fn integer(&self, index: usize, name: &str) -> SqliteResult<i64> {
        let value = self.required(index, name)?;
        if let Some(i) = value.as_i64() {
            return Ok(i);
        }
        let n = value.to_number();
        if n.is_finite() {
            Ok(n.trunc() as i64)
        } else {
            Err(SqliteModuleError::invalid_argument(
                self.op,
                format!("argument '{}' is not a number", name),
            ))
        }
    }

    /// Optional argument; `undefined` and `null` read as absent.
    pub fn optional_string(&self, index: usize) -> Option<String> {
        self.info
            .get(index)
            .filter(|v| !v.is_nullish())
            .map(Value::to_display_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coercion_is_total() {
        let cells = [
            ColumnValue::Integer(7),
            ColumnValue::Float(2.5),
            ColumnValue::Text("x".into()),
            ColumnValue::Null,
            ColumnValue::Blob(3),
        ];
        for cell in cells {
            assert!(coerce_column("c", cell, BlobPolicy::Null).is_ok());
        }
    }

    #[test]
    fn test_coercion_values() {
        let policy = BlobPolicy::Null;
        assert_eq!(
            coerce_column("a", ColumnValue::Integer(1), policy).unwrap(),
            Value::Integer(1)
        );
        assert_eq!(
            coerce_column("a", ColumnValue::Integer(i64::MAX), policy).unwrap(),
            Value::Integer(i64::MAX)
        );
        assert_eq!(
            coerce_column("a", ColumnValue::Float(0.5), policy).unwrap(),
            Value::Number(0.5)
        );
        assert_eq!(
            coerce_column("a", ColumnValue::Text("hi".into()), policy).unwrap(),
            Value::string("hi")
        );
        assert!(coerce_column("a", ColumnValue::Null, policy).unwrap().is_null());
        assert!(coerce_column("a", ColumnValue::Blob(4), policy).unwrap().is_null());
    }

    #[test]
    fn test_strict_blob_policy() {
        let err = coerce_column("payload", ColumnValue::Blob(4), BlobPolicy::Error).unwrap_err();
        assert!(matches!(
            err,
            SqliteModuleError::UnsupportedColumnType { ref column, type_name: "BLOB" } if column == "payload"
        ));
    }

    #[test]
    fn test_from_value_ref_copies_text() {
        let cell = ColumnValue::from_value_ref(ValueRef::Text(b"abc"));
        assert_eq!(cell, ColumnValue::Text("abc".into()));
        assert_eq!(ColumnValue::from_value_ref(ValueRef::Blob(&[1, 2])), ColumnValue::Blob(2));
    }

    #[test]
    fn test_invalid_utf8_text_is_replaced() {
        let cell = ColumnValue::from_value_ref(ValueRef::Text(&[0xff, b'A']));
        assert_eq!(cell, ColumnValue::Text("\u{FFFD}A".into()));
        assert_eq!(
            coerce_column("t", cell, BlobPolicy::Error).unwrap(),
            Value::string("\u{FFFD}A")
        );
    }

    #[test]
    fn test_args() {
        let info = CallbackInfo::new(
            Value::Undefined,
            vec![Value::string("db.sqlite"), Value::string("6"), Value::Null],
        );
        let args = Args::new(&info, "open");
        assert_eq!(args.string(0, "filename").unwrap(), "db.sqlite");
        assert_eq!(args.integer(1, "flags").unwrap(), 6);
        assert_eq!(args.optional_string(2), None);
        assert_eq!(args.optional_string(3), None);

        let err = args.string(3, "vfs").unwrap_err();
        assert_eq!(err.to_string(), "Error in open: missing argument 'vfs'");
    }

    #[test]
    fn test_integer_argument_truncates() {
        let info = CallbackInfo::new(Value::Undefined, vec![Value::Number(6.9), Value::string("x")]);
        let args = Args::new(&info, "open");
        assert_eq!(args.integer(0, "flags").unwrap(), 6);
        assert!(args.integer(1, "flags").is_err());
    }
}
