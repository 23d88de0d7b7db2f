//! SQL literal escaping through the engine's `%q` formatter.

use std::ffi::{CStr, CString, c_char};

use rusqlite::ffi;

use crate::error::{SqliteModuleError, SqliteResult};

/// Buffer allocated by the engine, released with `sqlite3_free`.
struct SqliteString(*mut c_char);

impl Drop for SqliteString {
    fn drop(&mut self) {
        // SAFETY: the pointer came from sqlite3_mprintf and is freed once.
        unsafe { ffi::sqlite3_free(self.0.cast()) };
    }
}

/// Double every single quote in `text` so it can sit inside a `'...'`
/// SQL literal.
///
/// ```ignore
/// assert_eq!(escape("O'Brien")?, "O''Brien");
/// ```
pub fn escape(text: &str) -> SqliteResult<String> {
    let input = CString::new(text).map_err(|_| {
        SqliteModuleError::invalid_argument("escape", "text contains a NUL character")
    })?;

    // SAFETY: the format string takes exactly one C string argument and
    // `input` outlives the call.
    let raw = unsafe { ffi::sqlite3_mprintf(c"%q".as_ptr(), input.as_ptr()) };
    if raw.is_null() {
        return Err(SqliteModuleError::EscapeAllocationFailure);
    }
    let buffer = SqliteString(raw);

    // SAFETY: non-null output of sqlite3_mprintf is NUL-terminated.
    let escaped = unsafe { CStr::from_ptr(buffer.0) };
    Ok(escaped.to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_quotes() {
        assert_eq!(escape("O'Brien").unwrap(), "O''Brien");
        assert_eq!(escape("''").unwrap(), "''''");
        assert_eq!(escape("plain").unwrap(), "plain");
        assert_eq!(escape("").unwrap(), "");
    }

    #[test]
    fn test_escaped_text_round_trips_through_literal() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        let original = "it's a 'quoted' value";
        let sql = format!("SELECT '{}'", escape(original).unwrap());
        let back: String = conn.query_row(&sql, [], |r| r.get(0)).unwrap();
        assert_eq!(back, original);
    }

    #[test]
    fn test_interior_nul_rejected() {
        let err = escape("a\0b").unwrap_err();
        assert!(matches!(err, SqliteModuleError::InvalidArgument { op: "escape", .. }));
    }

    #[test]
    fn test_unicode_preserved() {
        assert_eq!(escape("caf\u{e9}'s").unwrap(), "caf\u{e9}''s");
    }
}
