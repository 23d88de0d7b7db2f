//! Open-mode flag constants published to scripts.
//!
//! Values are taken from the linked SQLite build, one for one.

use rusqlite::OpenFlags;
use rusqlite::ffi;

use crate::error::{SqliteModuleError, SqliteResult};

/// Every open-mode flag, by its native name.
pub const OPEN_FLAGS: &[(&str, i64)] = &[
    ("SQLITE_OPEN_READONLY", ffi::SQLITE_OPEN_READONLY as i64),
    ("SQLITE_OPEN_READWRITE", ffi::SQLITE_OPEN_READWRITE as i64),
    ("SQLITE_OPEN_CREATE", ffi::SQLITE_OPEN_CREATE as i64),
    ("SQLITE_OPEN_DELETEONCLOSE", ffi::SQLITE_OPEN_DELETEONCLOSE as i64),
    ("SQLITE_OPEN_EXCLUSIVE", ffi::SQLITE_OPEN_EXCLUSIVE as i64),
    ("SQLITE_OPEN_AUTOPROXY", ffi::SQLITE_OPEN_AUTOPROXY as i64),
    ("SQLITE_OPEN_URI", ffi::SQLITE_OPEN_URI as i64),
    ("SQLITE_OPEN_MEMORY", ffi::SQLITE_OPEN_MEMORY as i64),
    ("SQLITE_OPEN_MAIN_DB", ffi::SQLITE_OPEN_MAIN_DB as i64),
    ("SQLITE_OPEN_TEMP_DB", ffi::SQLITE_OPEN_TEMP_DB as i64),
    ("SQLITE_OPEN_TRANSIENT_DB", ffi::SQLITE_OPEN_TRANSIENT_DB as i64),
    ("SQLITE_OPEN_MAIN_JOURNAL", ffi::SQLITE_OPEN_MAIN_JOURNAL as i64),
    ("SQLITE_OPEN_TEMP_JOURNAL", ffi::SQLITE_OPEN_TEMP_JOURNAL as i64),
    ("SQLITE_OPEN_SUBJOURNAL", ffi::SQLITE_OPEN_SUBJOURNAL as i64),
    ("SQLITE_OPEN_SUPER_JOURNAL", ffi::SQLITE_OPEN_SUPER_JOURNAL as i64),
    ("SQLITE_OPEN_NOMUTEX", ffi::SQLITE_OPEN_NOMUTEX as i64),
    ("SQLITE_OPEN_FULLMUTEX", ffi::SQLITE_OPEN_FULLMUTEX as i64),
    ("SQLITE_OPEN_SHAREDCACHE", ffi::SQLITE_OPEN_SHAREDCACHE as i64),
    ("SQLITE_OPEN_PRIVATECACHE", ffi::SQLITE_OPEN_PRIVATECACHE as i64),
    ("SQLITE_OPEN_WAL", ffi::SQLITE_OPEN_WAL as i64),
    ("SQLITE_OPEN_NOFOLLOW", ffi::SQLITE_OPEN_NOFOLLOW as i64),
    ("SQLITE_OPEN_EXRESCODE", ffi::SQLITE_OPEN_EXRESCODE as i64),
];

/// Look up a flag value by name
pub fn flag_value(name: &str) -> Option<i64> {
    OPEN_FLAGS
        .iter()
        .find(|(flag, _)| *flag == name)
        .map(|(_, value)| *value)
}

/// Turn a script-supplied bit set into native open flags. Bits are passed
/// through unchanged; only values that do not fit the native `int` are
/// rejected.
pub fn open_flags(bits: i64) -> SqliteResult<OpenFlags> {
    let bits = i32::try_from(bits)
        .ok()
        .filter(|b| *b >= 0)
        .ok_or_else(|| {
            SqliteModuleError::invalid_argument("open", format!("invalid open flags {}", bits))
        })?;
    Ok(OpenFlags::from_bits_retain(bits))
}
