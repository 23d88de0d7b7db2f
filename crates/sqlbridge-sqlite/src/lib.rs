//! sqlbridge SQLite - SQLite bindings for embedded script VMs
//!
//! Publishes a raw-SQL, handle-oriented database API into a VM: open-mode
//! constants, `open()`, `escape()`, and `SQLDatabase` objects with `exec`,
//! `query`, `queryOne`, `escape` and `close` methods.
//!
//! # Usage
//!
//! ```typescript
//! const db = open(":memory:", SQLITE_OPEN_READWRITE | SQLITE_OPEN_CREATE);
//! db.exec("CREATE TABLE t(a INTEGER, b TEXT)");
//! db.exec("INSERT INTO t VALUES (1, 'x')");
//!
//! const result = db.query("SELECT * FROM t");  // { rows: [{ a: 1, b: "x" }], rowCount: 1 }
//! const row = db.queryOne("SELECT b FROM t");  // { b: "x" } or null
//! escape("O'Brien");                           // "O''Brien"
//! db.close();                                  // true
//! ```
//!
//! Hosts load the module through `sqlbridge_runtime::ModuleHost`:
//!
//! ```ignore
//! let mut host = ModuleHost::load(sqlite_module(ModuleConfig::default()), api)?;
//! host.register(&mut vm)?;
//! ```

pub mod bindings;
pub mod coercion;
pub mod config;
pub mod escape;
pub mod flags;
pub mod handle;
pub mod row;
pub mod statement;

mod error;
mod module;

pub use bindings::{BindingContext, DATABASE_CLASS, RESULT_CLASS, ROW_CLASS};
pub use config::{BlobPolicy, Identity, ModuleConfig};
pub use error::{MODULE_TAG, SqliteModuleError, SqliteResult};
pub use handle::{HandleRegistry, HandleStats};
pub use module::{SqliteModule, sqlite_module};
pub use row::{ResultRow, ResultSet};
