//! Script-facing API
//!
//! Publishes into one VM:
//!
//! - one integer constant per open-mode flag (`SQLITE_OPEN_*`)
//! - `open(filename, flags, vfs?)` returning an `SQLDatabase`
//! - `escape(text)`
//! - the `SQLDatabase`, `SQLiteQueryResult` and `SQLiteQueryRow` classes
//!
//! Every callback captures a shared [`BindingContext`] instead of reaching
//! for process globals.

use std::sync::Arc;

use rusqlite::Connection;
use sqlbridge_runtime::RegistrationContext;
use sqlbridge_vm::{CallbackInfo, ClassBuilder, ClassRef, Value, VmResult};
use tracing::{debug, warn};

use crate::coercion::Args;
use crate::config::ModuleConfig;
use crate::error::{SqliteModuleError, SqliteResult};
use crate::escape::escape;
use crate::flags::{OPEN_FLAGS, open_flags};
use crate::handle::{ConnectionHandle, HandleRegistry};
use crate::statement::Executor;

pub const DATABASE_CLASS: &str = "SQLDatabase";
pub const RESULT_CLASS: &str = "SQLiteQueryResult";
pub const ROW_CLASS: &str = "SQLiteQueryRow";

/// State shared by every callback registered into one VM.
#[derive(Debug)]
pub struct BindingContext {
    config: ModuleConfig,
    handles: Arc<HandleRegistry>,
    row_class: ClassRef,
    result_class: ClassRef,
}

impl BindingContext {
    pub fn handles(&self) -> &Arc<HandleRegistry> {
        &self.handles
    }

    fn database(&self, info: &CallbackInfo) -> SqliteResult<Arc<ConnectionHandle>> {
        let obj = info.this_object().ok_or(SqliteModuleError::WrongHandleType {
            expected: DATABASE_CLASS,
        })?;
        self.handles.unwrap(obj)
    }

    fn with_executor<R>(
        &self,
        handle: &ConnectionHandle,
        f: impl FnOnce(&Executor<'_>) -> SqliteResult<R>,
    ) -> SqliteResult<R> {
        handle.with_connection(|conn| {
            let executor = Executor::new(conn, self.handles.statement_stats(), self.config.blob_policy);
            f(&executor)
        })
    }

    fn open(&self, class: &ClassRef, info: &CallbackInfo) -> SqliteResult<Value> {
        let args = Args::new(info, "open");
        let filename = args.string(0, "filename")?;
        let flags = open_flags(args.integer(1, "flags")?)?;
        let vfs = args.optional_string(2).filter(|v| !v.is_empty());

        let conn = match vfs.as_deref() {
            Some(vfs) => Connection::open_with_flags_and_vfs(&filename, flags, vfs),
            None => Connection::open_with_flags(&filename, flags),
        }
        .map_err(|e| SqliteModuleError::sql("open", e))?;

        debug!(filename = %filename, flags = flags.bits(), vfs = ?vfs, "Opened database");
        Ok(Value::Object(self.handles.wrap(class, conn, &filename)))
    }

    fn exec(&self, info: &CallbackInfo) -> SqliteResult<Value> {
        let handle = self.database(info)?;
        let sql = Args::new(info, "exec").string(0, "sql")?;
        self.with_executor(&handle, |ex| ex.execute_non_query(&sql))?;
        Ok(Value::Boolean(true))
    }

    fn query(&self, info: &CallbackInfo) -> SqliteResult<Value> {
        let handle = self.database(info)?;
        let sql = Args::new(info, "query").string(0, "sql")?;
        let set = self.with_executor(&handle, |ex| ex.execute_multi_row(&sql))?;
        Ok(Value::Object(set.into_object(&self.result_class, &self.row_class)))
    }

    fn query_one(&self, info: &CallbackInfo) -> SqliteResult<Value> {
        let handle = self.database(info)?;
        let sql = Args::new(info, "queryOne").string(0, "sql")?;
        let row = self.with_executor(&handle, |ex| ex.execute_single_row(&sql))?;
        Ok(match row {
            Some(row) => Value::Object(row.into_object(&self.row_class)),
            None => Value::Null,
        })
    }

    fn escape_on(&self, info: &CallbackInfo) -> SqliteResult<Value> {
        self.database(info)?;
        escape_global(info)
    }

    fn close(&self, info: &CallbackInfo) -> SqliteResult<Value> {
        let obj = info.this_object().ok_or(SqliteModuleError::WrongHandleType {
            expected: DATABASE_CLASS,
        })?;
        self.handles.invalidate(obj)?;
        Ok(Value::Boolean(true))
    }
}

fn escape_global(info: &CallbackInfo) -> SqliteResult<Value> {
    let text = Args::new(info, "escape").string(0, "text")?;
    Ok(Value::from(escape(&text)?))
}

/// Adapt a fallible binding into a VM callback. Failures are logged and
/// thrown as tagged exceptions.
fn bind<F>(op: &'static str, f: F) -> impl Fn(&CallbackInfo) -> VmResult<Value> + Send + Sync + 'static
where
    F: Fn(&CallbackInfo) -> SqliteResult<Value> + Send + Sync + 'static,
{
    move |info| {
        f(info).map_err(|e| {
            warn!(op, error = %e, code = ?e.code(), "SQLite call failed");
            e.into_exception()
        })
    }
}

/// Publish the constants, classes and functions into the VM behind `ctx`.
///
/// Runs once per VM; the host guarantees it is not repeated.
pub fn register(
    ctx: &mut RegistrationContext<'_>,
    config: ModuleConfig,
    handles: Arc<HandleRegistry>,
) -> Arc<BindingContext> {
    for (name, value) in OPEN_FLAGS {
        ctx.constant(name, *value);
    }

    let row_class = ctx.class(ClassBuilder::new(ROW_CLASS));
    let result_class = ctx.class(
        ClassBuilder::new(RESULT_CLASS)
            .property("rows", Value::Null)
            .property("rowCount", 0),
    );

    let bindings = Arc::new(BindingContext {
        config,
        handles,
        row_class,
        result_class,
    });

    let mut database = ClassBuilder::new(DATABASE_CLASS)
        .property("filename", Value::Null)
        .method("exec", {
            let b = bindings.clone();
            bind("exec", move |info| b.exec(info))
        })
        .method("query", {
            let b = bindings.clone();
            bind("query", move |info| b.query(info))
        });
    if bindings.config.expose_query_one {
        database = database.method("queryOne", {
            let b = bindings.clone();
            bind("queryOne", move |info| b.query_one(info))
        });
    }
    let database = ctx.class(
        database
            .method("escape", {
                let b = bindings.clone();
                bind("escape", move |info| b.escape_on(info))
            })
            .method("close", {
                let b = bindings.clone();
                bind("close", move |info| b.close(info))
            }),
    );

    ctx.global_fn("open", {
        let b = bindings.clone();
        bind("open", move |info| b.open(&database, info))
    });
    ctx.global_fn("escape", bind("escape", escape_global));

    debug!(
        module = ctx.module(),
        constants = OPEN_FLAGS.len(),
        query_one = bindings.config.expose_query_one,
        "SQLite bindings registered"
    );
    bindings
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlbridge_vm::Vm;

    fn setup(config: ModuleConfig) -> (Vm, Arc<BindingContext>) {
        let mut vm = Vm::new();
        let bindings = {
            let mut ctx = RegistrationContext::new(&mut vm, "test");
            register(&mut ctx, config, Arc::new(HandleRegistry::new()))
        };
        (vm, bindings)
    }

    fn rw_create() -> i64 {
        (rusqlite::ffi::SQLITE_OPEN_READWRITE | rusqlite::ffi::SQLITE_OPEN_CREATE) as i64
    }

    #[test]
    fn test_registers_constants_and_classes() {
        let (vm, _) = setup(ModuleConfig::default());
        assert_eq!(
            vm.get_global("SQLITE_OPEN_READWRITE"),
            Value::Integer(rusqlite::ffi::SQLITE_OPEN_READWRITE as i64)
        );
        assert!(vm.get_global("open").is_function());
        assert!(vm.get_global("escape").is_function());
        assert_eq!(
            vm.class_registry().names(),
            vec![ROW_CLASS, RESULT_CLASS, DATABASE_CLASS]
        );
    }

    #[test]
    fn test_query_one_can_be_hidden() {
        let (vm, _) = setup(ModuleConfig::default().expose_query_one(false));
        let db = vm
            .call_global("open", vec![":memory:".into(), rw_create().into()])
            .unwrap();
        let db = db.as_object().unwrap();
        assert!(!db.has("queryOne"));
        assert!(db.get("query").is_function());
    }

    #[test]
    fn test_method_without_receiver() {
        let (vm, _) = setup(ModuleConfig::default());
        let class = vm.class_registry().get(DATABASE_CLASS).unwrap();
        let obj = class.create_instance(None);
        let exec = obj.get("exec");
        let exec = exec.as_function().unwrap();

        let err = vm
            .call(exec, Value::Undefined, vec!["SELECT 1".into()])
            .unwrap_err();
        assert_eq!(
            err.thrown_message(),
            Some("[sqlmodule] Expected a SQLDatabase handle")
        );

        let err = vm.call_method(&obj, "exec", vec!["SELECT 1".into()]).unwrap_err();
        assert_eq!(err.thrown_message(), Some("[sqlmodule] Database not open"));
    }

    #[test]
    fn test_open_failure_is_reported() {
        let (vm, bindings) = setup(ModuleConfig::default());
        let readonly = rusqlite::ffi::SQLITE_OPEN_READONLY as i64;
        let err = vm
            .call_global(
                "open",
                vec!["/nonexistent-dir/missing.db".into(), readonly.into()],
            )
            .unwrap_err();
        assert!(err.thrown_message().unwrap().starts_with("[sqlmodule] Error in open: "));
        assert_eq!(bindings.handles().stats().open_connections, 0);
    }

    #[test]
    fn test_open_requires_arguments() {
        let (vm, _) = setup(ModuleConfig::default());
        let err = vm.call_global("open", vec![":memory:".into()]).unwrap_err();
        assert_eq!(
            err.thrown_message(),
            Some("[sqlmodule] Error in open: missing argument 'flags'")
        );
    }
}
