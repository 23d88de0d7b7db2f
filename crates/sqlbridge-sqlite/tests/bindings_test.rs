//! Integration tests driving the SQLite bindings through a VM

use std::sync::Arc;

use sqlbridge_runtime::{ModuleHost, StaticServerApi};
use sqlbridge_sqlite::{BlobPolicy, HandleRegistry, ModuleConfig, SqliteModule};
use sqlbridge_vm::{ObjectRef, Value, Vm, VmError};

struct Harness {
    vm: Vm,
    host: ModuleHost,
    handles: Arc<HandleRegistry>,
}

impl Harness {
    fn new() -> Self {
        Self::with_config(ModuleConfig::default())
    }

    fn with_config(config: ModuleConfig) -> Self {
        let module = SqliteModule::new(config);
        let handles = module.handles();
        let mut host = ModuleHost::load(
            Box::new(module),
            Arc::new(StaticServerApi::new("integration")),
        )
        .unwrap();
        let mut vm = Vm::new();
        host.register(&mut vm).unwrap();
        Self { vm, host, handles }
    }

    fn constant(&self, name: &str) -> i64 {
        self.vm.get_global(name).as_i64().unwrap()
    }

    fn open(&self, filename: &str) -> ObjectRef {
        let flags = self.constant("SQLITE_OPEN_READWRITE") | self.constant("SQLITE_OPEN_CREATE");
        self.vm
            .call_global("open", vec![filename.into(), flags.into()])
            .unwrap()
            .as_object()
            .cloned()
            .unwrap()
    }

    fn call(&self, db: &ObjectRef, method: &str, sql: &str) -> Result<Value, VmError> {
        self.vm.call_method(db, method, vec![sql.into()])
    }
}

fn thrown(err: VmError) -> String {
    err.thrown_message().unwrap().to_string()
}

fn row_at(result: &Value, index: usize) -> ObjectRef {
    let rows = result.as_object().unwrap().get("rows");
    rows.as_array().unwrap().get(index).as_object().cloned().unwrap()
}

#[test]
fn test_end_to_end_scenario() {
    let h = Harness::new();
    let db = h.open(":memory:");

    assert_eq!(
        h.call(&db, "exec", "CREATE TABLE t(a INTEGER, b TEXT)").unwrap(),
        Value::Boolean(true)
    );
    h.call(&db, "exec", "INSERT INTO t VALUES (1,'x')").unwrap();

    let result = h.call(&db, "query", "SELECT * FROM t").unwrap();
    let obj = result.as_object().unwrap();
    assert_eq!(obj.class_name(), "SQLiteQueryResult");
    assert_eq!(obj.get("rowCount"), Value::Integer(1));

    let row = row_at(&result, 0);
    assert_eq!(row.class_name(), "SQLiteQueryRow");
    assert_eq!(row.keys(), vec!["a", "b"]);
    assert_eq!(row.get("a"), Value::Integer(1));
    assert_eq!(row.get("b"), Value::string("x"));
}

#[test]
fn test_closed_connection_fails_cleanly() {
    let h = Harness::new();
    let db = h.open(":memory:");

    assert_eq!(
        h.vm.call_method(&db, "close", vec![]).unwrap(),
        Value::Boolean(true)
    );

    for method in ["exec", "query", "queryOne", "escape"] {
        let err = h.call(&db, method, "SELECT 1").unwrap_err();
        assert_eq!(thrown(err), "[sqlmodule] Database not open", "{}", method);
    }

    let err = h.vm.call_method(&db, "close", vec![]).unwrap_err();
    assert_eq!(thrown(err), "[sqlmodule] Database not open");
    assert_eq!(h.handles.stats().open_connections, 0);
}

#[test]
fn test_row_count_and_order() {
    let h = Harness::new();
    let db = h.open(":memory:");
    h.call(&db, "exec", "CREATE TABLE n(v INTEGER)").unwrap();
    for v in [5, 3, 9, 1] {
        h.call(&db, "exec", &format!("INSERT INTO n VALUES ({})", v))
            .unwrap();
    }

    let result = h.call(&db, "query", "SELECT v FROM n ORDER BY v").unwrap();
    assert_eq!(result.as_object().unwrap().get("rowCount"), Value::Integer(4));
    let values: Vec<_> = (0..4).map(|i| row_at(&result, i).get("v")).collect();
    assert_eq!(
        values,
        vec![Value::Integer(1), Value::Integer(3), Value::Integer(5), Value::Integer(9)]
    );
}

#[test]
fn test_empty_query() {
    let h = Harness::new();
    let db = h.open(":memory:");
    h.call(&db, "exec", "CREATE TABLE e(x)").unwrap();

    let result = h.call(&db, "query", "SELECT * FROM e").unwrap();
    let obj = result.as_object().unwrap();
    assert_eq!(obj.get("rowCount"), Value::Integer(0));
    assert_eq!(obj.get("rows").as_array().unwrap().len(), 0);

    assert!(h.call(&db, "queryOne", "SELECT * FROM e").unwrap().is_null());
}

#[test]
fn test_query_one_returns_first_row() {
    let h = Harness::new();
    let db = h.open(":memory:");
    h.call(
        &db,
        "exec",
        "CREATE TABLE p(name TEXT); INSERT INTO p VALUES ('ann'); INSERT INTO p VALUES ('bob');",
    )
    .unwrap();

    let row = h
        .call(&db, "queryOne", "SELECT name FROM p ORDER BY name DESC")
        .unwrap();
    assert_eq!(row.as_object().unwrap().get("name"), Value::string("bob"));
}

#[test]
fn test_malformed_sql_does_not_leak_statements() {
    let h = Harness::new();
    let db = h.open(":memory:");
    let before = h.handles.stats();

    for _ in 0..10 {
        let err = h.call(&db, "query", "SELEC * FROM nowhere").unwrap_err();
        assert!(thrown(err).starts_with("[sqlmodule] Error in query: "));
        assert!(h.call(&db, "queryOne", "SELECT FROM").is_err());
        assert!(h.call(&db, "exec", "CREATE TABLE (").is_err());
    }

    let after = h.handles.stats();
    assert_eq!(after.live_statements(), 0);
    assert_eq!(after.statements_acquired - before.statements_acquired, 30);

    // The connection is still usable
    assert_eq!(
        h.call(&db, "queryOne", "SELECT 1 AS one")
            .unwrap()
            .as_object()
            .unwrap()
            .get("one"),
        Value::Integer(1)
    );

    // A statement left unfinalized would make the native close report BUSY
    assert!(h.call(&db, "exec", "SELECT 1; CREATE TABLE (").is_err());
    assert_eq!(
        h.vm.call_method(&db, "close", vec![]).unwrap(),
        Value::Boolean(true)
    );
}

#[test]
fn test_sql_error_carries_native_text() {
    let h = Harness::new();
    let db = h.open(":memory:");
    let err = h.call(&db, "query", "SELECT * FROM missing_table").unwrap_err();
    assert_eq!(
        thrown(err),
        "[sqlmodule] Error in query: no such table: missing_table"
    );
}

#[test]
fn test_escape() {
    let h = Harness::new();
    let escaped = h.vm.call_global("escape", vec!["O'Brien".into()]).unwrap();
    assert_eq!(escaped, Value::string("O''Brien"));

    let db = h.open(":memory:");
    let escaped = h.call(&db, "escape", "it's").unwrap();
    assert_eq!(escaped, Value::string("it''s"));

    // Escaped text embeds safely in a literal
    let sql = format!("SELECT '{}' AS s", escaped.as_str().unwrap());
    let row = h.call(&db, "queryOne", &sql).unwrap();
    assert_eq!(row.as_object().unwrap().get("s"), Value::string("it's"));
}

#[test]
fn test_escape_rejects_nul() {
    let h = Harness::new();
    let err = h.vm.call_global("escape", vec!["a\0b".into()]).unwrap_err();
    assert!(thrown(err).starts_with("[sqlmodule] Error in escape: "));
}

#[test]
fn test_column_types() {
    let h = Harness::new();
    let db = h.open(":memory:");
    let row = h
        .call(
            &db,
            "queryOne",
            "SELECT 42 AS i, 2.5 AS f, 'txt' AS s, NULL AS n, x'00ff' AS b, 9007199254740993 AS big",
        )
        .unwrap();
    let row = row.as_object().unwrap();

    assert_eq!(row.get("i"), Value::Integer(42));
    assert_eq!(row.get("f"), Value::Number(2.5));
    assert_eq!(row.get("s"), Value::string("txt"));
    assert!(row.get("n").is_null());
    assert!(row.get("b").is_null());
    assert_eq!(row.get("big"), Value::Integer(9_007_199_254_740_993));
}

#[test]
fn test_invalid_utf8_text_is_replaced() {
    let h = Harness::new();
    let db = h.open(":memory:");
    let row = h
        .call(&db, "queryOne", "SELECT CAST(x'ff41' AS TEXT) AS t")
        .unwrap();
    assert_eq!(row.as_object().unwrap().get("t"), Value::string("\u{FFFD}A"));
}

#[test]
fn test_strict_blob_policy() {
    let h = Harness::with_config(ModuleConfig::default().blob_policy(BlobPolicy::Error));
    let db = h.open(":memory:");

    let err = h.call(&db, "query", "SELECT x'00' AS payload").unwrap_err();
    assert_eq!(
        thrown(err),
        "[sqlmodule] Unsupported column type BLOB in column 'payload'"
    );
    assert_eq!(h.handles.stats().live_statements(), 0);
}

#[test]
fn test_duplicate_column_names() {
    let h = Harness::new();
    let db = h.open(":memory:");
    let row = h
        .call(&db, "queryOne", "SELECT 1 AS v, 'mid' AS m, 2 AS v")
        .unwrap();
    let row = row.as_object().unwrap();
    assert_eq!(row.keys(), vec!["v", "m"]);
    assert_eq!(row.get("v"), Value::Integer(2));
}

#[test]
fn test_exec_batch_stops_at_first_error() {
    let h = Harness::new();
    let db = h.open(":memory:");
    let err = h
        .call(
            &db,
            "exec",
            "CREATE TABLE b(x); INSERT INTO b VALUES (1); INSERT INTO nope VALUES (2); INSERT INTO b VALUES (3);",
        )
        .unwrap_err();
    assert!(thrown(err).contains("no such table: nope"));

    let result = h.call(&db, "query", "SELECT x FROM b").unwrap();
    assert_eq!(result.as_object().unwrap().get("rowCount"), Value::Integer(1));
}

#[test]
fn test_file_database_persists() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data.db");
    let path = path.to_str().unwrap();
    let h = Harness::new();

    let db = h.open(path);
    assert_eq!(db.get("filename"), Value::string(path));
    h.call(&db, "exec", "CREATE TABLE kv(k TEXT, v TEXT); INSERT INTO kv VALUES ('a', 'b');")
        .unwrap();
    h.vm.call_method(&db, "close", vec![]).unwrap();

    let reopened = h.open(path);
    let row = h.call(&reopened, "queryOne", "SELECT v FROM kv WHERE k = 'a'").unwrap();
    assert_eq!(row.as_object().unwrap().get("v"), Value::string("b"));
}

#[test]
fn test_filename_is_informational() {
    let h = Harness::new();
    let db = h.open(":memory:");
    assert_eq!(db.get("filename"), Value::string(":memory:"));

    db.set("filename", "elsewhere.db");
    h.call(&db, "exec", "CREATE TABLE f(x)").unwrap();
    let result = h.call(&db, "query", "SELECT * FROM f").unwrap();
    assert_eq!(result.as_object().unwrap().get("rowCount"), Value::Integer(0));
    assert_eq!(
        h.vm.call_method(&db, "close", vec![]).unwrap(),
        Value::Boolean(true)
    );
}

#[test]
fn test_open_with_vfs() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("vfs.db");
    let h = Harness::new();
    let flags = h.constant("SQLITE_OPEN_READWRITE") | h.constant("SQLITE_OPEN_CREATE");

    // Empty name selects the default VFS
    let db = h
        .vm
        .call_global(
            "open",
            vec![path.to_str().unwrap().into(), flags.into(), "".into()],
        )
        .unwrap();
    assert!(db.is_object());

    let err = h
        .vm
        .call_global(
            "open",
            vec![path.to_str().unwrap().into(), flags.into(), "no-such-vfs".into()],
        )
        .unwrap_err();
    assert!(thrown(err).starts_with("[sqlmodule] Error in open: "));
}

#[test]
fn test_readonly_open_rejects_writes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ro.db");
    let path = path.to_str().unwrap();
    let h = Harness::new();

    let db = h.open(path);
    h.call(&db, "exec", "CREATE TABLE r(x)").unwrap();
    h.vm.call_method(&db, "close", vec![]).unwrap();

    let readonly = h
        .vm
        .call_global("open", vec![path.into(), h.constant("SQLITE_OPEN_READONLY").into()])
        .unwrap();
    let readonly = readonly.as_object().unwrap();
    let err = h.call(readonly, "exec", "INSERT INTO r VALUES (1)").unwrap_err();
    assert!(thrown(err).contains("readonly"));
}

#[test]
fn test_connections_are_independent() {
    let h = Harness::new();
    let a = h.open(":memory:");
    let b = h.open(":memory:");
    h.call(&a, "exec", "CREATE TABLE only_a(x)").unwrap();
    h.vm.call_method(&a, "close", vec![]).unwrap();

    assert!(h.call(&b, "query", "SELECT * FROM only_a").is_err());
    assert!(h.call(&b, "query", "SELECT 1").is_ok());
    assert_eq!(h.handles.stats().open_connections, 1);
}

#[test]
fn test_unload_closes_open_connections() {
    let h = Harness::new();
    let db = h.open(":memory:");
    let _other = h.open(":memory:");
    assert_eq!(h.handles.stats().open_connections, 2);

    let Harness {
        vm,
        mut host,
        handles,
    } = h;
    host.unload();
    assert_eq!(handles.stats().open_connections, 0);

    let err = vm.call_method(&db, "query", vec!["SELECT 1".into()]).unwrap_err();
    assert_eq!(thrown(err), "[sqlmodule] Database not open");
}
