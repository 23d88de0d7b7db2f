//! A VM with the SQLite module registered into it.

use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::Args;
use sqlbridge_runtime::{ModuleHost, StaticServerApi};
use sqlbridge_sqlite::{ModuleConfig, sqlite_module};
use sqlbridge_vm::{ObjectRef, Value, Vm};
use tracing::debug;

const FLAG_PREFIX: &str = "SQLITE_OPEN_";

/// Database selection shared by the SQL commands.
#[derive(Args)]
pub struct DbArgs {
    /// Database file, or `:memory:`
    pub db: String,

    /// Open flags: constant names (prefix optional) or numbers, joined by `|`
    #[arg(long, default_value = "READWRITE|CREATE")]
    pub flags: String,

    /// VFS name (default VFS when omitted)
    #[arg(long)]
    pub vfs: Option<String>,
}

pub struct Session {
    vm: Vm,
    // Kept alive so unload runs when the session ends
    _host: ModuleHost,
}

impl Session {
    pub fn new(config: ModuleConfig) -> Result<Self> {
        let api = Arc::new(StaticServerApi::new("sqlbridge-cli"));
        let mut host = ModuleHost::load(sqlite_module(config), api)?;
        let mut vm = Vm::new();
        host.register(&mut vm)?;
        Ok(Self { vm, _host: host })
    }

    pub fn vm(&self) -> &Vm {
        &self.vm
    }

    /// Resolve a `|`-separated flag expression against the published constants.
    pub fn flags(&self, spec: &str) -> Result<i64> {
        let mut bits = 0i64;
        for part in spec.split('|').map(str::trim).filter(|p| !p.is_empty()) {
            if let Ok(n) = part.parse::<i64>() {
                bits |= n;
                continue;
            }
            let name = if part.starts_with(FLAG_PREFIX) {
                part.to_string()
            } else {
                format!("{}{}", FLAG_PREFIX, part.to_ascii_uppercase())
            };
            match self.vm.get_global(&name).as_i64() {
                Some(value) => bits |= value,
                None => bail!("unknown open flag '{}'", part),
            }
        }
        Ok(bits)
    }

    /// Call the global `open` and return the database object.
    pub fn open(&self, args: &DbArgs) -> Result<ObjectRef> {
        let flags = self.flags(&args.flags)?;
        let mut call_args = vec![Value::from(args.db.as_str()), Value::Integer(flags)];
        if let Some(vfs) = &args.vfs {
            call_args.push(Value::from(vfs.as_str()));
        }
        debug!(db = %args.db, flags, "opening");

        let db = self.vm.call_global("open", call_args)?;
        db.as_object()
            .cloned()
            .with_context(|| format!("open returned {}", db.type_name()))
    }

    /// Call `db.method(sql)`.
    pub fn call(&self, db: &ObjectRef, method: &str, sql: &str) -> Result<Value> {
        Ok(self.vm.call_method(db, method, vec![Value::from(sql)])?)
    }

    /// Close `db`, reporting a failed close.
    pub fn close(&self, db: &ObjectRef) -> Result<()> {
        self.vm.call_method(db, "close", vec![])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_expressions() {
        let session = Session::new(ModuleConfig::default()).unwrap();
        assert_eq!(session.flags("READWRITE|CREATE").unwrap(), 0x6);
        assert_eq!(session.flags("SQLITE_OPEN_READONLY").unwrap(), 0x1);
        assert_eq!(session.flags("readwrite | 4").unwrap(), 0x6);
        assert!(session.flags("BOGUS").is_err());
    }

    #[test]
    fn test_open_query_close() {
        let session = Session::new(ModuleConfig::default()).unwrap();
        let db = session
            .open(&DbArgs {
                db: ":memory:".into(),
                flags: "READWRITE|CREATE".into(),
                vfs: None,
            })
            .unwrap();

        session.call(&db, "exec", "CREATE TABLE t(a)").unwrap();
        let result = session.call(&db, "query", "SELECT * FROM t").unwrap();
        assert_eq!(result.to_json()["rowCount"], 0);
        session.close(&db).unwrap();
        assert!(session.close(&db).is_err());
    }
}
