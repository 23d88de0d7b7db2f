//! Handle registry
//!
//! A connection lives in a [`ConnectionHandle`] stored in the internal slot of
//! its `SQLDatabase` script object. Scripts only ever see the wrapper; every
//! operation goes through [`HandleRegistry::unwrap`], which fails with
//! `ConnectionNotOpen` once the handle has been invalidated.
//!
//! The wrapper object is the only strong owner of its handle. The registry
//! keeps weak references, so a wrapper dropped with its VM closes the
//! connection without waiting for the module to unload.

use std::sync::{Arc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use indexmap::IndexMap;
use parking_lot::Mutex;
use rusqlite::Connection;
use sqlbridge_vm::{ClassDefinition, External, ObjectId, ObjectRef};
use tracing::{debug, warn};

use crate::error::{SqliteModuleError, SqliteResult};

/// One open database connection.
pub struct ConnectionHandle {
    conn: Mutex<Option<Connection>>,
    filename: String,
}

impl std::fmt::Debug for ConnectionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionHandle")
            .field("filename", &self.filename)
            .field("open", &self.is_open())
            .finish()
    }
}

impl ConnectionHandle {
    pub fn new(conn: Connection, filename: impl Into<String>) -> Self {
        Self {
            conn: Mutex::new(Some(conn)),
            filename: filename.into(),
        }
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn is_open(&self) -> bool {
        self.conn.lock().is_some()
    }

    /// Run `f` against the open connection.
    ///
    /// The lock is held for the whole call, so a statement borrowed from the
    /// connection cannot outlive it.
    pub fn with_connection<R>(
        &self,
        f: impl FnOnce(&Connection) -> SqliteResult<R>,
    ) -> SqliteResult<R> {
        let guard = self.conn.lock();
        match guard.as_ref() {
            Some(conn) => f(conn),
            None => Err(SqliteModuleError::ConnectionNotOpen),
        }
    }

    /// Close the connection. A failed close leaves it open.
    pub fn close(&self) -> SqliteResult<()> {
        let mut guard = self.conn.lock();
        let conn = guard.take().ok_or(SqliteModuleError::ConnectionNotOpen)?;
        match conn.close() {
            Ok(()) => Ok(()),
            Err((conn, err)) => {
                *guard = Some(conn);
                Err(SqliteModuleError::sql("close", err))
            }
        }
    }
}

/// Prepared/finalized statement counters shared with every executor.
#[derive(Debug, Default)]
pub struct StatementStats {
    acquired: AtomicU64,
    finalized: AtomicU64,
}

impl StatementStats {
    pub(crate) fn record_acquired(&self) {
        self.acquired.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_finalized(&self) {
        self.finalized.fetch_add(1, Ordering::Relaxed);
    }

    pub fn acquired(&self) -> u64 {
        self.acquired.load(Ordering::Relaxed)
    }

    pub fn finalized(&self) -> u64 {
        self.finalized.load(Ordering::Relaxed)
    }
}

/// Snapshot of registry state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandleStats {
    pub open_connections: usize,
    pub statements_acquired: u64,
    pub statements_finalized: u64,
}

impl HandleStats {
    /// Statements acquired but not yet finalized.
    pub fn live_statements(&self) -> u64 {
        self.statements_acquired - self.statements_finalized
    }
}

impl Drop for ConnectionHandle {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.get_mut().take() {
            match conn.close() {
                Ok(()) => debug!(filename = %self.filename, "Closed unreachable connection"),
                Err((_, e)) => warn!(filename = %self.filename, error = %e, "Close failed on drop"),
            }
        }
    }
}

/// Tracks every connection handed out to scripts, keyed by wrapper object.
#[derive(Debug, Default)]
pub struct HandleRegistry {
    connections: Mutex<IndexMap<ObjectId, Weak<ConnectionHandle>>>,
    stats: Arc<StatementStats>,
}

impl HandleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counters to hand to statement executors.
    pub fn statement_stats(&self) -> Arc<StatementStats> {
        self.stats.clone()
    }

    /// Allocate a `class` instance owning `conn`.
    pub fn wrap(&self, class: &ClassDefinition, conn: Connection, filename: &str) -> ObjectRef {
        let handle = Arc::new(ConnectionHandle::new(conn, filename));
        let obj = class.create_instance(Some(External::new(handle.clone())));
        obj.set("filename", filename);

        debug!(object = %obj.id(), filename, "Wrapped connection");
        let mut connections = self.connections.lock();
        connections.retain(|_, weak| weak.strong_count() > 0);
        connections.insert(obj.id(), Arc::downgrade(&handle));
        obj
    }

    /// The open connection behind `obj`.
    pub fn unwrap(&self, obj: &ObjectRef) -> SqliteResult<Arc<ConnectionHandle>> {
        let internal = obj.internal().ok_or(SqliteModuleError::ConnectionNotOpen)?;
        let handle = internal
            .downcast::<ConnectionHandle>()
            .ok_or(SqliteModuleError::WrongHandleType {
                expected: "SQLDatabase",
            })?;
        if !handle.is_open() {
            return Err(SqliteModuleError::ConnectionNotOpen);
        }
        Ok(handle)
    }

    /// Close the connection behind `obj` and clear its internal slot.
    ///
    /// A second call fails with `ConnectionNotOpen`.
    pub fn invalidate(&self, obj: &ObjectRef) -> SqliteResult<()> {
        let handle = self.unwrap(obj)?;
        handle.close()?;
        obj.take_internal();
        self.connections.lock().shift_remove(&obj.id());
        debug!(object = %obj.id(), filename = handle.filename(), "Closed connection");
        Ok(())
    }

    /// Close every connection still open. Returns how many were closed.
    pub fn close_all(&self) -> usize {
        let handles: Vec<_> = self
            .connections
            .lock()
            .drain(..)
            .filter_map(|(id, weak)| weak.upgrade().map(|handle| (id, handle)))
            .collect();
        let mut closed = 0;
        for (id, handle) in handles {
            if !handle.is_open() {
                continue;
            }
            match handle.close() {
                Ok(()) => closed += 1,
                Err(e) => warn!(object = %id, filename = handle.filename(), error = %e, "Close failed at teardown"),
            }
        }
        if closed > 0 {
            debug!(closed, "Closed remaining connections");
        }
        closed
    }

    /// Snapshot of the counters. Entries whose wrapper was dropped are
    /// pruned first.
    pub fn stats(&self) -> HandleStats {
        let mut connections = self.connections.lock();
        connections.retain(|_, weak| weak.strong_count() > 0);
        HandleStats {
            open_connections: connections.len(),
            statements_acquired: self.stats.acquired(),
            statements_finalized: self.stats.finalized(),
        }
    }
}

impl Drop for HandleRegistry {
    fn drop(&mut self) {
        self.close_all();
    }
}
