//! Statement execution engine
//!
//! Every prepared statement lives inside a [`StatementScope`]. The scope
//! finalizes its statement when dropped, so a statement is released exactly
//! once whether the call returns a result, fails to prepare, fails while
//! stepping, or fails while coercing a row.
//!
//! Per call the scope moves through `Idle -> Prepared -> Stepping ->
//! Finalized`. A failed prepare goes straight from `Idle` to `Finalized`.

use std::sync::Arc;

use rusqlite::{Batch, Connection, Row, Rows, Statement};
use tracing::{debug, trace};

use crate::coercion::{ColumnValue, coerce_column};
use crate::config::BlobPolicy;
use crate::error::{SqliteModuleError, SqliteResult};
use crate::handle::StatementStats;
use crate::row::{ResultRow, ResultSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementState {
    Idle,
    Prepared,
    Stepping,
    Finalized,
}

/// Scoped ownership of at most one prepared statement.
pub struct StatementScope<'conn> {
    stmt: Option<Statement<'conn>>,
    state: StatementState,
    op: &'static str,
    stats: Arc<StatementStats>,
    counted: bool,
}

impl<'conn> StatementScope<'conn> {
    fn begin(op: &'static str, stats: &Arc<StatementStats>) -> Self {
        Self {
            stmt: None,
            state: StatementState::Idle,
            op,
            stats: stats.clone(),
            counted: false,
        }
    }

    /// Prepare the first statement of `sql`. Anything after it is ignored;
    /// blank or comment-only SQL yields a scope with no statement.
    pub fn prepare(
        conn: &'conn Connection,
        sql: &str,
        op: &'static str,
        stats: &Arc<StatementStats>,
    ) -> SqliteResult<Self> {
        let mut batch = Batch::new(conn, sql);
        let scope = Self::next_in_batch(&mut batch, op, stats)?;
        Ok(scope.unwrap_or_else(|| Self::begin(op, stats)))
    }

    /// Prepare the next statement of a batch; `None` once the batch is done.
    ///
    /// Every prepare attempt, failed or not, counts once as acquired and
    /// once as finalized.
    pub fn next_in_batch(
        batch: &mut Batch<'conn, '_>,
        op: &'static str,
        stats: &Arc<StatementStats>,
    ) -> SqliteResult<Option<Self>> {
        let mut scope = Self::begin(op, stats);
        let prepared = batch.next();
        if !matches!(prepared, Ok(None)) {
            stats.record_acquired();
            scope.counted = true;
        }
        match prepared {
            Ok(Some(stmt)) => {
                trace!(op, "statement prepared");
                scope.stmt = Some(stmt);
                scope.state = StatementState::Prepared;
                Ok(Some(scope))
            }
            Ok(None) => Ok(None),
            Err(e) => {
                debug!(op, error = %e, "prepare failed");
                Err(SqliteModuleError::sql(op, e))
            }
        }
    }

    pub fn state(&self) -> StatementState {
        self.state
    }

    /// Column names and a row cursor; `None` when nothing was prepared.
    pub fn query(&mut self) -> Option<(Vec<String>, Rows<'_>)> {
        let stmt = self.stmt.as_mut()?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        trace!(op = self.op, columns = columns.len(), "stepping");
        self.state = StatementState::Stepping;
        Some((columns, stmt.raw_query()))
    }

    /// Step once and discard any row. Returns whether a row was produced.
    pub fn step_once(&mut self) -> SqliteResult<bool> {
        let op = self.op;
        let Some((_, mut rows)) = self.query() else {
            return Ok(false);
        };
        let produced = rows
            .next()
            .map_err(|e| SqliteModuleError::sql(op, e))?
            .is_some();
        Ok(produced)
    }
}

impl Drop for StatementScope<'_> {
    fn drop(&mut self) {
        if let Some(stmt) = self.stmt.take() {
            // Step errors were already reported; finalize repeats them.
            if let Err(e) = stmt.finalize() {
                trace!(op = self.op, error = %e, "finalize reported error");
            }
        }
        self.state = StatementState::Finalized;
        if self.counted {
            self.stats.record_finalized();
            trace!(op = self.op, "statement finalized");
        }
    }
}

/// Runs SQL against one open connection.
pub struct Executor<'conn> {
    conn: &'conn Connection,
    stats: Arc<StatementStats>,
    policy: BlobPolicy,
}

impl<'conn> Executor<'conn> {
    pub fn new(conn: &'conn Connection, stats: Arc<StatementStats>, policy: BlobPolicy) -> Self {
        Self {
            conn,
            stats,
            policy,
        }
    }

    /// Run every statement in `sql`, in order, each stepped at most once.
    /// Stops at the first failure; earlier statements keep their effects.
    pub fn execute_non_query(&self, sql: &str) -> SqliteResult<()> {
        let mut batch = Batch::new(self.conn, sql);
        let mut executed = 0usize;
        while let Some(mut scope) =
            StatementScope::next_in_batch(&mut batch, "exec", &self.stats)?
        {
            scope.step_once()?;
            executed += 1;
        }
        debug!(statements = executed, "exec complete");
        Ok(())
    }

    /// First row of `sql`, or `None` if it produces no rows.
    pub fn execute_single_row(&self, sql: &str) -> SqliteResult<Option<ResultRow>> {
        let mut rows = self.collect_rows(sql, "queryOne", Some(1))?;
        Ok(rows.pop())
    }

    /// Every row of `sql`, in iteration order.
    pub fn execute_multi_row(&self, sql: &str) -> SqliteResult<ResultSet> {
        let mut set = ResultSet::new();
        for row in self.collect_rows(sql, "query", None)? {
            set.push(row);
        }
        debug!(rows = set.row_count(), "query complete");
        Ok(set)
    }

    fn collect_rows(
        &self,
        sql: &str,
        op: &'static str,
        limit: Option<usize>,
    ) -> SqliteResult<Vec<ResultRow>> {
        let mut scope = StatementScope::prepare(self.conn, sql, op, &self.stats)?;
        let mut out = Vec::new();
        let Some((columns, mut rows)) = scope.query() else {
            return Ok(out);
        };

        while limit.is_none_or(|n| out.len() < n) {
            match rows.next().map_err(|e| SqliteModuleError::sql(op, e))? {
                Some(row) => out.push(self.coerce_row(op, &columns, row)?),
                None => break,
            }
        }
        Ok(out)
    }

    fn coerce_row(&self, op: &'static str, columns: &[String], row: &Row<'_>) -> SqliteResult<ResultRow> {
        let mut out = ResultRow::new();
        for (idx, name) in columns.iter().enumerate() {
            let cell = row
                .get_ref(idx)
                .map_err(|e| SqliteModuleError::sql(op, e))?;
            let value = coerce_column(name, ColumnValue::from_value_ref(cell), self.policy)?;
            out.insert(name.as_str(), value);
        }
        Ok(out)
    }
}
