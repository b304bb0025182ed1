//! Safe wrapper around a `SQLite` database connection.
//!
//! This file contains **no `unsafe` code**. All FFI interaction is delegated to
//! [`ffi::RawDb`] which encapsulates the raw pointers and C type conversions.

use std::path::Path;

use super::error::{DbError, DbResult, ResultCode};
use super::ffi::{self, RawDb};
use super::handle::ConnectionHandle;
use super::logger;
use super::options::OpenOptions;
use super::statement::{Statement, StepResult};
use super::transaction::{Transaction, TransactionBehavior};
use super::value::Value;

/// A `SQLite` database connection.
///
/// Closed when dropped. `Send` but not `Sync`: all access happens from one
/// thread at a time, so a failed call's error state cannot be overwritten by
/// another caller before it is read into an error.
pub struct Connection {
    db: RawDb,
}

impl Connection {
    /// Opens (or creates) a database at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Sql`] if the engine cannot open the file.
    pub fn open(path: &Path, read_only: bool) -> DbResult<Self> {
        Self::open_with(path, &OpenOptions::new().read_only(read_only))
    }

    /// Opens a database at `path` with explicit [`OpenOptions`].
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Sql`] if the engine cannot open the file or apply
    /// the options.
    pub fn open_with(path: &Path, options: &OpenOptions) -> DbResult<Self> {
        let path_str = path.to_string_lossy();
        let db = RawDb::open(&path_str, options.flags()).inspect_err(logger::failure)?;
        if let Some(millis) = options.busy_timeout_millis() {
            db.busy_timeout(millis)?;
        }
        log::debug!(
            "opened sqlite database {path_str} (read_only: {})",
            options.is_read_only()
        );
        Ok(Self { db })
    }

    /// Opens a private, temporary in-memory database.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Sql`] if the engine cannot allocate the database.
    pub fn open_in_memory() -> DbResult<Self> {
        Self::open(Path::new(":memory:"), false)
    }

    /// Executes one or more SQL statements separated by semicolons.
    ///
    /// No result rows are returned. Suitable for DDL, PRAGMAs, and
    /// multi-statement scripts.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Sql`] for the first failing statement; the whole
    /// script is reported as the query.
    pub fn execute_batch(&self, sql: &str) -> DbResult<()> {
        self.db.exec(sql).inspect_err(logger::failure)
    }

    /// Prepares a single SQL statement.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Sql`] if the statement does not compile, or
    /// [`DbError::Generic`] if `sql` holds no statement or an interior NUL.
    pub fn prepare(&self, sql: &str) -> DbResult<Statement<'_>> {
        let raw_stmt = self.db.prepare(sql).inspect_err(logger::failure)?;
        Ok(Statement::new(raw_stmt))
    }

    /// Prepares and executes a single SQL statement with the given parameters.
    ///
    /// Returns the number of rows changed.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Generic`] if the statement produces rows (use
    /// [`query_row`](Self::query_row) or [`query_map`](Self::query_map)
    /// instead), and propagates prepare, bind and step failures.
    pub fn execute(&self, sql: &str, params: &[Value]) -> DbResult<usize> {
        let stmt = self.prepare(sql)?;
        stmt.bind_values(params)?;
        match stmt.step()? {
            StepResult::Done => Ok(self.changes()),
            StepResult::Row => Err(DbError::generic(format!(
                "execute returned rows for query \"{sql}\""
            ))),
        }
    }

    /// Prepares and executes a statement, mapping exactly one result row.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Generic`] if no row is returned, and propagates
    /// prepare, bind, step and mapper failures.
    pub fn query_row<T>(
        &self,
        sql: &str,
        params: &[Value],
        mapper: impl FnOnce(&Statement<'_>) -> DbResult<T>,
    ) -> DbResult<T> {
        self.query_row_optional(sql, params, mapper)?
            .ok_or_else(|| DbError::generic(format!("query returned no rows: \"{sql}\"")))
    }

    /// Like [`query_row`](Self::query_row) but returns `Ok(None)` when no row
    /// is returned.
    ///
    /// # Errors
    ///
    /// Propagates prepare, bind, step and mapper failures.
    pub fn query_row_optional<T>(
        &self,
        sql: &str,
        params: &[Value],
        mapper: impl FnOnce(&Statement<'_>) -> DbResult<T>,
    ) -> DbResult<Option<T>> {
        let stmt = self.prepare(sql)?;
        stmt.bind_values(params)?;
        match stmt.step()? {
            StepResult::Row => mapper(&stmt).map(Some),
            StepResult::Done => Ok(None),
        }
    }

    /// Prepares a statement and collects all matching rows.
    ///
    /// # Errors
    ///
    /// Propagates prepare, bind, step and mapper failures.
    pub fn query_map<T>(
        &self,
        sql: &str,
        params: &[Value],
        mut mapper: impl FnMut(&Statement<'_>) -> DbResult<T>,
    ) -> DbResult<Vec<T>> {
        let stmt = self.prepare(sql)?;
        stmt.bind_values(params)?;
        let mut results = Vec::new();
        while stmt.step()? == StepResult::Row {
            results.push(mapper(&stmt)?);
        }
        Ok(results)
    }

    /// Begins a deferred transaction.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Sql`] if `BEGIN` fails (e.g. a transaction is
    /// already open).
    pub fn transaction(&self) -> DbResult<Transaction<'_>> {
        Transaction::begin(self, TransactionBehavior::Deferred)
    }

    /// Begins an immediate transaction (acquires a RESERVED lock right away).
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Sql`] if `BEGIN IMMEDIATE` fails.
    pub fn transaction_immediate(&self) -> DbResult<Transaction<'_>> {
        Transaction::begin(self, TransactionBehavior::Immediate)
    }

    /// Returns the rowid of the most recent successful INSERT.
    #[must_use]
    pub fn last_insert_rowid(&self) -> i64 {
        self.db.last_insert_rowid()
    }

    /// Returns the number of rows changed by the most recent statement.
    #[must_use]
    pub fn changes(&self) -> usize {
        usize::try_from(self.db.changes()).unwrap_or(0)
    }
}

impl ConnectionHandle for Connection {
    fn extended_error_code(&self) -> ResultCode {
        self.db.extended_error_code()
    }

    fn error_message(&self) -> String {
        self.db.error_message()
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection").finish_non_exhaustive()
    }
}

/// The connection that owns a [`Statement`], borrowed from the statement.
///
/// Only exposes the connection's error state; obtained through
/// [`StatementHandle::connection`](crate::StatementHandle::connection).
#[derive(Clone, Copy)]
pub struct ConnectionRef<'a> {
    raw: ffi::DbRef<'a>,
}

impl<'a> ConnectionRef<'a> {
    pub(super) const fn new(raw: ffi::DbRef<'a>) -> Self {
        Self { raw }
    }
}

impl ConnectionHandle for ConnectionRef<'_> {
    fn extended_error_code(&self) -> ResultCode {
        self.raw.extended_error_code()
    }

    fn error_message(&self) -> String {
        self.raw.error_message()
    }
}

impl std::fmt::Debug for ConnectionRef<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionRef").finish_non_exhaustive()
    }
}
