//! Safe wrapper around a `SQLite` prepared statement.
//!
//! This file contains **no `unsafe` code**. All FFI interaction is delegated to
//! [`ffi::RawStmt`] which encapsulates the raw pointers and C type conversions.
//! Failed engine calls are turned into [`BindError`]s (binding) or
//! [`SqlError`]s (stepping, resetting) right where the result code is seen.

use std::os::raw::c_int;

use super::connection::ConnectionRef;
use super::error::{BindError, DbError, DbResult, ResultCode, SqlError};
use super::ffi::{self, RawStmt};
use super::handle::StatementHandle;
use super::logger;
use super::value::{ColumnType, Value};

/// Result of a single `sqlite3_step` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepResult {
    /// A result row is available.
    Row,
    /// The statement has finished executing.
    Done,
}

/// A prepared `SQLite` statement.
///
/// Created via [`Connection::prepare`](super::Connection::prepare).
/// Tied to the lifetime of the connection that created it.
/// Finalized when dropped.
pub struct Statement<'conn> {
    raw: RawStmt<'conn>,
}

impl<'conn> Statement<'conn> {
    /// Wraps a raw statement handle.
    pub(super) const fn new(raw: RawStmt<'conn>) -> Self {
        Self { raw }
    }

    /// Returns the SQL text the statement was prepared from.
    #[must_use]
    pub fn sql(&self) -> String {
        self.raw.sql()
    }

    /// Number of parameters the statement expects (the largest index for
    /// numbered parameters).
    #[must_use]
    pub fn parameter_count(&self) -> usize {
        usize::try_from(self.raw.bind_parameter_count()).unwrap_or(0)
    }

    // ── Binding ─────────────────────────────────────────────────────────

    /// Binds a slice of [`Value`]s to the statement parameters (1-indexed).
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Bind`] naming the position of the first value the
    /// engine rejects.
    pub fn bind_values(&self, values: &[Value]) -> DbResult<()> {
        for (i, value) in values.iter().enumerate() {
            self.bind(i + 1, value)?;
        }
        Ok(())
    }

    /// Binds `value` to the parameter at 1-based `index`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Bind`] if the engine rejects the value or the index.
    pub fn bind(&self, index: usize, value: &Value) -> DbResult<()> {
        let rc = c_int::try_from(index).map_or(ResultCode::RANGE.0, |idx| self.raw.bind(idx, value));
        if rc != ffi::SQLITE_OK {
            let err = DbError::from(BindError::for_index(self, index, ResultCode(rc)));
            logger::failure(&err);
            return Err(err);
        }
        Ok(())
    }

    /// Binds `value` to the named parameter `name`, prefix included
    /// (`:id`, `@id` or `$id`).
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Bind`] with `SQLITE_RANGE` if the statement has no
    /// such parameter, or with the engine's code if it rejects the value.
    pub fn bind_named(&self, name: &str, value: &Value) -> DbResult<()> {
        let index = self.raw.bind_parameter_index(name)?;
        let rc = if index == 0 {
            ResultCode::RANGE.0
        } else {
            self.raw.bind(index, value)
        };
        if rc != ffi::SQLITE_OK {
            let err = DbError::from(BindError::for_name(self, name, ResultCode(rc)));
            logger::failure(&err);
            return Err(err);
        }
        Ok(())
    }

    // ── Stepping ────────────────────────────────────────────────────────

    /// Executes a single step.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Sql`] carrying the connection's error state and the
    /// statement's SQL.
    pub fn step(&self) -> DbResult<StepResult> {
        match self.raw.step() {
            ffi::SQLITE_ROW => Ok(StepResult::Row),
            ffi::SQLITE_DONE => Ok(StepResult::Done),
            _ => Err(self.sql_error("")),
        }
    }

    /// Resets the statement so it can be stepped again. Bindings are kept.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Sql`] if the most recent step failed.
    pub fn reset(&self) -> DbResult<()> {
        if self.raw.reset() != ffi::SQLITE_OK {
            return Err(self.sql_error("reset"));
        }
        Ok(())
    }

    // ── Column reading ──────────────────────────────────────────────────

    /// Returns the number of columns in the result set.
    #[must_use]
    pub fn column_count(&self) -> usize {
        usize::try_from(self.raw.column_count()).unwrap_or(0)
    }

    /// Returns the name of column `idx`, or `None` if out of range.
    #[must_use]
    pub fn column_name(&self, idx: usize) -> Option<String> {
        self.raw.column_name(column_index(idx))
    }

    /// Returns the storage class of column `idx` in the current row.
    #[must_use]
    pub fn column_type(&self, idx: usize) -> ColumnType {
        ColumnType::from_raw(self.raw.column_type(column_index(idx)))
    }

    /// Returns `true` if the column is SQL NULL.
    #[must_use]
    pub fn is_column_null(&self, idx: usize) -> bool {
        self.column_type(idx) == ColumnType::Null
    }

    /// Reads a column as `i64`.
    #[must_use]
    pub fn column_i64(&self, idx: usize) -> i64 {
        self.raw.column_i64(column_index(idx))
    }

    /// Reads a column as `f64`.
    #[must_use]
    pub fn column_f64(&self, idx: usize) -> f64 {
        self.raw.column_f64(column_index(idx))
    }

    /// Reads a column as a UTF-8 string. Returns an empty string for NULL.
    #[must_use]
    pub fn column_text(&self, idx: usize) -> String {
        self.raw.column_text(column_index(idx))
    }

    /// Reads a column as a blob. Returns an empty `Vec` for NULL.
    #[must_use]
    pub fn column_blob(&self, idx: usize) -> Vec<u8> {
        self.raw.column_blob(column_index(idx))
    }

    /// Reads a column in its own storage class.
    #[must_use]
    pub fn column_value(&self, idx: usize) -> Value {
        match self.column_type(idx) {
            ColumnType::Integer => Value::Integer(self.column_i64(idx)),
            ColumnType::Real => Value::Real(self.column_f64(idx)),
            ColumnType::Text => Value::Text(self.column_text(idx)),
            ColumnType::Blob => Value::Blob(self.column_blob(idx)),
            ColumnType::Null => Value::Null,
        }
    }

    fn sql_error(&self, context: &str) -> DbError {
        let err = DbError::from(SqlError::from_statement(self, context));
        logger::failure(&err);
        err
    }
}

impl StatementHandle for Statement<'_> {
    type Connection<'a>
        = ConnectionRef<'a>
    where
        Self: 'a;

    fn connection(&self) -> ConnectionRef<'_> {
        ConnectionRef::new(self.raw.db())
    }

    fn sql(&self) -> String {
        self.raw.sql()
    }
}

impl std::fmt::Debug for Statement<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Statement")
            .field("sql", &self.raw.sql())
            .finish_non_exhaustive()
    }
}

/// Out-of-range indices saturate; the engine treats them as NULL columns.
fn column_index(idx: usize) -> c_int {
    c_int::try_from(idx).unwrap_or(c_int::MAX)
}
