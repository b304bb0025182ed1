//! Database error types for the safe `SQLite` wrapper.
//!
//! Every error freezes its message when it is constructed. Engine state is
//! read exactly once, so an error stays accurate after the connection or
//! statement that produced it has moved on (or been dropped).
//!
//! Three kinds are reported:
//!
//! * [`GenericError`] -- a plain message, used when no engine diagnosis applies.
//! * [`SqlError`] -- a failure reported by the engine for a connection,
//!   optionally tied to a query.
//! * [`BindError`] -- a parameter binding failure on a prepared statement.
//!
//! [`DbError`] is the closed union of the three and is what every fallible
//! operation in this crate returns.

use std::fmt;

use thiserror::Error;

use super::ffi;
use super::handle::{ConnectionHandle, StatementHandle};

/// Result code returned by `SQLite` operations (primary or extended).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResultCode(pub i32);

impl ResultCode {
    /// Successful result.
    pub const OK: Self = Self(0);
    /// Generic error.
    pub const ERROR: Self = Self(1);
    /// Internal logic error in `SQLite`.
    pub const INTERNAL: Self = Self(2);
    /// Callback routine requested an abort.
    pub const ABORT: Self = Self(4);
    /// The database file is locked.
    pub const BUSY: Self = Self(5);
    /// A table in the database is locked.
    pub const LOCKED: Self = Self(6);
    /// A `malloc()` failed.
    pub const NOMEM: Self = Self(7);
    /// Attempt to write a read-only database.
    pub const READONLY: Self = Self(8);
    /// Some kind of disk I/O error occurred.
    pub const IOERR: Self = Self(10);
    /// The database disk image is malformed.
    pub const CORRUPT: Self = Self(11);
    /// Unable to open the database file.
    pub const CANTOPEN: Self = Self(14);
    /// String or BLOB exceeds size limit.
    pub const TOOBIG: Self = Self(18);
    /// Abort due to constraint violation.
    pub const CONSTRAINT: Self = Self(19);
    /// Data type mismatch.
    pub const MISMATCH: Self = Self(20);
    /// Library used incorrectly.
    pub const MISUSE: Self = Self(21);
    /// Bind parameter or column index out of range.
    pub const RANGE: Self = Self(25);
    /// File opened that is not a database file.
    pub const NOTADB: Self = Self(26);
    /// `sqlite3_step()` has another row ready.
    pub const ROW: Self = Self(100);
    /// `sqlite3_step()` has finished executing.
    pub const DONE: Self = Self(101);

    /// Returns the primary result code (the low 8 bits of an extended code).
    #[must_use]
    pub const fn primary(self) -> Self {
        Self(self.0 & 0xff)
    }

    /// Returns the engine's canonical short description of this code.
    ///
    /// Backed by `sqlite3_errstr`, so extended codes describe their primary
    /// code and unknown codes yield `"unknown error"`.
    #[must_use]
    pub fn description(self) -> String {
        ffi::errstr(self.0)
    }
}

impl From<i32> for ResultCode {
    fn from(code: i32) -> Self {
        Self(code)
    }
}

impl fmt::Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An error carrying only a message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct GenericError {
    message: String,
}

impl GenericError {
    /// Creates an error whose message is exactly `message` (which may be empty).
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Returns the error message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// A failure reported by the engine for a connection.
///
/// The message has the shape
/// `<description> (<code>): <engine message>[ (<context>)][ for query "<query>"]`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct SqlError {
    code: ResultCode,
    description: String,
    engine_message: String,
    context: Option<String>,
    query: Option<String>,
    message: String,
}

impl SqlError {
    /// Captures the current error state of `conn`.
    ///
    /// Must be called right after the failing call is detected: any later
    /// call on the same connection may overwrite its error state. Empty
    /// `query` and `context` strings are left out of the message.
    pub fn from_connection<C>(conn: &C, query: &str, context: &str) -> Self
    where
        C: ConnectionHandle + ?Sized,
    {
        let code = conn.extended_error_code();
        let description = code.description();
        let engine_message = conn.error_message();

        let mut message = format!("{description} ({code}): {engine_message}");
        if !context.is_empty() {
            message.push_str(&format!(" ({context})"));
        }
        if !query.is_empty() {
            message.push_str(&format!(" for query \"{query}\""));
        }

        Self {
            code,
            description,
            engine_message,
            context: non_empty(context),
            query: non_empty(query),
            message,
        }
    }

    /// Captures the error state of the connection owning `stmt`, reporting the
    /// statement's SQL as the query.
    pub fn from_statement<S>(stmt: &S, context: &str) -> Self
    where
        S: StatementHandle + ?Sized,
    {
        let conn = stmt.connection();
        Self::from_connection(&conn, &stmt.sql(), context)
    }

    /// Extended result code read from the connection.
    #[must_use]
    pub const fn code(&self) -> ResultCode {
        self.code
    }

    /// Canonical short description of [`code`](Self::code).
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// The engine's error message (`sqlite3_errmsg`) at construction time.
    #[must_use]
    pub fn engine_message(&self) -> &str {
        &self.engine_message
    }

    /// Caller-supplied context, if any.
    #[must_use]
    pub fn context(&self) -> Option<&str> {
        self.context.as_deref()
    }

    /// The offending query text, if any.
    #[must_use]
    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    /// Returns the formatted error message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// A failure binding a value to a statement parameter.
///
/// The message has the shape
/// `<description> (<code>) for parameter "<parameter>" of query "<query>"`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct BindError {
    code: ResultCode,
    description: String,
    parameter: String,
    query: String,
    message: String,
}

impl BindError {
    /// Reports a failure binding the parameter named `parameter`.
    pub fn for_name<S>(stmt: &S, parameter: &str, code: ResultCode) -> Self
    where
        S: StatementHandle + ?Sized,
    {
        let description = code.description();
        let query = stmt.sql();
        let message = format!(
            "{description} ({code}) for parameter \"{parameter}\" of query \"{query}\""
        );
        Self {
            code,
            description,
            parameter: parameter.to_owned(),
            query,
            message,
        }
    }

    /// Reports a failure binding the parameter at 1-based position `index`.
    pub fn for_index<S>(stmt: &S, index: usize, code: ResultCode) -> Self
    where
        S: StatementHandle + ?Sized,
    {
        Self::for_name(stmt, &index.to_string(), code)
    }

    /// Result code returned by the bind call.
    #[must_use]
    pub const fn code(&self) -> ResultCode {
        self.code
    }

    /// Canonical short description of [`code`](Self::code).
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Parameter name, or the decimal position for positional parameters.
    #[must_use]
    pub fn parameter(&self) -> &str {
        &self.parameter
    }

    /// Full SQL text of the statement.
    #[must_use]
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Returns the formatted error message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Error returned by database operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DbError {
    /// No engine diagnosis applies.
    #[error(transparent)]
    Generic(#[from] GenericError),
    /// The engine reported a failure.
    #[error(transparent)]
    Sql(#[from] SqlError),
    /// Binding a statement parameter failed.
    #[error(transparent)]
    Bind(#[from] BindError),
}

impl DbError {
    /// Shorthand for a [`GenericError`].
    pub fn generic(message: impl Into<String>) -> Self {
        Self::Generic(GenericError::new(message))
    }

    /// Returns the formatted error message, whatever the kind.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Generic(e) => e.message(),
            Self::Sql(e) => e.message(),
            Self::Bind(e) => e.message(),
        }
    }

    /// Query the error is about, if any.
    #[must_use]
    pub fn query(&self) -> Option<&str> {
        match self {
            Self::Generic(_) => None,
            Self::Sql(e) => e.query(),
            Self::Bind(e) => Some(e.query()),
        }
    }

    /// Result code behind the error, if the engine reported one.
    #[must_use]
    pub const fn code(&self) -> Option<ResultCode> {
        match self {
            Self::Generic(_) => None,
            Self::Sql(e) => Some(e.code()),
            Self::Bind(e) => Some(e.code()),
        }
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

fn non_empty(s: &str) -> Option<String> {
    (!s.is_empty()).then(|| s.to_owned())
}
