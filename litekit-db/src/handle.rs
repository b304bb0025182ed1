//! Engine-facing handle traits consumed by the error types.
//!
//! [`SqlError`](crate::error::SqlError) and [`BindError`](crate::error::BindError)
//! only need to read a few pieces of engine state. Expressing that surface as
//! traits keeps the error layer independent of how a handle is owned:
//! [`Connection`](crate::Connection) and [`Statement`](crate::Statement)
//! implement them over the real engine, tests implement them over fixtures.
//!
//! Reading a connection's "last error" is only meaningful if nothing else
//! touches the connection between the failing call and the read. Callers
//! sharing one handle across threads must serialize access themselves.

use super::error::ResultCode;

/// Read access to a connection's most recent error state.
pub trait ConnectionHandle {
    /// Extended result code of the most recent failed call
    /// (`sqlite3_extended_errcode`).
    fn extended_error_code(&self) -> ResultCode;

    /// English-language description of the most recent error
    /// (`sqlite3_errmsg`).
    fn error_message(&self) -> String;
}

impl<T: ConnectionHandle + ?Sized> ConnectionHandle for &T {
    fn extended_error_code(&self) -> ResultCode {
        (**self).extended_error_code()
    }

    fn error_message(&self) -> String {
        (**self).error_message()
    }
}

/// Read access to a prepared statement's identity.
pub trait StatementHandle {
    /// Borrowed handle to the connection that owns the statement.
    type Connection<'a>: ConnectionHandle
    where
        Self: 'a;

    /// Returns the owning connection (`sqlite3_db_handle`).
    fn connection(&self) -> Self::Connection<'_>;

    /// Returns the SQL text the statement was prepared from (`sqlite3_sql`).
    fn sql(&self) -> String;
}
