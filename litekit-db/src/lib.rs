//! Minimal safe `SQLite` wrapper with structured error reporting.
//!
//! Every failure the engine reports becomes a [`DbError`] whose message is
//! formatted once, at the point of failure, from the engine's own diagnosis:
//!
//! * [`SqlError`] -- `<description> (<code>): <engine message>`, followed by
//!   optional context and the offending query.
//! * [`BindError`] -- which parameter of which query could not be bound.
//! * [`GenericError`] -- anything the engine did not diagnose itself.
//!
//! The engine is the bundled `SQLite` from `libsqlite3-sys`. The `ffi` module
//! is the **only** file that contains `unsafe` code or C types; consumer code
//! uses [`Connection`], [`Statement`] and [`Transaction`].
//!
//! The error types only read engine state through [`ConnectionHandle`] and
//! [`StatementHandle`], so they can describe failures from any handle that
//! implements those traits.
//!
//! ```rust
//! use litekit_db::{params, Connection, DbError};
//!
//! let conn = Connection::open_in_memory()?;
//! conn.execute_batch("CREATE TABLE t (id INTEGER PRIMARY KEY);")?;
//! conn.execute("INSERT INTO t (id) VALUES (?1)", params![1_i64])?;
//!
//! let err = conn
//!     .execute("INSERT INTO t (id) VALUES (?1)", params![1_i64])
//!     .unwrap_err();
//! assert!(matches!(err, DbError::Sql(_)));
//! assert!(err.message().ends_with("for query \"INSERT INTO t (id) VALUES (?1)\""));
//! # Ok::<(), DbError>(())
//! ```

mod ffi;

mod connection;
pub mod error;
pub mod handle;
pub mod logger;
mod options;
mod statement;
mod transaction;
pub mod value;

pub use connection::{Connection, ConnectionRef};
pub use error::{BindError, DbError, DbResult, GenericError, ResultCode, SqlError};
pub use handle::{ConnectionHandle, StatementHandle};
pub use options::OpenOptions;
pub use statement::{Statement, StepResult};
pub use transaction::Transaction;
pub use value::{ColumnType, Value};
