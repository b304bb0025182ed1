//! Raw FFI layer over the bundled `SQLite` engine.
//!
//! This is the **only** file in the crate that contains `unsafe` code or C
//! types. [`RawDb`] and [`RawStmt`] own the `sqlite3*` / `sqlite3_stmt*`
//! pointers and expose plain Rust signatures; statement operations hand the
//! raw result code back so the safe layer can decide which error to build.

use std::ffi::{CStr, CString};
use std::marker::PhantomData;
use std::os::raw::{c_char, c_int};
use std::ptr::{self, NonNull};

/// `libsqlite3-sys` plus `sqlite3_close_v2`, which its generated bindings
/// blocklist even though the bundled engine exports it.
mod sys {
    pub use libsqlite3_sys::*;

    extern "C" {
        pub fn sqlite3_close_v2(db: *mut sqlite3) -> std::os::raw::c_int;
    }
}

use super::error::{DbError, DbResult, ResultCode, SqlError};
use super::handle::ConnectionHandle;
use super::value::Value;

// ── SQLite constants ────────────────────────────────────────────────────

pub const SQLITE_OK: c_int = sys::SQLITE_OK;
pub const SQLITE_ROW: c_int = sys::SQLITE_ROW;
pub const SQLITE_DONE: c_int = sys::SQLITE_DONE;
pub const SQLITE_TOOBIG: c_int = sys::SQLITE_TOOBIG;

// Column type constants
pub const SQLITE_INTEGER: c_int = sys::SQLITE_INTEGER;
pub const SQLITE_FLOAT: c_int = sys::SQLITE_FLOAT;
pub const SQLITE_TEXT: c_int = sys::SQLITE_TEXT;
pub const SQLITE_BLOB: c_int = sys::SQLITE_BLOB;

// Open flags
pub const SQLITE_OPEN_READONLY: c_int = sys::SQLITE_OPEN_READONLY;
pub const SQLITE_OPEN_READWRITE: c_int = sys::SQLITE_OPEN_READWRITE;
pub const SQLITE_OPEN_CREATE: c_int = sys::SQLITE_OPEN_CREATE;
pub const SQLITE_OPEN_FULLMUTEX: c_int = sys::SQLITE_OPEN_FULLMUTEX;

// ── Helpers ─────────────────────────────────────────────────────────────

/// Copies a C string owned by `SQLite` into a Rust `String`.
///
/// # Safety
///
/// `ptr` must be null or point to a NUL-terminated string that stays valid
/// for the duration of the call.
unsafe fn owned_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        None
    } else {
        Some(CStr::from_ptr(ptr).to_string_lossy().into_owned())
    }
}

fn to_cstring(s: &str, what: &str) -> DbResult<CString> {
    CString::new(s).map_err(|e| DbError::generic(format!("nul in {what}: {e}")))
}

/// Canonical short description of a result code (`sqlite3_errstr`).
pub fn errstr(code: c_int) -> String {
    // sqlite3_errstr returns a pointer to a static string.
    unsafe { owned_string(sys::sqlite3_errstr(code)) }
        .unwrap_or_else(|| "unknown error".to_string())
}

fn extended_errcode(db: NonNull<sys::sqlite3>) -> ResultCode {
    ResultCode(unsafe { sys::sqlite3_extended_errcode(db.as_ptr()) })
}

fn errmsg(db: NonNull<sys::sqlite3>) -> String {
    // The message buffer is owned by the connection and only valid until the
    // next API call, so it is copied out immediately.
    unsafe { owned_string(sys::sqlite3_errmsg(db.as_ptr())) }
        .unwrap_or_else(|| "unknown error".to_string())
}

// ── Connection ──────────────────────────────────────────────────────────

/// Owned `sqlite3*` handle. Closed on drop.
pub struct RawDb {
    handle: NonNull<sys::sqlite3>,
}

// Safety: a connection opened with SQLITE_OPEN_FULLMUTEX may be used from any
// thread. RawDb is not Sync, so the safe layer never shares it by reference.
unsafe impl Send for RawDb {}

impl RawDb {
    /// Opens a connection with `sqlite3_open_v2`.
    ///
    /// When the engine hands back a handle alongside a failure code, the error
    /// is read from that handle before it is closed.
    pub fn open(path: &str, flags: c_int) -> DbResult<Self> {
        let c_path = to_cstring(path, "path")?;
        let mut db: *mut sys::sqlite3 = ptr::null_mut();
        let rc = unsafe { sys::sqlite3_open_v2(c_path.as_ptr(), &mut db, flags, ptr::null()) };

        let Some(handle) = NonNull::new(db) else {
            return Err(DbError::generic(format!(
                "sqlite3_open_v2 returned {rc} without a connection handle"
            )));
        };
        let raw = Self { handle };
        if rc != SQLITE_OK {
            return Err(SqlError::from_connection(&raw, "", &format!("cannot open {path}")).into());
        }
        Ok(raw)
    }

    /// Runs `sql` with `sqlite3_exec`, discarding result rows.
    pub fn exec(&self, sql: &str) -> DbResult<()> {
        let c_sql = to_cstring(sql, "SQL")?;
        let rc = unsafe {
            sys::sqlite3_exec(
                self.handle.as_ptr(),
                c_sql.as_ptr(),
                None,
                ptr::null_mut(),
                ptr::null_mut(),
            )
        };
        if rc != SQLITE_OK {
            return Err(SqlError::from_connection(self, sql, "").into());
        }
        Ok(())
    }

    /// Compiles `sql`, which must hold exactly one statement.
    ///
    /// Trailing whitespace, semicolons and comments are accepted; any further
    /// statement is rejected rather than silently skipped.
    pub fn prepare(&self, sql: &str) -> DbResult<RawStmt<'_>> {
        let c_sql = to_cstring(sql, "SQL")?;
        let mut tail: *const c_char = ptr::null();
        let Some(handle) = self.prepare_raw(c_sql.as_ptr(), &mut tail) else {
            return Err(SqlError::from_connection(self, sql, "").into());
        };
        // Whitespace- or comment-only input compiles to a null statement.
        let Some(handle) = handle else {
            return Err(DbError::generic(format!("no SQL statement in \"{sql}\"")));
        };
        let db = NonNull::new(unsafe { sys::sqlite3_db_handle(handle.as_ptr()) })
            .unwrap_or(self.handle);
        let stmt = RawStmt {
            handle,
            db: DbRef {
                handle: db,
                _marker: PhantomData,
            },
        };

        // `tail` points into `c_sql`, just past the first statement.
        if !tail.is_null() && unsafe { *tail } != 0 && self.has_statement(tail) {
            return Err(DbError::generic(format!("multiple statements in \"{sql}\"")));
        }
        Ok(stmt)
    }

    /// Runs `sqlite3_prepare_v2`. `None` means the engine reported an error;
    /// `Some(None)` means the input held no statement.
    fn prepare_raw(
        &self,
        sql: *const c_char,
        tail: &mut *const c_char,
    ) -> Option<Option<NonNull<sys::sqlite3_stmt>>> {
        let mut stmt: *mut sys::sqlite3_stmt = ptr::null_mut();
        let rc = unsafe { sys::sqlite3_prepare_v2(self.handle.as_ptr(), sql, -1, &mut stmt, tail) };
        (rc == SQLITE_OK).then(|| NonNull::new(stmt))
    }

    /// Whether the NUL-terminated text at `sql` holds anything but
    /// whitespace, semicolons and comments. Text that fails to compile counts
    /// as a statement.
    fn has_statement(&self, mut sql: *const c_char) -> bool {
        loop {
            let mut rest: *const c_char = ptr::null();
            match self.prepare_raw(sql, &mut rest) {
                None => return true,
                Some(Some(extra)) => {
                    unsafe {
                        sys::sqlite3_finalize(extra.as_ptr());
                    }
                    return true;
                }
                // An empty statement (`;`) may end the scan early.
                Some(None) => {
                    if rest.is_null() || rest == sql || unsafe { *rest } == 0 {
                        return false;
                    }
                    sql = rest;
                }
            }
        }
    }

    /// Sets the busy handler timeout in milliseconds.
    pub fn busy_timeout(&self, millis: c_int) -> DbResult<()> {
        let rc = unsafe { sys::sqlite3_busy_timeout(self.handle.as_ptr(), millis) };
        if rc != SQLITE_OK {
            return Err(SqlError::from_connection(self, "", "setting busy timeout").into());
        }
        Ok(())
    }

    pub fn changes(&self) -> c_int {
        unsafe { sys::sqlite3_changes(self.handle.as_ptr()) }
    }

    pub fn last_insert_rowid(&self) -> i64 {
        unsafe { sys::sqlite3_last_insert_rowid(self.handle.as_ptr()) }
    }
}

impl ConnectionHandle for RawDb {
    fn extended_error_code(&self) -> ResultCode {
        extended_errcode(self.handle)
    }

    fn error_message(&self) -> String {
        errmsg(self.handle)
    }
}

impl Drop for RawDb {
    fn drop(&mut self) {
        let rc = unsafe { sys::sqlite3_close_v2(self.handle.as_ptr()) };
        if rc != SQLITE_OK {
            log::warn!("sqlite3_close_v2 failed: {} ({rc})", errstr(rc));
        }
    }
}

/// Borrowed `sqlite3*` handle, obtained from a statement.
#[derive(Clone, Copy)]
pub struct DbRef<'a> {
    handle: NonNull<sys::sqlite3>,
    _marker: PhantomData<&'a RawDb>,
}

impl ConnectionHandle for DbRef<'_> {
    fn extended_error_code(&self) -> ResultCode {
        extended_errcode(self.handle)
    }

    fn error_message(&self) -> String {
        errmsg(self.handle)
    }
}

// ── Statement ───────────────────────────────────────────────────────────

/// Owned `sqlite3_stmt*` handle, tied to the connection that prepared it.
/// Finalized on drop.
pub struct RawStmt<'db> {
    handle: NonNull<sys::sqlite3_stmt>,
    /// Owning connection, as reported by `sqlite3_db_handle`.
    db: DbRef<'db>,
}

impl<'db> RawStmt<'db> {
    /// Returns the owning connection.
    pub const fn db(&self) -> DbRef<'db> {
        self.db
    }

    /// Returns the SQL text the statement was prepared from.
    pub fn sql(&self) -> String {
        unsafe { owned_string(sys::sqlite3_sql(self.handle.as_ptr())) }.unwrap_or_default()
    }

    // ── Binding ─────────────────────────────────────────────────────────

    /// Binds `value` at 1-based `index`, returning the raw result code.
    pub fn bind(&self, index: c_int, value: &Value) -> c_int {
        let stmt = self.handle.as_ptr();
        match value {
            Value::Integer(v) => unsafe { sys::sqlite3_bind_int64(stmt, index, *v) },
            Value::Real(v) => unsafe { sys::sqlite3_bind_double(stmt, index, *v) },
            Value::Text(v) => {
                let Ok(len) = c_int::try_from(v.len()) else {
                    return SQLITE_TOOBIG;
                };
                unsafe {
                    sys::sqlite3_bind_text(
                        stmt,
                        index,
                        v.as_ptr().cast::<c_char>(),
                        len,
                        sys::SQLITE_TRANSIENT(),
                    )
                }
            }
            Value::Blob(v) => {
                let Ok(len) = c_int::try_from(v.len()) else {
                    return SQLITE_TOOBIG;
                };
                unsafe {
                    sys::sqlite3_bind_blob(
                        stmt,
                        index,
                        v.as_ptr().cast(),
                        len,
                        sys::SQLITE_TRANSIENT(),
                    )
                }
            }
            Value::Null => unsafe { sys::sqlite3_bind_null(stmt, index) },
        }
    }

    pub fn bind_parameter_count(&self) -> c_int {
        unsafe { sys::sqlite3_bind_parameter_count(self.handle.as_ptr()) }
    }

    /// Looks up a named parameter (including its prefix, e.g. `:id`).
    /// Returns 0 if no parameter has that name.
    pub fn bind_parameter_index(&self, name: &str) -> DbResult<c_int> {
        let c_name = to_cstring(name, "parameter name")?;
        Ok(unsafe { sys::sqlite3_bind_parameter_index(self.handle.as_ptr(), c_name.as_ptr()) })
    }

    // ── Execution ───────────────────────────────────────────────────────

    pub fn step(&self) -> c_int {
        unsafe { sys::sqlite3_step(self.handle.as_ptr()) }
    }

    pub fn reset(&self) -> c_int {
        unsafe { sys::sqlite3_reset(self.handle.as_ptr()) }
    }

    // ── Column reading ──────────────────────────────────────────────────

    pub fn column_count(&self) -> c_int {
        unsafe { sys::sqlite3_column_count(self.handle.as_ptr()) }
    }

    pub fn column_name(&self, col: c_int) -> Option<String> {
        unsafe { owned_string(sys::sqlite3_column_name(self.handle.as_ptr(), col)) }
    }

    pub fn column_type(&self, col: c_int) -> c_int {
        unsafe { sys::sqlite3_column_type(self.handle.as_ptr(), col) }
    }

    pub fn column_i64(&self, col: c_int) -> i64 {
        unsafe { sys::sqlite3_column_int64(self.handle.as_ptr(), col) }
    }

    pub fn column_f64(&self, col: c_int) -> f64 {
        unsafe { sys::sqlite3_column_double(self.handle.as_ptr(), col) }
    }

    /// Reads the full text value, interior NULs included.
    pub fn column_text(&self, col: c_int) -> String {
        unsafe {
            // column_bytes must come after column_text so it measures the
            // UTF-8 conversion.
            let ptr = sys::sqlite3_column_text(self.handle.as_ptr(), col);
            let len = sys::sqlite3_column_bytes(self.handle.as_ptr(), col);
            match usize::try_from(len) {
                Ok(len) if !ptr.is_null() && len > 0 => {
                    let bytes = std::slice::from_raw_parts(ptr.cast::<u8>(), len);
                    String::from_utf8_lossy(bytes).into_owned()
                }
                _ => String::new(),
            }
        }
    }

    pub fn column_blob(&self, col: c_int) -> Vec<u8> {
        unsafe {
            let ptr = sys::sqlite3_column_blob(self.handle.as_ptr(), col);
            let len = sys::sqlite3_column_bytes(self.handle.as_ptr(), col);
            match usize::try_from(len) {
                Ok(len) if !ptr.is_null() && len > 0 => {
                    std::slice::from_raw_parts(ptr.cast::<u8>(), len).to_vec()
                }
                _ => Vec::new(),
            }
        }
    }
}

impl Drop for RawStmt<'_> {
    fn drop(&mut self) {
        // The return value repeats the last step error, which has already
        // been reported.
        unsafe {
            sys::sqlite3_finalize(self.handle.as_ptr());
        }
    }
}
