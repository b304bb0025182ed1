//! Connection configuration.

use std::os::raw::c_int;
use std::time::Duration;

use super::ffi;

/// Options controlling how a [`Connection`](crate::Connection) is opened.
///
/// The default opens read-write, creates the file if missing, and installs
/// no busy handler. Connections are always opened in serialized
/// (`SQLITE_OPEN_FULLMUTEX`) mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenOptions {
    read_only: bool,
    create: bool,
    busy_timeout: Option<Duration>,
}

impl Default for OpenOptions {
    fn default() -> Self {
        Self {
            read_only: false,
            create: true,
            busy_timeout: None,
        }
    }
}

impl OpenOptions {
    /// Returns the default options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens the database read-only. Implies `create(false)`.
    #[must_use]
    pub const fn read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    /// Creates the database file if it does not exist (ignored when read-only).
    #[must_use]
    pub const fn create(mut self, create: bool) -> Self {
        self.create = create;
        self
    }

    /// Retries for up to `timeout` when the database is locked, instead of
    /// failing immediately with `SQLITE_BUSY`.
    #[must_use]
    pub const fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = Some(timeout);
        self
    }

    /// Whether the connection is opened read-only.
    #[must_use]
    pub const fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Busy timeout in milliseconds, saturated to the engine's `int` range.
    pub(crate) fn busy_timeout_millis(&self) -> Option<c_int> {
        self.busy_timeout
            .map(|t| c_int::try_from(t.as_millis()).unwrap_or(c_int::MAX))
    }

    pub(crate) const fn flags(&self) -> c_int {
        if self.read_only {
            ffi::SQLITE_OPEN_READONLY | ffi::SQLITE_OPEN_FULLMUTEX
        } else if self.create {
            ffi::SQLITE_OPEN_READWRITE | ffi::SQLITE_OPEN_CREATE | ffi::SQLITE_OPEN_FULLMUTEX
        } else {
            ffi::SQLITE_OPEN_READWRITE | ffi::SQLITE_OPEN_FULLMUTEX
        }
    }
}
