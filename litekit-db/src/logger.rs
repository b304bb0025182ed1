//! Bridge from the `log` facade to a host-provided [`Logger`].
//!
//! Every engine failure this crate turns into a [`DbError`] is logged at
//! debug level before it is returned. Those records carry the error's result
//! code and query as structured fields, so a host can index failures without
//! parsing the message.

use std::sync::{Arc, OnceLock};

use log::kv::Key;

use super::error::{DbError, ResultCode};

/// Receives the crate's log output in the host application's own logging
/// system.
///
/// # Examples
///
/// ```rust
/// use std::sync::Arc;
/// use litekit_db::logger::{set_logger, LogLevel, LogRecord, Logger};
///
/// struct StderrLogger;
///
/// impl Logger for StderrLogger {
///     fn log(&self, record: LogRecord) {
///         match record.code {
///             Some(code) => eprintln!("[{:?}] {} (rc={code})", record.level, record.message),
///             None => eprintln!("[{:?}] {}", record.level, record.message),
///         }
///     }
/// }
///
/// set_logger(Arc::new(StderrLogger), LogLevel::Info);
/// ```
pub trait Logger: Sync + Send {
    /// Records one log entry.
    fn log(&self, record: LogRecord);
}

/// Severity of a [`LogRecord`], from most to least verbose.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Very low priority, extremely detailed messages.
    Trace,
    /// Failures turned into errors, and other debugging information.
    Debug,
    /// Progress of the application.
    Info,
    /// Potentially harmful situations, such as a failed best-effort rollback.
    Warn,
    /// Errors the crate could not report through a return value.
    Error,
}

impl LogLevel {
    const fn filter(self) -> log::LevelFilter {
        match self {
            Self::Trace => log::LevelFilter::Trace,
            Self::Debug => log::LevelFilter::Debug,
            Self::Info => log::LevelFilter::Info,
            Self::Warn => log::LevelFilter::Warn,
            Self::Error => log::LevelFilter::Error,
        }
    }
}

impl From<log::Level> for LogLevel {
    fn from(level: log::Level) -> Self {
        match level {
            log::Level::Error => Self::Error,
            log::Level::Warn => Self::Warn,
            log::Level::Info => Self::Info,
            log::Level::Debug => Self::Debug,
            log::Level::Trace => Self::Trace,
        }
    }
}

/// One entry handed to the host [`Logger`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    /// Severity.
    pub level: LogLevel,
    /// Module that emitted the record, e.g. `litekit_db::statement`.
    pub target: String,
    /// Rendered message; for failures, the error's full message.
    pub message: String,
    /// Result code of the failure, when the engine reported one.
    pub code: Option<ResultCode>,
    /// Query the failure is about, if any.
    pub query: Option<String>,
}

impl LogRecord {
    fn from_log(record: &log::Record<'_>) -> Self {
        let fields = record.key_values();
        Self {
            level: record.level().into(),
            target: record.target().to_owned(),
            message: record.args().to_string(),
            code: fields
                .get(Key::from("code"))
                .and_then(|v| v.to_i64())
                .and_then(|v| i32::try_from(v).ok())
                .map(ResultCode),
            query: fields.get(Key::from("query")).map(|v| v.to_string()),
        }
    }
}

/// Logs `err` at debug level, with its code and query as structured fields.
pub(crate) fn failure(err: &DbError) {
    match (err.code(), err.query()) {
        (Some(code), Some(query)) => log::debug!(code = code.0, query = query; "{err}"),
        (Some(code), None) => log::debug!(code = code.0; "{err}"),
        (None, Some(query)) => log::debug!(query = query; "{err}"),
        (None, None) => log::debug!("{err}"),
    }
}

/// Forwards `log` records to the installed [`Logger`].
struct ForeignLogger;

/// Records from this crate pass down to `max`; other crates sharing the
/// facade only reach the host at warn and above.
fn accepts(metadata: &log::Metadata<'_>, max: log::LevelFilter) -> bool {
    if metadata.level() > max {
        return false;
    }
    metadata.target().starts_with("litekit") || metadata.level() <= log::Level::Warn
}

impl log::Log for ForeignLogger {
    fn enabled(&self, metadata: &log::Metadata<'_>) -> bool {
        accepts(metadata, log::max_level())
    }

    fn log(&self, record: &log::Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        if let Some(logger) = LOGGER_INSTANCE.get() {
            logger.log(LogRecord::from_log(record));
        }
    }

    fn flush(&self) {}
}

static FOREIGN_LOGGER: ForeignLogger = ForeignLogger;
static LOGGER_INSTANCE: OnceLock<Arc<dyn Logger>> = OnceLock::new();

/// Installs `logger` as the process-wide destination of the crate's records,
/// keeping those at `max_level` or more severe.
///
/// Only the first call installs a logger; later calls are ignored (with a
/// message on stderr), as is the call if another `log` backend is already
/// installed.
pub fn set_logger(logger: Arc<dyn Logger>, max_level: LogLevel) {
    if LOGGER_INSTANCE.set(logger).is_err() {
        eprintln!("Logger already set");
        return;
    }

    if let Err(e) = log::set_logger(&FOREIGN_LOGGER) {
        eprintln!("Failed to set logger: {e}");
        return;
    }
    log::set_max_level(max_level.filter());
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    fn metadata(level: log::Level, target: &str) -> log::Metadata<'_> {
        log::Metadata::builder().level(level).target(target).build()
    }

    #[test_case(log::Level::Debug, "litekit_db::statement", log::LevelFilter::Debug => true ; "own debug at debug")]
    #[test_case(log::Level::Debug, "litekit_db::statement", log::LevelFilter::Info => false ; "own debug above max")]
    #[test_case(log::Level::Debug, "hyper::client", log::LevelFilter::Trace => false ; "foreign debug")]
    #[test_case(log::Level::Info, "hyper::client", log::LevelFilter::Trace => false ; "foreign info")]
    #[test_case(log::Level::Warn, "hyper::client", log::LevelFilter::Trace => true ; "foreign warn")]
    #[test_case(log::Level::Warn, "litekit_db::transaction", log::LevelFilter::Error => false ; "warn above max")]
    fn filters_by_level_and_target(
        level: log::Level,
        target: &str,
        max: log::LevelFilter,
    ) -> bool {
        accepts(&metadata(level, target), max)
    }

    #[test]
    fn maps_every_level() {
        assert_eq!(LogLevel::from(log::Level::Error), LogLevel::Error);
        assert_eq!(LogLevel::from(log::Level::Warn), LogLevel::Warn);
        assert_eq!(LogLevel::from(log::Level::Info), LogLevel::Info);
        assert_eq!(LogLevel::from(log::Level::Debug), LogLevel::Debug);
        assert_eq!(LogLevel::from(log::Level::Trace), LogLevel::Trace);
        assert_eq!(LogLevel::Warn.filter(), log::LevelFilter::Warn);
    }

    #[test]
    fn record_carries_code_and_query() {
        let fields = [
            ("code", log::kv::Value::from(2067_i64)),
            ("query", log::kv::Value::from("INSERT INTO t VALUES (1)")),
        ];
        let record = LogRecord::from_log(
            &log::Record::builder()
                .level(log::Level::Debug)
                .target("litekit_db::statement")
                .args(format_args!("constraint failed"))
                .key_values(&fields)
                .build(),
        );

        assert_eq!(
            record,
            LogRecord {
                level: LogLevel::Debug,
                target: "litekit_db::statement".to_owned(),
                message: "constraint failed".to_owned(),
                code: Some(ResultCode(2067)),
                query: Some("INSERT INTO t VALUES (1)".to_owned()),
            }
        );
        assert_eq!(record.code.map(ResultCode::primary), Some(ResultCode::CONSTRAINT));
    }

    #[test]
    fn record_without_fields() {
        let record = LogRecord::from_log(
            &log::Record::builder()
                .level(log::Level::Warn)
                .target("litekit_db::transaction")
                .args(format_args!("rollback on drop failed"))
                .build(),
        );
        assert_eq!(record.level, LogLevel::Warn);
        assert_eq!(record.code, None);
        assert_eq!(record.query, None);
    }
}
