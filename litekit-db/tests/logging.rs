//! The logger bridge forwards the crate's diagnostics to a host logger.
//!
//! The host logger is process-wide, so every test here shares one capturing
//! logger and looks only for the records it produced itself.

use std::sync::{Arc, Mutex, OnceLock};

use litekit_db::logger::{set_logger, LogLevel, LogRecord, Logger};
use litekit_db::{params, Connection, ResultCode};

#[derive(Default)]
struct CapturingLogger {
    records: Mutex<Vec<LogRecord>>,
}

impl Logger for CapturingLogger {
    fn log(&self, record: LogRecord) {
        self.records.lock().unwrap().push(record);
    }
}

impl CapturingLogger {
    fn find(&self, pred: impl Fn(&LogRecord) -> bool) -> Option<LogRecord> {
        self.records.lock().unwrap().iter().find(|r| pred(r)).cloned()
    }
}

fn logger() -> &'static CapturingLogger {
    static LOGGER: OnceLock<Arc<CapturingLogger>> = OnceLock::new();
    LOGGER.get_or_init(|| {
        let logger = Arc::new(CapturingLogger::default());
        set_logger(logger.clone(), LogLevel::Debug);
        logger
    })
}

#[test]
fn engine_failures_are_logged() {
    let logger = logger();

    let conn = Connection::open_in_memory().expect("open in-memory db");
    conn.execute_batch("CREATE TABLE dup (id INTEGER PRIMARY KEY);")
        .expect("create table");
    conn.execute("INSERT INTO dup (id) VALUES (?1)", params![1_i64])
        .expect("insert");
    let err = conn
        .execute("INSERT INTO dup (id) VALUES (?1)", params![1_i64])
        .unwrap_err();

    let record = logger
        .find(|r| r.message == err.message())
        .expect("failure record");
    assert_eq!(record.level, LogLevel::Debug);
    assert!(record.target.starts_with("litekit_db"));
    assert_eq!(record.code, err.code());
    assert_eq!(record.code.map(ResultCode::primary), Some(ResultCode::CONSTRAINT));
    assert_eq!(record.query.as_deref(), Some("INSERT INTO dup (id) VALUES (?1)"));

    assert!(logger
        .find(|r| r.message.starts_with("opened sqlite database :memory:"))
        .is_some());
}

#[test]
fn generic_failures_carry_no_code() {
    let logger = logger();

    let conn = Connection::open_in_memory().expect("open in-memory db");
    let err = conn.prepare("  -- nothing to run").unwrap_err();

    let record = logger
        .find(|r| r.message == err.message())
        .expect("failure record");
    assert_eq!(record.code, None);
    assert_eq!(record.query, None);
}

#[test]
fn failed_rollback_on_drop_is_warned() {
    let logger = logger();

    let conn = Connection::open_in_memory().expect("open in-memory db");
    conn.execute_batch("CREATE TABLE ended (id INTEGER PRIMARY KEY);")
        .expect("create table");
    let tx = conn.transaction().expect("begin tx");
    tx.execute("INSERT INTO ended (id) VALUES (1)", &[])
        .expect("insert");
    // Ends the transaction behind the guard's back, so its ROLLBACK fails.
    conn.execute_batch("COMMIT").expect("commit");
    drop(tx);

    let record = logger
        .find(|r| {
            r.level == LogLevel::Warn
                && r.message.starts_with("rollback on drop failed")
                && r.message.contains("no transaction is active")
        })
        .expect("rollback warning");
    assert!(record.target.starts_with("litekit_db"));

    // The committed row survives the failed rollback.
    let count = conn
        .query_row("SELECT count(*) FROM ended", &[], |stmt| {
            Ok(stmt.column_i64(0))
        })
        .expect("count");
    assert_eq!(count, 1);
}
