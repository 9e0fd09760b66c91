//! Embedded sqlite backend implementing the callback engine contract.
//!
//! A dedicated worker thread owns the `rusqlite` connection; commands arrive
//! over an mpsc channel and the outcome is reported through the caller's
//! transaction hooks. Each command runs as one BEGIN/statement/COMMIT cycle,
//! which gives the single-live-transaction behavior the adapter is built
//! around.

use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use tracing::debug;

use crate::engine::{OpenParams, RawResult, RawRow, SqlEngine, TransactionHooks};
use crate::error::{EngineError, SqlAdapterError};
use crate::types::SqlValue;

enum Command {
    Execute {
        statement: String,
        params: Vec<SqlValue>,
        hooks: TransactionHooks,
    },
    Shutdown,
}

/// Engine handle backed by a worker-owned `rusqlite::Connection`.
pub struct SqliteEngine {
    sender: Sender<Command>,
}

impl SqliteEngine {
    /// Spawn the worker thread and open the database named in `params`
    /// (`:memory:` opens an in-memory database).
    ///
    /// # Errors
    /// Returns `ConnectionError` if the worker thread cannot be spawned. A
    /// failure to open the database itself is reported through the hooks of
    /// the first command, matching the engine contract's async error path.
    pub fn open(params: &OpenParams) -> Result<Self, SqlAdapterError> {
        let (sender, receiver) = mpsc::channel::<Command>();
        let name = params.name.clone();
        debug!(name, version = params.version, "opening sqlite engine");
        thread::Builder::new()
            .name(format!("sqlite-engine-{name}"))
            .spawn(move || run_worker(&name, &receiver))
            .map_err(|err| {
                SqlAdapterError::ConnectionError(format!(
                    "failed to spawn sqlite engine thread: {err}"
                ))
            })?;
        Ok(Self { sender })
    }
}

impl SqlEngine for SqliteEngine {
    fn execute_in_transaction(
        &self,
        statement: String,
        params: Vec<SqlValue>,
        hooks: TransactionHooks,
    ) {
        if let Err(send_err) = self.sender.send(Command::Execute {
            statement,
            params,
            hooks,
        }) && let Command::Execute { hooks, .. } = send_err.0
        {
            (hooks.on_transaction_error)(EngineError::new("sqlite engine worker is gone"));
        }
    }
}

impl Drop for SqliteEngine {
    fn drop(&mut self) {
        let _ = self.sender.send(Command::Shutdown);
    }
}

fn run_worker(name: &str, receiver: &Receiver<Command>) {
    let mut conn = match rusqlite::Connection::open(name) {
        Ok(conn) => conn,
        Err(err) => {
            let err = EngineError::from(err);
            while let Ok(command) = receiver.recv() {
                if let Command::Execute { hooks, .. } = command {
                    (hooks.on_transaction_error)(err.clone());
                }
            }
            return;
        }
    };

    while let Ok(command) = receiver.recv() {
        match command {
            Command::Shutdown => break,
            Command::Execute {
                statement,
                params,
                hooks,
            } => execute(&mut conn, &statement, params, hooks),
        }
    }
}

/// One engine-managed transaction around one statement. The statement hook
/// fires before COMMIT; a commit failure still routes to the error hook, at
/// which point the bridge discards the captured result.
fn execute(
    conn: &mut rusqlite::Connection,
    statement: &str,
    params: Vec<SqlValue>,
    hooks: TransactionHooks,
) {
    let tx = match conn.transaction() {
        Ok(tx) => tx,
        Err(err) => {
            (hooks.on_transaction_error)(err.into());
            return;
        }
    };

    let raw = match run_statement(&tx, statement, params) {
        Ok(raw) => raw,
        Err(err) => {
            // Dropping the transaction rolls it back.
            drop(tx);
            (hooks.on_transaction_error)(err);
            return;
        }
    };

    (hooks.on_statement)(raw);
    match tx.commit() {
        Ok(()) => (hooks.on_transaction_success)(),
        Err(err) => (hooks.on_transaction_error)(err.into()),
    }
}

fn run_statement(
    tx: &rusqlite::Transaction<'_>,
    statement: &str,
    params: Vec<SqlValue>,
) -> Result<RawResult, EngineError> {
    let mut stmt = tx.prepare(statement)?;
    let values = convert_params(params);

    if stmt.column_count() > 0 {
        let column_names: Arc<Vec<String>> =
            Arc::new(stmt.column_names().iter().map(ToString::to_string).collect());
        let mut rows_iter = stmt.query(rusqlite::params_from_iter(values))?;
        let mut rows = Vec::new();
        while let Some(row) = rows_iter.next()? {
            let mut row_values = Vec::with_capacity(column_names.len());
            for idx in 0..column_names.len() {
                row_values.push(extract_value(row, idx)?);
            }
            rows.push(RawRow::new(Arc::clone(&column_names), row_values));
        }
        Ok(RawResult::new(Some(0), Err(no_insert_id()), Some(rows)))
    } else {
        // Reset the sentinel so this statement's insert is distinguishable
        // from an earlier statement that happened to produce the same rowid.
        tx.set_last_insert_rowid(0);
        let affected = stmt.execute(rusqlite::params_from_iter(values))?;
        let rowid = tx.last_insert_rowid();
        // The insert id is only readable when this statement actually
        // inserted a row, mirroring the throwing accessor of the source
        // engine family.
        let insert_id = if affected > 0 && rowid != 0 {
            Ok(rowid)
        } else {
            Err(no_insert_id())
        };
        Ok(RawResult::new(Some(affected as u64), insert_id, None))
    }
}

fn no_insert_id() -> EngineError {
    EngineError::new("statement did not produce an insert id")
}

fn convert_params(params: Vec<SqlValue>) -> Vec<rusqlite::types::Value> {
    params
        .into_iter()
        .map(|value| match value {
            SqlValue::Int(i) => rusqlite::types::Value::Integer(i),
            SqlValue::Float(f) => rusqlite::types::Value::Real(f),
            SqlValue::Text(s) => rusqlite::types::Value::Text(s),
            SqlValue::Bool(b) => rusqlite::types::Value::Integer(i64::from(b)),
            SqlValue::Null => rusqlite::types::Value::Null,
            SqlValue::Blob(bytes) => rusqlite::types::Value::Blob(bytes),
        })
        .collect()
}

fn extract_value(row: &rusqlite::Row<'_>, idx: usize) -> Result<SqlValue, EngineError> {
    match row.get_ref(idx)? {
        rusqlite::types::ValueRef::Null => Ok(SqlValue::Null),
        rusqlite::types::ValueRef::Integer(i) => Ok(SqlValue::Int(i)),
        rusqlite::types::ValueRef::Real(f) => Ok(SqlValue::Float(f)),
        rusqlite::types::ValueRef::Text(bytes) => {
            Ok(SqlValue::Text(String::from_utf8_lossy(bytes).into_owned()))
        }
        rusqlite::types::ValueRef::Blob(bytes) => Ok(SqlValue::Blob(bytes.to_vec())),
    }
}
