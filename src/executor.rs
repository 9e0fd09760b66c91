//! Connection-wide serialization and the callback-to-future bridge.
//!
//! The engine permits one live transaction per handle, so every logical unit
//! of work (a single query or an entire transaction body) runs under one
//! async mutex. The lock is cooperative and fair: callers suspend at the
//! acquisition point and are admitted in arrival order.

use std::future::Future;
use std::sync::{Arc, Mutex as StdMutex, MutexGuard};

use tokio::sync::{Mutex, oneshot};
use tracing::debug;

use crate::codec::encode_params;
use crate::engine::{RawResult, SqlEngine, TransactionHooks};
use crate::error::{EngineError, SqlAdapterError};
use crate::results::{ResultSet, normalize};
use crate::types::SqlValue;

/// Guarantees at most one in-flight unit of work against the engine handle,
/// and bridges the engine's callback completion into futures.
pub struct SerializedExecutor {
    engine: Arc<dyn SqlEngine>,
    lock: Mutex<()>,
}

impl SerializedExecutor {
    #[must_use]
    pub fn new(engine: Arc<dyn SqlEngine>) -> Self {
        Self {
            engine,
            lock: Mutex::new(()),
        }
    }

    /// Run `unit` while holding the connection-wide lock.
    ///
    /// The lock is released unconditionally when the unit finishes, success
    /// or failure, so a failing unit never starves later callers. The lock
    /// is not reentrant: a unit that calls back into `run_exclusive` on the
    /// same executor deadlocks.
    pub async fn run_exclusive<F, Fut, T>(&self, unit: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let _guard = self.lock.lock().await;
        unit().await
    }

    /// Encode, execute and normalize a single statement without touching the
    /// lock. Callers must already hold it, either via [`run_exclusive`] or
    /// because they run inside a transaction body.
    ///
    /// An engine that completes the transaction without ever delivering a
    /// statement result yields an empty result set.
    ///
    /// [`run_exclusive`]: SerializedExecutor::run_exclusive
    pub(crate) async fn execute_unlocked(
        &self,
        statement: &str,
        params: &[SqlValue],
    ) -> Result<ResultSet, SqlAdapterError> {
        let encoded = encode_params(params);
        let raw = self.execute_one(statement, encoded).await?;
        Ok(normalize(raw).unwrap_or_default())
    }

    /// Bridge one engine-managed transaction into a future.
    ///
    /// The statement-success hook only captures the raw result into a
    /// one-shot cell; completion is gated on the transaction-success hook,
    /// since the engine may still abort after the statement callback fires.
    /// On transaction error the captured result is discarded and the driver
    /// error surfaces unchanged.
    async fn execute_one(
        &self,
        statement: &str,
        params: Vec<SqlValue>,
    ) -> Result<Option<RawResult>, SqlAdapterError> {
        let (done_tx, done_rx) = oneshot::channel::<Result<Option<RawResult>, EngineError>>();
        let captured: Arc<StdMutex<Option<RawResult>>> = Arc::new(StdMutex::new(None));
        let completion = Arc::new(StdMutex::new(Some(done_tx)));

        let capture_cell = Arc::clone(&captured);
        let on_statement = Box::new(move |raw: RawResult| {
            *lock_unpoisoned(&capture_cell) = Some(raw);
        });

        let error_completion = Arc::clone(&completion);
        let on_transaction_error = Box::new(move |err: EngineError| {
            if let Some(tx) = lock_unpoisoned(&error_completion).take() {
                let _ = tx.send(Err(err));
            }
        });

        let success_cell = Arc::clone(&captured);
        let success_completion = Arc::clone(&completion);
        let on_transaction_success = Box::new(move || {
            let raw = lock_unpoisoned(&success_cell).take();
            if let Some(tx) = lock_unpoisoned(&success_completion).take() {
                let _ = tx.send(Ok(raw));
            }
        });

        debug!(statement, "dispatching statement to engine");
        self.engine.execute_in_transaction(
            statement.to_string(),
            params,
            TransactionHooks {
                on_statement,
                on_transaction_error,
                on_transaction_success,
            },
        );

        match done_rx.await {
            Ok(Ok(raw)) => Ok(raw),
            Ok(Err(err)) => Err(SqlAdapterError::EngineError(err)),
            Err(_) => Err(SqlAdapterError::ConnectionError(
                "engine dropped its completion callbacks".to_string(),
            )),
        }
    }
}

fn lock_unpoisoned<T>(mutex: &StdMutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::RawRow;

    /// Scripted engine that invokes its hooks synchronously.
    struct ScriptedEngine {
        script: Script,
    }

    enum Script {
        RowsThenCommit,
        CommitWithoutStatement,
        FailBeforeStatement,
        StatementThenAbort,
        DropHooks,
    }

    impl SqlEngine for ScriptedEngine {
        fn execute_in_transaction(
            &self,
            _statement: String,
            _params: Vec<SqlValue>,
            hooks: TransactionHooks,
        ) {
            let names = Arc::new(vec!["n".to_string()]);
            let result = RawResult::new(
                Some(0),
                Err(EngineError::new("no insert id")),
                Some(vec![RawRow::new(names, vec![SqlValue::Int(1)])]),
            );
            match self.script {
                Script::RowsThenCommit => {
                    (hooks.on_statement)(result);
                    (hooks.on_transaction_success)();
                }
                Script::CommitWithoutStatement => {
                    (hooks.on_transaction_success)();
                }
                Script::FailBeforeStatement => {
                    (hooks.on_transaction_error)(EngineError::new("engine exploded"));
                }
                Script::StatementThenAbort => {
                    (hooks.on_statement)(result);
                    (hooks.on_transaction_error)(EngineError::new("aborted after statement"));
                }
                Script::DropHooks => drop(hooks),
            }
        }
    }

    fn executor(script: Script) -> SerializedExecutor {
        SerializedExecutor::new(Arc::new(ScriptedEngine { script }))
    }

    #[tokio::test]
    async fn resolves_with_rows_on_commit() {
        let set = executor(Script::RowsThenCommit)
            .execute_unlocked("SELECT 1", &[])
            .await
            .unwrap();
        assert_eq!(set.len(), 1);
        assert_eq!(set.rows[0].get("n"), Some(&SqlValue::Int(1)));
    }

    #[tokio::test]
    async fn commit_without_statement_result_yields_empty_set() {
        let set = executor(Script::CommitWithoutStatement)
            .execute_unlocked("CREATE TABLE t (x)", &[])
            .await
            .unwrap();
        assert!(set.is_empty());
        assert_eq!(set.affected_rows, None);
    }

    #[tokio::test]
    async fn transaction_error_surfaces_driver_message() {
        let err = executor(Script::FailBeforeStatement)
            .execute_unlocked("SELECT 1", &[])
            .await
            .unwrap_err();
        assert!(matches!(err, SqlAdapterError::EngineError(_)));
        assert_eq!(err.to_string(), "engine exploded");
    }

    #[tokio::test]
    async fn captured_result_is_discarded_when_transaction_aborts() {
        let err = executor(Script::StatementThenAbort)
            .execute_unlocked("INSERT INTO t VALUES (1)", &[])
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "aborted after statement");
    }

    #[tokio::test]
    async fn dropped_hooks_become_a_connection_error() {
        let err = executor(Script::DropHooks)
            .execute_unlocked("SELECT 1", &[])
            .await
            .unwrap_err();
        assert!(matches!(err, SqlAdapterError::ConnectionError(_)));
    }

    #[tokio::test]
    async fn failing_unit_still_releases_the_lock() {
        let exec = executor(Script::RowsThenCommit);
        let failed: Result<(), &str> = exec.run_exclusive(|| async { Err("unit failed") }).await;
        assert!(failed.is_err());

        // A later unit must still be able to acquire and run.
        let set = exec
            .run_exclusive(|| exec.execute_unlocked("SELECT 1", &[]))
            .await
            .unwrap();
        assert_eq!(set.len(), 1);
    }
}
