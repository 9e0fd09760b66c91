//! Connection construction and the public query/transaction entry points.

use std::future::Future;
use std::sync::Arc;

use crate::engine::SqlEngine;
use crate::error::SqlAdapterError;
use crate::executor::SerializedExecutor;
use crate::results::ResultSet;
use crate::transaction::TransactionScope;
use crate::types::SqlValue;

#[cfg(feature = "sqlite")]
use crate::engine::OpenParams;
#[cfg(feature = "sqlite")]
use crate::sqlite::SqliteEngine;

/// A single adapter connection: one engine handle, one serialization lock.
///
/// All queries and transaction bodies on this connection execute one at a
/// time in arrival order; see [`SerializedExecutor`] for the lock semantics.
pub struct Connection {
    executor: Arc<SerializedExecutor>,
}

impl Connection {
    /// Open a connection on the embedded sqlite engine.
    ///
    /// The database name is the text after the first `:` of the URL (a URL
    /// without a scheme separator is taken whole); `sqlite::memory:` opens
    /// an in-memory database.
    ///
    /// # Errors
    /// `ConfigError` when the URL or the derived name is empty;
    /// `ConnectionError` when the engine worker cannot be started.
    #[cfg(feature = "sqlite")]
    pub fn open(url: &str) -> Result<Self, SqlAdapterError> {
        let name = database_name(url)?;
        let engine = SqliteEngine::open(&OpenParams::for_name(name))?;
        Ok(Self::from_engine(Arc::new(engine)))
    }

    /// Open a connection over an arbitrary engine implementation, keeping
    /// the same URL handling as [`Connection::open`].
    ///
    /// # Errors
    /// `ConfigError` when the URL or the derived name is empty.
    pub fn with_engine(url: &str, engine: Arc<dyn SqlEngine>) -> Result<Self, SqlAdapterError> {
        database_name(url)?;
        Ok(Self::from_engine(engine))
    }

    fn from_engine(engine: Arc<dyn SqlEngine>) -> Self {
        Self {
            executor: Arc::new(SerializedExecutor::new(engine)),
        }
    }

    /// Execute a single statement exclusively and return the normalized
    /// result.
    ///
    /// # Errors
    /// Returns [`SqlAdapterError`] when the engine reports a
    /// transaction-level failure. Errors are surfaced, never retried.
    pub async fn query(
        &self,
        statement: &str,
        params: &[SqlValue],
    ) -> Result<ResultSet, SqlAdapterError> {
        self.executor
            .run_exclusive(|| self.executor.execute_unlocked(statement, params))
            .await
    }

    /// Run `body` as one exclusive unit of work.
    ///
    /// The body receives a [`TransactionScope`] whose `query` method shares
    /// the lock held for the whole body, so its statements interleave with
    /// nothing else on this connection. This is mutual exclusion against
    /// other connection users, not engine-level multi-statement rollback: a
    /// failing second statement does not undo the first one's effects.
    ///
    /// # Errors
    /// An error returned by the body propagates unchanged after the lock is
    /// released; no partial result is returned.
    pub async fn transaction<F, Fut, T>(&self, body: F) -> Result<T, SqlAdapterError>
    where
        F: FnOnce(TransactionScope) -> Fut,
        Fut: Future<Output = Result<T, SqlAdapterError>>,
    {
        let scope_executor = Arc::clone(&self.executor);
        self.executor
            .run_exclusive(move || body(TransactionScope::new(scope_executor)))
            .await
    }

    /// Close the connection. A no-op for this engine family: the engine has
    /// no explicit disconnect, and outstanding operations are not aborted.
    pub async fn close(&self) {}
}

fn database_name(url: &str) -> Result<String, SqlAdapterError> {
    if url.is_empty() {
        return Err(SqlAdapterError::ConfigError(
            "connection URL is missing".to_string(),
        ));
    }
    let name = match url.find(':') {
        Some(pos) => &url[pos + 1..],
        None => url,
    };
    if name.is_empty() {
        return Err(SqlAdapterError::ConfigError(
            "database name is missing".to_string(),
        ));
    }
    Ok(name.to_string())
}
