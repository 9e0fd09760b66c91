//! Restricted query surface handed to transaction bodies.

use std::sync::Arc;

use crate::error::SqlAdapterError;
use crate::executor::SerializedExecutor;
use crate::results::ResultSet;
use crate::types::SqlValue;

/// Query handle given to a transaction body.
///
/// Statements issued through this handle run with full parameter encoding
/// and result normalization but do not re-acquire the connection lock: the
/// enclosing `transaction` call already holds it for the whole body, which
/// is what keeps the body's statements from interleaving with other callers.
/// Calling back into [`Connection::query`] from inside a body would deadlock
/// instead; this handle is the only correct entry point there.
///
/// Statements must be issued while the body is running; the handle is not
/// meant to outlive it.
///
/// [`Connection::query`]: crate::connection::Connection::query
pub struct TransactionScope {
    executor: Arc<SerializedExecutor>,
}

impl TransactionScope {
    pub(crate) fn new(executor: Arc<SerializedExecutor>) -> Self {
        Self { executor }
    }

    /// Execute a single statement under the lock already held by the
    /// enclosing transaction.
    ///
    /// # Errors
    /// Returns [`SqlAdapterError`] when the engine reports a
    /// transaction-level failure for this statement.
    pub async fn query(
        &self,
        statement: &str,
        params: &[SqlValue],
    ) -> Result<ResultSet, SqlAdapterError> {
        self.executor.execute_unlocked(statement, params).await
    }
}
