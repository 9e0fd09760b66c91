//! Contract for the underlying callback-style SQL engine.
//!
//! The engine is a black box: it accepts one statement with positional
//! parameters inside an engine-managed transaction and reports the outcome
//! through callbacks. Only one transaction may be live per handle; the
//! adapter's executor guarantees that by serializing all callers.

use std::sync::Arc;

use crate::error::EngineError;
use crate::types::SqlValue;

/// Version tag passed to the engine's open-handle call.
pub const DEFAULT_VERSION: &str = "1.0";

/// Storage-size ceiling passed to the engine's open-handle call (50 MiB).
pub const DEFAULT_MAX_SIZE: u64 = 50 * 1024 * 1024;

/// Parameters for opening an engine handle.
#[derive(Debug, Clone)]
pub struct OpenParams {
    /// Database name (derived from the connection URL).
    pub name: String,
    /// Engine version tag.
    pub version: String,
    /// Human-readable label for the database.
    pub display_name: String,
    /// Storage-size ceiling in bytes.
    pub max_size: u64,
}

impl OpenParams {
    /// Open parameters with the defaults the adapter uses: the database name
    /// doubles as the display label.
    #[must_use]
    pub fn for_name(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            display_name: name.clone(),
            name,
            version: DEFAULT_VERSION.to_string(),
            max_size: DEFAULT_MAX_SIZE,
        }
    }
}

/// A single engine-native result row: column names shared across the result,
/// values in engine column order.
#[derive(Debug, Clone)]
pub struct RawRow {
    column_names: Arc<Vec<String>>,
    values: Vec<SqlValue>,
}

impl RawRow {
    #[must_use]
    pub fn new(column_names: Arc<Vec<String>>, values: Vec<SqlValue>) -> Self {
        Self {
            column_names,
            values,
        }
    }

    #[must_use]
    pub fn column_names(&self) -> &Arc<Vec<String>> {
        &self.column_names
    }

    #[must_use]
    pub fn values(&self) -> &[SqlValue] {
        &self.values
    }

    pub(crate) fn into_parts(self) -> (Arc<Vec<String>>, Vec<SqlValue>) {
        (self.column_names, self.values)
    }
}

/// Engine-native result of one statement execution.
///
/// The insert-id accessor is fallible by contract: statement types without
/// an insert identifier report an engine-level error when it is read, and
/// the normalizer treats that as "absent" rather than a failure.
#[derive(Debug, Clone)]
pub struct RawResult {
    rows_affected: Option<u64>,
    insert_id: Result<i64, EngineError>,
    rows: Option<Vec<RawRow>>,
}

impl RawResult {
    #[must_use]
    pub fn new(
        rows_affected: Option<u64>,
        insert_id: Result<i64, EngineError>,
        rows: Option<Vec<RawRow>>,
    ) -> Self {
        Self {
            rows_affected,
            insert_id,
            rows,
        }
    }

    /// Row count affected by a write, when the engine reports one.
    #[must_use]
    pub fn rows_affected(&self) -> Option<u64> {
        self.rows_affected
    }

    /// Identifier of the last inserted row.
    ///
    /// # Errors
    /// Returns the engine-level error for statement types that expose no
    /// insert identifier. Callers are expected to treat this as absence.
    pub fn insert_id(&self) -> Result<i64, EngineError> {
        self.insert_id.clone()
    }

    /// The row collection, absent for statements that produce none.
    #[must_use]
    pub fn rows(&self) -> Option<&[RawRow]> {
        self.rows.as_deref()
    }

    pub(crate) fn into_rows(self) -> Option<Vec<RawRow>> {
        self.rows
    }
}

/// Completion callbacks for one engine-managed transaction.
///
/// The statement-success hook receives the raw result as soon as the
/// statement completes; the transaction may still abort afterwards, in which
/// case the transaction-error hook fires and the captured result must be
/// discarded. The engine invokes at most one of the two transaction-level
/// hooks, exactly once.
pub struct TransactionHooks {
    /// Statement completed; carries the engine-native result.
    pub on_statement: Box<dyn FnOnce(RawResult) + Send>,
    /// The enclosing transaction failed; carries the driver error.
    pub on_transaction_error: Box<dyn FnOnce(EngineError) + Send>,
    /// The enclosing transaction committed.
    pub on_transaction_success: Box<dyn FnOnce() + Send>,
}

/// The underlying engine's transaction/execute-statement API.
///
/// `execute_in_transaction` starts exactly one engine-managed transaction
/// containing exactly one statement execution and returns immediately; the
/// outcome arrives through `hooks` from the engine's own context. The
/// adapter never installs a per-statement error callback: a failing
/// statement aborts the transaction and surfaces through the
/// transaction-error hook.
pub trait SqlEngine: Send + Sync {
    fn execute_in_transaction(
        &self,
        statement: String,
        params: Vec<SqlValue>,
        hooks: TransactionHooks,
    );
}
