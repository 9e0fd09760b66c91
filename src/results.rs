//! Uniform row-set representation and the engine-result normalizer.

use std::sync::Arc;

use crate::codec::decode_value;
use crate::engine::RawResult;
use crate::types::SqlValue;

/// A row from a query result, with access by column name or index.
#[derive(Debug, Clone)]
pub struct Row {
    /// Column names, shared across all rows of a result set.
    column_names: Arc<Vec<String>>,
    values: Vec<SqlValue>,
}

impl Row {
    #[must_use]
    pub fn new(column_names: Arc<Vec<String>>, values: Vec<SqlValue>) -> Self {
        Self {
            column_names,
            values,
        }
    }

    #[must_use]
    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    /// Get a value by column name, or None if the column doesn't exist.
    #[must_use]
    pub fn get(&self, column_name: &str) -> Option<&SqlValue> {
        let idx = self.column_names.iter().position(|c| c == column_name)?;
        self.values.get(idx)
    }

    #[must_use]
    pub fn get_by_index(&self, index: usize) -> Option<&SqlValue> {
        self.values.get(index)
    }

    #[must_use]
    pub fn values(&self) -> &[SqlValue] {
        &self.values
    }
}

/// Uniform result shape returned to all callers regardless of statement
/// type: rows in engine order plus set-level metadata. A write-only or DDL
/// statement yields an empty row sequence with the metadata still populated.
#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    /// The rows returned by the statement, in engine order.
    pub rows: Vec<Row>,
    /// Row count affected by a write, when the engine reported one.
    pub affected_rows: Option<u64>,
    /// Identifier of the last inserted row, when one was readable.
    pub insert_id: Option<i64>,
}

impl ResultSet {
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Convert an engine-native result into the uniform [`ResultSet`] shape.
///
/// Absence propagates. `affected_rows` is copied whenever the engine reports
/// it, zero included. The insert identifier is read through the raw result's
/// fallible accessor; a read failure means the statement type has none and
/// leaves the field unset instead of failing the call. Rows are converted in
/// engine order with every value run through the codec's decoder.
#[must_use]
pub fn normalize(raw: Option<RawResult>) -> Option<ResultSet> {
    let raw = raw?;

    let mut result = ResultSet {
        affected_rows: raw.rows_affected(),
        insert_id: raw.insert_id().ok(),
        ..ResultSet::default()
    };

    let Some(raw_rows) = raw.into_rows() else {
        return Some(result);
    };

    result.rows.reserve(raw_rows.len());
    for raw_row in raw_rows {
        let (column_names, values) = raw_row.into_parts();
        let decoded = values.into_iter().map(decode_value).collect();
        result.rows.push(Row::new(column_names, decoded));
    }
    Some(result)
}
