//! Serialized async adapter over callback-driven embedded SQL engines.
//!
//! The underlying engine family supports exactly one live transaction per
//! handle and reports results through callbacks. This crate wraps such an
//! engine behind a promise-style API: every query and every transaction body
//! runs under a connection-wide async lock, parameters and results pass
//! through a value codec so binary data survives an engine that only stores
//! text and numbers, and engine-native results are normalized into a uniform
//! row-set shape carrying insert-id and affected-row metadata.

pub mod codec;
pub mod connection;
pub mod engine;
pub mod error;
pub mod executor;
pub mod results;
pub mod transaction;
pub mod types;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use connection::Connection;
pub use error::{EngineError, SqlAdapterError};
pub use results::{ResultSet, Row};
pub use types::SqlValue;

/// Convenience re-exports for the common surface of the crate.
pub mod prelude {
    pub use crate::connection::Connection;
    pub use crate::error::{EngineError, SqlAdapterError};
    pub use crate::results::{ResultSet, Row};
    pub use crate::types::SqlValue;
}
