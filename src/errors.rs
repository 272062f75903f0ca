//! Error types shared by the decoder, the data sources and the report writer.
//!
//! Only the low-level sources and the report writer return these errors. The
//! probe chain converts every failure into sentinel text, so none of them reach
//! the final report as an error.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum InventoryError {
    /// A product-key buffer was shorter than the 15 bytes the decoder needs.
    #[error("product key buffer too short: expected at least 15 bytes, got {len}")]
    KeyBufferTooShort { len: usize },

    #[error("registry error: {0}")]
    Registry(String),

    #[error("inventory query failed: {0}")]
    Query(String),

    /// The query string is not a `SELECT <fields> FROM <class>` statement.
    #[error("invalid inventory query: {0}")]
    InvalidQuery(String),

    #[error("configuration error: {0}")]
    ConfigError(String),

    #[error("storage error: {0}")]
    StorageError(#[from] std::io::Error),
}

pub type InventoryResult<T> = Result<T, InventoryError>;
