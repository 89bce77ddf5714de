//! Core type definitions for tabula.
//!
//! This crate holds the small, plugin-agnostic types every other tabula
//! crate keys its state on:
//! - Table identity keys (UUID v7)
//! - Column keys used to address column-scoped preferences
//! - The entity scope a piece of plugin metadata belongs to
//!
//! Nothing here knows about plugins or storage.

mod ids;
mod scope;

pub use ids::{ColumnKey, TableId};
pub use scope::MetaScope;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid UUID: {0}")]
    InvalidUuid(#[from] uuid::Error),

    #[error("invalid column key: {0:?}")]
    InvalidColumnKey(String),
}
