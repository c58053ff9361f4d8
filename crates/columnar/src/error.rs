//! Table-surface errors
//!
//! Misuse of the storage surface (wrong arity, wrong types, unknown names)
//! is reported as a plain `Result` failure; it is the caller's input that is
//! wrong, not the engine's state.

use crate::types::DataType;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StorageError {
    #[error("unknown column '{name}'")]
    UnknownColumn { name: String },

    #[error("row has {got} values, table has {expected} columns")]
    ColumnCountMismatch { expected: usize, got: usize },

    #[error("type mismatch in column '{column}': expected {expected}, got {got}")]
    TypeMismatch {
        column: String,
        expected: DataType,
        got: DataType,
    },

    #[error("column '{column}' is not nullable")]
    NullNotAllowed { column: String },

    #[error("length mismatch: {values} values vs {nulls} null markers")]
    LengthMismatch { values: usize, nulls: usize },
}
