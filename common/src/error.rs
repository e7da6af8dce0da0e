use thiserror::Error;

pub type TupleResult<T> = Result<T, TupleError>;

/// Errors raised by the record model: schema construction and field access.
#[derive(Debug, PartialEq, Clone, Error)]
pub enum TupleError {
    #[error("Duplicate field `{0}`")]
    DuplicateField(String),
    #[error("Field names must not be empty")]
    EmptyFieldName,
    #[error("Unknown field `{field}` in schema [{schema}]")]
    UnknownField { field: String, schema: String },
    #[error("Field position {pos} out of range for tuple of width {width}")]
    PositionOutOfRange { pos: usize, width: usize },
    #[error("Width mismatch: expected {expected} values, found {actual}")]
    WidthMismatch { expected: usize, actual: usize },
    #[error("Schema mismatch: expected [{expected}], found [{actual}]")]
    SchemaMismatch { expected: String, actual: String },
}
