use thiserror::Error;

use combiner_common::error::TupleError;

pub type CombinerResult<T> = Result<T, CombinerError>;

#[derive(Debug, PartialEq, Clone, Error)]
pub enum CombinerError {
    #[error("Memory bound cache used for combining but no memory estimator specified for aggregator at index {index}")]
    MissingMemoryEstimator { index: usize },
    #[error("At least one aggregator spec is required")]
    EmptySpecList,
    #[error("Aggregator spec requires at least one {kind} field")]
    EmptyFields { kind: &'static str },
    #[error("Unknown aggregator `{0}`")]
    UnknownAggregator(String),
    #[error("{aggregator}: expected {expected} fields, found {actual}")]
    ArityMismatch {
        aggregator: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("{aggregator}: field `{field}` expected {expected}, found {actual}")]
    TypeMismatch {
        aggregator: &'static str,
        field: String,
        expected: &'static str,
        actual: &'static str,
    },
    #[error("{aggregator}: count overflow")]
    CountOverflow { aggregator: &'static str },
    #[error("Accumulator is not of the expected type `{expected}`")]
    AccumulatorMismatch { expected: &'static str },
    #[error("Composite accumulator has {actual} entries but {expected} aggregators are composed")]
    CompositeWidthMismatch { expected: usize, actual: usize },
    #[error(transparent)]
    Tuple(#[from] TupleError),
    #[error("{0}")]
    General(String),
}

impl From<&str> for CombinerError {
    fn from(message: &str) -> Self {
        CombinerError::General(String::from(message))
    }
}

impl From<String> for CombinerError {
    fn from(message: String) -> Self {
        CombinerError::General(message)
    }
}
