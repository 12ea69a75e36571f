//! FILENAME: pivot-crosstab/src/error.rs

use thiserror::Error;

use crate::value::PivotValue;

#[derive(Error, Debug)]
pub enum PivotError {
    /// Illegal clause combination or configuration.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Cannot aggregate an empty list of items")]
    EmptyGroup,

    /// A value of the wrong kind reached a numeric aggregate.
    #[error("{function}: expected a numeric value but got {value:?}")]
    TypeMismatch {
        function: &'static str,
        value: PivotValue,
    },

    /// Two values that have no natural ordering between them.
    #[error("Values are not comparable: {left:?} and {right:?}")]
    Incomparable {
        left: PivotValue,
        right: PivotValue,
    },

    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PivotError>;
