//! Error types for the standard function libraries

use thiserror::Error;

/// Failures raised by standard library function bodies.
///
/// The engine wraps these in `NodeGraphError::Invocation`, so callers see
/// them as the source of the invocation error.
#[derive(Debug, Error)]
pub enum FunctionError {
    #[error("Division by zero")]
    DivisionByZero,

    #[error("To sort a list, all elements in the list need to be of the same type.")]
    MixedSort,

    #[error("Values of type {0} cannot be sorted")]
    Unsortable(String),

    #[error("Could not parse '{0}' as a number")]
    NotANumber(String),
}
