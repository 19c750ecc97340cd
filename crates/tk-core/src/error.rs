//! Core error types.

use thiserror::Error;

pub type CoreResult<T> = Result<T, CoreError>;

/// Errors shared by every arena.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("Id space exhausted at index {index}")]
    IdOverflow { index: usize },
}
