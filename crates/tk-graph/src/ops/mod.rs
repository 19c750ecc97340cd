//! Operator trait, attributes and built-in operators.
//!
//! An operator only knows how to infer its output descriptors from its input
//! descriptors. Kernels live in whichever runtime executes the graph.

mod attrs;
mod convert;
mod eltwise;
mod squeeze;
mod topk;

use std::fmt;

use thiserror::Error;

use crate::element::ElementType;
use crate::shape::PartialShape;
use crate::tensor::TensorDesc;

pub use attrs::{AttrValue, Attributes};
pub use convert::Convert;
pub use eltwise::Add;
pub use squeeze::{Squeeze, Unsqueeze};
pub use topk::{TopK, TopKMode, TopKSort};

pub type OpResult<T> = Result<T, OpError>;

/// Errors reported by operator construction and type inference.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OpError {
    #[error("expected {expected} inputs, got {actual}")]
    InputCount { expected: usize, actual: usize },

    #[error("input {input} must be {expected}, got {actual}")]
    ElementType {
        input: usize,
        expected: &'static str,
        actual: ElementType,
    },

    #[error("input {input} must have {expected}, got {actual}")]
    Rank {
        input: usize,
        expected: String,
        actual: PartialShape,
    },

    #[error("input {input} axis {axis}: {what}")]
    Dimension { input: usize, axis: i64, what: String },

    #[error("shapes {lhs} and {rhs} are not broadcastable")]
    Broadcast { lhs: PartialShape, rhs: PartialShape },

    #[error("attribute '{name}': {what}")]
    Attribute { name: String, what: String },
}

/// A graph operator seen through its type-inference contract.
pub trait Operator: fmt::Debug + Send + Sync {
    /// Type name used by the operator factory.
    fn type_name(&self) -> &str;

    /// Number of tensors produced.
    fn output_count(&self) -> usize {
        1
    }

    /// Attributes that reconstruct this operator through the factory.
    fn attributes(&self) -> Attributes {
        Attributes::new()
    }

    /// Compute output descriptors; must return exactly `output_count()` entries.
    fn infer(&self, inputs: &[TensorDesc]) -> OpResult<Vec<TensorDesc>>;
}

/// Fail unless exactly `expected` inputs are present.
pub fn expect_inputs(inputs: &[TensorDesc], expected: usize) -> OpResult<()> {
    if inputs.len() == expected {
        Ok(())
    } else {
        Err(OpError::InputCount {
            expected,
            actual: inputs.len(),
        })
    }
}

/// Fail unless input `index` is dynamic or satisfies `accept`.
pub fn expect_element(
    inputs: &[TensorDesc],
    index: usize,
    expected: &'static str,
    accept: impl Fn(ElementType) -> bool,
) -> OpResult<ElementType> {
    let actual = inputs[index].element_type;
    if actual.is_dynamic() || accept(actual) {
        Ok(actual)
    } else {
        Err(OpError::ElementType {
            input: index,
            expected,
            actual,
        })
    }
}

/// Fail unless input `index` has dynamic rank or rank `rank`.
pub fn expect_rank(inputs: &[TensorDesc], index: usize, rank: usize) -> OpResult<()> {
    let shape = &inputs[index].shape;
    match shape.rank() {
        Some(r) if r != rank => Err(OpError::Rank {
            input: index,
            expected: format!("rank {rank}"),
            actual: shape.clone(),
        }),
        _ => Ok(()),
    }
}
