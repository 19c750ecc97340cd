//! Graph-specific error types.

use thiserror::Error;
use tk_core::{CoreError, NodeId};

use crate::ops::OpError;

pub type GraphResult<T> = Result<T, GraphError>;

/// Graph construction, validation and lookup errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error(transparent)]
    Core(#[from] CoreError),

    /// An edge refers to a node that doesn't exist.
    #[error("Node {node} refers to non-existent node {target}")]
    InvalidNodeRef { node: NodeId, target: NodeId },

    /// An edge refers to an output index the producer doesn't have.
    #[error("Node {node} refers to output {output} of node {target}, which has {count} outputs")]
    InvalidOutputRef {
        node: NodeId,
        target: NodeId,
        output: u32,
        count: usize,
    },

    /// An input slot index is out of range for the consumer.
    #[error("Node {node} has no input slot {input}")]
    InvalidInputSlot { node: NodeId, input: u32 },

    #[error("Node {node} is not a parameter")]
    NotAParameter { node: NodeId },

    #[error("Node {node} is not a result")]
    NotAResult { node: NodeId },

    #[error("Node {node} is declared more than once")]
    DuplicateDeclaration { node: NodeId },

    #[error("Input name '{name}' is used by more than one graph input")]
    DuplicateInputName { name: String },

    /// A parameter feeds the outputs but is not one of the graph inputs.
    #[error("Parameter '{name}' is reachable from the outputs but not declared as a graph input")]
    UndeclaredParameter { name: String },

    #[error("Graph contains a cycle through node '{name}'")]
    Cycle { name: String },

    /// Operator type inference rejected its inputs.
    #[error("Node '{node}' ({op}): {source}")]
    Inference {
        node: String,
        op: String,
        #[source]
        source: OpError,
    },

    #[error("Node '{node}' ({op}) produced {actual} outputs, expected {expected}")]
    OutputCount {
        node: String,
        op: String,
        expected: usize,
        actual: usize,
    },

    #[error("Graph '{graph}' has no input named '{name}'")]
    UnknownInput { graph: String, name: String },

    #[error("Graph '{graph}' has no output named '{name}'")]
    UnknownOutput { graph: String, name: String },

    #[error("Port index out of bounds: {what} (index={index}, len={len})")]
    PortIndexOob {
        what: &'static str,
        index: usize,
        len: usize,
    },

    #[error("Operator type '{type_name}' is already registered")]
    DuplicateOpType { type_name: String },

    #[error("Operator type '{type_name}' is not registered")]
    UnknownOpType { type_name: String },

    #[error("Cannot construct '{type_name}': {source}")]
    OpConstruction {
        type_name: String,
        #[source]
        source: OpError,
    },
}
