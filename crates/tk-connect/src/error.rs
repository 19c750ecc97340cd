//! Error types for graph connection.

use thiserror::Error;
use tk_graph::{GraphError, TensorDesc};

pub type ConnectResult<T> = Result<T, ConnectError>;

/// Errors raised while aligning and splicing two graphs.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectError {
    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error("Graph '{graph}' has no output named '{name}'")]
    UnknownOutput { graph: String, name: String },

    #[error("Graph '{graph}' has no input named '{name}'")]
    UnknownInput { graph: String, name: String },

    /// Two alignment pairs target the same input of the second graph.
    #[error("Input '{name}' is aligned more than once")]
    DuplicateInput { name: String },

    /// A mapping listed the same output name twice.
    #[error("Output '{key}' appears more than once in the port mapping")]
    DuplicateKey { key: String },

    #[error("Cannot connect output '{output}' ({produced}) to input '{input}' ({expected})")]
    SpliceMismatch {
        output: String,
        input: String,
        produced: TensorDesc,
        expected: TensorDesc,
    },
}
