//! tk-graph: computation-graph object model for tokwire.
//!
//! Provides:
//! - Tensor descriptors (element types, partial shapes)
//! - Core graph data structures (Node, Graph, ports and value references)
//! - Incremental graph builder with pruning, validation and type inference
//! - Built-in operators and the operator factory
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use tk_graph::{ElementType, GraphBuilder, PartialShape, TensorDesc, ValueRef};
//! use tk_graph::ops::Convert;
//!
//! let mut builder = GraphBuilder::new("cast");
//! let ids = builder
//!     .add_parameter("ids", TensorDesc::new(ElementType::I32, PartialShape::with_rank(2)))
//!     .unwrap();
//! let cast = builder
//!     .add_op("cast", Arc::new(Convert::new(ElementType::I64).unwrap()), [ValueRef::new(ids, 0)])
//!     .unwrap();
//! builder.add_tensor_names(ValueRef::new(cast, 0), ["ids_i64"]).unwrap();
//! builder.add_result(ValueRef::new(cast, 0)).unwrap();
//! let graph = builder.build().unwrap();
//!
//! let out = graph.output("ids_i64").unwrap();
//! assert_eq!(graph.output_desc(&out).element_type, ElementType::I64);
//! ```

pub mod builder;
pub mod element;
pub mod error;
pub mod factory;
pub mod graph;
pub(crate) mod infer;
pub mod ops;
pub mod shape;
pub mod tensor;
pub(crate) mod validate;

// Re-exports for ergonomics
pub use builder::{GraphBuilder, NodeRemap};
pub use element::ElementType;
pub use error::{GraphError, GraphResult};
pub use factory::{OpConstructor, OpFactory, boxed};
pub use graph::{Consumer, Graph, InputPort, Node, NodeKind, OutputPort, ValueRef};
pub use ops::{AttrValue, Attributes, OpError, OpResult, Operator};
pub use shape::{Dimension, PartialShape, normalize_axis};
pub use tensor::{TensorDesc, TensorInfo};
pub use tk_core::NodeId;
