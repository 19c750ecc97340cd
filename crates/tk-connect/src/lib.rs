//! tk-connect: splice one graph's outputs into another graph's inputs.
//!
//! Provides:
//! - Port alignment by name, by index or by an explicit mapping
//! - `connect_models`, which builds a new composite graph from two borrowed ones
//! - Decoding heads (greedy arg-max) attached to a model's logits
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use tk_connect::add_greedy_decoding;
//! use tk_graph::ops::Convert;
//! use tk_graph::{ElementType, GraphBuilder, PartialShape, TensorDesc, ValueRef};
//!
//! let mut builder = GraphBuilder::new("lm");
//! let hidden = builder
//!     .add_parameter("hidden", TensorDesc::new(ElementType::F16, PartialShape::fixed(&[1, 7, 50])))
//!     .unwrap();
//! let logits = builder
//!     .add_op("upcast", Arc::new(Convert::new(ElementType::F32).unwrap()), [ValueRef::new(hidden, 0)])
//!     .unwrap();
//! builder.add_tensor_names(ValueRef::new(logits, 0), ["logits"]).unwrap();
//! builder.add_result(ValueRef::new(logits, 0)).unwrap();
//! let model = builder.build().unwrap();
//!
//! let decoded = add_greedy_decoding(&model, "logits").unwrap();
//! let token_ids = decoded.output("token_ids").unwrap();
//! assert_eq!(decoded.output_desc(&token_ids).to_string(), "i32[1,7]");
//! ```

pub mod connect;
pub mod decoding;
pub mod error;
pub mod names;

pub use connect::{
    AlignedPair, Alignment, ConnectOptions, PortMapping, connect_models, resolve_alignment,
};
pub use decoding::{DecodingType, ParseDecodingTypeError, add_greedy_decoding, greedy_decoding_graph};
pub use error::{ConnectError, ConnectResult};
pub use names::{GREEDY_DECODER_NAME, LOGITS_OUTPUT_NAME, TOKEN_IDS_OUTPUT_NAME};
