//! Decoding heads attached to a model's logits output.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use tk_graph::ops::{Squeeze, TopK};
use tk_graph::{ElementType, Graph, GraphBuilder, PartialShape, TensorDesc, ValueRef};

use crate::connect::{Alignment, ConnectOptions, PortMapping, connect_models};
use crate::error::ConnectResult;
use crate::names::{GREEDY_DECODER_NAME, LOGITS_OUTPUT_NAME, TOKEN_IDS_OUTPUT_NAME};

/// Supported decoding strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DecodingType {
    #[default]
    Greedy,
}

impl DecodingType {
    pub const ALL: [DecodingType; 1] = [DecodingType::Greedy];

    pub fn as_str(self) -> &'static str {
        match self {
            DecodingType::Greedy => "greedy",
        }
    }

    /// Standalone decoder graph taking `logits` and producing `token_ids`.
    pub fn decoder_graph(self) -> ConnectResult<Graph> {
        match self {
            DecodingType::Greedy => greedy_decoding_graph(),
        }
    }

    /// Attach this decoder to `model`'s output named `logits_output`.
    pub fn attach(self, model: &Graph, logits_output: &str) -> ConnectResult<Graph> {
        match self {
            DecodingType::Greedy => add_greedy_decoding(model, logits_output),
        }
    }
}

impl fmt::Display for DecodingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown decoding type name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown decoding type: {0}")]
pub struct ParseDecodingTypeError(pub String);

impl FromStr for DecodingType {
    type Err = ParseDecodingTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ParseDecodingTypeError(s.to_string()))
    }
}

/// Graph computing the arg-max token id at every position.
///
/// `logits` has rank 3 with dynamic dimensions and element type; `token_ids`
/// drops the last axis and is `i32`.
pub fn greedy_decoding_graph() -> ConnectResult<Graph> {
    let mut builder = GraphBuilder::new(GREEDY_DECODER_NAME);
    let logits = builder.add_parameter(
        LOGITS_OUTPUT_NAME,
        TensorDesc::new(ElementType::Dynamic, PartialShape::with_rank(3)),
    )?;
    let argmax = builder.add_op("ArgMax", Arc::new(TopK::argmax()), [ValueRef::new(logits, 0)])?;
    let squeeze = builder.add_op(
        "ArgMax/squeeze",
        Arc::new(Squeeze::new([-1])),
        [ValueRef::new(argmax, 1)],
    )?;

    let token_ids = ValueRef::new(squeeze, 0);
    builder.add_tensor_names(token_ids, [TOKEN_IDS_OUTPUT_NAME])?;
    builder.add_result(token_ids)?;
    Ok(builder.build()?)
}

/// Append greedy decoding to `model`, fed by its output named `logits_output`.
///
/// The model's other outputs and any unfed decoder inputs stay exposed.
pub fn add_greedy_decoding(model: &Graph, logits_output: &str) -> ConnectResult<Graph> {
    let decoder = greedy_decoding_graph()?;
    let options = ConnectOptions {
        alignment: Alignment::Explicit(PortMapping::from_pairs([(
            logits_output,
            LOGITS_OUTPUT_NAME,
        )])),
        keep_unaligned_second_inputs: true,
        keep_unaligned_first_outputs: true,
    };
    connect_models(model, &decoder, &options)
}
