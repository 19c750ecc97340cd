use tk_graph::ops::{expect_element, expect_inputs};
use tk_graph::{
    Attributes, Dimension, ElementType, OpError, OpResult, Operator, PartialShape, TensorDesc,
};

/// SentencePiece tokenization of a batch of packed sentences.
///
/// Inputs: `0` serialized model (`u8`), `1` packed sentences (`u8` or string).
/// Outputs form a sparse tensor: `0` indices `i64 [?,2]`, `1` token ids
/// `i32 [?]`, `2` dense shape `i64 [2]`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SentencepieceTokenizer {
    pub nbest_size: i64,
    pub alpha: f64,
    pub add_bos: bool,
    pub add_eos: bool,
    pub reverse: bool,
}

impl SentencepieceTokenizer {
    pub const TYPE_NAME: &'static str = "SentencepieceTokenizer";

    pub fn from_attributes(attrs: &Attributes) -> OpResult<Self> {
        let alpha = attrs.get_float_or("alpha", 0.0)?;
        if !alpha.is_finite() {
            return Err(OpError::Attribute {
                name: "alpha".into(),
                what: format!("must be finite, got {alpha}"),
            });
        }
        Ok(Self {
            nbest_size: attrs.get_int_or("nbest_size", 0)?,
            alpha,
            add_bos: attrs.get_bool_or("add_bos", false)?,
            add_eos: attrs.get_bool_or("add_eos", false)?,
            reverse: attrs.get_bool_or("reverse", false)?,
        })
    }
}

impl Operator for SentencepieceTokenizer {
    fn type_name(&self) -> &str {
        Self::TYPE_NAME
    }

    fn output_count(&self) -> usize {
        3
    }

    fn attributes(&self) -> Attributes {
        Attributes::new()
            .with("nbest_size", self.nbest_size)
            .with("alpha", self.alpha)
            .with("add_bos", self.add_bos)
            .with("add_eos", self.add_eos)
            .with("reverse", self.reverse)
    }

    fn infer(&self, inputs: &[TensorDesc]) -> OpResult<Vec<TensorDesc>> {
        expect_inputs(inputs, 2)?;
        expect_element(inputs, 0, "u8 model", |t| t == ElementType::U8)?;
        expect_element(inputs, 1, "u8 or string sentences", |t| {
            matches!(t, ElementType::U8 | ElementType::String)
        })?;
        Ok(vec![
            TensorDesc::new(
                ElementType::I64,
                PartialShape::new([Dimension::Dynamic, Dimension::Static(2)]),
            ),
            TensorDesc::new(ElementType::I32, PartialShape::with_rank(1)),
            TensorDesc::new(ElementType::I64, PartialShape::fixed(&[2])),
        ])
    }
}
