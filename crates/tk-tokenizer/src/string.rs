//! String tensor operators.
//!
//! Strings travel between these operators in decomposed form: three tensors
//! holding per-element `begins` and `ends` offsets (both `i32`, same shape)
//! and a flat `u8` symbol buffer.

use tk_graph::ops::{expect_element, expect_inputs, expect_rank};
use tk_graph::{Attributes, ElementType, OpError, OpResult, Operator, PartialShape, TensorDesc};

/// Only supported packing mode.
pub const BEGINS_ENDS: &str = "begins_ends";

/// Unicode normalization forms accepted by `NormalizeUnicode`.
pub const NORMALIZATION_FORMS: [&str; 4] = ["NFC", "NFD", "NFKC", "NFKD"];

/// Check that inputs `first..first + 3` form a decomposed string and return
/// the begins shape.
pub fn check_decomposed(inputs: &[TensorDesc], first: usize) -> OpResult<PartialShape> {
    expect_element(inputs, first, "i32 begins", |t| t == ElementType::I32)?;
    expect_element(inputs, first + 1, "i32 ends", |t| t == ElementType::I32)?;
    expect_element(inputs, first + 2, "u8 symbols", |t| t == ElementType::U8)?;
    Ok(inputs[first].shape.clone())
}

/// Output descriptors of a decomposed string with the given element shape.
pub fn decomposed_output(shape: PartialShape) -> Vec<TensorDesc> {
    vec![
        TensorDesc::new(ElementType::I32, shape.clone()),
        TensorDesc::new(ElementType::I32, shape),
        TensorDesc::new(ElementType::U8, PartialShape::with_rank(1)),
    ]
}

fn check_mode(attrs: &Attributes) -> OpResult<String> {
    let mode = attrs.get_str_or("mode", BEGINS_ENDS.into())?;
    if mode != BEGINS_ENDS {
        return Err(OpError::Attribute {
            name: "mode".into(),
            what: format!("only '{BEGINS_ENDS}' is supported, got '{mode}'"),
        });
    }
    Ok(mode)
}

/// Packs a decomposed string into a single `u8` buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringTensorPack {
    pub mode: String,
}

impl Default for StringTensorPack {
    fn default() -> Self {
        Self {
            mode: BEGINS_ENDS.into(),
        }
    }
}

impl StringTensorPack {
    pub const TYPE_NAME: &'static str = "StringTensorPack";

    pub fn from_attributes(attrs: &Attributes) -> OpResult<Self> {
        Ok(Self {
            mode: check_mode(attrs)?,
        })
    }
}

impl Operator for StringTensorPack {
    fn type_name(&self) -> &str {
        Self::TYPE_NAME
    }

    fn attributes(&self) -> Attributes {
        Attributes::new().with("mode", self.mode.as_str())
    }

    fn infer(&self, inputs: &[TensorDesc]) -> OpResult<Vec<TensorDesc>> {
        expect_inputs(inputs, 3)?;
        check_decomposed(inputs, 0)?;
        Ok(vec![TensorDesc::new(
            ElementType::U8,
            PartialShape::with_rank(1),
        )])
    }
}

/// Splits a string tensor into its decomposed form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringTensorUnpack {
    pub mode: String,
}

impl Default for StringTensorUnpack {
    fn default() -> Self {
        Self {
            mode: BEGINS_ENDS.into(),
        }
    }
}

impl StringTensorUnpack {
    pub const TYPE_NAME: &'static str = "StringTensorUnpack";

    pub fn from_attributes(attrs: &Attributes) -> OpResult<Self> {
        Ok(Self {
            mode: check_mode(attrs)?,
        })
    }
}

impl Operator for StringTensorUnpack {
    fn type_name(&self) -> &str {
        Self::TYPE_NAME
    }

    fn output_count(&self) -> usize {
        3
    }

    fn attributes(&self) -> Attributes {
        Attributes::new().with("mode", self.mode.as_str())
    }

    fn infer(&self, inputs: &[TensorDesc]) -> OpResult<Vec<TensorDesc>> {
        expect_inputs(inputs, 1)?;
        let shape = &inputs[0].shape;
        if shape.is_rank_dynamic() {
            return Err(OpError::Rank {
                input: 0,
                expected: "static rank".into(),
                actual: shape.clone(),
            });
        }
        Ok(decomposed_output(shape.clone()))
    }
}

/// Unicode case folding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CaseFold;

impl CaseFold {
    pub const TYPE_NAME: &'static str = "CaseFold";
}

impl Operator for CaseFold {
    fn type_name(&self) -> &str {
        Self::TYPE_NAME
    }

    fn output_count(&self) -> usize {
        3
    }

    fn infer(&self, inputs: &[TensorDesc]) -> OpResult<Vec<TensorDesc>> {
        expect_inputs(inputs, 3)?;
        Ok(decomposed_output(check_decomposed(inputs, 0)?))
    }
}

/// Unicode normalization to one of [`NORMALIZATION_FORMS`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizeUnicode {
    pub normalization_form: String,
}

impl NormalizeUnicode {
    pub const TYPE_NAME: &'static str = "NormalizeUnicode";

    pub fn new(normalization_form: impl Into<String>) -> OpResult<Self> {
        let normalization_form = normalization_form.into();
        if !NORMALIZATION_FORMS.contains(&normalization_form.as_str()) {
            return Err(OpError::Attribute {
                name: "normalization_form".into(),
                what: format!("unsupported form '{normalization_form}'"),
            });
        }
        Ok(Self { normalization_form })
    }

    pub fn from_attributes(attrs: &Attributes) -> OpResult<Self> {
        Self::new(attrs.get_str("normalization_form")?)
    }
}

impl Operator for NormalizeUnicode {
    fn type_name(&self) -> &str {
        Self::TYPE_NAME
    }

    fn output_count(&self) -> usize {
        3
    }

    fn attributes(&self) -> Attributes {
        Attributes::new().with("normalization_form", self.normalization_form.as_str())
    }

    fn infer(&self, inputs: &[TensorDesc]) -> OpResult<Vec<TensorDesc>> {
        expect_inputs(inputs, 3)?;
        Ok(decomposed_output(check_decomposed(inputs, 0)?))
    }
}

/// Regex search-and-replace over a decomposed string.
///
/// Inputs 3 and 4 carry the pattern and the replacement as `u8` buffers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegexNormalization;

impl RegexNormalization {
    pub const TYPE_NAME: &'static str = "RegexNormalization";
}

impl Operator for RegexNormalization {
    fn type_name(&self) -> &str {
        Self::TYPE_NAME
    }

    fn output_count(&self) -> usize {
        3
    }

    fn infer(&self, inputs: &[TensorDesc]) -> OpResult<Vec<TensorDesc>> {
        expect_inputs(inputs, 5)?;
        let shape = check_decomposed(inputs, 0)?;
        for index in [3, 4] {
            expect_element(inputs, index, "u8 string scalar", |t| t == ElementType::U8)?;
            expect_rank(inputs, index, 1)?;
        }
        Ok(decomposed_output(shape))
    }
}
