use crate::element::ElementType;
use crate::shape::{Dimension, PartialShape, normalize_axis};
use crate::tensor::TensorDesc;

use super::{Attributes, OpError, OpResult, Operator, expect_element, expect_inputs};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopKMode {
    Max,
    Min,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopKSort {
    None,
    Value,
    Index,
}

impl TopKMode {
    fn as_str(self) -> &'static str {
        match self {
            TopKMode::Max => "max",
            TopKMode::Min => "min",
        }
    }
}

impl TopKSort {
    fn as_str(self) -> &'static str {
        match self {
            TopKSort::None => "none",
            TopKSort::Value => "value",
            TopKSort::Index => "index",
        }
    }
}

/// Top-k selection along one axis.
///
/// Outputs: `0` values (input element type), `1` indices (`index_type`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopK {
    pub k: u64,
    pub axis: i64,
    pub mode: TopKMode,
    pub sort: TopKSort,
    pub index_type: ElementType,
}

impl TopK {
    pub const TYPE_NAME: &'static str = "TopK";

    /// Top-1 maximum along the last axis with `i32` indices.
    pub fn argmax() -> Self {
        Self {
            k: 1,
            axis: -1,
            mode: TopKMode::Max,
            sort: TopKSort::None,
            index_type: ElementType::I32,
        }
    }

    pub fn from_attributes(attrs: &Attributes) -> OpResult<Self> {
        let k = attrs.get_int("k")?;
        if k <= 0 {
            return Err(OpError::Attribute {
                name: "k".into(),
                what: format!("must be positive, got {k}"),
            });
        }
        let mode = match attrs.get_str_or("mode", "max".into())?.as_str() {
            "max" => TopKMode::Max,
            "min" => TopKMode::Min,
            other => {
                return Err(OpError::Attribute {
                    name: "mode".into(),
                    what: format!("unsupported value '{other}'"),
                });
            }
        };
        let sort = match attrs.get_str_or("sort", "none".into())?.as_str() {
            "none" => TopKSort::None,
            "value" => TopKSort::Value,
            "index" => TopKSort::Index,
            other => {
                return Err(OpError::Attribute {
                    name: "sort".into(),
                    what: format!("unsupported value '{other}'"),
                });
            }
        };
        let index_type = attrs.get_element_or("index_element_type", ElementType::I32)?;
        if !matches!(index_type, ElementType::I32 | ElementType::I64) {
            return Err(OpError::Attribute {
                name: "index_element_type".into(),
                what: format!("must be i32 or i64, got {index_type}"),
            });
        }
        Ok(Self {
            k: k as u64,
            axis: attrs.get_int_or("axis", -1)?,
            mode,
            sort,
            index_type,
        })
    }
}

impl Operator for TopK {
    fn type_name(&self) -> &str {
        Self::TYPE_NAME
    }

    fn output_count(&self) -> usize {
        2
    }

    fn attributes(&self) -> Attributes {
        Attributes::new()
            .with("k", self.k as i64)
            .with("axis", self.axis)
            .with("mode", self.mode.as_str())
            .with("sort", self.sort.as_str())
            .with("index_element_type", self.index_type)
    }

    fn infer(&self, inputs: &[TensorDesc]) -> OpResult<Vec<TensorDesc>> {
        expect_inputs(inputs, 1)?;
        let element_type = expect_element(inputs, 0, "numeric", ElementType::is_numeric)?;

        let shape = match inputs[0].shape.dims() {
            None => PartialShape::dynamic(),
            Some(dims) => {
                let axis = normalize_axis(self.axis, dims.len()).ok_or_else(|| {
                    OpError::Dimension {
                        input: 0,
                        axis: self.axis,
                        what: format!("out of range for rank {}", dims.len()),
                    }
                })?;
                let mut out = dims.to_vec();
                out[axis] = match dims[axis] {
                    Dimension::Static(n) => Dimension::Static(n.min(self.k)),
                    Dimension::Dynamic => Dimension::Dynamic,
                };
                PartialShape::new(out)
            }
        };

        Ok(vec![
            TensorDesc::new(element_type, shape.clone()),
            TensorDesc::new(self.index_type, shape),
        ])
    }
}
