use std::collections::BTreeSet;

use crate::shape::{Dimension, PartialShape, normalize_axis};
use crate::tensor::TensorDesc;

use super::{Attributes, OpError, OpResult, Operator, expect_inputs};

fn resolve_axes(axes: &[i64], rank: usize) -> OpResult<BTreeSet<usize>> {
    axes.iter()
        .map(|&axis| {
            normalize_axis(axis, rank).ok_or_else(|| OpError::Dimension {
                input: 0,
                axis,
                what: format!("out of range for rank {rank}"),
            })
        })
        .collect()
}

/// Remove size-1 axes.
///
/// With no axes every static size-1 axis is removed; a dynamic dimension then
/// makes the output rank unknown. A dynamic dimension named in `axes` is
/// assumed to be 1.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Squeeze {
    pub axes: Vec<i64>,
}

impl Squeeze {
    pub const TYPE_NAME: &'static str = "Squeeze";

    pub fn new(axes: impl Into<Vec<i64>>) -> Self {
        Self { axes: axes.into() }
    }

    pub fn from_attributes(attrs: &Attributes) -> OpResult<Self> {
        Ok(Self::new(attrs.get_ints_or("axes", Vec::new())?))
    }
}

impl Operator for Squeeze {
    fn type_name(&self) -> &str {
        Self::TYPE_NAME
    }

    fn attributes(&self) -> Attributes {
        Attributes::new().with("axes", self.axes.clone())
    }

    fn infer(&self, inputs: &[TensorDesc]) -> OpResult<Vec<TensorDesc>> {
        expect_inputs(inputs, 1)?;
        let input = &inputs[0];
        let Some(dims) = input.shape.dims() else {
            return Ok(vec![TensorDesc::new(
                input.element_type,
                PartialShape::dynamic(),
            )]);
        };

        let shape = if self.axes.is_empty() {
            if dims.iter().any(|d| d.is_dynamic()) {
                PartialShape::dynamic()
            } else {
                PartialShape::new(dims.iter().copied().filter(|d| *d != Dimension::Static(1)))
            }
        } else {
            let axes = resolve_axes(&self.axes, dims.len())?;
            for &axis in &axes {
                if let Dimension::Static(n) = dims[axis]
                    && n != 1
                {
                    return Err(OpError::Dimension {
                        input: 0,
                        axis: axis as i64,
                        what: format!("cannot squeeze dimension of size {n}"),
                    });
                }
            }
            PartialShape::new(
                dims.iter()
                    .enumerate()
                    .filter(|(i, _)| !axes.contains(i))
                    .map(|(_, d)| *d),
            )
        };

        Ok(vec![TensorDesc::new(input.element_type, shape)])
    }
}

/// Insert size-1 axes at the given output positions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unsqueeze {
    pub axes: Vec<i64>,
}

impl Unsqueeze {
    pub const TYPE_NAME: &'static str = "Unsqueeze";

    pub fn new(axes: impl Into<Vec<i64>>) -> Self {
        Self { axes: axes.into() }
    }

    pub fn from_attributes(attrs: &Attributes) -> OpResult<Self> {
        Ok(Self::new(attrs.get_ints("axes")?))
    }
}

impl Operator for Unsqueeze {
    fn type_name(&self) -> &str {
        Self::TYPE_NAME
    }

    fn attributes(&self) -> Attributes {
        Attributes::new().with("axes", self.axes.clone())
    }

    fn infer(&self, inputs: &[TensorDesc]) -> OpResult<Vec<TensorDesc>> {
        expect_inputs(inputs, 1)?;
        let input = &inputs[0];
        let Some(dims) = input.shape.dims() else {
            return Ok(vec![TensorDesc::new(
                input.element_type,
                PartialShape::dynamic(),
            )]);
        };

        let out_rank = dims.len() + self.axes.len();
        let axes = resolve_axes(&self.axes, out_rank)?;
        if axes.len() != self.axes.len() {
            return Err(OpError::Attribute {
                name: "axes".into(),
                what: "repeated axis".into(),
            });
        }
        let mut rest = dims.iter().copied();
        let shape = PartialShape::new((0..out_rank).map(|i| {
            if axes.contains(&i) {
                Dimension::Static(1)
            } else {
                rest.next().unwrap_or_default()
            }
        }));

        Ok(vec![TensorDesc::new(input.element_type, shape)])
    }
}
