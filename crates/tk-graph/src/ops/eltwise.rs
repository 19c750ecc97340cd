use crate::element::ElementType;
use crate::tensor::TensorDesc;

use super::{OpError, OpResult, Operator, expect_element, expect_inputs};

/// Elementwise addition with numpy broadcasting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Add;

impl Add {
    pub const TYPE_NAME: &'static str = "Add";
}

impl Operator for Add {
    fn type_name(&self) -> &str {
        Self::TYPE_NAME
    }

    fn infer(&self, inputs: &[TensorDesc]) -> OpResult<Vec<TensorDesc>> {
        expect_inputs(inputs, 2)?;
        let lhs = expect_element(inputs, 0, "numeric", ElementType::is_numeric)?;
        let rhs = expect_element(inputs, 1, "numeric", ElementType::is_numeric)?;
        let element_type = lhs.merge(rhs).ok_or(OpError::ElementType {
            input: 1,
            expected: "the same element type as input 0",
            actual: rhs,
        })?;
        let shape = inputs[0]
            .shape
            .broadcast(&inputs[1].shape)
            .ok_or_else(|| OpError::Broadcast {
                lhs: inputs[0].shape.clone(),
                rhs: inputs[1].shape.clone(),
            })?;
        Ok(vec![TensorDesc::new(element_type, shape)])
    }
}
