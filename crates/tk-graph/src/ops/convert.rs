use crate::element::ElementType;
use crate::tensor::TensorDesc;

use super::{Attributes, OpError, OpResult, Operator, expect_inputs};

/// Element-type cast; the shape passes through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Convert {
    pub destination: ElementType,
}

impl Convert {
    pub const TYPE_NAME: &'static str = "Convert";

    pub fn new(destination: ElementType) -> OpResult<Self> {
        if destination.is_dynamic() {
            return Err(OpError::Attribute {
                name: "destination_type".into(),
                what: "must be a static element type".into(),
            });
        }
        Ok(Self { destination })
    }

    pub fn from_attributes(attrs: &Attributes) -> OpResult<Self> {
        Self::new(attrs.get_element("destination_type")?)
    }
}

impl Operator for Convert {
    fn type_name(&self) -> &str {
        Self::TYPE_NAME
    }

    fn attributes(&self) -> Attributes {
        Attributes::new().with("destination_type", self.destination)
    }

    fn infer(&self, inputs: &[TensorDesc]) -> OpResult<Vec<TensorDesc>> {
        expect_inputs(inputs, 1)?;
        Ok(vec![TensorDesc::new(
            self.destination,
            inputs[0].shape.clone(),
        )])
    }
}
