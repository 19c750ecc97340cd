//! Tensor descriptors attached to node outputs.

use std::collections::BTreeSet;
use std::fmt;

use crate::element::ElementType;
use crate::shape::PartialShape;

/// Element type plus partial shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TensorDesc {
    pub element_type: ElementType,
    pub shape: PartialShape,
}

impl TensorDesc {
    pub fn new(element_type: ElementType, shape: PartialShape) -> Self {
        Self {
            element_type,
            shape,
        }
    }

    /// Fully unknown descriptor.
    pub fn dynamic() -> Self {
        Self::default()
    }

    pub fn compatible(&self, other: &TensorDesc) -> bool {
        self.element_type.compatible(other.element_type) && self.shape.compatible(&other.shape)
    }

    pub fn merge(&self, other: &TensorDesc) -> Option<TensorDesc> {
        Some(TensorDesc {
            element_type: self.element_type.merge(other.element_type)?,
            shape: self.shape.merge(&other.shape)?,
        })
    }
}

impl fmt::Display for TensorDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.element_type, self.shape)
    }
}

/// A produced tensor: its descriptor and the set of names it answers to.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TensorInfo {
    pub desc: TensorDesc,
    pub names: BTreeSet<String>,
}

impl TensorInfo {
    pub fn new(desc: TensorDesc) -> Self {
        Self {
            desc,
            names: BTreeSet::new(),
        }
    }

    /// Lexicographically smallest alias.
    pub fn any_name(&self) -> Option<&str> {
        self.names.iter().next().map(String::as_str)
    }

    pub fn has_name(&self, name: &str) -> bool {
        self.names.contains(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn any_name_is_smallest_alias() {
        let mut info = TensorInfo::new(TensorDesc::dynamic());
        assert_eq!(info.any_name(), None);
        info.names.insert("logits".into());
        info.names.insert("Identity:0".into());
        assert_eq!(info.any_name(), Some("Identity:0"));
        assert!(info.has_name("logits"));
    }

    #[test]
    fn desc_display_and_merge() {
        let a = TensorDesc::new(ElementType::Dynamic, PartialShape::with_rank(2));
        let b = TensorDesc::new(ElementType::F32, PartialShape::fixed(&[1, 4]));
        assert_eq!(b.to_string(), "f32[1,4]");
        assert!(a.compatible(&b));
        assert_eq!(a.merge(&b), Some(b.clone()));
        let c = TensorDesc::new(ElementType::I32, PartialShape::fixed(&[1, 4]));
        assert!(!b.compatible(&c));
        assert_eq!(b.merge(&c), None);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn desc_serde_json() {
        let desc = TensorDesc::new(
            ElementType::I64,
            PartialShape::new([crate::Dimension::Dynamic, 2.into()]),
        );
        let text = serde_json::to_string(&desc).unwrap();
        let back: TensorDesc = serde_json::from_str(&text).unwrap();
        assert_eq!(back, desc);
    }
}
