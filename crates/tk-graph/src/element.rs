//! Tensor element types.

use std::fmt;
use std::str::FromStr;

/// Scalar element type carried by a tensor.
///
/// `Dynamic` is an unresolved type: it is compatible with every other type and
/// is replaced by the static one when two descriptors are merged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ElementType {
    #[default]
    Dynamic,
    Boolean,
    F16,
    F32,
    F64,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    String,
}

impl ElementType {
    pub const ALL: [ElementType; 14] = [
        ElementType::Dynamic,
        ElementType::Boolean,
        ElementType::F16,
        ElementType::F32,
        ElementType::F64,
        ElementType::I8,
        ElementType::I16,
        ElementType::I32,
        ElementType::I64,
        ElementType::U8,
        ElementType::U16,
        ElementType::U32,
        ElementType::U64,
        ElementType::String,
    ];

    pub fn is_dynamic(self) -> bool {
        self == ElementType::Dynamic
    }

    pub fn is_static(self) -> bool {
        !self.is_dynamic()
    }

    pub fn is_integer(self) -> bool {
        matches!(
            self,
            ElementType::I8
                | ElementType::I16
                | ElementType::I32
                | ElementType::I64
                | ElementType::U8
                | ElementType::U16
                | ElementType::U32
                | ElementType::U64
        )
    }

    pub fn is_float(self) -> bool {
        matches!(self, ElementType::F16 | ElementType::F32 | ElementType::F64)
    }

    /// Integer or floating point.
    pub fn is_numeric(self) -> bool {
        self.is_integer() || self.is_float()
    }

    /// Storage size in bytes; `None` for dynamic and string types.
    pub fn size_in_bytes(self) -> Option<usize> {
        match self {
            ElementType::Boolean | ElementType::I8 | ElementType::U8 => Some(1),
            ElementType::F16 | ElementType::I16 | ElementType::U16 => Some(2),
            ElementType::F32 | ElementType::I32 | ElementType::U32 => Some(4),
            ElementType::F64 | ElementType::I64 | ElementType::U64 => Some(8),
            ElementType::Dynamic | ElementType::String => None,
        }
    }

    /// Two types are compatible when equal or when either one is dynamic.
    pub fn compatible(self, other: ElementType) -> bool {
        self == other || self.is_dynamic() || other.is_dynamic()
    }

    /// Merge two compatible types, preferring the static one.
    pub fn merge(self, other: ElementType) -> Option<ElementType> {
        match (self, other) {
            (ElementType::Dynamic, t) | (t, ElementType::Dynamic) => Some(t),
            (a, b) if a == b => Some(a),
            _ => None,
        }
    }

    /// Short lowercase name (`"f32"`, `"i64"`, `"dynamic"`).
    pub fn as_str(self) -> &'static str {
        match self {
            ElementType::Dynamic => "dynamic",
            ElementType::Boolean => "boolean",
            ElementType::F16 => "f16",
            ElementType::F32 => "f32",
            ElementType::F64 => "f64",
            ElementType::I8 => "i8",
            ElementType::I16 => "i16",
            ElementType::I32 => "i32",
            ElementType::I64 => "i64",
            ElementType::U8 => "u8",
            ElementType::U16 => "u16",
            ElementType::U32 => "u32",
            ElementType::U64 => "u64",
            ElementType::String => "string",
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown element type name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown element type: {0}")]
pub struct ParseElementTypeError(pub String);

impl FromStr for ElementType {
    type Err = ParseElementTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ElementType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .or(match s {
                "bool" => Some(ElementType::Boolean),
                "?" => Some(ElementType::Dynamic),
                _ => None,
            })
            .ok_or_else(|| ParseElementTypeError(s.to_string()))
    }
}
