use std::collections::BTreeMap;

use crate::element::ElementType;

use super::{OpError, OpResult};

/// One attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Ints(Vec<i64>),
    Element(ElementType),
}

impl AttrValue {
    fn kind(&self) -> &'static str {
        match self {
            AttrValue::Bool(_) => "bool",
            AttrValue::Int(_) => "int",
            AttrValue::Float(_) => "float",
            AttrValue::Str(_) => "string",
            AttrValue::Ints(_) => "int list",
            AttrValue::Element(_) => "element type",
        }
    }
}

impl From<bool> for AttrValue {
    fn from(v: bool) -> Self {
        AttrValue::Bool(v)
    }
}

impl From<i64> for AttrValue {
    fn from(v: i64) -> Self {
        AttrValue::Int(v)
    }
}

impl From<f64> for AttrValue {
    fn from(v: f64) -> Self {
        AttrValue::Float(v)
    }
}

impl From<&str> for AttrValue {
    fn from(v: &str) -> Self {
        AttrValue::Str(v.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(v: String) -> Self {
        AttrValue::Str(v)
    }
}

impl From<Vec<i64>> for AttrValue {
    fn from(v: Vec<i64>) -> Self {
        AttrValue::Ints(v)
    }
}

impl From<ElementType> for AttrValue {
    fn from(v: ElementType) -> Self {
        AttrValue::Element(v)
    }
}

/// Named operator attributes, ordered by name.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Attributes {
    values: BTreeMap<String, AttrValue>,
}

macro_rules! typed_getter {
    ($get:ident, $get_or:ident, $variant:ident, $ty:ty, $expected:literal) => {
        pub fn $get(&self, name: &str) -> OpResult<$ty> {
            match self.values.get(name) {
                Some(AttrValue::$variant(v)) => Ok(v.clone()),
                Some(other) => Err(mismatch(name, $expected, other)),
                None => Err(OpError::Attribute {
                    name: name.to_string(),
                    what: "missing".to_string(),
                }),
            }
        }

        pub fn $get_or(&self, name: &str, default: $ty) -> OpResult<$ty> {
            if self.values.contains_key(name) {
                self.$get(name)
            } else {
                Ok(default)
            }
        }
    };
}

fn mismatch(name: &str, expected: &str, actual: &AttrValue) -> OpError {
    OpError::Attribute {
        name: name.to_string(),
        what: format!("expected {expected}, got {}", actual.kind()),
    }
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<AttrValue>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&AttrValue> {
        self.values.get(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttrValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    typed_getter!(get_bool, get_bool_or, Bool, bool, "bool");
    typed_getter!(get_int, get_int_or, Int, i64, "int");
    typed_getter!(get_str, get_str_or, Str, String, "string");
    typed_getter!(get_ints, get_ints_or, Ints, Vec<i64>, "int list");
    typed_getter!(get_element, get_element_or, Element, ElementType, "element type");

    /// Floats also accept integer values.
    pub fn get_float_or(&self, name: &str, default: f64) -> OpResult<f64> {
        match self.values.get(name) {
            Some(AttrValue::Float(v)) => Ok(*v),
            Some(AttrValue::Int(v)) => Ok(*v as f64),
            Some(other) => Err(mismatch(name, "float", other)),
            None => Ok(default),
        }
    }
}
