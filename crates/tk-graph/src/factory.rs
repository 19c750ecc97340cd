//! Operator factory: type name to constructor registry.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{GraphError, GraphResult};
use crate::ops::{Add, Attributes, Convert, OpResult, Operator, Squeeze, TopK, Unsqueeze};

/// Constructor stored in the factory.
pub type OpConstructor = Box<dyn Fn(&Attributes) -> OpResult<Arc<dyn Operator>> + Send + Sync>;

/// Wrap a typed constructor into a factory entry.
pub fn boxed<T: Operator + 'static>(ctor: fn(&Attributes) -> OpResult<T>) -> OpConstructor {
    Box::new(move |attrs: &Attributes| -> OpResult<Arc<dyn Operator>> {
        Ok(Arc::new(ctor(attrs)?) as Arc<dyn Operator>)
    })
}

/// Registry that makes operators constructible by type name.
#[derive(Default)]
pub struct OpFactory {
    constructors: BTreeMap<String, OpConstructor>,
}

impl fmt::Debug for OpFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpFactory")
            .field("types", &self.constructors.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl OpFactory {
    /// Empty factory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Factory with the built-in operators registered.
    pub fn with_builtins() -> Self {
        let mut factory = Self::new();
        factory.register_builtins();
        factory
    }

    fn register_builtins(&mut self) {
        let builtins: [(&str, OpConstructor); 5] = [
            (TopK::TYPE_NAME, boxed(TopK::from_attributes)),
            (Squeeze::TYPE_NAME, boxed(Squeeze::from_attributes)),
            (Unsqueeze::TYPE_NAME, boxed(Unsqueeze::from_attributes)),
            (Convert::TYPE_NAME, boxed(Convert::from_attributes)),
            (Add::TYPE_NAME, boxed(|_| Ok(Add))),
        ];
        for (name, ctor) in builtins {
            self.constructors.insert(name.to_string(), ctor);
        }
    }

    /// Register a constructor under `type_name`; fails if the name is taken.
    pub fn register<F>(&mut self, type_name: impl Into<String>, ctor: F) -> GraphResult<()>
    where
        F: Fn(&Attributes) -> OpResult<Arc<dyn Operator>> + Send + Sync + 'static,
    {
        let type_name = type_name.into();
        if self.constructors.contains_key(&type_name) {
            return Err(GraphError::DuplicateOpType { type_name });
        }
        tracing::debug!(op = %type_name, "registered operator type");
        self.constructors.insert(type_name, Box::new(ctor));
        Ok(())
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.constructors.contains_key(type_name)
    }

    /// Registered type names, sorted.
    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.constructors.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.constructors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constructors.is_empty()
    }

    /// Construct an operator of `type_name` from `attrs`.
    pub fn create(&self, type_name: &str, attrs: &Attributes) -> GraphResult<Arc<dyn Operator>> {
        let ctor = self
            .constructors
            .get(type_name)
            .ok_or_else(|| GraphError::UnknownOpType {
                type_name: type_name.to_string(),
            })?;
        ctor(attrs).map_err(|source| GraphError::OpConstruction {
            type_name: type_name.to_string(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::ElementType;
    use crate::shape::PartialShape;
    use crate::tensor::TensorDesc;

    #[test]
    fn builtins_are_registered() {
        let factory = OpFactory::with_builtins();
        let names: Vec<&str> = factory.type_names().collect();
        assert_eq!(names, vec!["Add", "Convert", "Squeeze", "TopK", "Unsqueeze"]);
    }

    #[test]
    fn create_from_attributes() {
        let factory = OpFactory::with_builtins();
        let attrs = Attributes::new().with("k", 1_i64).with("axis", -1_i64);
        let op = factory.create("TopK", &attrs).unwrap();
        assert_eq!(op.type_name(), "TopK");
        assert_eq!(op.output_count(), 2);

        let input = TensorDesc::new(ElementType::F32, PartialShape::fixed(&[1, 4]));
        let out = op.infer(&[input]).unwrap();
        assert_eq!(out[1].shape, PartialShape::fixed(&[1, 1]));
    }

    #[test]
    fn unknown_and_duplicate_types() {
        let mut factory = OpFactory::with_builtins();
        assert!(matches!(
            factory.create("Softmax", &Attributes::new()),
            Err(GraphError::UnknownOpType { .. })
        ));
        let err = factory
            .register("Add", |_| Ok(Arc::new(Add) as Arc<dyn Operator>))
            .unwrap_err();
        assert_eq!(
            err,
            GraphError::DuplicateOpType {
                type_name: "Add".into()
            }
        );
        assert!(matches!(
            factory.create("Convert", &Attributes::new()),
            Err(GraphError::OpConstruction { .. })
        ));
    }
}
