//! tk-tokenizer: type-inference schemas for the tokenizer extension operators.
//!
//! The native extension library provides the kernels for these operators.
//! This crate describes their inputs, outputs and attributes so graphs that
//! use them can be built and validated without loading the library.
//!
//! # Example
//!
//! ```
//! use tk_graph::{Attributes, OpFactory};
//!
//! let mut factory = OpFactory::with_builtins();
//! tk_tokenizer::register_tokenizer_ops(&mut factory).unwrap();
//! let op = factory
//!     .create("NormalizeUnicode", &Attributes::new().with("normalization_form", "NFKC"))
//!     .unwrap();
//! assert_eq!(op.output_count(), 3);
//! ```

pub mod sentencepiece;
pub mod string;

use tk_graph::{GraphResult, OpFactory, boxed};

pub use sentencepiece::SentencepieceTokenizer;
pub use string::{
    CaseFold, NormalizeUnicode, RegexNormalization, StringTensorPack, StringTensorUnpack,
};

/// Type names registered by [`register_tokenizer_ops`].
pub const TOKENIZER_OP_TYPES: [&str; 6] = [
    SentencepieceTokenizer::TYPE_NAME,
    StringTensorPack::TYPE_NAME,
    StringTensorUnpack::TYPE_NAME,
    CaseFold::TYPE_NAME,
    NormalizeUnicode::TYPE_NAME,
    RegexNormalization::TYPE_NAME,
];

/// Register every tokenizer operator with `factory`.
///
/// Fails without registering anything if one of the type names is taken.
pub fn register_tokenizer_ops(factory: &mut OpFactory) -> GraphResult<()> {
    if let Some(taken) = TOKENIZER_OP_TYPES.iter().find(|t| factory.contains(t)) {
        return Err(tk_graph::GraphError::DuplicateOpType {
            type_name: taken.to_string(),
        });
    }

    factory.register(
        SentencepieceTokenizer::TYPE_NAME,
        boxed(SentencepieceTokenizer::from_attributes),
    )?;
    factory.register(
        StringTensorPack::TYPE_NAME,
        boxed(StringTensorPack::from_attributes),
    )?;
    factory.register(
        StringTensorUnpack::TYPE_NAME,
        boxed(StringTensorUnpack::from_attributes),
    )?;
    factory.register(CaseFold::TYPE_NAME, boxed(|_| Ok(CaseFold)))?;
    factory.register(
        NormalizeUnicode::TYPE_NAME,
        boxed(NormalizeUnicode::from_attributes),
    )?;
    factory.register(
        RegexNormalization::TYPE_NAME,
        boxed(|_| Ok(RegexNormalization)),
    )?;

    tracing::debug!(count = TOKENIZER_OP_TYPES.len(), "registered tokenizer operators");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tk_graph::{Attributes, GraphError};

    #[test]
    fn registers_all_types() {
        let mut factory = OpFactory::new();
        register_tokenizer_ops(&mut factory).unwrap();
        assert_eq!(factory.len(), TOKENIZER_OP_TYPES.len());
        for name in TOKENIZER_OP_TYPES {
            assert!(factory.contains(name), "{name} missing");
        }
        let op = factory.create("CaseFold", &Attributes::new()).unwrap();
        assert_eq!(op.type_name(), "CaseFold");
    }

    #[test]
    fn second_registration_fails_cleanly() {
        let mut factory = OpFactory::with_builtins();
        register_tokenizer_ops(&mut factory).unwrap();
        let before = factory.len();
        let err = register_tokenizer_ops(&mut factory).unwrap_err();
        assert!(matches!(err, GraphError::DuplicateOpType { .. }));
        assert_eq!(factory.len(), before);
    }
}
