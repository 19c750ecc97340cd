//! tk-runtime: native extension loading and runtime setup.
//!
//! The extension library is located from a [`RuntimeConfig`], loaded once per
//! [`RuntimeContext`] and shared with any [`ExtensionHost`] through `Arc`.
//!
//! # Example
//!
//! ```no_run
//! use tk_runtime::{RuntimeConfig, RuntimeContext};
//!
//! let config = RuntimeConfig::load_yaml("tokwire.yaml".as_ref())
//!     .unwrap()
//!     .with_env_overrides();
//! let context = RuntimeContext::builder(config).build().unwrap();
//! assert!(context.factory().contains("SentencepieceTokenizer"));
//! ```

pub mod config;
pub mod context;
pub mod error;
pub mod library;

pub use config::{
    DEFAULT_EXTENSION_DIR, DEFAULT_LIBRARY_STEM, EXTENSION_DIR_ENV, RuntimeConfig,
};
pub use context::{ExtensionHost, RuntimeBuilder, RuntimeContext};
pub use error::{RuntimeError, RuntimeResult};
pub use library::{
    ENTRY_POINT, ExtensionLibrary, library_file_name, library_file_name_for, locate_library,
};
