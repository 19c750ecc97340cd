//! Runtime context: the operator factory plus the loaded extension libraries.

use std::sync::Arc;

use tk_graph::OpFactory;

use crate::config::RuntimeConfig;
use crate::error::{RuntimeError, RuntimeResult};
use crate::library::{ExtensionLibrary, locate_library};

/// Something that accepts native extension libraries.
pub trait ExtensionHost {
    fn add_extension(&mut self, library: &Arc<ExtensionLibrary>) -> RuntimeResult<()>;
}

/// Configured runtime: an operator factory and the extensions backing it.
#[derive(Debug)]
pub struct RuntimeContext {
    config: RuntimeConfig,
    factory: OpFactory,
    extensions: Vec<Arc<ExtensionLibrary>>,
}

impl RuntimeContext {
    pub fn builder(config: RuntimeConfig) -> RuntimeBuilder {
        RuntimeBuilder::new(config)
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn factory(&self) -> &OpFactory {
        &self.factory
    }

    pub fn factory_mut(&mut self) -> &mut OpFactory {
        &mut self.factory
    }

    pub fn extensions(&self) -> &[Arc<ExtensionLibrary>] {
        &self.extensions
    }

    /// Hand every loaded extension to `host`, in load order.
    pub fn attach(&self, host: &mut impl ExtensionHost) -> RuntimeResult<()> {
        for library in &self.extensions {
            host.add_extension(library)?;
        }
        Ok(())
    }
}

impl ExtensionHost for RuntimeContext {
    fn add_extension(&mut self, library: &Arc<ExtensionLibrary>) -> RuntimeResult<()> {
        if self.extensions.iter().any(|l| l.path() == library.path()) {
            tracing::debug!(path = %library.path().display(), "extension already registered");
            return Ok(());
        }
        self.extensions.push(Arc::clone(library));
        Ok(())
    }
}

/// Builds a [`RuntimeContext`] from a [`RuntimeConfig`].
#[derive(Debug)]
pub struct RuntimeBuilder {
    config: RuntimeConfig,
    factory: Option<OpFactory>,
}

impl RuntimeBuilder {
    pub fn new(config: RuntimeConfig) -> Self {
        Self {
            config,
            factory: None,
        }
    }

    /// Start from `factory` instead of a factory with just the built-ins.
    pub fn with_factory(mut self, factory: OpFactory) -> Self {
        self.factory = Some(factory);
        self
    }

    /// Load the extension library and register operator schemas.
    ///
    /// A missing library is an error unless the config marks it optional.
    pub fn build(self) -> RuntimeResult<RuntimeContext> {
        let library = match locate_library(&self.config.extension_dir, &self.config.library_stem) {
            Ok(path) => Some(Arc::new(ExtensionLibrary::load(path)?)),
            Err(RuntimeError::LibraryNotFound { path }) if !self.config.require_extension => {
                tracing::warn!(path = %path.display(), "extension library not found, continuing without it");
                None
            }
            Err(err) => return Err(err),
        };
        if let Some(library) = &library
            && !library.has_entry_point()
        {
            tracing::warn!(path = %library.path().display(), "extension library has no entry point");
        }

        let mut factory = self.factory.unwrap_or_else(OpFactory::with_builtins);
        if self.config.register_tokenizer_ops {
            tk_tokenizer::register_tokenizer_ops(&mut factory)?;
        }

        let mut context = RuntimeContext {
            config: self.config,
            factory,
            extensions: Vec::new(),
        };
        if let Some(library) = &library {
            context.add_extension(library)?;
        }

        tracing::info!(
            extensions = context.extensions.len(),
            op_types = context.factory.len(),
            "runtime context ready"
        );
        Ok(context)
    }
}
