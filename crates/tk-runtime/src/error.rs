//! Error types for runtime setup.

use std::path::PathBuf;

use thiserror::Error;
use tk_graph::GraphError;

pub type RuntimeResult<T> = Result<T, RuntimeError>;

/// Errors raised while configuring the runtime and loading extensions.
#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error("Extension library not found: {}", .path.display())]
    LibraryNotFound { path: PathBuf },

    #[error("Unsupported platform for native extensions: {os}")]
    UnsupportedPlatform { os: String },

    #[error("Failed to load {}: {message}", .path.display())]
    Load { path: PathBuf, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
