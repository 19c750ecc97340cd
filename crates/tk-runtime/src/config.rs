//! Runtime configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::RuntimeResult;
use crate::library::library_file_name;

/// Environment variable overriding [`RuntimeConfig::extension_dir`].
pub const EXTENSION_DIR_ENV: &str = "TOKWIRE_EXTENSION_DIR";

pub const DEFAULT_EXTENSION_DIR: &str = "libs";
pub const DEFAULT_LIBRARY_STEM: &str = "user_ov_extensions";

/// Where to find the native extension and what to register.
///
/// ```yaml
/// extension_dir: /opt/tokwire/libs
/// library_stem: user_ov_extensions
/// require_extension: false
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    #[serde(default = "default_extension_dir")]
    pub extension_dir: PathBuf,
    /// Platform-neutral library name, e.g. `user_ov_extensions` for
    /// `libuser_ov_extensions.so`.
    #[serde(default = "default_library_stem")]
    pub library_stem: String,
    /// Fail when the library is absent instead of continuing without it.
    #[serde(default = "default_true")]
    pub require_extension: bool,
    #[serde(default = "default_true")]
    pub register_tokenizer_ops: bool,
}

fn default_extension_dir() -> PathBuf {
    PathBuf::from(DEFAULT_EXTENSION_DIR)
}

fn default_library_stem() -> String {
    DEFAULT_LIBRARY_STEM.to_string()
}

fn default_true() -> bool {
    true
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            extension_dir: default_extension_dir(),
            library_stem: default_library_stem(),
            require_extension: true,
            register_tokenizer_ops: true,
        }
    }
}

impl RuntimeConfig {
    pub fn from_yaml_str(content: &str) -> RuntimeResult<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn load_yaml(path: &Path) -> RuntimeResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    pub fn save_yaml(&self, path: &Path) -> RuntimeResult<()> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Apply overrides from the process environment.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides using `lookup` in place of the environment.
    pub fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(dir) = lookup(EXTENSION_DIR_ENV).filter(|d| !d.is_empty()) {
            tracing::debug!(dir = %dir, "extension dir overridden from environment");
            self.extension_dir = PathBuf::from(dir);
        }
        self
    }

    /// Full path of the library for the current platform.
    pub fn library_path(&self) -> RuntimeResult<PathBuf> {
        Ok(self.extension_dir.join(library_file_name(&self.library_stem)?))
    }
}
