//! Native extension library discovery and loading.

use std::fmt;
use std::path::{Path, PathBuf};

use libloading::Library;

use crate::error::{RuntimeError, RuntimeResult};

/// Symbol the extension library exports to hand over its operators.
pub const ENTRY_POINT: &str = "create_extensions";

/// Library file name for `stem` on operating system `os`.
pub fn library_file_name_for(os: &str, stem: &str) -> RuntimeResult<String> {
    match os {
        "linux" => Ok(format!("lib{stem}.so")),
        "macos" => Ok(format!("lib{stem}.dylib")),
        "windows" => Ok(format!("{stem}.dll")),
        other => Err(RuntimeError::UnsupportedPlatform {
            os: other.to_string(),
        }),
    }
}

/// Library file name for `stem` on the current platform.
pub fn library_file_name(stem: &str) -> RuntimeResult<String> {
    library_file_name_for(std::env::consts::OS, stem)
}

/// Path of the library `stem` inside `dir`; fails if no such file exists.
pub fn locate_library(dir: &Path, stem: &str) -> RuntimeResult<PathBuf> {
    let path = dir.join(library_file_name(stem)?);
    if path.is_file() {
        Ok(path)
    } else {
        Err(RuntimeError::LibraryNotFound { path })
    }
}

/// A loaded extension library; unloaded on drop.
pub struct ExtensionLibrary {
    path: PathBuf,
    library: Library,
}

impl fmt::Debug for ExtensionLibrary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtensionLibrary")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl ExtensionLibrary {
    pub fn load(path: impl Into<PathBuf>) -> RuntimeResult<Self> {
        let path = path.into();
        // SAFETY: loading runs the library's initializers; extension libraries
        // are trusted native code shipped with the runtime.
        let library = unsafe { Library::new(&path) }.map_err(|err| RuntimeError::Load {
            path: path.clone(),
            message: err.to_string(),
        })?;
        tracing::info!(path = %path.display(), "loaded extension library");
        Ok(Self { path, library })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the library exports `symbol`.
    pub fn has_symbol(&self, symbol: &str) -> bool {
        // SAFETY: the symbol is only looked up, never called.
        unsafe { self.library.get::<unsafe extern "C" fn()>(symbol.as_bytes()) }.is_ok()
    }

    pub fn has_entry_point(&self) -> bool {
        self.has_symbol(ENTRY_POINT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_names_per_platform() {
        let stem = "user_ov_extensions";
        assert_eq!(
            library_file_name_for("linux", stem).unwrap(),
            "libuser_ov_extensions.so"
        );
        assert_eq!(
            library_file_name_for("macos", stem).unwrap(),
            "libuser_ov_extensions.dylib"
        );
        assert_eq!(
            library_file_name_for("windows", stem).unwrap(),
            "user_ov_extensions.dll"
        );
        assert!(matches!(
            library_file_name_for("plan9", stem),
            Err(RuntimeError::UnsupportedPlatform { ref os }) if os == "plan9"
        ));
    }

    #[test]
    fn missing_library_is_reported_with_path() {
        let dir = std::env::temp_dir().join("tokwire-missing-lib");
        let err = locate_library(&dir, "nothing_here").unwrap_err();
        match err {
            RuntimeError::LibraryNotFound { path } => assert!(path.starts_with(&dir)),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn loading_garbage_fails() {
        let dir = std::env::temp_dir().join(format!("tokwire-garbage-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(library_file_name("garbage").unwrap());
        std::fs::write(&path, b"not a shared object").unwrap();

        let err = ExtensionLibrary::load(&path).unwrap_err();
        assert!(matches!(err, RuntimeError::Load { .. }));
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
