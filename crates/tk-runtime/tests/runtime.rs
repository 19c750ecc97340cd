//! Integration tests for runtime setup.

use std::path::PathBuf;
use std::sync::Arc;

use tk_runtime::{
    ExtensionHost, ExtensionLibrary, RuntimeConfig, RuntimeContext, RuntimeError, RuntimeResult,
};
use tk_tokenizer::TOKENIZER_OP_TYPES;

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn scratch_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("tokwire-{tag}-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn optional(dir: PathBuf) -> RuntimeConfig {
    RuntimeConfig {
        extension_dir: dir,
        require_extension: false,
        ..RuntimeConfig::default()
    }
}

#[derive(Default)]
struct RecordingHost {
    paths: Vec<PathBuf>,
}

impl ExtensionHost for RecordingHost {
    fn add_extension(&mut self, library: &Arc<ExtensionLibrary>) -> RuntimeResult<()> {
        self.paths.push(library.path().to_path_buf());
        Ok(())
    }
}

#[test]
fn optional_missing_library_still_registers_schemas() {
    init_tracing();
    let dir = scratch_dir("optional");
    let context = RuntimeContext::builder(optional(dir.clone())).build().unwrap();

    assert!(context.extensions().is_empty());
    for name in TOKENIZER_OP_TYPES {
        assert!(context.factory().contains(name), "{name} missing");
    }
    assert!(context.factory().contains("TopK"));

    let mut host = RecordingHost::default();
    context.attach(&mut host).unwrap();
    assert!(host.paths.is_empty());
    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn required_missing_library_fails() {
    let dir = scratch_dir("required");
    let config = RuntimeConfig {
        extension_dir: dir.clone(),
        ..RuntimeConfig::default()
    };
    let err = RuntimeContext::builder(config).build().unwrap_err();
    match err {
        RuntimeError::LibraryNotFound { path } => {
            assert_eq!(path.parent(), Some(dir.as_path()));
        }
        other => panic!("unexpected error: {other}"),
    }
    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn corrupt_library_fails_to_load() {
    let dir = scratch_dir("corrupt");
    let config = RuntimeConfig {
        extension_dir: dir.clone(),
        ..RuntimeConfig::default()
    };
    std::fs::write(config.library_path().unwrap(), b"\x7fELF but not really").unwrap();

    let err = RuntimeContext::builder(config).build().unwrap_err();
    assert!(matches!(err, RuntimeError::Load { .. }));
    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn tokenizer_registration_can_be_disabled() {
    let dir = scratch_dir("no-tokenizer");
    let config = RuntimeConfig {
        register_tokenizer_ops: false,
        ..optional(dir.clone())
    };
    let context = RuntimeContext::builder(config).build().unwrap();
    assert!(!context.factory().contains("SentencepieceTokenizer"));
    assert_eq!(context.factory().len(), 5);
    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn supplied_factory_with_tokenizer_ops_conflicts() {
    let dir = scratch_dir("conflict");
    let mut factory = tk_graph::OpFactory::new();
    tk_tokenizer::register_tokenizer_ops(&mut factory).unwrap();

    let err = RuntimeContext::builder(optional(dir.clone()))
        .with_factory(factory)
        .build()
        .unwrap_err();
    assert!(matches!(
        err,
        RuntimeError::Graph(tk_graph::GraphError::DuplicateOpType { .. })
    ));
    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn config_file_round_trip() {
    let dir = scratch_dir("config");
    let path = dir.join("tokwire.yaml");
    let config = RuntimeConfig {
        library_stem: "custom_ops".into(),
        ..optional(dir.join("native"))
    };
    config.save_yaml(&path).unwrap();

    let loaded = RuntimeConfig::load_yaml(&path).unwrap();
    assert_eq!(loaded, config);

    let err = RuntimeConfig::load_yaml(&dir.join("absent.yaml")).unwrap_err();
    assert!(matches!(err, RuntimeError::Io(_)));
    std::fs::remove_dir_all(&dir).unwrap();
}

#[cfg(all(target_os = "linux", target_env = "gnu"))]
#[test]
fn attach_forwards_loaded_libraries() {
    // Any shared object will do; the C library is always present
    let library = Arc::new(ExtensionLibrary::load("libc.so.6").unwrap());
    assert!(library.has_symbol("malloc"));
    assert!(!library.has_entry_point());

    let dir = scratch_dir("attach");
    let mut context = RuntimeContext::builder(optional(dir.clone())).build().unwrap();
    context.add_extension(&library).unwrap();
    context.add_extension(&library).unwrap();
    assert_eq!(context.extensions().len(), 1);

    let mut host = RecordingHost::default();
    context.attach(&mut host).unwrap();
    assert_eq!(host.paths, vec![PathBuf::from("libc.so.6")]);
    std::fs::remove_dir_all(&dir).unwrap();
}
