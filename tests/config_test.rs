use stencil::config::Config;
use stencil::scaffold::Scaffold;
use stencil::source::{SourceEntry, SourceTree};
use tempfile::TempDir;

fn mem_source() -> SourceTree {
    let mut tree = SourceTree::new();
    tree.insert("f".to_string(), SourceEntry::File("c".to_string()));
    tree
}

#[test]
fn requires_a_target() {
    let cfg = Config {
        source: Some(mem_source()),
        ..Config::default()
    };

    let err = Scaffold::new(cfg, Default::default()).unwrap_err();
    assert!(err.to_string().contains("target is required"), "{}", err);
}

#[test]
fn requires_a_source() {
    let dir = TempDir::new().unwrap();
    let cfg = Config {
        target_directory: dir.path().join("target"),
        ..Config::default()
    };

    let err = Scaffold::new(cfg, Default::default()).unwrap_err();
    assert!(err.to_string().contains("no sources provided"), "{}", err);
}

#[test]
fn rejects_both_sources() {
    let dir = TempDir::new().unwrap();
    let cfg = Config {
        target_directory: dir.path().join("target"),
        source_directory: Some(dir.path().to_path_buf()),
        source: Some(mem_source()),
        ..Config::default()
    };

    let err = Scaffold::new(cfg, Default::default()).unwrap_err();
    assert!(err.to_string().contains("mutually exclusive"), "{}", err);
}

#[test]
fn rejects_a_missing_source_directory() {
    let dir = TempDir::new().unwrap();
    let cfg = Config {
        target_directory: dir.path().join("target"),
        source_directory: Some(dir.path().join("no/such/directory")),
        ..Config::default()
    };

    let err = Scaffold::new(cfg, Default::default()).unwrap_err();
    assert!(
        err.to_string().contains("cannot read source directory"),
        "{}",
        err
    );
}

#[test]
fn rejects_a_lone_delimiter() {
    let dir = TempDir::new().unwrap();

    let cfg = Config {
        target_directory: dir.path().join("target"),
        source: Some(mem_source()),
        left_delimiter: Some("<<".to_string()),
        ..Config::default()
    };

    let err = Scaffold::new(cfg, Default::default()).unwrap_err();
    assert!(
        err.to_string()
            .contains("both left_delimiter and right_delimiter must be set"),
        "{}",
        err
    );
}

#[test]
fn rejects_an_existing_target_without_merge() {
    let dir = TempDir::new().unwrap();
    let cfg = Config {
        target_directory: dir.path().to_path_buf(),
        source: Some(mem_source()),
        ..Config::default()
    };

    let err = Scaffold::new(cfg, Default::default()).unwrap_err();
    assert!(err.to_string().contains("target directory exists"), "{}", err);
}

#[test]
fn allows_an_existing_target_when_merging() {
    let dir = TempDir::new().unwrap();
    let cfg = Config {
        target_directory: dir.path().to_path_buf(),
        merge_target_directory: true,
        source: Some(mem_source()),
        ..Config::default()
    };

    assert!(Scaffold::new(cfg, Default::default()).is_ok());
}

#[test]
fn resolves_the_target_to_an_absolute_path() {
    let cfg = Config {
        target_directory: "relative-stencil-target".into(),
        source: Some(mem_source()),
        ..Config::default()
    };

    let s = Scaffold::new(cfg, Default::default()).unwrap();
    assert!(s.target_directory().is_absolute());
}

#[test]
fn alternate_engine_rejects_custom_delimiters() {
    let dir = TempDir::new().unwrap();
    let cfg = Config {
        target_directory: dir.path().join("target"),
        source: Some(mem_source()),
        left_delimiter: Some("<<".to_string()),
        right_delimiter: Some(">>".to_string()),
        ..Config::default()
    };

    let err = Scaffold::new_alt(cfg, Vec::new()).unwrap_err();
    assert!(
        err.to_string()
            .contains("custom delimiters are not supported"),
        "{}",
        err
    );
}

#[test]
fn alternate_engine_accepts_the_default_delimiters() {
    let dir = TempDir::new().unwrap();
    let cfg = Config {
        target_directory: dir.path().join("target"),
        source: Some(mem_source()),
        left_delimiter: Some("{{".to_string()),
        right_delimiter: Some("}}".to_string()),
        ..Config::default()
    };

    assert!(Scaffold::new_alt(cfg, Vec::new()).is_ok());
}
