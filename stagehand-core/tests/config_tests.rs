//! Configuration error-message and atomic-save integration tests.

use assert_fs::prelude::*;
use predicates::prelude::predicate;
use stagehand_core::{
    config::{self, Config, LOCAL_CONFIG_FILE},
    CoreError,
};

#[test]
fn corrupt_yaml_returns_parse_error_with_path() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let file = dir.child(LOCAL_CONFIG_FILE);
    file.write_str(": : corrupt : yaml : !!!\n  - broken: [unclosed")
        .expect("write");

    let err = config::load_at(file.path()).unwrap_err();
    assert!(matches!(err, CoreError::Parse { .. }), "got: {err}");
    assert!(err.to_string().contains(LOCAL_CONFIG_FILE));
}

#[test]
fn wrong_shape_yaml_returns_parse_error() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let file = dir.child(LOCAL_CONFIG_FILE);
    file.write_str("- this is a list, not a mapping\n").expect("write");

    let err = config::load_at(file.path()).unwrap_err();
    assert!(matches!(err, CoreError::Parse { .. }), "got: {err}");
}

#[test]
fn save_writes_yaml_and_cleans_up_tmp() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let file = dir.child(LOCAL_CONFIG_FILE);

    let mut cfg = Config::default();
    cfg.host_process = Some("trainz".to_string());
    config::save_at(file.path(), &cfg).expect("save");

    file.assert(predicate::path::exists());
    file.assert(predicate::str::contains("host_process: trainz"));
    dir.child("stagehand.yaml.tmp")
        .assert(predicate::path::missing());

    let loaded = config::load_at(file.path()).expect("load");
    assert_eq!(loaded, cfg);
}

#[test]
fn user_config_is_used_when_no_local_file() {
    let cwd = assert_fs::TempDir::new().expect("cwd");
    let home = assert_fs::TempDir::new().expect("home");
    home.child(".stagehand/config.yaml")
        .write_str("daemon:\n  process_name: Indexer\n")
        .expect("write");

    let (cfg, from) = config::resolve_at(None, cwd.path(), Some(home.path())).expect("resolve");
    assert_eq!(cfg.daemon.process_name, "Indexer");
    assert_eq!(from, Some(config::user_config_path_at(home.path())));
}
