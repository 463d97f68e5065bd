//! Configuration loading and root folder resolution tests
//!
//! Tests that touch REVIVE_ROOT_FOLDER are marked #[serial] so they never
//! race on the process environment.

use revive_common::config::{
    default_root_folder, load_or_default, load_toml_config, ImportConfig, RootFolderInitializer,
    RootFolderResolver, TomlConfig, DATABASE_FILE_NAME, DEFAULT_PORT, ROOT_FOLDER_ENV,
};
use serial_test::serial;
use std::env;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn write_config(dir: &TempDir, content: &str) -> PathBuf {
    let path = dir.path().join("revive-import.toml");
    std::fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_defaults() {
    let config = TomlConfig::default();

    assert_eq!(config.logging.level, "info");
    assert!(config.logging.file.is_none());
    assert_eq!(config.server.port, DEFAULT_PORT);
    assert_eq!(config.server.bind_address, "127.0.0.1");
    assert_eq!(config.import.batch_size, 50);
    assert_eq!(config.import.redirect_path, "/leads");
    assert_eq!(config.import.redirect_delay_ms, 2000);
    assert_eq!(config.import.max_upload_bytes, 50 * 1024 * 1024);
    assert_eq!(config.import.session_ttl_secs, 3600);
}

#[test]
fn test_partial_toml_fills_defaults() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
        environment = "staging"

        [import]
        batch_size = 25
        "#,
    );

    let config = load_toml_config(&path).unwrap();
    assert_eq!(config.environment.as_deref(), Some("staging"));
    assert_eq!(config.import.batch_size, 25);
    assert_eq!(config.import.redirect_delay_ms, 2000);
    assert_eq!(config.server.port, DEFAULT_PORT);
}

#[test]
fn test_invalid_import_section_resets_only_that_section() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
        environment = "production"

        [server]
        port = 6100

        [import]
        batch_size = 0
        redirect_path = "/elsewhere"
        "#,
    );

    let config = load_or_default(Some(&path));
    assert_eq!(config.server.port, 6100);
    assert_eq!(config.environment.as_deref(), Some("production"));
    assert_eq!(config.import, ImportConfig::default());
}

#[test]
fn test_import_config_validation() {
    assert!(ImportConfig::default().validate().is_ok());

    let zero_batch = ImportConfig {
        batch_size: 0,
        ..Default::default()
    };
    assert!(zero_batch.validate().unwrap_err().to_string().contains("batch_size"));

    let relative_redirect = ImportConfig {
        redirect_path: "leads".to_string(),
        ..Default::default()
    };
    assert!(relative_redirect.validate().is_err());

    let no_upload = ImportConfig {
        max_upload_bytes: 0,
        ..Default::default()
    };
    assert!(no_upload.validate().is_err());
}

#[test]
fn test_missing_file_falls_back_to_defaults() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("does-not-exist.toml");

    assert_eq!(load_or_default(Some(&missing)), TomlConfig::default());
    assert_eq!(load_or_default(None), TomlConfig::default());
}

#[test]
fn test_malformed_file_falls_back_to_defaults() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "this is [not toml");

    assert!(load_toml_config(&path).is_err());
    assert_eq!(load_or_default(Some(&path)), TomlConfig::default());
}

#[test]
#[serial]
fn test_resolver_cli_argument_wins() {
    env::set_var(ROOT_FOLDER_ENV, "/tmp/revive-env");
    let toml = TomlConfig {
        root_folder: Some(PathBuf::from("/tmp/revive-toml")),
        ..Default::default()
    };

    let resolved = RootFolderResolver::new("test-module")
        .resolve(Some(Path::new("/tmp/revive-cli")), &toml);
    env::remove_var(ROOT_FOLDER_ENV);

    assert_eq!(resolved, PathBuf::from("/tmp/revive-cli"));
}

#[test]
#[serial]
fn test_resolver_env_beats_toml() {
    env::set_var(ROOT_FOLDER_ENV, "/tmp/revive-env");
    let toml = TomlConfig {
        root_folder: Some(PathBuf::from("/tmp/revive-toml")),
        ..Default::default()
    };

    let resolved = RootFolderResolver::new("test-module").resolve(None, &toml);
    env::remove_var(ROOT_FOLDER_ENV);

    assert_eq!(resolved, PathBuf::from("/tmp/revive-env"));
}

#[test]
#[serial]
fn test_resolver_toml_then_default() {
    env::remove_var(ROOT_FOLDER_ENV);
    let resolver = RootFolderResolver::new("test-module");

    let toml = TomlConfig {
        root_folder: Some(PathBuf::from("/tmp/revive-toml")),
        ..Default::default()
    };
    assert_eq!(resolver.resolve(None, &toml), PathBuf::from("/tmp/revive-toml"));
    assert_eq!(resolver.resolve(None, &TomlConfig::default()), default_root_folder());
}

#[test]
fn test_initializer_creates_directory() {
    let dir = TempDir::new().unwrap();
    let root = dir.path().join("nested").join("revive");

    let initializer = RootFolderInitializer::new(root.clone());
    initializer.ensure_directory_exists().unwrap();

    assert!(root.is_dir());
    assert_eq!(initializer.database_path(), root.join(DATABASE_FILE_NAME));

    // Idempotent
    initializer.ensure_directory_exists().unwrap();
}
