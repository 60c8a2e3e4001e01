use lumo_kernel::config::{ConfigError, load_config};
use lumo_kernel::domain::config::{CompressionKind, LibraryConfig};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

#[test]
fn loads_file_with_defaults_for_missing_sections() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("lumo.toml");
    fs::write(
        &path,
        r#"
[storage]
data_dir = "/srv/lumo"
compression = "lz4"

[media.display]
max_dimension = 1280
quality = 0.8
"#,
    )
    .unwrap();

    let cfg: LibraryConfig = load_config(Some(&path)).unwrap();
    assert_eq!(cfg.storage.data_dir, PathBuf::from("/srv/lumo"));
    assert_eq!(cfg.storage.compression, CompressionKind::Lz4);
    assert_eq!(cfg.storage.photo_collection, "images");
    assert_eq!(cfg.media.display.max_dimension, 1280);
    assert_eq!(cfg.media.thumbnail.max_dimension, 300);
}

#[test]
fn missing_explicit_file_is_an_error() {
    let temp = TempDir::new().unwrap();
    let err = load_config::<LibraryConfig>(Some(temp.path().join("absent.toml"))).unwrap_err();
    assert!(matches!(err, ConfigError::Config { context: Some(_), .. }));
}

#[test]
fn format_follows_extension() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("lumo.json");
    fs::write(&path, r#"{ "logging": { "level": "debug", "filter": "lumo_storage=trace" } }"#)
        .unwrap();

    let cfg: LibraryConfig = load_config(Some(&path)).unwrap();
    assert_eq!(cfg.logging.level, "debug");
    assert_eq!(cfg.logging.filter.as_deref(), Some("lumo_storage=trace"));
    assert_eq!(cfg.storage.schema_version, 1);
}
