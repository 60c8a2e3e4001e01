use lumo_domain::config::{CompressionKind, LibraryConfig, MediaConfig, PresetConfig, StorageConfig};
use lumo_domain::constants::{DATABASE, PHOTO_COLLECTION, VIDEO_COLLECTION};
use serde_json::json;
use std::path::PathBuf;

#[test]
fn config_defaults_are_sane() {
    let storage = StorageConfig::default();
    assert_eq!(storage.database, DATABASE);
    assert_eq!(storage.photo_collection, PHOTO_COLLECTION);
    assert_eq!(storage.video_collection, VIDEO_COLLECTION);
    assert_eq!(storage.schema_version, 1);
    assert_eq!(storage.compression, CompressionKind::None);

    let media = MediaConfig::default();
    assert_eq!(media.display, PresetConfig { max_dimension: 1920, quality: 0.85 });
    assert_eq!(media.thumbnail, PresetConfig { max_dimension: 300, quality: 0.70 });
    assert!((media.poster_quality - 0.70).abs() < f32::EPSILON);
    assert_eq!(media.ffmpeg.ffprobe, PathBuf::from("ffprobe"));
}

#[test]
fn library_config_deserializes_partial_sections() {
    let raw = json!({
        "storage": { "data_dir": "/tmp/lumo", "compression": "lz4" },
        "media": { "thumbnail": { "max_dimension": 256, "quality": 0.6 } },
        "logging": { "level": "debug", "json": true }
    });

    let cfg: LibraryConfig = serde_json::from_value(raw).expect("config deserialize");
    assert_eq!(cfg.storage.data_dir, PathBuf::from("/tmp/lumo"));
    assert_eq!(cfg.storage.compression, CompressionKind::Lz4);
    assert_eq!(cfg.storage.database, DATABASE);
    assert_eq!(cfg.media.thumbnail.max_dimension, 256);
    assert_eq!(cfg.media.display, PresetConfig::DISPLAY);
    assert_eq!(cfg.logging.level, "debug");
    assert!(cfg.logging.json);
}

#[test]
fn config_clones_share_until_mutated() {
    let base = LibraryConfig::default();
    let mut tuned = base.clone();
    tuned.storage.schema_version = 2;

    assert_eq!(base.storage.schema_version, 1);
    assert_eq!(tuned.storage.schema_version, 2);
}
