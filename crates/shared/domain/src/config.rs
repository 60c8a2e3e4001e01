use crate::constants;
use serde::Deserialize;
use std::ops::{Deref, DerefMut};
use std::path::PathBuf;
use std::sync::Arc;

/// Top-level media library configuration.
#[derive(Default, Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LibraryConfigInner {
    pub storage: StorageConfig,
    pub media: MediaConfig,
    pub logging: LoggingConfig,
}

/// Thin Arc-wrapped config for inexpensive cloning into subsystems.
#[derive(Default, Debug, Clone, Deserialize)]
pub struct LibraryConfig {
    #[serde(flatten, default)]
    inner: Arc<LibraryConfigInner>,
}

impl Deref for LibraryConfig {
    type Target = LibraryConfigInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl DerefMut for LibraryConfig {
    fn deref_mut(&mut self) -> &mut LibraryConfigInner {
        Arc::make_mut(&mut self.inner)
    }
}

/// Record compression as written in config files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionKind {
    #[default]
    None,
    Lz4,
}

/// Where and how records are persisted.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
    pub database: String,
    pub photo_collection: String,
    pub video_collection: String,
    pub schema_version: u32,
    pub compression: CompressionKind,
}

/// A resize/re-encode target.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct PresetConfig {
    /// Longest side in pixels.
    pub max_dimension: u32,
    /// Lossy quality in `0.0..=1.0`.
    pub quality: f32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MediaConfig {
    pub display: PresetConfig,
    pub thumbnail: PresetConfig,
    pub poster_quality: f32,
    pub ffmpeg: FfmpegConfig,
}

/// External binaries used for video probing and frame capture.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FfmpegConfig {
    pub ffmpeg: PathBuf,
    pub ffprobe: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// Rolling log files are written here when set.
    pub directory: Option<PathBuf>,
    pub json: bool,
    /// Extra `tracing` directives, e.g. `lumo_storage=debug`.
    pub filter: Option<String>,
}

// --- Default ---

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            database: constants::DATABASE.to_owned(),
            photo_collection: constants::PHOTO_COLLECTION.to_owned(),
            video_collection: constants::VIDEO_COLLECTION.to_owned(),
            schema_version: constants::SCHEMA_VERSION,
            compression: CompressionKind::None,
        }
    }
}

impl PresetConfig {
    pub const DISPLAY: Self = Self { max_dimension: 1920, quality: 0.85 };
    pub const THUMBNAIL: Self = Self { max_dimension: 300, quality: 0.70 };
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            display: PresetConfig::DISPLAY,
            thumbnail: PresetConfig::THUMBNAIL,
            poster_quality: 0.70,
            ffmpeg: FfmpegConfig::default(),
        }
    }
}

impl Default for FfmpegConfig {
    fn default() -> Self {
        Self { ffmpeg: PathBuf::from("ffmpeg"), ffprobe: PathBuf::from("ffprobe") }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_owned(), directory: None, json: false, filter: None }
    }
}
