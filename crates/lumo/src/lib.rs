//! Facade crate for the Lumo media library.
//! Re-exports the shared, infrastructure and gallery crates and wires them from one config.
//! Keep this crate thin: it should compose other crates, not implement business logic.
//!
//! ## Usage
//! ```rust,no_run
//! use lumo::MediaLibrary;
//! use lumo::domain::config::LibraryConfig;
//! # async fn run(file: lumo::domain::Blob) -> Result<(), lumo::gallery::GalleryError> {
//! let library = MediaLibrary::from_config(&LibraryConfig::default())?;
//! library.photos().create("sunset", &file).await?;
//! # Ok(())
//! # }
//! ```

pub use lumo_domain as domain;
pub use lumo_gallery as gallery;
pub use lumo_kernel as kernel;
pub use lumo_media as media;
pub use lumo_storage as storage;

use lumo_domain::config::{CompressionKind, LibraryConfig};
use lumo_gallery::{GalleryError, GalleryErrorExt, HandleTable, PhotoStore, VideoStore};
use lumo_media::{FfmpegDecoder, ImagePreset};
use lumo_storage::{Compression, Database};
use std::ops::Deref;
use std::sync::Arc;
use tracing::info;

#[derive(Debug)]
pub struct MediaLibraryInner {
    database: Database,
    photos: PhotoStore,
    videos: VideoStore,
    handles: HandleTable,
}

/// Both media stores over one database, minting into one handle table. Cheap to clone.
#[derive(Debug, Clone)]
pub struct MediaLibrary {
    inner: Arc<MediaLibraryInner>,
}

impl Deref for MediaLibrary {
    type Target = MediaLibraryInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl MediaLibrary {
    /// Builds the stores described by `config`. No I/O happens until first use.
    ///
    /// # Errors
    ///
    /// Returns [`GalleryError::Store`] for invalid database or collection names.
    pub fn from_config(config: &LibraryConfig) -> Result<Self, GalleryError> {
        let storage = &config.storage;
        let media = &config.media;

        let database = Database::builder()
            .root(&storage.data_dir)
            .name(&storage.database)
            .compression(match storage.compression {
                CompressionKind::None => Compression::None,
                CompressionKind::Lz4 => Compression::Lz4,
            })
            .build()
            .context("Invalid storage configuration")?;

        let handles = HandleTable::new();

        let photos = database
            .collection(&storage.photo_collection)
            .version(storage.schema_version)
            .build()
            .context("Invalid photo collection")?;
        let photos = PhotoStore::new(photos)
            .with_presets(ImagePreset::from(media.display), ImagePreset::from(media.thumbnail))
            .with_handles(handles.clone());

        let videos = database
            .collection(&storage.video_collection)
            .version(storage.schema_version)
            .build()
            .context("Invalid video collection")?;
        let videos = VideoStore::new(videos, FfmpegDecoder::from_config(&media.ffmpeg))
            .with_poster_quality(media.poster_quality)
            .with_handles(handles.clone());

        info!(
            root = %storage.data_dir.display(),
            database = database.name(),
            "Media library configured"
        );
        Ok(Self { inner: Arc::new(MediaLibraryInner { database, photos, videos, handles }) })
    }

    /// Opens both collections now, running pending schema upgrades.
    ///
    /// # Errors
    ///
    /// Returns [`GalleryError::Store`] if either collection fails to open.
    pub async fn open(&self) -> Result<(), GalleryError> {
        self.photos.collection().open().await.context("Failed to open photos")?;
        self.videos.collection().open().await.context("Failed to open videos")
    }
}

impl MediaLibraryInner {
    #[must_use]
    pub const fn database(&self) -> &Database {
        &self.database
    }

    #[must_use]
    pub const fn photos(&self) -> &PhotoStore {
        &self.photos
    }

    #[must_use]
    pub const fn videos(&self) -> &VideoStore {
        &self.videos
    }

    #[must_use]
    pub const fn handles(&self) -> &HandleTable {
        &self.handles
    }
}
