use crate::error::{GalleryError, GalleryErrorExt};
use crate::handles::{HandleLease, HandleTable};
use crate::records::{VideoRecord, next_update, now_ms};
use lumo_domain::Blob;
use lumo_domain::constants::{SCHEMA_VERSION, VIDEO_COLLECTION};
use lumo_media::{FfmpegDecoder, POSTER_QUALITY, VideoDecoder, poster_from_metadata};
use lumo_storage::{Collection, Database};
use tracing::{info, instrument};

/// Videos keyed by caller-chosen ids. The upload is stored untouched next to a poster frame
/// and its duration.
#[derive(Debug)]
pub struct VideoStore<D = FfmpegDecoder> {
    collection: Collection<VideoRecord>,
    decoder: D,
    poster_quality: f32,
    handles: HandleTable,
}

impl VideoStore<FfmpegDecoder> {
    /// Uses the `videos` collection of `database`, decoding with the `ffmpeg` on `PATH`.
    ///
    /// # Errors
    ///
    /// Fails only if the collection name or version is rejected; nothing is opened yet.
    pub fn from_database(database: &Database) -> Result<Self, GalleryError> {
        Self::with_decoder(database, FfmpegDecoder::default())
    }
}

impl<D: VideoDecoder> VideoStore<D> {
    /// # Errors
    ///
    /// Fails only if the collection name or version is rejected; nothing is opened yet.
    pub fn with_decoder(database: &Database, decoder: D) -> Result<Self, GalleryError> {
        let collection = database
            .collection::<VideoRecord>(VIDEO_COLLECTION)
            .version(SCHEMA_VERSION)
            .build()
            .context("Invalid video collection")?;
        Ok(Self::new(collection, decoder))
    }

    #[must_use]
    pub fn new(collection: Collection<VideoRecord>, decoder: D) -> Self {
        Self { collection, decoder, poster_quality: POSTER_QUALITY, handles: HandleTable::new() }
    }

    #[must_use = "Sets the poster quality"]
    pub const fn with_poster_quality(mut self, quality: f32) -> Self {
        self.poster_quality = quality;
        self
    }

    /// Mints handles into `handles` instead of a private table.
    #[must_use = "Sets the handle table"]
    pub fn with_handles(mut self, handles: HandleTable) -> Self {
        self.handles = handles;
        self
    }

    #[must_use]
    pub const fn collection(&self) -> &Collection<VideoRecord> {
        &self.collection
    }

    #[must_use]
    pub const fn handles(&self) -> &HandleTable {
        &self.handles
    }

    /// Captures a poster and the duration of `file` and stores all three under a new `id`.
    ///
    /// # Errors
    ///
    /// [`GalleryError::Transform`] when `file` can't be probed or seeked (nothing is
    /// written), or [`GalleryError::Store`] with a duplicate key when `id` already exists.
    #[instrument(skip(self, file), fields(bytes = file.len()))]
    pub async fn create(&self, id: &str, file: &Blob) -> Result<VideoRecord, GalleryError> {
        let (poster, duration) = self.derive(file).await?;
        let now = now_ms();
        let record = VideoRecord {
            id: id.to_owned(),
            original: file.clone(),
            poster,
            duration,
            created_at: now,
            updated_at: now,
        };

        self.collection.add(&record).await.context("Failed to add video")?;
        info!(duration, poster = record.poster.len(), "Video created");
        Ok(record)
    }

    /// Replaces an existing video, keeping `created_at`.
    ///
    /// # Errors
    ///
    /// [`GalleryError::RecordNotFound`] when `id` is not stored, plus the errors of
    /// [`VideoStore::create`] other than the duplicate key.
    #[instrument(skip(self, file), fields(bytes = file.len()))]
    pub async fn update(&self, id: &str, file: &Blob) -> Result<VideoRecord, GalleryError> {
        let Some(existing) = self.get(id).await? else {
            return Err(GalleryError::RecordNotFound {
                id: id.to_owned().into(),
                context: Some(format!("collection '{}'", self.collection.name()).into()),
            });
        };
        let (poster, duration) = self.derive(file).await?;
        let record = VideoRecord {
            id: existing.id,
            original: file.clone(),
            poster,
            duration,
            created_at: existing.created_at,
            updated_at: next_update(existing.updated_at),
        };

        self.collection.put(&record).await.context("Failed to update video")?;
        info!(duration, updated_at = record.updated_at, "Video updated");
        Ok(record)
    }

    /// # Errors
    ///
    /// Returns [`GalleryError::Store`] if the collection can't be read.
    pub async fn get(&self, id: &str) -> Result<Option<VideoRecord>, GalleryError> {
        self.collection.get(id).await.context("Failed to load video")
    }

    /// # Errors
    ///
    /// Returns [`GalleryError::Store`] if the collection can't be listed.
    pub async fn keys(&self) -> Result<Vec<String>, GalleryError> {
        self.collection.get_all_keys().await.context("Failed to list videos")
    }

    /// # Errors
    ///
    /// Returns [`GalleryError::Store`] if the record can't be removed.
    pub async fn delete(&self, id: &str) -> Result<(), GalleryError> {
        self.collection.delete(id).await.context("Failed to delete video")
    }

    /// # Errors
    ///
    /// Returns [`GalleryError::Store`] if the collection can't be emptied.
    pub async fn clear(&self) -> Result<(), GalleryError> {
        self.collection.clear().await.context("Failed to clear videos")
    }

    /// A fresh handle to the poster frame, or `None` for an unknown id.
    ///
    /// # Errors
    ///
    /// Returns [`GalleryError::Store`] if the record can't be read.
    pub async fn poster_handle(&self, id: &str) -> Result<Option<HandleLease>, GalleryError> {
        Ok(self.get(id).await?.map(|record| self.handles.mint(record.poster)))
    }

    /// A fresh handle to the original upload, or `None` for an unknown id.
    ///
    /// # Errors
    ///
    /// Returns [`GalleryError::Store`] if the record can't be read.
    pub async fn video_handle(&self, id: &str) -> Result<Option<HandleLease>, GalleryError> {
        Ok(self.get(id).await?.map(|record| self.handles.mint(record.original)))
    }

    /// Probes once; the same metadata yields both the duration and the poster seek.
    async fn derive(&self, file: &Blob) -> Result<(Blob, f64), GalleryError> {
        let metadata = self.decoder.probe(file).await.context("Failed to probe video")?;
        let duration = metadata.valid_duration().context("Failed to transform video")?;
        let poster = poster_from_metadata(&self.decoder, file, &metadata, self.poster_quality)
            .await
            .context("Failed to transform video")?;
        Ok((poster, duration))
    }
}
