use crate::error::{GalleryError, GalleryErrorExt};
use crate::handles::{HandleLease, HandleTable};
use crate::records::{ImageRecord, next_update, now_ms};
use lumo_domain::Blob;
use lumo_domain::constants::{PHOTO_COLLECTION, SCHEMA_VERSION};
use lumo_media::{ImagePreset, compress};
use lumo_storage::{Collection, Database};
use tracing::{debug, info, instrument};

/// Photos keyed by caller-chosen ids, stored as a display JPEG plus a thumbnail.
#[derive(Debug)]
pub struct PhotoStore {
    collection: Collection<ImageRecord>,
    display: ImagePreset,
    thumbnail: ImagePreset,
    handles: HandleTable,
}

impl PhotoStore {
    /// Uses the `images` collection of `database` at the current schema version.
    ///
    /// # Errors
    ///
    /// Fails only if the collection name or version is rejected; nothing is opened yet.
    pub fn from_database(database: &Database) -> Result<Self, GalleryError> {
        let collection = database
            .collection::<ImageRecord>(PHOTO_COLLECTION)
            .version(SCHEMA_VERSION)
            .build()
            .context("Invalid photo collection")?;
        Ok(Self::new(collection))
    }

    #[must_use]
    pub fn new(collection: Collection<ImageRecord>) -> Self {
        Self {
            collection,
            display: ImagePreset::DISPLAY,
            thumbnail: ImagePreset::THUMBNAIL,
            handles: HandleTable::new(),
        }
    }

    /// Overrides both presets. A thumbnail bound above the display bound is capped to it.
    #[must_use = "Sets the derivative presets"]
    pub const fn with_presets(mut self, display: ImagePreset, thumbnail: ImagePreset) -> Self {
        self.display = display;
        self.thumbnail = thumbnail;
        self
    }

    /// Mints handles into `handles` instead of a private table.
    #[must_use = "Sets the handle table"]
    pub fn with_handles(mut self, handles: HandleTable) -> Self {
        self.handles = handles;
        self
    }

    #[must_use]
    pub const fn collection(&self) -> &Collection<ImageRecord> {
        &self.collection
    }

    #[must_use]
    pub const fn handles(&self) -> &HandleTable {
        &self.handles
    }

    /// Compresses `file` into both derivatives and stores them under a new `id`.
    ///
    /// # Errors
    ///
    /// [`GalleryError::Transform`] when `file` can't be decoded (nothing is written), or
    /// [`GalleryError::Store`] with a duplicate key when `id` already exists.
    #[instrument(skip(self, file), fields(bytes = file.len()))]
    pub async fn create(&self, id: &str, file: &Blob) -> Result<ImageRecord, GalleryError> {
        let (original, thumbnail) = self.derive(file).await?;
        let now = now_ms();
        let record =
            ImageRecord { id: id.to_owned(), original, thumbnail, created_at: now, updated_at: now };

        self.collection.add(&record).await.context("Failed to add photo")?;
        info!(original = record.original.len(), thumbnail = record.thumbnail.len(), "Photo created");
        Ok(record)
    }

    /// Replaces the media of an existing photo, keeping `created_at`.
    ///
    /// # Errors
    ///
    /// [`GalleryError::RecordNotFound`] when `id` is not stored, plus the errors of
    /// [`PhotoStore::create`] other than the duplicate key.
    #[instrument(skip(self, file), fields(bytes = file.len()))]
    pub async fn update(&self, id: &str, file: &Blob) -> Result<ImageRecord, GalleryError> {
        let existing = self.require(id).await?;
        let (original, thumbnail) = self.derive(file).await?;
        let record = ImageRecord {
            id: existing.id,
            original,
            thumbnail,
            created_at: existing.created_at,
            updated_at: next_update(existing.updated_at),
        };

        self.collection.put(&record).await.context("Failed to update photo")?;
        info!(updated_at = record.updated_at, "Photo updated");
        Ok(record)
    }

    /// # Errors
    ///
    /// Returns [`GalleryError::Store`] if the collection can't be read.
    pub async fn get(&self, id: &str) -> Result<Option<ImageRecord>, GalleryError> {
        self.collection.get(id).await.context("Failed to load photo")
    }

    /// Every stored id in ascending order.
    ///
    /// # Errors
    ///
    /// Returns [`GalleryError::Store`] if the collection can't be listed.
    pub async fn keys(&self) -> Result<Vec<String>, GalleryError> {
        self.collection.get_all_keys().await.context("Failed to list photos")
    }

    /// Removes `id`; absent ids are not an error.
    ///
    /// # Errors
    ///
    /// Returns [`GalleryError::Store`] if the record can't be removed.
    pub async fn delete(&self, id: &str) -> Result<(), GalleryError> {
        self.collection.delete(id).await.context("Failed to delete photo")
    }

    /// # Errors
    ///
    /// Returns [`GalleryError::Store`] if the collection can't be emptied.
    pub async fn clear(&self) -> Result<(), GalleryError> {
        self.collection.clear().await.context("Failed to clear photos")
    }

    /// A fresh handle to the display image, or `None` for an unknown id.
    ///
    /// # Errors
    ///
    /// Returns [`GalleryError::Store`] if the record can't be read.
    pub async fn display_handle(&self, id: &str) -> Result<Option<HandleLease>, GalleryError> {
        Ok(self.get(id).await?.map(|record| self.handles.mint(record.original)))
    }

    /// A fresh handle to the thumbnail, or `None` for an unknown id.
    ///
    /// # Errors
    ///
    /// Returns [`GalleryError::Store`] if the record can't be read.
    pub async fn thumbnail_handle(&self, id: &str) -> Result<Option<HandleLease>, GalleryError> {
        Ok(self.get(id).await?.map(|record| self.handles.mint(record.thumbnail)))
    }

    async fn require(&self, id: &str) -> Result<ImageRecord, GalleryError> {
        self.get(id).await?.ok_or_else(|| GalleryError::RecordNotFound {
            id: id.to_owned().into(),
            context: Some(format!("collection '{}'", self.collection.name()).into()),
        })
    }

    async fn derive(&self, file: &Blob) -> Result<(Blob, Blob), GalleryError> {
        // Never let the thumbnail bound exceed the display bound.
        let thumbnail_preset = ImagePreset {
            max_dimension: self.thumbnail.max_dimension.min(self.display.max_dimension),
            ..self.thumbnail
        };
        let (display_image, thumbnail_image) =
            tokio::try_join!(compress(file, self.display), compress(file, thumbnail_preset))
                .context("Failed to transform photo")?;

        // Tiny sources can encode larger at the thumbnail preset.
        let (display_len, thumbnail_len) = (display_image.len(), thumbnail_image.len());
        if thumbnail_len > display_len {
            debug!(display_len, thumbnail_len, "Reusing display image");
            return Ok((display_image.clone(), display_image));
        }
        Ok((display_image, thumbnail_image))
    }
}
