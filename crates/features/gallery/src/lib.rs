//! # Gallery
//!
//! Typed media stores on top of [`lumo_storage`] and [`lumo_media`]:
//!
//! * [`PhotoStore`]: keeps a display-sized JPEG and a thumbnail per photo.
//! * [`VideoStore`]: keeps the untouched upload, a poster frame and the duration per video.
//!
//! Every `create` and `update` derives its media before touching storage, so a transform
//! failure never leaves a partial record behind. Reads hand out [`HandleLease`]s from a
//! shared [`HandleTable`] instead of copying bytes; a lease revokes its handle on drop.
//!
//! ```rust,no_run
//! use lumo_gallery::PhotoStore;
//! use lumo_storage::Database;
//! # async fn run(file: lumo_domain::Blob) -> Result<(), Box<dyn std::error::Error>> {
//! let db = Database::builder().root("data").name("media-db").build()?;
//! let photos = PhotoStore::from_database(&db)?;
//!
//! photos.create("sunset", &file).await?;
//! if let Some(lease) = photos.thumbnail_handle("sunset").await? {
//!     println!("{}", lease.url());
//! }
//! # Ok(())
//! # }
//! ```

mod error;
mod handles;
mod photos;
mod records;
mod videos;

pub use crate::error::{GalleryError, GalleryErrorExt};
pub use crate::handles::{BlobHandle, HandleLease, HandleTable};
pub use crate::photos::PhotoStore;
pub use crate::records::{ImageRecord, VideoRecord};
pub use crate::videos::VideoStore;
