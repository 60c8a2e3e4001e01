//! # Media
//!
//! Pure transforms deriving secondary blobs from user media:
//!
//! * [`compress`]: bounded JPEG derivative of an image ([`ImagePreset::DISPLAY`],
//!   [`ImagePreset::THUMBNAIL`]).
//! * [`extract_poster_frame`] / [`probe_duration`]: poster JPEG and duration of a video,
//!   through any [`VideoDecoder`] ([`FfmpegDecoder`] in production).
//!
//! CPU-heavy decode and encode work runs on Tokio's blocking pool, so the futures are safe
//! to join concurrently from request handlers.
//!
//! ```rust,no_run
//! use lumo_media::{ImagePreset, compress};
//! # async fn run(file: lumo_domain::Blob) -> Result<(), lumo_media::TransformError> {
//! let (display, thumbnail) = tokio::try_join!(
//!     compress(&file, ImagePreset::DISPLAY),
//!     compress(&file, ImagePreset::THUMBNAIL),
//! )?;
//! assert!(thumbnail.len() <= display.len());
//! # Ok(())
//! # }
//! ```

mod error;
mod ffmpeg;
mod raster;
mod video;

pub use crate::error::{TransformError, TransformErrorExt};
pub use crate::ffmpeg::FfmpegDecoder;
pub use crate::raster::{
    ImagePreset, POSTER_QUALITY, compress, compress_blocking, encode_jpeg, jpeg_quality,
    target_dimensions,
};
pub use crate::video::{
    MAX_POSTER_SEEK, VideoDecoder, VideoMetadata, extract_poster_frame, poster_from_metadata,
    poster_seek_position, probe_duration,
};
pub use ::image::RgbImage;
