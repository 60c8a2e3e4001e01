//! Video poster frames and duration probes.
//!
//! Decoding is delegated to a [`VideoDecoder`]; the functions here own the policy: which
//! timestamp to capture, what counts as a valid duration, and how the frame is encoded.

use crate::error::TransformError;
use crate::raster::encode_jpeg;
use image::RgbImage;
use lumo_domain::Blob;
use std::future::Future;
use tracing::{debug, instrument};

/// Posters are captured at `min(MAX_POSTER_SEEK, duration / 2)` seconds.
pub const MAX_POSTER_SEEK: f64 = 1.0;

/// Stream metadata reported by a decoder.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VideoMetadata {
    pub width: u32,
    pub height: u32,
    /// Seconds; may be zero, infinite or NaN for broken or live input.
    pub duration: f64,
}

/// Reads metadata and single frames out of an encoded video.
pub trait VideoDecoder: Send + Sync + 'static {
    /// Reads container and stream metadata without decoding the whole video.
    fn probe(
        &self,
        video: &Blob,
    ) -> impl Future<Output = Result<VideoMetadata, TransformError>> + Send;

    /// Decodes the frame shown at `seconds`, at the stream's native resolution.
    fn frame_at(
        &self,
        video: &Blob,
        seconds: f64,
    ) -> impl Future<Output = Result<RgbImage, TransformError>> + Send;
}

/// Timestamp of the poster frame for a video of `duration` seconds.
#[must_use]
pub fn poster_seek_position(duration: f64) -> f64 {
    (duration / 2.0).min(MAX_POSTER_SEEK)
}

fn validate_duration(duration: f64) -> Result<f64, TransformError> {
    if duration.is_finite() && duration > 0.0 {
        Ok(duration)
    } else {
        Err(TransformError::InvalidDuration {
            duration,
            context: Some("duration must be finite and greater than zero".into()),
        })
    }
}

impl VideoMetadata {
    /// The duration in seconds, if it is usable.
    ///
    /// # Errors
    ///
    /// [`TransformError::InvalidDuration`] for zero, negative, infinite or NaN durations.
    pub fn valid_duration(&self) -> Result<f64, TransformError> {
        validate_duration(self.duration)
    }
}

/// Returns the video's duration in seconds.
///
/// # Errors
///
/// [`TransformError::InvalidDuration`] for zero, negative, infinite or NaN durations, or any
/// error of the decoder's probe.
#[instrument(skip_all, fields(bytes = video.len()))]
pub async fn probe_duration<D: VideoDecoder>(
    decoder: &D,
    video: &Blob,
) -> Result<f64, TransformError> {
    decoder.probe(video).await?.valid_duration()
}

/// Captures one frame near the start of the video and encodes it as JPEG.
///
/// The frame is taken at [`poster_seek_position`] and keeps the native frame size (a
/// decoder may report it transposed for rotated streams).
///
/// # Errors
///
/// [`TransformError::InvalidDuration`] as in [`probe_duration`], [`TransformError::Probe`]
/// when the stream has no frame size, [`TransformError::Seek`] when the captured frame does
/// not match the stream, and any decoder or encoder error.
#[instrument(skip_all, fields(bytes = video.len()))]
pub async fn extract_poster_frame<D: VideoDecoder>(
    decoder: &D,
    video: &Blob,
    quality: f32,
) -> Result<Blob, TransformError> {
    let metadata = decoder.probe(video).await?;
    poster_from_metadata(decoder, video, &metadata, quality).await
}

/// [`extract_poster_frame`] for a video that has already been probed.
///
/// # Errors
///
/// See [`extract_poster_frame`].
pub async fn poster_from_metadata<D: VideoDecoder>(
    decoder: &D,
    video: &Blob,
    metadata: &VideoMetadata,
    quality: f32,
) -> Result<Blob, TransformError> {
    let duration = metadata.valid_duration()?;
    if metadata.width == 0 || metadata.height == 0 {
        return Err(TransformError::Probe {
            message: "video stream has no frame size".into(),
            context: None,
        });
    }

    let at = poster_seek_position(duration);
    let frame = decoder.frame_at(video, at).await?;

    let native = (metadata.width, metadata.height);
    let captured = frame.dimensions();
    if captured != native && captured != (native.1, native.0) {
        return Err(TransformError::Seek {
            message: format!(
                "captured {}x{} frame, stream is {}x{}",
                captured.0, captured.1, native.0, native.1
            )
            .into(),
            context: Some(format!("at {at:.3}s").into()),
        });
    }

    let poster = tokio::task::spawn_blocking(move || encode_jpeg(&frame, quality))
        .await
        .map_err(|e| TransformError::worker(&e))??;

    debug!(at, duration, width = captured.0, height = captured.1, "Poster frame captured");
    Ok(poster)
}
