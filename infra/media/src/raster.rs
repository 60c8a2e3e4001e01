//! Bounded lossy image derivatives.
//!
//! Every derivative is a baseline JPEG: decode upright (EXIF orientation applied), scale
//! uniformly so the longest side fits the preset (never upscaling), then re-encode at the
//! preset quality. Metadata is not carried over.

use crate::error::{TransformError, TransformErrorExt};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageDecoder, ImageError, ImageReader, RgbImage};
use lumo_domain::Blob;
use lumo_domain::config::PresetConfig;
use std::io::Cursor;
use tracing::{debug, instrument};

/// Quality used for video poster frames.
pub const POSTER_QUALITY: f32 = 0.70;

/// A resize/re-encode target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImagePreset {
    /// Longest side in pixels.
    pub max_dimension: u32,
    /// Lossy quality in `0.0..=1.0`.
    pub quality: f32,
}

impl ImagePreset {
    /// Full-screen display copy.
    pub const DISPLAY: Self = Self { max_dimension: 1920, quality: 0.85 };
    /// Grid thumbnail.
    pub const THUMBNAIL: Self = Self { max_dimension: 300, quality: 0.70 };

    #[must_use]
    pub const fn new(max_dimension: u32, quality: f32) -> Self {
        Self { max_dimension, quality }
    }
}

impl From<PresetConfig> for ImagePreset {
    fn from(config: PresetConfig) -> Self {
        Self::new(config.max_dimension, config.quality)
    }
}

/// Output size for `width`×`height` scaled by `min(1, max_dimension / max(width, height))`.
///
/// Sides are rounded and never drop below one pixel.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn target_dimensions(width: u32, height: u32, max_dimension: u32) -> (u32, u32) {
    let longest = width.max(height);
    if longest == 0 || longest <= max_dimension {
        return (width, height);
    }

    let scale = f64::from(max_dimension) / f64::from(longest);
    let side = |v: u32| (f64::from(v) * scale).round().max(1.0) as u32;
    (side(width), side(height))
}

/// Maps `0.0..=1.0` onto the encoder's `1..=100` scale.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn jpeg_quality(quality: f32) -> u8 {
    if !quality.is_finite() {
        return 1;
    }
    ((quality.clamp(0.0, 1.0) * 100.0).round() as u8).max(1)
}

/// Produces a bounded JPEG derivative of an encoded image on the blocking pool.
///
/// # Errors
///
/// [`TransformError::Decode`] when the input is not a decodable image,
/// [`TransformError::Encode`] when encoding fails.
#[instrument(skip(source), fields(bytes = source.len()))]
pub async fn compress(source: &Blob, preset: ImagePreset) -> Result<Blob, TransformError> {
    let source = source.clone();
    tokio::task::spawn_blocking(move || compress_blocking(&source, preset))
        .await
        .map_err(|e| TransformError::worker(&e))?
}

/// Synchronous core of [`compress`].
///
/// # Errors
///
/// See [`compress`].
pub fn compress_blocking(source: &[u8], preset: ImagePreset) -> Result<Blob, TransformError> {
    let decoded = decode_upright(source).context("Source is not a decodable image")?;
    let (width, height) = (decoded.width(), decoded.height());
    let (target_w, target_h) = target_dimensions(width, height, preset.max_dimension);

    let resized = if (target_w, target_h) == (width, height) {
        decoded
    } else {
        decoded.resize_exact(target_w, target_h, FilterType::Triangle)
    };

    let blob = encode_jpeg(&flatten(resized), preset.quality)?;
    debug!(width, height, target_w, target_h, out = blob.len(), "Image derivative encoded");
    Ok(blob)
}

/// Encodes an RGB frame as JPEG.
///
/// # Errors
///
/// [`TransformError::Encode`] when the encoder rejects the frame.
pub fn encode_jpeg(frame: &RgbImage, quality: f32) -> Result<Blob, TransformError> {
    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, jpeg_quality(quality)).encode_image(frame).map_err(
        |e| TransformError::Encode {
            message: e.to_string().into(),
            context: Some(format!("{}x{} frame", frame.width(), frame.height()).into()),
        },
    )?;
    Ok(Blob::from(out))
}

fn decode_upright(source: &[u8]) -> Result<DynamicImage, ImageError> {
    let mut decoder = ImageReader::new(Cursor::new(source))
        .with_guessed_format()
        .map_err(ImageError::IoError)?
        .into_decoder()?;
    let orientation = decoder.orientation()?;
    let mut decoded = DynamicImage::from_decoder(decoder)?;
    decoded.apply_orientation(orientation);
    Ok(decoded)
}

fn flatten(image: DynamicImage) -> RgbImage {
    match image {
        DynamicImage::ImageRgb8(rgb) => rgb,
        other => other.to_rgb8(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scales_longest_side_only_when_larger() {
        assert_eq!(target_dimensions(4000, 3000, 1920), (1920, 1440));
        assert_eq!(target_dimensions(3000, 4000, 300), (225, 300));
        assert_eq!(target_dimensions(800, 600, 1920), (800, 600));
        assert_eq!(target_dimensions(1920, 1080, 1920), (1920, 1080));
    }

    #[test]
    fn extreme_aspect_ratios_keep_one_pixel() {
        assert_eq!(target_dimensions(10_000, 2, 300), (300, 1));
        assert_eq!(target_dimensions(0, 0, 300), (0, 0));
    }

    #[test]
    fn quality_maps_to_encoder_scale() {
        assert_eq!(jpeg_quality(0.85), 85);
        assert_eq!(jpeg_quality(0.70), 70);
        assert_eq!(jpeg_quality(1.5), 100);
        assert_eq!(jpeg_quality(0.0), 1);
        assert_eq!(jpeg_quality(f32::NAN), 1);
    }

    #[test]
    fn presets_follow_config() {
        assert_eq!(ImagePreset::from(PresetConfig::DISPLAY), ImagePreset::DISPLAY);
        assert_eq!(ImagePreset::from(PresetConfig::THUMBNAIL), ImagePreset::THUMBNAIL);
    }
}
