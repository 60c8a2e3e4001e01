#![allow(dead_code)]

use image::codecs::jpeg::JpegEncoder;
use image::{Rgb, RgbImage};
use lumo_domain::Blob;
use lumo_media::{TransformError, VideoDecoder, VideoMetadata};
use lumo_storage::Database;
use std::path::Path;

pub fn database(root: &Path) -> Database {
    Database::builder().root(root).name("media-db").build().unwrap()
}

/// A gradient JPEG, so the encoder has real detail to compress.
pub fn jpeg(width: u32, height: u32) -> Blob {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, ((x ^ y) % 256) as u8])
    });
    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, 95).encode_image(&img).unwrap();
    Blob::from(out)
}

pub fn dimensions(blob: &Blob) -> (u32, u32) {
    let decoded = image::load_from_memory(blob).unwrap();
    (decoded.width(), decoded.height())
}

/// Reports fixed metadata and paints solid frames of the reported size.
#[derive(Debug, Clone, Copy)]
pub struct FakeDecoder {
    pub width: u32,
    pub height: u32,
    pub duration: f64,
}

impl VideoDecoder for FakeDecoder {
    async fn probe(&self, _video: &Blob) -> Result<VideoMetadata, TransformError> {
        Ok(VideoMetadata { width: self.width, height: self.height, duration: self.duration })
    }

    async fn frame_at(&self, _video: &Blob, _seconds: f64) -> Result<RgbImage, TransformError> {
        Ok(RgbImage::from_pixel(self.width, self.height, Rgb([200, 120, 40])))
    }
}
