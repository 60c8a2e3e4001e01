use image::codecs::jpeg::JpegEncoder;
use image::{ImageFormat, Rgb, RgbImage};
use lumo_domain::Blob;
use lumo_media::{ImagePreset, TransformError, compress};
use std::io::Cursor;

fn gradient(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, ((x / 7 + y / 5) % 256) as u8])
    })
}

fn jpeg(width: u32, height: u32) -> Blob {
    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, 95).encode_image(&gradient(width, height)).unwrap();
    Blob::from(out)
}

fn png(width: u32, height: u32) -> Blob {
    let mut out = Cursor::new(Vec::new());
    gradient(width, height).write_to(&mut out, ImageFormat::Png).unwrap();
    Blob::from(out.into_inner())
}

/// `jpeg` with an EXIF APP1 segment carrying `Orientation = 6` (rotate 90° clockwise).
fn rotated_jpeg(width: u32, height: u32) -> Blob {
    let plain = jpeg(width, height);
    let exif: &[u8] = &[
        b'E', b'x', b'i', b'f', 0, 0, // identifier
        b'M', b'M', 0, 42, 0, 0, 0, 8, // big-endian TIFF header, IFD at 8
        0, 1, // one entry
        0x01, 0x12, 0, 3, 0, 0, 0, 1, 0, 6, 0, 0, // Orientation, SHORT, 6
        0, 0, 0, 0, // no next IFD
    ];
    let length = u16::try_from(exif.len() + 2).unwrap().to_be_bytes();

    let mut out = plain[..2].to_vec();
    out.extend_from_slice(&[0xFF, 0xE1, length[0], length[1]]);
    out.extend_from_slice(exif);
    out.extend_from_slice(&plain[2..]);
    Blob::from(out)
}

fn decoded_size(blob: &Blob) -> (u32, u32) {
    let format = image::guess_format(blob).unwrap();
    assert_eq!(format, ImageFormat::Jpeg, "derivatives are always JPEG");
    let decoded = image::load_from_memory(blob).unwrap();
    (decoded.width(), decoded.height())
}

#[tokio::test]
async fn test_large_photo_fits_presets() {
    let source = jpeg(4000, 3000);

    let (display, thumbnail) = tokio::try_join!(
        compress(&source, ImagePreset::DISPLAY),
        compress(&source, ImagePreset::THUMBNAIL),
    )
    .unwrap();

    assert_eq!(decoded_size(&display), (1920, 1440));
    assert_eq!(decoded_size(&thumbnail), (300, 225));
    assert!(thumbnail.len() < display.len());
}

#[tokio::test]
async fn test_portrait_scales_by_height() {
    let display = compress(&jpeg(1200, 2400), ImagePreset::DISPLAY).await.unwrap();
    assert_eq!(decoded_size(&display), (960, 1920));
}

#[tokio::test]
async fn test_small_images_are_not_upscaled() {
    let display = compress(&png(640, 480), ImagePreset::DISPLAY).await.unwrap();
    assert_eq!(decoded_size(&display), (640, 480));
}

#[tokio::test]
async fn test_quality_controls_size() {
    let source = png(800, 600);
    let low = compress(&source, ImagePreset::new(1920, 0.2)).await.unwrap();
    let high = compress(&source, ImagePreset::new(1920, 0.95)).await.unwrap();
    assert!(low.len() < high.len());
}

#[tokio::test]
async fn test_corrupt_input_fails_to_decode() {
    let garbage = Blob::from(b"definitely not an image".to_vec());
    let err = compress(&garbage, ImagePreset::THUMBNAIL).await.unwrap_err();
    assert!(matches!(err, TransformError::Decode { context: Some(_), .. }), "{err}");

    let mut truncated = jpeg(64, 64).to_vec();
    truncated.truncate(10);
    let err = compress(&Blob::from(truncated), ImagePreset::THUMBNAIL).await.unwrap_err();
    assert!(matches!(err, TransformError::Decode { .. }), "{err}");
}

#[tokio::test]
async fn test_exif_orientation_is_applied() {
    let source = rotated_jpeg(400, 200);
    assert_eq!(image::load_from_memory(&source).unwrap().width(), 400);

    let display = compress(&source, ImagePreset::DISPLAY).await.unwrap();
    assert_eq!(decoded_size(&display), (200, 400));

    let thumbnail = compress(&source, ImagePreset::new(100, 0.7)).await.unwrap();
    assert_eq!(decoded_size(&thumbnail), (50, 100));
}
