use image::{Rgb, RgbImage};
use lumo_domain::Blob;
use lumo_media::{
    POSTER_QUALITY, TransformError, VideoDecoder, VideoMetadata, extract_poster_frame,
    probe_duration,
};
use std::sync::Mutex;

/// Decodes nothing; reports fixed metadata and paints frames of a fixed size.
#[derive(Debug)]
struct FakeDecoder {
    metadata: VideoMetadata,
    frame: (u32, u32),
    seeks: Mutex<Vec<f64>>,
}

impl FakeDecoder {
    fn new(width: u32, height: u32, duration: f64) -> Self {
        Self {
            metadata: VideoMetadata { width, height, duration },
            frame: (width, height),
            seeks: Mutex::new(Vec::new()),
        }
    }
}

impl VideoDecoder for FakeDecoder {
    async fn probe(&self, _video: &Blob) -> Result<VideoMetadata, TransformError> {
        Ok(self.metadata)
    }

    async fn frame_at(&self, _video: &Blob, seconds: f64) -> Result<RgbImage, TransformError> {
        self.seeks.lock().unwrap().push(seconds);
        Ok(RgbImage::from_pixel(self.frame.0, self.frame.1, Rgb([30, 60, 90])))
    }
}

fn clip() -> Blob {
    Blob::from(vec![0u8; 64])
}

fn poster_size(poster: &Blob) -> (u32, u32) {
    let decoded = image::load_from_memory(poster).unwrap();
    (decoded.width(), decoded.height())
}

#[tokio::test]
async fn test_poster_keeps_native_size() {
    let decoder = FakeDecoder::new(1280, 720, 12.0);
    let poster = extract_poster_frame(&decoder, &clip(), POSTER_QUALITY).await.unwrap();

    assert_eq!(poster_size(&poster), (1280, 720));
    assert_eq!(*decoder.seeks.lock().unwrap(), [1.0]);
}

#[tokio::test]
async fn test_short_clips_seek_to_midpoint() {
    let decoder = FakeDecoder::new(320, 240, 0.8);
    extract_poster_frame(&decoder, &clip(), POSTER_QUALITY).await.unwrap();

    let seeks = decoder.seeks.lock().unwrap();
    assert!((seeks[0] - 0.4).abs() < 1e-9);
}

#[tokio::test]
async fn test_invalid_durations_fail() {
    for duration in [0.0, f64::NAN, f64::INFINITY, -2.0] {
        let decoder = FakeDecoder::new(320, 240, duration);

        let err = probe_duration(&decoder, &clip()).await.unwrap_err();
        assert!(matches!(err, TransformError::InvalidDuration { .. }));

        let err = extract_poster_frame(&decoder, &clip(), POSTER_QUALITY).await.unwrap_err();
        assert!(matches!(err, TransformError::InvalidDuration { .. }));
        assert!(decoder.seeks.lock().unwrap().is_empty(), "no seek for invalid input");
    }
}

#[tokio::test]
async fn test_probe_duration_reports_seconds() {
    let decoder = FakeDecoder::new(320, 240, 42.5);
    let duration = probe_duration(&decoder, &clip()).await.unwrap();
    assert!((duration - 42.5).abs() < f64::EPSILON);
}

#[tokio::test]
async fn test_mismatched_frame_is_a_seek_error() {
    let mut decoder = FakeDecoder::new(1920, 1080, 5.0);
    decoder.frame = (640, 360);

    let err = extract_poster_frame(&decoder, &clip(), POSTER_QUALITY).await.unwrap_err();
    assert!(matches!(err, TransformError::Seek { .. }), "{err}");
}

#[tokio::test]
async fn test_rotated_frames_are_accepted() {
    let mut decoder = FakeDecoder::new(1920, 1080, 5.0);
    decoder.frame = (1080, 1920);

    let poster = extract_poster_frame(&decoder, &clip(), POSTER_QUALITY).await.unwrap();
    assert_eq!(poster_size(&poster), (1080, 1920));
}
