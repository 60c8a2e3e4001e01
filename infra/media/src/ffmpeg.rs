//! [`VideoDecoder`] backed by the `ffprobe` and `ffmpeg` command-line tools.

use crate::error::{TransformError, TransformErrorExt};
use crate::video::{VideoDecoder, VideoMetadata};
use image::{ImageFormat, RgbImage};
use lumo_domain::Blob;
use lumo_domain::config::FfmpegConfig;
use serde::Deserialize;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Output, Stdio};
use tempfile::NamedTempFile;
use tokio::process::Command;
use tracing::debug;

/// Runs `ffprobe` for metadata and `ffmpeg` for single-frame capture.
///
/// Each call spools the video to a private temp file that is removed when the call ends.
#[derive(Debug, Clone)]
pub struct FfmpegDecoder {
    ffmpeg: PathBuf,
    ffprobe: PathBuf,
}

impl Default for FfmpegDecoder {
    fn default() -> Self {
        Self::from_config(&FfmpegConfig::default())
    }
}

impl FfmpegDecoder {
    #[must_use]
    pub fn new(ffmpeg: impl Into<PathBuf>, ffprobe: impl Into<PathBuf>) -> Self {
        Self { ffmpeg: ffmpeg.into(), ffprobe: ffprobe.into() }
    }

    #[must_use]
    pub fn from_config(config: &FfmpegConfig) -> Self {
        Self::new(&config.ffmpeg, &config.ffprobe)
    }
}

impl VideoDecoder for FfmpegDecoder {
    async fn probe(&self, video: &Blob) -> Result<VideoMetadata, TransformError> {
        let file = spool(video).await?;
        let output = run(
            Command::new(&self.ffprobe)
                .args(["-v", "error", "-select_streams", "v:0"])
                .args(["-show_entries", "stream=width,height:format=duration", "-of", "json"])
                .arg(file.path()),
        )
        .await
        .context("Failed to run ffprobe")?;

        if !output.status.success() {
            return Err(TransformError::Probe {
                message: stderr_message(&output).into(),
                context: Some(format!("ffprobe exited with {}", output.status).into()),
            });
        }

        let metadata = parse_probe(&output.stdout)?;
        debug!(?metadata, "Video probed");
        Ok(metadata)
    }

    async fn frame_at(&self, video: &Blob, seconds: f64) -> Result<RgbImage, TransformError> {
        let file = spool(video).await?;
        let output = run(
            Command::new(&self.ffmpeg)
                .args(["-v", "error", "-ss", &format!("{seconds:.3}"), "-i"])
                .arg(file.path())
                .args(["-frames:v", "1", "-f", "image2pipe", "-vcodec", "png", "-"]),
        )
        .await
        .context("Failed to run ffmpeg")?;

        if !output.status.success() {
            return Err(TransformError::Seek {
                message: stderr_message(&output).into(),
                context: Some(format!("ffmpeg exited with {}", output.status).into()),
            });
        }
        if output.stdout.is_empty() {
            return Err(TransformError::Seek {
                message: format!("no frame decoded at {seconds:.3}s").into(),
                context: None,
            });
        }

        tokio::task::spawn_blocking(move || {
            image::load_from_memory_with_format(&output.stdout, ImageFormat::Png)
                .map(|frame| frame.to_rgb8())
                .context("ffmpeg returned an unreadable frame")
        })
        .await
        .map_err(|e| TransformError::worker(&e))?
    }
}

async fn spool(video: &Blob) -> Result<NamedTempFile, TransformError> {
    let video = video.clone();
    tokio::task::spawn_blocking(move || {
        let mut file = NamedTempFile::with_prefix("lumo-video-")?;
        file.write_all(&video)?;
        file.flush()?;
        Ok::<_, std::io::Error>(file)
    })
    .await
    .map_err(|e| TransformError::worker(&e))?
    .context("Failed to spool video to a temp file")
}

async fn run(command: &mut Command) -> std::io::Result<Output> {
    command.stdin(Stdio::null()).kill_on_drop(true).output().await
}

fn stderr_message(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let trimmed = stderr.trim();
    if trimmed.is_empty() { "no diagnostic output".to_owned() } else { trimmed.to_owned() }
}

#[derive(Debug, Deserialize)]
struct ProbeReport {
    #[serde(default)]
    streams: Vec<ProbeStream>,
    format: Option<ProbeFormat>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    width: Option<u32>,
    height: Option<u32>,
}

/// `ffprobe` prints the duration as a decimal string, or `N/A`.
#[derive(Debug, Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

fn parse_probe(stdout: &[u8]) -> Result<VideoMetadata, TransformError> {
    let report: ProbeReport = serde_json::from_slice(stdout).map_err(|e| TransformError::Probe {
        message: e.to_string().into(),
        context: Some("Unreadable ffprobe report".into()),
    })?;

    let stream = report.streams.first().ok_or_else(|| TransformError::Probe {
        message: "input has no video stream".into(),
        context: None,
    })?;

    let duration = report
        .format
        .and_then(|f| f.duration)
        .and_then(|d| d.trim().parse::<f64>().ok())
        .unwrap_or(f64::NAN);

    Ok(VideoMetadata {
        width: stream.width.unwrap_or(0),
        height: stream.height.unwrap_or(0),
        duration,
    })
}
