//! # CLI Argument Definitions

use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};

#[derive(Debug, Parser)]
#[command(name = "lumo")]
#[command(author = env!("CARGO_PKG_AUTHORS"))]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(arg_required_else_help = true)]
#[command(about = "Import, inspect and export slideshow media")]
pub struct Cli {
    /// Config file (TOML, JSON or YAML); `lumo.*` in the working directory when omitted
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store a new photo or video
    Import {
        file: PathBuf,
        /// Record id; a random one is generated when omitted
        #[arg(long)]
        id: Option<String>,
        /// Overrides detection from the file extension
        #[arg(short, long)]
        kind: Option<MediaKind>,
    },
    /// Replace the media of an existing record
    Replace {
        id: String,
        file: PathBuf,
        #[arg(short, long)]
        kind: Option<MediaKind>,
    },
    /// List stored ids
    List {
        #[arg(short, long)]
        kind: Option<MediaKind>,
    },
    /// Print the metadata of one record
    Show {
        id: String,
        #[arg(short, long, default_value = "photo")]
        kind: MediaKind,
    },
    /// Write one stored blob to a file
    Export {
        id: String,
        dest: PathBuf,
        #[arg(short, long, default_value = "original")]
        variant: Variant,
        #[arg(short, long, default_value = "photo")]
        kind: MediaKind,
    },
    /// Remove a record; unknown ids are ignored
    Delete {
        id: String,
        #[arg(short, long, default_value = "photo")]
        kind: MediaKind,
    },
    /// Remove every record
    Clear {
        #[arg(short, long)]
        kind: Option<MediaKind>,
        /// Required confirmation
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MediaKind {
    Photo,
    Video,
}

impl MediaKind {
    const PHOTO_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp", "webp"];
    const VIDEO_EXTENSIONS: &[&str] = &["mp4", "m4v", "mov", "webm", "mkv", "avi"];

    /// Guesses the kind from a file extension.
    #[must_use]
    pub fn detect(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        if Self::PHOTO_EXTENSIONS.contains(&ext.as_str()) {
            Some(Self::Photo)
        } else if Self::VIDEO_EXTENSIONS.contains(&ext.as_str()) {
            Some(Self::Video)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Variant {
    /// Display image of a photo, upload of a video
    Original,
    Thumbnail,
    Poster,
}
