//! Well-known names shared by the stores, the facade and the CLI.

pub const DATABASE: &str = "media-db";
pub const PHOTO_COLLECTION: &str = "images";
pub const VIDEO_COLLECTION: &str = "videos";
pub const SCHEMA_VERSION: u32 = 1;

/// Prefix of the URLs minted for blob handles.
pub const BLOB_URL_PREFIX: &str = "blob:lumo/";
