use lumo_domain::Blob;
use lumo_storage::Record;
use serde::{Deserialize, Serialize};

/// A stored photo: a display-sized JPEG plus a thumbnail.
///
/// `thumbnail` never exceeds `original` in bytes or in either pixel dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRecord {
    pub id: String,
    pub original: Blob,
    pub thumbnail: Blob,
    /// Milliseconds since the Unix epoch.
    pub created_at: i64,
    /// Milliseconds since the Unix epoch.
    pub updated_at: i64,
}

impl Record for ImageRecord {
    fn id(&self) -> &str {
        &self.id
    }
}

/// A stored video: the untouched upload plus a poster frame at native size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoRecord {
    pub id: String,
    pub original: Blob,
    pub poster: Blob,
    /// Seconds, finite and greater than zero.
    pub duration: f64,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Record for VideoRecord {
    fn id(&self) -> &str {
        &self.id
    }
}

pub(crate) fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// `updated_at` for a record last touched at `previous`; always strictly later.
pub(crate) fn next_update(previous: i64) -> i64 {
    now_ms().max(previous.saturating_add(1))
}
