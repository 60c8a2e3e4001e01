use crate::engine::TMP_MARKER;
use crate::security::{self, RECORD_EXTENSION};
use std::io;
use std::path::Path;
use std::time::{Duration, SystemTime};
use tracing::{error, info, warn};
use walkdir::{DirEntry, WalkDir};

const STALE_AFTER: Duration = Duration::from_secs(300);
const LOCK_SUFFIX: &str = ".upgrade.lock";

/// Removes temp files and upgrade locks left behind by crashed writers.
///
/// Runs whenever a collection is opened. Failures are logged and never fail the open.
pub(crate) async fn purge_stale(db_dir: &Path) {
    let db_dir = db_dir.to_path_buf();
    let now = SystemTime::now();

    match tokio::task::spawn_blocking(move || remove_stale(&db_dir, now, STALE_AFTER)).await {
        Ok((removed, failed)) if removed > 0 || failed > 0 => {
            info!(removed, failed, "Cleaned up stale temp and lock files");
        },
        Err(e) => {
            error!(error = %e, "Stale file cleanup task panicked");
        },
        _ => {},
    }
}

fn remove_stale(db_dir: &Path, now: SystemTime, threshold: Duration) -> (usize, usize) {
    let mut removed = 0;
    let mut failed = 0;

    WalkDir::new(db_dir).min_depth(1).contents_first(true).into_iter().flatten().for_each(
        |entry| {
            let path = entry.path();

            if entry.file_type().is_file() && is_leftover(&entry) && is_stale(&entry, now, threshold)
            {
                match std::fs::remove_file(path) {
                    Ok(()) => removed += 1,
                    Err(e) => {
                        warn!(p = %path.display(), err = %e, "IO fail");
                        failed += 1;
                    },
                }
            }
        },
    );

    (removed, failed)
}

fn is_leftover(entry: &DirEntry) -> bool {
    entry.file_name().to_str().is_some_and(|name| {
        name.contains(TMP_MARKER) || (entry.depth() == 1 && name.ends_with(LOCK_SUFFIX))
    })
}

fn is_stale(entry: &DirEntry, now: SystemTime, threshold: Duration) -> bool {
    entry
        .metadata()
        .ok()
        .and_then(|m| m.modified().ok())
        .map(|modified| now.duration_since(modified).unwrap_or_default())
        .is_none_or(|age| age > threshold)
}

/// Lists the ids of all records under a collection directory, sorted.
pub(crate) fn scan_keys(dir: &Path) -> io::Result<Vec<String>> {
    let mut keys = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1) {
        let entry = entry?;
        if entry.file_type().is_file()
            && let Some(key) = security::key_from_path(entry.path())
        {
            keys.push(key);
        }
    }
    keys.sort_unstable();
    Ok(keys)
}

/// Deletes every record file under a collection directory.
///
/// Shard directories stay: another instance may be staging a write into one of them.
pub(crate) fn remove_records(dir: &Path) -> io::Result<usize> {
    let mut removed = 0;
    for entry in WalkDir::new(dir).min_depth(1) {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type().is_file()
            && path.extension().and_then(|e| e.to_str()) == Some(RECORD_EXTENSION)
        {
            match std::fs::remove_file(path) {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == io::ErrorKind::NotFound => {},
                Err(e) => return Err(e),
            }
        }
    }
    Ok(removed)
}
