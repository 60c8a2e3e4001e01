//! The [`Database`] handle and the atomic file primitives every collection writes through.
//!
//! A database is a directory `<root>/<name>/`. Each collection owns a subdirectory, a schema
//! manifest `<collection>.schema.json`, and (while upgrading) a lock file
//! `<collection>.upgrade.lock` next to it.

use crate::builder::DatabaseBuilder;
use crate::codec::Record;
use crate::collection::CollectionBuilder;
use crate::error::StoreError;
use crate::security::StoreName;
use std::io;
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

pub(crate) const TMP_MARKER: &str = ".lumotmp.";

static INSTANCE_SEQ: AtomicU64 = AtomicU64::new(1);

/// Payload compression applied to newly written records.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub enum Compression {
    #[default]
    None,
    Lz4,
}

/// The internal shared state of a [`Database`] instance.
#[derive(Debug)]
pub struct DatabaseInner {
    pub(crate) root: PathBuf,
    pub(crate) name: StoreName,
    pub(crate) compression: Compression,
    pub(crate) create: bool,
    /// Distinguishes temp files of handles sharing one directory.
    pub(crate) instance: u64,
    pub(crate) tmp_counter: AtomicU64,
}

/// A cheap-to-clone handle to one named database under a root directory.
///
/// Building a `Database` performs no I/O. The directory is created (when `create` is set)
/// the first time one of its collections is opened.
///
/// # Example
///
/// ```rust
/// use lumo_storage::{Compression, Database, Record, StoreError};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Serialize, Deserialize)]
/// struct Note {
///     id: String,
///     text: String,
/// }
///
/// impl Record for Note {
///     fn id(&self) -> &str {
///         &self.id
///     }
/// }
///
/// #[tokio::main]
/// async fn main() -> Result<(), StoreError> {
///     # let tmp = tempfile::tempdir().unwrap();
///     let db = Database::builder()
///         .root(tmp.path())
///         .name("notes-db")
///         .compression(Compression::Lz4)
///         .build()?;
///
///     let notes = db.collection::<Note>("notes").version(1).build()?;
///     notes.add(&Note { id: "n1".into(), text: "hello".into() }).await?;
///     assert_eq!(notes.get("n1").await?.map(|n| n.text).as_deref(), Some("hello"));
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Database {
    pub(crate) inner: Arc<DatabaseInner>,
}

impl Deref for Database {
    type Target = DatabaseInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl Database {
    #[must_use = "The database is not configured until you call .build()"]
    pub fn builder() -> DatabaseBuilder {
        DatabaseBuilder::new()
    }

    pub(crate) fn from_parts(
        root: PathBuf,
        name: StoreName,
        compression: Compression,
        create: bool,
    ) -> Self {
        Self {
            inner: Arc::new(DatabaseInner {
                root,
                name,
                compression,
                create,
                instance: INSTANCE_SEQ.fetch_add(1, Ordering::Relaxed),
                tmp_counter: AtomicU64::new(1),
            }),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// The database directory, `<root>/<name>`.
    #[must_use]
    pub fn path(&self) -> PathBuf {
        self.root.join(self.name.as_str())
    }

    #[must_use]
    pub fn compression(&self) -> Compression {
        self.inner.compression
    }

    /// Starts configuring a typed collection of this database.
    #[must_use = "The collection is not configured until you call .build()"]
    pub fn collection<T: Record>(&self, name: impl Into<String>) -> CollectionBuilder<T> {
        CollectionBuilder::new(self.clone(), name.into())
    }

    /// Creates (when allowed) and resolves the database directory.
    pub(crate) async fn bootstrap(&self) -> Result<PathBuf, StoreError> {
        let dir = self.path();

        if self.create {
            fs::create_dir_all(&dir).await.map_err(|e| {
                StoreError::open(e.to_string(), format!("Failed to bootstrap {}", dir.display()))
            })?;
        }

        let canonical = fs::canonicalize(&dir).await.map_err(|e| {
            StoreError::open(e.to_string(), format!("Failed to resolve {}", dir.display()))
        })?;

        if !fs::metadata(&canonical).await.is_ok_and(|m| m.is_dir()) {
            return Err(StoreError::open(
                "database path is not a directory",
                canonical.display().to_string(),
            ));
        }

        info!(path = %canonical.display(), database = %self.name, "Database directory ready");
        Ok(canonical)
    }

    /// Reads a whole file, `None` when it does not exist.
    pub(crate) async fn read_file(path: &Path) -> io::Result<Option<Vec<u8>>> {
        match fs::read(path).await {
            Ok(data) => Ok(Some(data)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Writes `data` to a fresh temp file next to `target` and syncs it to disk.
    pub(crate) async fn stage(&self, target: &Path, data: &[u8]) -> io::Result<PathBuf> {
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).await?;
        }

        let temp = self.unique_tmp_path(target);
        let written = async {
            let mut file = match create_new(&temp).await {
                // The shard was removed under us; recreate it once.
                Err(err) if err.kind() == io::ErrorKind::NotFound => {
                    if let Some(parent) = target.parent() {
                        fs::create_dir_all(parent).await?;
                    }
                    create_new(&temp).await?
                },
                other => other?,
            };
            file.write_all(data).await?;
            file.sync_all().await
        }
        .await;

        if let Err(err) = written {
            discard(&temp).await;
            return Err(err);
        }
        Ok(temp)
    }

    /// Moves a staged file over `target`, replacing any existing file.
    pub(crate) async fn replace(staged: &Path, target: &Path) -> io::Result<()> {
        if let Err(err) = fs::rename(staged, target).await {
            if err.kind() != io::ErrorKind::AlreadyExists {
                discard(staged).await;
                return Err(err);
            }
            fs::remove_file(target).await?;
            fs::rename(staged, target).await?;
        }

        sync_parent(target).await;
        Ok(())
    }

    /// Publishes a staged file at `target` only if nothing is there yet.
    ///
    /// Returns `false` when `target` already exists. Uses a hard link, which fails atomically
    /// on an existing target even across processes; filesystems without hard links fall back
    /// to an existence check followed by a rename.
    pub(crate) async fn publish_new(staged: &Path, target: &Path) -> io::Result<bool> {
        let published = match fs::hard_link(staged, target).await {
            Ok(()) => true,
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => false,
            Err(err) => {
                debug!(error = %err, "Hard link unavailable, falling back to rename");
                if fs::try_exists(target).await? {
                    false
                } else {
                    fs::rename(staged, target).await?;
                    sync_parent(target).await;
                    return Ok(true);
                }
            },
        };

        discard(staged).await;
        if published {
            sync_parent(target).await;
        }
        Ok(published)
    }

    /// Atomically writes `data` to `target`, replacing any existing file.
    pub(crate) async fn write_atomic(&self, target: &Path, data: &[u8]) -> io::Result<()> {
        let staged = self.stage(target, data).await?;
        Self::replace(&staged, target).await
    }

    /// Removes a file, returning whether it existed.
    pub(crate) async fn remove_file(path: &Path) -> io::Result<bool> {
        match fs::remove_file(path).await {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err),
        }
    }

    fn unique_tmp_path(&self, target: &Path) -> PathBuf {
        let counter = self.tmp_counter.fetch_add(1, Ordering::Relaxed);
        let file_name = target.file_name().and_then(|s| s.to_str()).unwrap_or("record");
        let tmp_name =
            format!("{file_name}{TMP_MARKER}{}.{}.{counter}", std::process::id(), self.instance);
        target.with_file_name(tmp_name)
    }
}

async fn create_new(path: &Path) -> io::Result<fs::File> {
    fs::OpenOptions::new().create_new(true).write(true).open(path).await
}

async fn discard(path: &Path) {
    if let Err(err) = fs::remove_file(path).await
        && err.kind() != io::ErrorKind::NotFound
    {
        warn!(path = %path.display(), error = %err, "Failed to remove temp file");
    }
}

async fn sync_parent(path: &Path) {
    let Some(parent) = path.parent() else {
        return;
    };
    match fs::File::open(parent).await {
        Ok(dir) => {
            if let Err(err) = dir.sync_all().await {
                warn!(path = %parent.display(), error = %err, "Directory sync failed");
            }
        },
        Err(err) => {
            warn!(path = %parent.display(), error = %err, "Directory open failed");
        },
    }
}
