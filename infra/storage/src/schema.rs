//! Per-collection schema versions and the upgrade hook.
//!
//! Each collection persists its own version in `<collection>.schema.json`, so collections
//! sharing a database upgrade independently. Opening a collection whose requested version is
//! higher than the persisted one runs the upgrade hook once, under an exclusive lock file.

use crate::engine::Database;
use crate::error::StoreError;
use crate::security::StoreName;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::fs;
use tracing::{debug, warn};

const LOCK_RETRY_DELAY: Duration = Duration::from_millis(20);
const LOCK_RETRIES: u32 = 50;

/// Called as `hook(ctx, old_version, new_version)` when a collection is opened at a version
/// above the persisted one. `old_version` is `0` for a collection that was never opened.
pub type UpgradeHook =
    Arc<dyn Fn(&mut UpgradeContext, u32, u32) -> Result<(), StoreError> + Send + Sync>;

/// The hook used when none is configured: make sure the collection exists.
pub(crate) fn default_hook() -> UpgradeHook {
    Arc::new(|ctx: &mut UpgradeContext, _: u32, _: u32| {
        ctx.ensure_collection();
        Ok(())
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UpgradeStep {
    Create,
    Drop,
}

/// Structural changes requested by an upgrade hook, applied after it returns.
pub struct UpgradeContext {
    collection: String,
    exists: bool,
    steps: Vec<UpgradeStep>,
}

impl fmt::Debug for UpgradeContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpgradeContext")
            .field("collection", &self.collection)
            .field("exists", &self.exists)
            .field("pending", &self.steps.len())
            .finish()
    }
}

impl UpgradeContext {
    pub(crate) const fn new(collection: String, exists: bool) -> Self {
        Self { collection, exists, steps: Vec::new() }
    }

    /// The name of the collection being upgraded.
    #[must_use]
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Whether the collection exists, including changes queued by this hook.
    #[must_use]
    pub const fn contains_collection(&self) -> bool {
        self.exists
    }

    /// Creates the collection unless it already exists.
    pub fn ensure_collection(&mut self) {
        if !self.exists {
            self.steps.push(UpgradeStep::Create);
            self.exists = true;
        }
    }

    /// Removes the collection and every record in it.
    pub fn drop_collection(&mut self) {
        if self.exists {
            self.steps.push(UpgradeStep::Drop);
            self.exists = false;
        }
    }

    pub(crate) async fn apply(self, dir: &Path) -> io::Result<()> {
        for step in self.steps {
            match step {
                UpgradeStep::Create => fs::create_dir_all(dir).await?,
                UpgradeStep::Drop => match fs::remove_dir_all(dir).await {
                    Ok(()) => {},
                    Err(err) if err.kind() == io::ErrorKind::NotFound => {},
                    Err(err) => return Err(err),
                },
            }
            debug!(collection = %self.collection, ?step, "Applied upgrade step");
        }
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct SchemaManifest {
    collection: String,
    version: u32,
    /// Milliseconds since the Unix epoch.
    upgraded_at: i64,
}

pub(crate) fn manifest_path(db_dir: &Path, name: &StoreName) -> PathBuf {
    db_dir.join(format!("{name}.schema.json"))
}

/// Reads the persisted schema version, `0` when the collection was never opened.
pub(crate) async fn read_version(path: &Path) -> Result<u32, StoreError> {
    let Some(bytes) = Database::read_file(path).await.map_err(|e| {
        StoreError::open(e.to_string(), format!("Failed to read {}", path.display()))
    })?
    else {
        return Ok(0);
    };

    serde_json::from_slice::<SchemaManifest>(&bytes).map(|m| m.version).map_err(|e| {
        StoreError::open(e.to_string(), format!("Corrupt schema manifest {}", path.display()))
    })
}

pub(crate) async fn write_version(
    db: &Database,
    path: &Path,
    name: &StoreName,
    version: u32,
) -> Result<(), StoreError> {
    let manifest = SchemaManifest {
        collection: name.to_string(),
        version,
        upgraded_at: chrono::Utc::now().timestamp_millis(),
    };
    let bytes = serde_json::to_vec_pretty(&manifest)
        .map_err(|e| StoreError::open(e.to_string(), "Failed to encode schema manifest"))?;

    db.write_atomic(path, &bytes).await.map_err(|e| {
        StoreError::open(e.to_string(), format!("Failed to write {}", path.display()))
    })
}

/// Exclusive right to upgrade one collection, held as `<collection>.upgrade.lock`.
#[derive(Debug)]
pub(crate) struct UpgradeLock {
    path: PathBuf,
}

impl UpgradeLock {
    /// Takes the lock, waiting briefly for a concurrent upgrade to finish.
    ///
    /// # Errors
    ///
    /// [`StoreError::DatabaseOpen`] when another connection keeps the lock.
    pub(crate) async fn acquire(db_dir: &Path, name: &StoreName) -> Result<Self, StoreError> {
        let path = db_dir.join(format!("{name}.upgrade.lock"));

        for _ in 0..LOCK_RETRIES {
            match fs::OpenOptions::new().create_new(true).write(true).open(&path).await {
                Ok(_) => return Ok(Self { path }),
                Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
                    tokio::time::sleep(LOCK_RETRY_DELAY).await;
                },
                Err(err) => {
                    return Err(StoreError::open(
                        err.to_string(),
                        format!("Failed to create {}", path.display()),
                    ));
                },
            }
        }

        Err(StoreError::open(
            format!("Upgrade of '{name}' is blocked by another connection"),
            path.display().to_string(),
        ))
    }
}

impl Drop for UpgradeLock {
    fn drop(&mut self) {
        if let Err(err) = std::fs::remove_file(&self.path) {
            warn!(path = %self.path.display(), error = %err, "Failed to release upgrade lock");
        }
    }
}
