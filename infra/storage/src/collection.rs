//! Typed collections: lazy memoized open plus the single-record operations.

use crate::codec::{self, Record};
use crate::engine::Database;
use crate::error::StoreError;
use crate::maintenance;
use crate::schema::{self, UpgradeContext, UpgradeHook, UpgradeLock};
use crate::security::{self, StoreName};
use crate::transaction::{Operation, Scheduler};
use std::borrow::Cow;
use std::fmt;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::sync::OnceCell;
use tracing::{debug, info, instrument};

/// Configures a [`Collection`]. Obtained from [`Database::collection`].
pub struct CollectionBuilder<T> {
    database: Database,
    name: String,
    version: u32,
    upgrade: UpgradeHook,
    _record: PhantomData<fn() -> T>,
}

impl<T> fmt::Debug for CollectionBuilder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollectionBuilder")
            .field("database", &self.database.name())
            .field("name", &self.name)
            .field("version", &self.version)
            .finish_non_exhaustive()
    }
}

impl<T: Record> CollectionBuilder<T> {
    pub(crate) fn new(database: Database, name: String) -> Self {
        Self { database, name, version: 1, upgrade: schema::default_hook(), _record: PhantomData }
    }

    /// The schema version this handle expects. Defaults to `1`.
    #[must_use = "Sets the expected schema version"]
    pub const fn version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    /// Replaces the default upgrade hook, which only ensures the collection exists.
    ///
    /// The hook must leave the collection existing (via
    /// [`UpgradeContext::ensure_collection`]) or the open fails.
    #[must_use = "Sets the upgrade hook"]
    pub fn on_upgrade<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut UpgradeContext, u32, u32) -> Result<(), StoreError> + Send + Sync + 'static,
    {
        self.upgrade = Arc::new(hook);
        self
    }

    /// Validates the configuration. Performs no I/O.
    ///
    /// # Errors
    ///
    /// [`StoreError::Configuration`] for an invalid collection name or a version of `0`.
    pub fn build(self) -> Result<Collection<T>, StoreError> {
        let name = StoreName::parse("collection", &self.name)?;
        if self.version == 0 {
            return Err(StoreError::Configuration {
                message: "Schema version must be at least 1".into(),
                context: Some(format!("collection '{name}'").into()),
            });
        }

        Ok(Collection {
            database: self.database,
            name,
            version: self.version,
            upgrade: self.upgrade,
            connection: OnceCell::new(),
            _record: PhantomData,
        })
    }
}

#[derive(Debug)]
struct Connection {
    dir: PathBuf,
    scheduler: Scheduler,
}

/// A failed open, kept so every later call reports the same error.
#[derive(Debug, Clone)]
struct OpenFailure {
    message: Cow<'static, str>,
    context: Option<Cow<'static, str>>,
}

impl From<StoreError> for OpenFailure {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DatabaseOpen { message, context } => Self { message, context },
            other => Self { message: other.to_string().into(), context: None },
        }
    }
}

impl OpenFailure {
    fn to_error(&self) -> StoreError {
        StoreError::DatabaseOpen { message: self.message.clone(), context: self.context.clone() }
    }
}

/// A typed, versioned collection of records keyed by [`Record::id`].
///
/// The collection is opened on first use and the outcome (success or failure) is memoized
/// for the lifetime of this value: concurrent first calls share one open, and the upgrade
/// hook runs at most once. Every operation runs in its own transaction; there is no
/// cross-call atomicity.
pub struct Collection<T> {
    database: Database,
    name: StoreName,
    version: u32,
    upgrade: UpgradeHook,
    connection: OnceCell<Result<Connection, OpenFailure>>,
    _record: PhantomData<fn() -> T>,
}

impl<T> fmt::Debug for Collection<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collection")
            .field("database", &self.database.name())
            .field("name", &self.name)
            .field("version", &self.version)
            .field("opened", &self.connection.initialized())
            .finish_non_exhaustive()
    }
}

impl<T: Record> Collection<T> {
    /// Same as [`Database::collection`].
    pub fn builder(database: &Database, name: impl Into<String>) -> CollectionBuilder<T> {
        database.collection(name)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    #[must_use]
    pub const fn version(&self) -> u32 {
        self.version
    }

    #[must_use]
    pub const fn database(&self) -> &Database {
        &self.database
    }

    /// Opens the collection now instead of on first use.
    ///
    /// # Errors
    ///
    /// [`StoreError::DatabaseOpen`] if the database cannot be opened or upgraded.
    pub async fn open(&self) -> Result<(), StoreError> {
        self.connection().await.map(|_| ())
    }

    /// Reads one record, `None` when the id is absent.
    ///
    /// # Errors
    ///
    /// [`StoreError::InvalidKey`], [`StoreError::DatabaseOpen`], or
    /// [`StoreError::Transaction`] on I/O or decoding failures.
    pub async fn get(&self, id: &str) -> Result<Option<T>, StoreError> {
        let connection = self.connection().await?;
        let path = security::record_path(&connection.dir, id)?;
        let tx = connection.scheduler.begin(Operation::Get, id.to_owned()).await;

        let Some(bytes) = Database::read_file(&path).await.map_err(|e| tx.fail(e))? else {
            return Ok(None);
        };
        let record: T = codec::decode(&bytes).map_err(|e| tx.fail(e))?;
        if record.id() != id {
            return Err(tx.fail("stored record id does not match its key"));
        }
        Ok(Some(record))
    }

    /// Lists every record id in ascending order.
    ///
    /// # Errors
    ///
    /// [`StoreError::DatabaseOpen`] or [`StoreError::Transaction`].
    pub async fn get_all_keys(&self) -> Result<Vec<String>, StoreError> {
        let connection = self.connection().await?;
        let tx = connection.scheduler.begin(Operation::GetAllKeys, "*").await;

        let dir = connection.dir.clone();
        tokio::task::spawn_blocking(move || maintenance::scan_keys(&dir))
            .await
            .map_err(|e| tx.fail(e))?
            .map_err(|e| tx.fail(e))
    }

    /// Inserts a record whose id must not exist yet.
    ///
    /// # Errors
    ///
    /// [`StoreError::DuplicateKey`] if the id is taken, otherwise as [`Collection::put`].
    pub async fn add(&self, record: &T) -> Result<(), StoreError> {
        let connection = self.connection().await?;
        let id = record.id();
        let path = security::record_path(&connection.dir, id)?;
        let bytes = self.encode(Operation::Add, record)?;

        let tx = connection.scheduler.begin(Operation::Add, id.to_owned()).await;
        let staged = self.database.stage(&path, &bytes).await.map_err(|e| tx.fail(e))?;
        if !Database::publish_new(&staged, &path).await.map_err(|e| tx.fail(e))? {
            return Err(StoreError::DuplicateKey {
                key: id.to_owned().into(),
                context: Some(format!("collection '{}'", self.name).into()),
            });
        }

        debug!(collection = %self.name, key = tx.key(), bytes = bytes.len(), "Record added");
        Ok(())
    }

    /// Inserts or fully replaces a record.
    ///
    /// # Errors
    ///
    /// [`StoreError::InvalidKey`], [`StoreError::DatabaseOpen`], or
    /// [`StoreError::Transaction`] on encoding or I/O failures.
    pub async fn put(&self, record: &T) -> Result<(), StoreError> {
        let connection = self.connection().await?;
        let id = record.id();
        let path = security::record_path(&connection.dir, id)?;
        let bytes = self.encode(Operation::Put, record)?;

        let tx = connection.scheduler.begin(Operation::Put, id.to_owned()).await;
        let staged = self.database.stage(&path, &bytes).await.map_err(|e| tx.fail(e))?;
        Database::replace(&staged, &path).await.map_err(|e| tx.fail(e))?;

        debug!(collection = %self.name, key = tx.key(), bytes = bytes.len(), "Record stored");
        Ok(())
    }

    /// Removes a record. Removing an absent id succeeds.
    ///
    /// # Errors
    ///
    /// [`StoreError::InvalidKey`], [`StoreError::DatabaseOpen`], or
    /// [`StoreError::Transaction`].
    pub async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let connection = self.connection().await?;
        let path = security::record_path(&connection.dir, id)?;
        let tx = connection.scheduler.begin(Operation::Delete, id.to_owned()).await;

        let existed = Database::remove_file(&path).await.map_err(|e| tx.fail(e))?;
        debug!(collection = %self.name, key = tx.key(), existed, "Record deleted");
        Ok(())
    }

    /// Removes every record, keeping the collection and its schema version.
    ///
    /// # Errors
    ///
    /// [`StoreError::DatabaseOpen`] or [`StoreError::Transaction`].
    pub async fn clear(&self) -> Result<(), StoreError> {
        let connection = self.connection().await?;
        let tx = connection.scheduler.begin(Operation::Clear, "*").await;

        let dir = connection.dir.clone();
        let removed = tokio::task::spawn_blocking(move || maintenance::remove_records(&dir))
            .await
            .map_err(|e| tx.fail(e))?
            .map_err(|e| tx.fail(e))?;

        info!(collection = %self.name, removed, "Collection cleared");
        Ok(())
    }

    fn encode(&self, operation: Operation, record: &T) -> Result<Vec<u8>, StoreError> {
        codec::encode(record, self.database.compression())
            .map_err(|e| StoreError::transaction(operation, record.id().to_owned(), e))
    }

    async fn connection(&self) -> Result<&Connection, StoreError> {
        let outcome = self
            .connection
            .get_or_init(|| async { self.establish().await.map_err(OpenFailure::from) })
            .await;
        outcome.as_ref().map_err(OpenFailure::to_error)
    }

    #[instrument(
        skip_all,
        fields(database = %self.database.name(), collection = %self.name, version = self.version)
    )]
    async fn establish(&self) -> Result<Connection, StoreError> {
        let db_dir = self.database.bootstrap().await?;
        maintenance::purge_stale(&db_dir).await;

        let dir = db_dir.join(self.name.as_str());
        let manifest = schema::manifest_path(&db_dir, &self.name);

        if self.check_version(schema::read_version(&manifest).await?)? {
            let _lock = UpgradeLock::acquire(&db_dir, &self.name).await?;
            // Another connection may have finished the upgrade while we waited.
            let persisted = schema::read_version(&manifest).await?;
            if self.check_version(persisted)? {
                self.upgrade(persisted, &dir, &manifest).await?;
            }
        }

        if !fs::metadata(&dir).await.is_ok_and(|m| m.is_dir()) {
            return Err(StoreError::open(
                format!("collection '{}' does not exist", self.name),
                "the upgrade hook must call ensure_collection",
            ));
        }

        debug!("Collection opened");
        Ok(Connection { dir, scheduler: Scheduler::default() })
    }

    /// Returns whether an upgrade is needed; refuses to open older than persisted.
    fn check_version(&self, persisted: u32) -> Result<bool, StoreError> {
        if persisted > self.version {
            return Err(StoreError::open(
                format!(
                    "requested version {} is lower than the persisted version {persisted}",
                    self.version
                ),
                format!("collection '{}'", self.name),
            ));
        }
        Ok(persisted < self.version)
    }

    async fn upgrade(&self, from: u32, dir: &Path, manifest: &Path) -> Result<(), StoreError> {
        let exists = fs::metadata(dir).await.is_ok_and(|m| m.is_dir());
        let mut ctx = UpgradeContext::new(self.name.to_string(), exists);

        (self.upgrade)(&mut ctx, from, self.version)
            .map_err(|e| StoreError::open(e.to_string(), "upgrade hook failed"))?;
        ctx.apply(dir).await.map_err(|e| {
            StoreError::open(e.to_string(), format!("Failed to upgrade {}", dir.display()))
        })?;

        schema::write_version(&self.database, manifest, &self.name, self.version).await?;
        info!(from, to = self.version, "Collection schema upgraded");
        Ok(())
    }
}
