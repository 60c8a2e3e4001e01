use crate::engine::{Compression, Database};
use crate::error::StoreError;
use crate::security::StoreName;
use private::Sealed;
use std::path::PathBuf;

/// Database name used when the builder is not given one.
pub const DEFAULT_DATABASE_NAME: &str = "lumo";

#[derive(Debug, Clone)]
struct DatabaseConfig {
    name: String,
    compression: Compression,
    create: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { name: DEFAULT_DATABASE_NAME.to_owned(), compression: Compression::None, create: true }
    }
}

#[derive(Debug, Default)]
pub struct NoRoot;
#[derive(Debug)]
pub struct WithRoot(PathBuf);

mod private {
    pub(super) trait Sealed {}
}
impl Sealed for NoRoot {}
impl Sealed for WithRoot {}

#[allow(private_bounds)]
#[derive(Debug, Default)]
pub struct DatabaseBuilder<S: Sealed = NoRoot> {
    state: S,
    config: DatabaseConfig,
}

#[allow(private_bounds)]
impl<S: Sealed> DatabaseBuilder<S> {
    #[must_use = "Sets the database name (its directory under the root)"]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.config.name = name.into();
        self
    }

    #[must_use = "Sets compression for newly written records"]
    pub const fn compression(mut self, compression: Compression) -> Self {
        self.config.compression = compression;
        self
    }

    #[must_use = "Sets whether the database directory should be created if it does not exist"]
    pub const fn create(mut self, enable: bool) -> Self {
        self.config.create = enable;
        self
    }

    fn transition<N: Sealed>(self, state: N) -> DatabaseBuilder<N> {
        DatabaseBuilder { state, config: self.config }
    }
}

impl DatabaseBuilder<NoRoot> {
    #[must_use = "Creates a new database builder with default configuration"]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use = "Sets the root directory holding the database"]
    pub fn root(self, path: impl Into<PathBuf>) -> DatabaseBuilder<WithRoot> {
        self.transition(WithRoot(path.into()))
    }
}

impl DatabaseBuilder<WithRoot> {
    /// Validates the configuration and returns a [`Database`] handle.
    ///
    /// No I/O happens here; directories are created and checked lazily when the first
    /// collection is opened.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Configuration`] if the database name is empty or contains
    /// characters other than `a-z`, `0-9`, `_` and `-`.
    pub fn build(self) -> Result<Database, StoreError> {
        let name = StoreName::parse("database", &self.config.name)?;
        Ok(Database::from_parts(self.state.0, name, self.config.compression, self.config.create))
    }
}
