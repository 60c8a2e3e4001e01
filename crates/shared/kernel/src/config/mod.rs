use config::{Config, Environment, File};
use serde::de::DeserializeOwned;
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use tracing::info;

/// Environment variables with this prefix override file values (`LUMO__STORAGE__DATA_DIR`).
pub const ENV_PREFIX: &str = "LUMO";

const DEFAULT_CONFIG_FILE: &str = "lumo";

#[lumo_derive::lumo_error]
pub enum ConfigError {
    #[error("Config error{}: {source}", format_context(.context))]
    Config { source: config::ConfigError, context: Option<Cow<'static, str>> },
}

/// Loads a configuration from a file layered with environment overrides.
///
/// 1. **Base File**: `path` (any format the `config` crate detects by extension). Without a
///    path, an optional `lumo.*` file in the working directory is used.
/// 2. **Environment Overrides**: variables prefixed with `LUMO__`; nested keys use double
///    underscores (`LUMO__MEDIA__POSTER_QUALITY` maps to `media.poster_quality`).
///
/// Fields missing from both layers fall back to the target type's serde defaults.
///
/// # Errors
/// Returns [`ConfigError::Config`] if an explicitly given file is missing or unreadable, or
/// if the merged values do not match `T`.
pub fn load_config<T>(path: Option<impl AsRef<Path>>) -> Result<T, ConfigError>
where
    T: DeserializeOwned,
{
    let (effective_path, required) = path.map_or_else(
        || (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        |p| (p.as_ref().to_path_buf(), true),
    );

    let builder = Config::builder()
        .add_source(File::from(effective_path.as_path()).required(required))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .convert_case(config::Case::Snake),
        );

    info!(path = %effective_path.display(), required, "Loading config");

    let config = builder
        .build()
        .context("Failed to build config")?
        .try_deserialize::<T>()
        .context("Failed to deserialize config")?;

    Ok(config)
}
