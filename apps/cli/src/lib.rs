//! # Lumo CLI
//!
//! Command-line front end of the media library. The binary loads [`LibraryConfig`], installs
//! the logger it describes and runs one [`Command`].
#![allow(clippy::print_stdout)]

pub mod args;
mod commands;

pub use crate::args::{Cli, Command, MediaKind, Variant};
pub use crate::commands::execute;

use anyhow::Context;
use lumo::domain::config::{LibraryConfig, LoggingConfig};
use lumo_logger::{LevelFilter, Logger};

/// Installs the global subscriber described by `config`.
///
/// # Errors
///
/// Fails on an unknown level, a malformed filter, or when a subscriber is already set.
pub fn init_logging(config: &LoggingConfig) -> anyhow::Result<Logger> {
    let level: LevelFilter =
        config.level.parse().with_context(|| format!("Invalid log level '{}'", config.level))?;

    let mut builder = Logger::builder().name(env!("CARGO_PKG_NAME")).level(level);
    if let Some(filter) = &config.filter {
        builder = builder.env_filter(filter);
    }

    let logger = match &config.directory {
        Some(dir) => builder.path(dir).json(config.json).init()?,
        None => builder.init()?,
    };
    Ok(logger)
}

/// Loads the config file named on the command line, or the optional default `lumo.*`.
///
/// # Errors
///
/// Fails when an explicit file is missing or any source is malformed.
pub fn load(cli: &Cli) -> anyhow::Result<LibraryConfig> {
    lumo::kernel::config::load_config(cli.config.as_deref())
        .context("Critical: Configuration is malformed")
}
