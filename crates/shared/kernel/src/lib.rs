//! Kernel utilities shared by the stores, the facade and the CLI: record ids and config
//! loading. Keep this crate lightweight.
//!
//! ## Record ids
//! [`safe_nanoid!`] generates ids that survive being read aloud or retyped from a
//! screen: no `0`, `1`, `I`, `O`, `i`, `l` or `o`.
//! ```rust
//! # use lumo_kernel::{RECORD_ID_LEN, safe_nanoid};
//! let id = safe_nanoid!();
//! assert_eq!(id.len(), RECORD_ID_LEN);
//! ```
//!
//! ## Config loading
//! ```rust,no_run
//! use lumo_kernel::config::load_config;
//! use lumo_kernel::domain::config::LibraryConfig;
//!
//! let cfg: LibraryConfig = load_config(Some("lumo.toml")).unwrap();
//! println!("{}", cfg.storage.data_dir.display());
//! ```
pub mod config;

pub use lumo_domain as domain;
pub use nanoid::nanoid;

/// Length of the ids `safe_nanoid!()` generates for new records.
pub const RECORD_ID_LEN: usize = 12;

/// `2-9`, `A-Z` without `I`/`O`, `a-z` without `i`/`l`/`o`.
pub const SAFE_ALPHABET: &[char; 55] = &[
    '2', '3', '4', '5', '6', '7', '8', '9', 'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'J', 'K', 'L',
    'M', 'N', 'P', 'Q', 'R', 'S', 'T', 'U', 'V', 'W', 'X', 'Y', 'Z', 'a', 'b', 'c', 'd', 'e', 'f',
    'g', 'h', 'j', 'k', 'm', 'n', 'p', 'q', 'r', 's', 't', 'u', 'v', 'w', 'x', 'y', 'z',
];

/// A random id over [`SAFE_ALPHABET`], [`RECORD_ID_LEN`] characters unless a size is given.
#[macro_export]
macro_rules! safe_nanoid {
    () => {
        $crate::nanoid!(($crate::RECORD_ID_LEN), $crate::SAFE_ALPHABET)
    };
    ($size:expr) => {
        $crate::nanoid!($size, $crate::SAFE_ALPHABET)
    };
}
