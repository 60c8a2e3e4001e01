//! A versioned, key-addressed record store on the local filesystem.
//!
//! Records are typed values with a string id, grouped into named collections inside a named
//! database directory. Each collection carries its own schema version; opening it at a higher
//! version runs a caller-supplied upgrade hook exactly once.
//!
//! # Core Features
//!
//! - **Lazy memoized open**: building handles does no I/O; the first operation opens the
//!   collection and every later call reuses the outcome, including a failure.
//! - **Atomic writes**: unique temp file + `fsync` + rename (or hard link for inserts), so a
//!   record is never observed half-written and `add` never clobbers.
//! - **Transactions**: each call runs in one scope, shared for reads and exclusive for writes.
//! - **Transparent compression**: optional LZ4, flagged per record.
//! - **Self-healing**: stale temp files and abandoned upgrade locks are removed at open.
//!
//! # Layout
//!
//! ```text
//! <root>/<database>/
//! ├── images.schema.json        {"collection":"images","version":1,...}
//! └── images/
//!     └── 70/68/70686f746f2d31.rec
//! ```
//!
//! # Examples
//!
//! ```rust
//! use lumo_storage::{Database, Record, StoreError};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize, Deserialize)]
//! struct Tag {
//!     id: String,
//! }
//!
//! impl Record for Tag {
//!     fn id(&self) -> &str {
//!         &self.id
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), StoreError> {
//!     # let tmp = tempfile::tempdir().unwrap();
//!     let db = Database::builder().root(tmp.path()).name("media-db").build()?;
//!     let tags = db
//!         .collection::<Tag>("tags")
//!         .version(2)
//!         .on_upgrade(|ctx, old, _new| {
//!             if old == 1 {
//!                 ctx.drop_collection();
//!             }
//!             ctx.ensure_collection();
//!             Ok(())
//!         })
//!         .build()?;
//!
//!     tags.add(&Tag { id: "beach".into() }).await?;
//!     assert!(tags.add(&Tag { id: "beach".into() }).await.unwrap_err().is_duplicate_key());
//!     assert_eq!(tags.get_all_keys().await?, ["beach"]);
//!     Ok(())
//! }
//! ```

mod builder;
mod codec;
mod collection;
mod engine;
mod error;
mod maintenance;
mod schema;
mod security;
mod transaction;

pub use builder::{DEFAULT_DATABASE_NAME, DatabaseBuilder};
pub use codec::Record;
pub use collection::{Collection, CollectionBuilder};
pub use engine::{Compression, Database};
pub use error::{StoreError, StoreErrorExt};
pub use schema::{UpgradeContext, UpgradeHook};
pub use security::{MAX_KEY_BYTES, StoreName};
pub use transaction::{Operation, TransactionMode};
