//! Per-call transaction scopes.
//!
//! Every engine operation takes exactly one scope on the collection it targets: shared for
//! read-only operations, exclusive for read-write ones. Scopes never span calls, so a
//! read-modify-write sequence issued by a caller is not atomic.

use crate::error::StoreError;
use std::borrow::Cow;
use std::fmt;
use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransactionMode {
    ReadOnly,
    ReadWrite,
}

impl fmt::Display for TransactionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ReadOnly => "readonly",
            Self::ReadWrite => "readwrite",
        })
    }
}

/// The single-record (or whole-collection) operations the engine exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Get,
    GetAllKeys,
    Add,
    Put,
    Delete,
    Clear,
}

impl Operation {
    #[must_use]
    pub const fn mode(self) -> TransactionMode {
        match self {
            Self::Get | Self::GetAllKeys => TransactionMode::ReadOnly,
            Self::Add | Self::Put | Self::Delete | Self::Clear => TransactionMode::ReadWrite,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Get => "get",
            Self::GetAllKeys => "get_all_keys",
            Self::Add => "add",
            Self::Put => "put",
            Self::Delete => "delete",
            Self::Clear => "clear",
        })
    }
}

/// Schedules transactions of one open collection.
#[derive(Debug, Default)]
pub(crate) struct Scheduler {
    lock: RwLock<()>,
}

#[derive(Debug)]
enum Scope<'c> {
    Shared { _guard: RwLockReadGuard<'c, ()> },
    Exclusive { _guard: RwLockWriteGuard<'c, ()> },
}

/// A live transaction; the scope is released when this value is dropped.
#[derive(Debug)]
pub(crate) struct Transaction<'c> {
    operation: Operation,
    key: Cow<'static, str>,
    _scope: Scope<'c>,
}

impl Scheduler {
    pub(crate) async fn begin(
        &self,
        operation: Operation,
        key: impl Into<Cow<'static, str>>,
    ) -> Transaction<'_> {
        let scope = match operation.mode() {
            TransactionMode::ReadOnly => Scope::Shared { _guard: self.lock.read().await },
            TransactionMode::ReadWrite => Scope::Exclusive { _guard: self.lock.write().await },
        };
        Transaction { operation, key: key.into(), _scope: scope }
    }
}

impl Transaction<'_> {
    pub(crate) fn fail(&self, message: impl fmt::Display) -> StoreError {
        StoreError::transaction(self.operation, self.key.clone(), message.to_string())
    }

    pub(crate) fn key(&self) -> &str {
        &self.key
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn operations_map_to_modes() {
        assert_eq!(Operation::Get.mode(), TransactionMode::ReadOnly);
        assert_eq!(Operation::GetAllKeys.mode(), TransactionMode::ReadOnly);
        assert_eq!(Operation::Clear.mode(), TransactionMode::ReadWrite);
        assert_eq!(Operation::Add.to_string(), "add");
    }

    #[test]
    fn failures_carry_operation_and_mode() {
        let err = StoreError::transaction(Operation::Put, "photo-1", "disk full");
        match err {
            StoreError::Transaction { operation, mode, key, .. } => {
                assert_eq!(operation, Operation::Put);
                assert_eq!(mode, TransactionMode::ReadWrite);
                assert_eq!(key, "photo-1");
            },
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn readers_share_writers_exclude() {
        let scheduler = Arc::new(Scheduler::default());

        let first = scheduler.begin(Operation::Get, "a").await;
        let second = tokio::time::timeout(
            Duration::from_millis(50),
            scheduler.begin(Operation::GetAllKeys, "*"),
        )
        .await;
        assert!(second.is_ok(), "read scopes must not block each other");

        let writer = tokio::time::timeout(
            Duration::from_millis(50),
            scheduler.begin(Operation::Put, "a"),
        )
        .await;
        assert!(writer.is_err(), "write scope must wait for readers");
        drop(first);
    }
}
