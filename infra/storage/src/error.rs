use crate::transaction::{Operation, TransactionMode};
use std::borrow::Cow;

/// A specialized [`StoreError`] enum of this crate.
#[lumo_derive::lumo_error]
pub enum StoreError {
    /// Opening or upgrading a collection failed. Memoized: every later call on the same
    /// [`Collection`](crate::Collection) instance reports the same failure.
    #[error("Database open failed{}: {message}", format_context(.context))]
    DatabaseOpen { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// `add` found a record with the same id.
    #[error("Duplicate key{}: {key}", format_context(.context))]
    DuplicateKey { key: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// A read or write failed inside a transaction.
    #[error(
        "{operation} transaction ({mode}) failed for '{key}'{}: {message}",
        format_context(.context)
    )]
    Transaction {
        operation: Operation,
        mode: TransactionMode,
        key: Cow<'static, str>,
        message: Cow<'static, str>,
        context: Option<Cow<'static, str>>,
    },

    /// The record id cannot be used as a storage key.
    #[error("Invalid key{}: {message}", format_context(.context))]
    InvalidKey { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// Invalid database/collection name or schema version.
    #[error("Invalid configuration{}: {message}", format_context(.context))]
    Configuration { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

impl StoreError {
    pub(crate) fn transaction(
        operation: Operation,
        key: impl Into<Cow<'static, str>>,
        message: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self::Transaction {
            operation,
            mode: operation.mode(),
            key: key.into(),
            message: message.into(),
            context: None,
        }
    }

    pub(crate) fn open(
        message: impl Into<Cow<'static, str>>,
        context: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self::DatabaseOpen { message: message.into(), context: Some(context.into()) }
    }

    /// Returns `true` for [`StoreError::DuplicateKey`].
    #[must_use]
    pub const fn is_duplicate_key(&self) -> bool {
        matches!(self, Self::DuplicateKey { .. })
    }
}
