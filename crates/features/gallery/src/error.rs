use lumo_media::TransformError;
use lumo_storage::StoreError;
use std::borrow::Cow;

/// A specialized [`GalleryError`] enum of this crate.
#[lumo_derive::lumo_error]
pub enum GalleryError {
    /// `update` targeted an id that is not stored.
    #[error("Record not found{}: {id}", format_context(.context))]
    RecordNotFound { id: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Store error{}: {source}", format_context(.context))]
    Store { source: StoreError, context: Option<Cow<'static, str>> },

    /// A media transform failed; nothing was written.
    #[error("Transform error{}: {source}", format_context(.context))]
    Transform { source: TransformError, context: Option<Cow<'static, str>> },
}

impl GalleryError {
    /// `create` hit an id that already exists.
    #[must_use]
    pub const fn is_duplicate_key(&self) -> bool {
        matches!(self, Self::Store { source: StoreError::DuplicateKey { .. }, .. })
    }

    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::RecordNotFound { .. })
    }
}
