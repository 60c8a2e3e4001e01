//! Revocable, in-process references to stored blobs.
//!
//! A [`HandleTable`] maps opaque ids to blobs so a renderer can load media by URL without
//! copying the bytes. Every minted handle is owned by a [`HandleLease`]; dropping the lease
//! revokes the handle, so a handle can't outlive the view that asked for it.

use fxhash::FxHashMap;
use lumo_domain::Blob;
use lumo_domain::constants::BLOB_URL_PREFIX;
use lumo_kernel::safe_nanoid;
use parking_lot::RwLock;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;
use tracing::{debug, warn};

const HANDLE_ID_LEN: usize = 21;

/// An opaque reference to a blob registered in a [`HandleTable`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BlobHandle {
    id: Arc<str>,
}

impl BlobHandle {
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// `blob:lumo/<id>`
    #[must_use]
    pub fn url(&self) -> String {
        format!("{BLOB_URL_PREFIX}{}", self.id)
    }

    /// Parses a URL produced by [`BlobHandle::url`].
    #[must_use]
    pub fn from_url(url: &str) -> Option<Self> {
        url.strip_prefix(BLOB_URL_PREFIX)
            .filter(|id| !id.is_empty())
            .map(|id| Self { id: Arc::from(id) })
    }
}

impl fmt::Display for BlobHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{BLOB_URL_PREFIX}{}", self.id)
    }
}

/// Shared registry of live blob handles. Cloning shares the table.
#[derive(Clone, Default)]
pub struct HandleTable {
    entries: Arc<RwLock<FxHashMap<Arc<str>, Blob>>>,
}

impl fmt::Debug for HandleTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandleTable").field("outstanding", &self.outstanding()).finish()
    }
}

impl HandleTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `blob` under a fresh id. Repeated calls for the same blob yield distinct
    /// handles; the bytes are shared, not copied.
    pub fn mint(&self, blob: Blob) -> HandleLease {
        let id: Arc<str> = Arc::from(safe_nanoid!(HANDLE_ID_LEN));
        let bytes = blob.len();
        self.entries.write().insert(Arc::clone(&id), blob);
        debug!(handle = %id, bytes, "Blob handle minted");

        HandleLease { handle: BlobHandle { id }, table: self.clone(), armed: true }
    }

    /// The blob behind a live handle.
    #[must_use]
    pub fn resolve(&self, handle: &BlobHandle) -> Option<Blob> {
        self.entries.read().get(&handle.id).cloned()
    }

    #[must_use]
    pub fn resolve_url(&self, url: &str) -> Option<Blob> {
        BlobHandle::from_url(url).and_then(|handle| self.resolve(&handle))
    }

    /// Invalidates `handle`. Returns `false` when it was already revoked.
    pub fn revoke(&self, handle: &BlobHandle) -> bool {
        let removed = self.entries.write().remove(&handle.id).is_some();
        if removed {
            debug!(handle = %handle.id, "Blob handle revoked");
        }
        removed
    }

    /// Revokes every live handle, returning how many there were.
    pub fn revoke_all(&self) -> usize {
        let drained = std::mem::take(&mut *self.entries.write()).len();
        if drained > 0 {
            warn!(count = drained, "Revoked outstanding blob handles");
        }
        drained
    }

    /// Number of live handles.
    #[must_use]
    pub fn outstanding(&self) -> usize {
        self.entries.read().len()
    }
}

/// Owns one minted handle and revokes it on drop.
#[must_use = "Dropping the lease revokes the handle immediately"]
pub struct HandleLease {
    handle: BlobHandle,
    table: HandleTable,
    armed: bool,
}

impl fmt::Debug for HandleLease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandleLease")
            .field("handle", &self.handle.id)
            .field("armed", &self.armed)
            .finish()
    }
}

impl HandleLease {
    #[must_use]
    pub const fn handle(&self) -> &BlobHandle {
        &self.handle
    }

    /// The blob this lease keeps reachable.
    #[must_use]
    pub fn blob(&self) -> Option<Blob> {
        self.table.resolve(&self.handle)
    }

    /// Revokes the handle now.
    pub fn release(self) {
        drop(self);
    }

    /// Gives up ownership without revoking. The caller must pass the handle to
    /// [`HandleTable::revoke`] once it is no longer displayed.
    #[must_use = "A detached handle stays live until revoked"]
    pub fn detach(mut self) -> BlobHandle {
        self.armed = false;
        self.handle.clone()
    }
}

impl Deref for HandleLease {
    type Target = BlobHandle;

    fn deref(&self) -> &Self::Target {
        &self.handle
    }
}

impl Drop for HandleLease {
    fn drop(&mut self) {
        if self.armed {
            self.table.revoke(&self.handle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_roundtrips_through_from_url() {
        let table = HandleTable::new();
        let lease = table.mint(Blob::from(vec![1, 2, 3]));

        assert!(lease.url().starts_with("blob:lumo/"));
        assert_eq!(lease.id().len(), HANDLE_ID_LEN);
        assert_eq!(BlobHandle::from_url(&lease.url()).as_ref(), Some(lease.handle()));
        assert_eq!(lease.to_string(), lease.url());
    }

    #[test]
    fn foreign_urls_are_rejected() {
        assert!(BlobHandle::from_url("https://example.com/a.jpg").is_none());
        assert!(BlobHandle::from_url("blob:lumo/").is_none());
    }

    #[test]
    fn revoke_all_drains_the_table() {
        let table = HandleTable::new();
        let a = table.mint(Blob::from(vec![1])).detach();
        let _b = table.mint(Blob::from(vec![2]));

        assert_eq!(table.revoke_all(), 2);
        assert_eq!(table.outstanding(), 0);
        assert!(!table.revoke(&a));
    }
}
