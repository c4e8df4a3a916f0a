use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::object::FlatObject;

/// A materialized catalog listing, keyed by flat object key.
pub type Listing = BTreeMap<String, FlatObject>;

/// Identity of one memoizable listing call: the operation together with its
/// full argument tuple. Distinct argument combinations occupy distinct
/// slots.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Signature {
    /// Full bucket scan including synthesized folders.
    Full { prefix: String },
    /// Client-side filtered view of the full scan.
    Filtered {
        prefix: String,
        recursive: bool,
        include_files: bool,
        include_folders: bool,
        include_self: bool,
    },
}

/// Process-local memo of listing results.
///
/// Entries never expire; every mutating operation clears the whole map. The
/// cache is purely an optimization and carries no consistency guarantee with
/// the store itself.
#[derive(Default)]
pub struct ListingCache {
    entries: Mutex<HashMap<Signature, Arc<Listing>>>,
}

impl ListingCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, signature: &Signature) -> Option<Arc<Listing>> {
        self.entries.lock().await.get(signature).cloned()
    }

    pub async fn put(&self, signature: Signature, listing: Arc<Listing>) {
        self.entries.lock().await.insert(signature, listing);
    }

    /// Drops every memoized listing. Called before any mutation reaches the
    /// store.
    pub async fn clear(&self) {
        self.entries.lock().await.clear();
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}
