//! bucketfs - a hierarchical filesystem view over a flat object bucket.
//!
//! The bucket itself knows nothing about directories: objects live under
//! opaque keys, and a trailing `/` in a key is nothing more than a naming
//! convention. This crate turns that flat key space into a navigable tree
//! with folders, recursive listings, sorting, move/copy/rename and a
//! recycle-bin deletion policy.
//!
//! The store is reached through the [`BucketClient`] capability trait;
//! [`MemoryBucket`] implements it in memory for tests and local tooling.
//! [`BucketDriver`] is the hierarchical facade callers talk to, built on
//! the read-side [`ObjectCatalog`] and the write-side [`BucketOperations`],
//! which share one [`ListingCache`].

mod cache;
mod catalog;
mod client;
mod driver;
mod error;
mod filter;
mod memory;
pub mod naming;
mod object;
mod ops;
mod recycle;

pub use cache::{Listing, ListingCache, Signature};
pub use catalog::{ObjectCatalog, SortKey};
pub use client::{
    BucketClient, ListOptions, ObjectPage, ObjectRecord, ResumableUpload, UploadOptions,
};
pub use driver::{BucketDriver, DriverConfig};
pub use error::{Error, Result};
pub use filter::{DirectoryFilter, FilterDecision};
pub use memory::MemoryBucket;
pub use object::{FlatObject, ObjectKind};
pub use ops::BucketOperations;
pub use recycle::{
    DeletionPolicy, FolderRole, RECYCLER_FOLDER, TEMPORARY_FOLDER, USER_UPLOAD_FOLDER,
    recycler_candidates, role_of,
};
