use std::path::Path;

use async_trait::async_trait;
use tokio::io::AsyncRead;

use crate::error::Result;

/// One raw object entry as returned by a bucket listing or mutation.
#[derive(Debug, Clone, Default)]
pub struct ObjectRecord {
    pub name: String,
    pub content_type: Option<String>,
    pub size: u64,
    /// RFC 3339 creation timestamp, verbatim from the store.
    pub time_created: Option<String>,
    /// RFC 3339 last-update timestamp, verbatim from the store.
    pub updated: Option<String>,
}

/// One page of a listing.
#[derive(Debug, Clone, Default)]
pub struct ObjectPage {
    pub objects: Vec<ObjectRecord>,
    /// Token for the next page, `None` on the last one.
    pub next_page_token: Option<String>,
}

/// Parameters of a single listing request.
#[derive(Debug, Clone, Default)]
pub struct ListOptions {
    pub prefix: String,
    /// Partial-response projection, e.g. `"items/name,items/size"`.
    pub fields: Option<String>,
    pub page_token: Option<String>,
}

/// Parameters of an upload.
#[derive(Debug, Clone)]
pub struct UploadOptions {
    pub name: String,
    pub content_type: Option<String>,
}

/// An in-flight resumable upload session.
#[async_trait]
pub trait ResumableUpload: Send {
    /// Runs the initial transfer.
    async fn upload(&mut self) -> Result<ObjectRecord>;

    /// Resumes from the last confirmed offset after a failed attempt.
    async fn resume(&mut self) -> Result<ObjectRecord>;
}

/// Capability surface of the underlying object store.
///
/// The store is flat: keys are opaque strings and a trailing delimiter is
/// purely a naming convention. Implementations exchange raw records; all
/// interpretation (folders, phantoms, hierarchy) happens in the catalog.
#[async_trait]
pub trait BucketClient: Send + Sync {
    /// Returns one page of objects whose keys start with the prefix.
    async fn list_objects(&self, options: &ListOptions) -> Result<ObjectPage>;

    /// Stores `content` under `options.name` in a single request.
    async fn upload(&self, content: Vec<u8>, options: &UploadOptions) -> Result<ObjectRecord>;

    /// Opens a resumable upload session reading from a local file.
    async fn start_resumable_upload(
        &self,
        source: &Path,
        options: &UploadOptions,
    ) -> Result<Box<dyn ResumableUpload>>;

    /// Server-side copy within the bucket.
    async fn copy_object(&self, key: &str, destination_key: &str) -> Result<ObjectRecord>;

    /// Server-side rename within the bucket.
    async fn rename_object(&self, key: &str, new_key: &str) -> Result<ObjectRecord>;

    async fn object_exists(&self, key: &str) -> Result<bool>;

    /// Removes the object at `key`. Deleting a missing key is not an error.
    async fn delete_object(&self, key: &str) -> Result<()>;

    /// Fetches the full object content.
    async fn download(&self, key: &str) -> Result<Vec<u8>>;

    /// Downloads the object straight into a local file.
    async fn download_to_file(&self, key: &str, target: &Path) -> Result<()>;

    /// Opens the object content as an async byte stream.
    async fn download_stream(&self, key: &str) -> Result<Box<dyn AsyncRead + Send + Unpin>>;
}
