use std::sync::Arc;

use diagnostics::log_debug;

use crate::cache::ListingCache;
use crate::client::{BucketClient, ObjectRecord, UploadOptions};
use crate::error::Result;
use crate::naming;

/// Write-side primitives over the flat key space.
///
/// Every operation clears the shared listing cache before it touches the
/// store, so later reads rebuild from live data. A failure after the clear
/// costs nothing but a re-listing.
#[derive(Clone)]
pub struct BucketOperations {
    client: Arc<dyn BucketClient>,
    cache: Arc<ListingCache>,
}

impl BucketOperations {
    pub fn new(client: Arc<dyn BucketClient>, cache: Arc<ListingCache>) -> Self {
        BucketOperations { client, cache }
    }

    /// Creates the zero-byte marker object for a folder. The bucket root
    /// exists by definition, so it is a quiet no-op.
    pub async fn make_folder(&self, folder_name: &str) -> Result<()> {
        let normalized = naming::normalize_folder_name(folder_name);
        if normalized.is_empty() {
            return Ok(());
        }

        self.cache.clear().await;
        log_debug!("creating folder marker {key}", key: normalized.as_str());
        self.client
            .upload(
                Vec::new(),
                &UploadOptions {
                    name: normalized,
                    content_type: None,
                },
            )
            .await?;
        Ok(())
    }

    /// Creates a zero-byte object at the given key. The caller is expected
    /// to pass a normalized file name.
    pub async fn create_empty_file(&self, file_name: &str) -> Result<ObjectRecord> {
        self.cache.clear().await;
        self.client
            .upload(
                Vec::new(),
                &UploadOptions {
                    name: file_name.to_string(),
                    content_type: None,
                },
            )
            .await
    }

    /// Server-side copy between two flat keys.
    pub async fn copy_from_to(
        &self,
        source_key: &str,
        destination_key: &str,
    ) -> Result<ObjectRecord> {
        self.cache.clear().await;
        let source = source_key.trim_start_matches(naming::DELIMITER);
        self.client.copy_object(source, destination_key).await
    }

    /// Renames a flat key. A source that has no object behind it is
    /// tolerated and reported as `None`: folders that exist only through
    /// their children have nothing to rename.
    pub async fn rename(&self, key: &str, new_key: &str) -> Result<Option<ObjectRecord>> {
        self.cache.clear().await;
        if !self.client.object_exists(key).await? {
            log_debug!("rename skipped, no object at {key}", key: key);
            return Ok(None);
        }
        Ok(Some(self.client.rename_object(key, new_key).await?))
    }

    /// Deletes the single object at the identifier's flat key, normalized
    /// as folder or file per the flag. Deleting a folder key removes only
    /// its marker, never the children.
    pub async fn delete(&self, identifier: &str, is_folder: bool) -> Result<()> {
        let key = if is_folder {
            naming::normalize_folder_name(identifier)
        } else {
            naming::normalize_file_name(identifier)
        };

        self.cache.clear().await;
        self.client.delete_object(&key).await
    }
}
