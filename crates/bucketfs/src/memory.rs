use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use tokio::io::AsyncRead;
use tokio::sync::Mutex;

use crate::client::{
    BucketClient, ListOptions, ObjectPage, ObjectRecord, ResumableUpload, UploadOptions,
};
use crate::error::{Error, Result};

/// One stored object: content plus the record metadata a listing reports.
#[derive(Debug, Clone)]
struct StoredObject {
    content: Vec<u8>,
    content_type: Option<String>,
    time_created: Option<String>,
    updated: Option<String>,
}

#[derive(Debug, Default)]
struct BucketState {
    objects: BTreeMap<String, StoredObject>,
    list_calls: usize,
    upload_calls: usize,
    resumable_starts: usize,
    fail_next_resumable: bool,
}

/// In-memory bucket used by tests and local tooling.
///
/// Implements the full client surface over a key-sorted map. The page size
/// is configurable so listing pagination gets exercised for real, and call
/// counters allow spy assertions on caching behavior.
#[derive(Clone)]
pub struct MemoryBucket {
    state: Arc<Mutex<BucketState>>,
    page_size: usize,
}

impl MemoryBucket {
    pub fn new() -> Self {
        Self::with_page_size(1000)
    }

    /// A bucket whose listings return at most `page_size` objects per call.
    pub fn with_page_size(page_size: usize) -> Self {
        MemoryBucket {
            state: Arc::new(Mutex::new(BucketState::default())),
            page_size: page_size.max(1),
        }
    }

    /// Seeds an object with explicit timestamps (unix seconds).
    pub async fn insert_object(
        &self,
        name: &str,
        content: &[u8],
        content_type: Option<&str>,
        created_at: i64,
        updated_at: i64,
    ) {
        let mut state = self.state.lock().await;
        state.objects.insert(
            name.to_string(),
            StoredObject {
                content: content.to_vec(),
                content_type: content_type.map(str::to_string),
                time_created: epoch_to_rfc3339(created_at),
                updated: epoch_to_rfc3339(updated_at),
            },
        );
    }

    /// Number of listing requests served so far, one per page.
    pub async fn list_calls(&self) -> usize {
        self.state.lock().await.list_calls
    }

    /// Number of single-shot uploads served so far.
    pub async fn upload_calls(&self) -> usize {
        self.state.lock().await.upload_calls
    }

    /// Number of resumable upload sessions opened so far.
    pub async fn resumable_starts(&self) -> usize {
        self.state.lock().await.resumable_starts
    }

    /// Makes the next resumable upload attempt fail once, so the resume
    /// path can be tested.
    pub async fn fail_next_resumable_upload(&self) {
        self.state.lock().await.fail_next_resumable = true;
    }

    pub async fn contains(&self, key: &str) -> bool {
        self.state.lock().await.objects.contains_key(key)
    }

    pub async fn content_of(&self, key: &str) -> Option<Vec<u8>> {
        self.state
            .lock()
            .await
            .objects
            .get(key)
            .map(|stored| stored.content.clone())
    }

    pub async fn object_count(&self) -> usize {
        self.state.lock().await.objects.len()
    }
}

impl Default for MemoryBucket {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BucketClient for MemoryBucket {
    async fn list_objects(&self, options: &ListOptions) -> Result<ObjectPage> {
        let mut state = self.state.lock().await;
        state.list_calls += 1;

        let mut objects = Vec::new();
        let mut remainder = false;
        for (name, stored) in &state.objects {
            if !name.starts_with(&options.prefix) {
                continue;
            }
            if let Some(token) = &options.page_token {
                if name <= token {
                    continue;
                }
            }
            if objects.len() == self.page_size {
                remainder = true;
                break;
            }
            objects.push(record_for(name, stored));
        }

        let next_page_token = if remainder {
            objects.last().map(|record| record.name.clone())
        } else {
            None
        };

        Ok(ObjectPage {
            objects,
            next_page_token,
        })
    }

    async fn upload(&self, content: Vec<u8>, options: &UploadOptions) -> Result<ObjectRecord> {
        let mut state = self.state.lock().await;
        state.upload_calls += 1;
        let now = Utc::now().to_rfc3339();
        let stored = StoredObject {
            content,
            content_type: options.content_type.clone(),
            time_created: Some(now.clone()),
            updated: Some(now),
        };
        let record = record_for(&options.name, &stored);
        state.objects.insert(options.name.clone(), stored);
        Ok(record)
    }

    async fn start_resumable_upload(
        &self,
        source: &Path,
        options: &UploadOptions,
    ) -> Result<Box<dyn ResumableUpload>> {
        let mut state = self.state.lock().await;
        state.resumable_starts += 1;
        Ok(Box::new(MemoryResumableUpload {
            state: Arc::clone(&self.state),
            source: source.to_path_buf(),
            options: options.clone(),
        }))
    }

    async fn copy_object(&self, key: &str, destination_key: &str) -> Result<ObjectRecord> {
        let mut state = self.state.lock().await;
        let source = state
            .objects
            .get(key)
            .cloned()
            .ok_or_else(|| Error::ObjectNotFound(key.to_string()))?;
        let now = Utc::now().to_rfc3339();
        let stored = StoredObject {
            content: source.content,
            content_type: source.content_type,
            time_created: Some(now.clone()),
            updated: Some(now),
        };
        let record = record_for(destination_key, &stored);
        state.objects.insert(destination_key.to_string(), stored);
        Ok(record)
    }

    async fn rename_object(&self, key: &str, new_key: &str) -> Result<ObjectRecord> {
        let mut state = self.state.lock().await;
        let stored = state
            .objects
            .remove(key)
            .ok_or_else(|| Error::ObjectNotFound(key.to_string()))?;
        let record = record_for(new_key, &stored);
        state.objects.insert(new_key.to_string(), stored);
        Ok(record)
    }

    async fn object_exists(&self, key: &str) -> Result<bool> {
        Ok(self.state.lock().await.objects.contains_key(key))
    }

    async fn delete_object(&self, key: &str) -> Result<()> {
        self.state.lock().await.objects.remove(key);
        Ok(())
    }

    async fn download(&self, key: &str) -> Result<Vec<u8>> {
        self.state
            .lock()
            .await
            .objects
            .get(key)
            .map(|stored| stored.content.clone())
            .ok_or_else(|| Error::ObjectNotFound(key.to_string()))
    }

    async fn download_to_file(&self, key: &str, target: &Path) -> Result<()> {
        let content = self.download(key).await?;
        tokio::fs::write(target, content).await?;
        Ok(())
    }

    async fn download_stream(&self, key: &str) -> Result<Box<dyn AsyncRead + Send + Unpin>> {
        let content = self.download(key).await?;
        Ok(Box::new(std::io::Cursor::new(content)))
    }
}

struct MemoryResumableUpload {
    state: Arc<Mutex<BucketState>>,
    source: PathBuf,
    options: UploadOptions,
}

impl MemoryResumableUpload {
    async fn transfer(&self) -> Result<ObjectRecord> {
        let content = tokio::fs::read(&self.source).await?;
        let now = Utc::now().to_rfc3339();
        let stored = StoredObject {
            content,
            content_type: self.options.content_type.clone(),
            time_created: Some(now.clone()),
            updated: Some(now),
        };
        let record = record_for(&self.options.name, &stored);
        let mut state = self.state.lock().await;
        state.objects.insert(self.options.name.clone(), stored);
        Ok(record)
    }
}

#[async_trait]
impl ResumableUpload for MemoryResumableUpload {
    async fn upload(&mut self) -> Result<ObjectRecord> {
        {
            let mut state = self.state.lock().await;
            if state.fail_next_resumable {
                state.fail_next_resumable = false;
                return Err(Error::store("upload interrupted"));
            }
        }
        self.transfer().await
    }

    async fn resume(&mut self) -> Result<ObjectRecord> {
        self.transfer().await
    }
}

fn record_for(name: &str, stored: &StoredObject) -> ObjectRecord {
    ObjectRecord {
        name: name.to_string(),
        content_type: stored.content_type.clone(),
        size: stored.content.len() as u64,
        time_created: stored.time_created.clone(),
        updated: stored.updated.clone(),
    }
}

fn epoch_to_rfc3339(epoch: i64) -> Option<String> {
    Utc.timestamp_opt(epoch, 0)
        .single()
        .map(|stamp| stamp.to_rfc3339())
}
