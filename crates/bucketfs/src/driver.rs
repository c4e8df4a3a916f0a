use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use diagnostics::{log_debug, log_info, log_warn};
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::cache::ListingCache;
use crate::catalog::ObjectCatalog;
use crate::client::{BucketClient, UploadOptions};
use crate::error::{Error, Result};
use crate::filter::{DirectoryFilter, evaluate_filters};
use crate::naming::{self, DELIMITER};
use crate::object::FlatObject;
use crate::ops::BucketOperations;
use crate::recycle::{self, DeletionPolicy, FolderRole, USER_UPLOAD_FOLDER};

/// Properties served when a file-info call does not name any.
const DEFAULT_FILE_PROPERTIES: [&str; 11] = [
    "size",
    "atime",
    "mtime",
    "ctime",
    "mimetype",
    "name",
    "extension",
    "identifier",
    "identifier_hash",
    "storage",
    "folder_hash",
];

/// Static configuration of a driver instance.
#[derive(Debug, Clone, Default)]
pub struct DriverConfig {
    /// Storage uid reported in property bags and mixed into identifier
    /// hashes.
    pub storage_uid: u32,
    /// Extension (lowercase, without dot) to MIME type overrides applied
    /// when uploading local files.
    pub mime_overrides: HashMap<String, String>,
    /// Directory for local-processing downloads; the system default when
    /// unset.
    pub temp_dir: Option<PathBuf>,
}

/// Hierarchical filesystem facade over a flat bucket.
///
/// Callers speak in absolute identifiers (`/folder/file.txt`, `/folder/`);
/// internally everything is a bare flat key. Inputs tolerate leading and
/// doubled delimiters, and every identifier handed back out is absolute.
/// The driver holds no per-call state beyond the shared listing cache.
pub struct BucketDriver {
    client: Arc<dyn BucketClient>,
    cache: Arc<ListingCache>,
    catalog: ObjectCatalog,
    ops: BucketOperations,
    config: DriverConfig,
}

impl BucketDriver {
    pub fn new(client: Arc<dyn BucketClient>, config: DriverConfig) -> Self {
        let cache = Arc::new(ListingCache::new());
        let catalog = ObjectCatalog::new(Arc::clone(&client), Arc::clone(&cache));
        let ops = BucketOperations::new(Arc::clone(&client), Arc::clone(&cache));
        BucketDriver {
            client,
            cache,
            catalog,
            ops,
            config,
        }
    }

    /// Read-side catalog, for callers that need raw listings.
    pub fn catalog(&self) -> &ObjectCatalog {
        &self.catalog
    }

    /// Write-side primitives, for callers that need raw mutations.
    pub fn operations(&self) -> &BucketOperations {
        &self.ops
    }

    pub fn root_level_folder(&self) -> String {
        rooted("")
    }

    /// Absolute identifier of an identifier's parent folder.
    pub fn parent_folder_identifier(&self, identifier: &str) -> String {
        rooted(&naming::parent_folder_name(identifier))
    }

    /// Role a folder plays by naming convention (recycle bin, temporary
    /// area, default upload target).
    pub fn role_of(&self, folder_identifier: &str) -> FolderRole {
        recycle::role_of(folder_identifier)
    }

    /// True when `identifier` lies inside `folder_identifier` or is the
    /// folder itself. The root contains everything.
    pub fn is_within(&self, folder_identifier: &str, identifier: &str) -> bool {
        let folder = naming::normalize_folder_name(folder_identifier);
        if folder.is_empty() {
            return true;
        }
        naming::normalize_folder_name(identifier).starts_with(&folder)
    }

    /// Hex SHA-256 of the storage-scoped absolute identifier.
    pub fn hash_identifier(&self, identifier: &str) -> String {
        let canonical = rooted(identifier.trim_start_matches(DELIMITER));
        let mut hasher = Sha256::new();
        hasher.update(self.config.storage_uid.to_string().as_bytes());
        hasher.update(b":");
        hasher.update(canonical.as_bytes());
        hex::encode(hasher.finalize())
    }

    // --- existence probes ---------------------------------------------

    pub async fn file_exists(&self, file_identifier: &str) -> Result<bool> {
        self.catalog.file_exists(file_identifier).await
    }

    pub async fn folder_exists(&self, folder_identifier: &str) -> Result<bool> {
        self.catalog.folder_exists(folder_identifier).await
    }

    pub async fn file_exists_in_folder(
        &self,
        file_name: &str,
        folder_identifier: &str,
    ) -> Result<bool> {
        let identifier = format!(
            "{}{file_name}",
            naming::normalize_folder_name(folder_identifier)
        );
        self.catalog.file_exists(&identifier).await
    }

    pub async fn folder_exists_in_folder(
        &self,
        folder_name: &str,
        folder_identifier: &str,
    ) -> Result<bool> {
        let identifier = format!(
            "{}{}",
            naming::normalize_folder_name(folder_identifier),
            naming::normalize_folder_name(folder_name)
        );
        self.catalog.folder_exists(&identifier).await
    }

    /// A folder is empty when it exists and its recursive listing holds
    /// nothing besides the folder itself.
    pub async fn is_folder_empty(&self, folder_identifier: &str) -> Result<bool> {
        let normalized = naming::normalize_folder_name(folder_identifier);
        Ok(self.catalog.folder_exists(&normalized).await?
            && self
                .catalog
                .objects(&normalized, true, true, true, false)
                .await?
                .is_empty())
    }

    // --- create ---------------------------------------------------------

    /// Creates a folder marker and returns the absolute identifier. The
    /// marker is only written when `recursive` is set or the parent exists;
    /// the identifier is computed and returned either way.
    pub async fn create_folder(
        &self,
        new_folder_name: &str,
        parent_folder_identifier: &str,
        recursive: bool,
    ) -> Result<String> {
        let identifier = naming::normalize_folder_name(&format!(
            "{}{}",
            naming::normalize_folder_name(parent_folder_identifier),
            naming::normalize_folder_name(new_folder_name)
        ));

        let containing = naming::parent_folder_name(&identifier);
        if recursive || self.catalog.folder_exists(&containing).await? {
            self.ops.make_folder(&identifier).await?;
        }

        Ok(rooted(&identifier))
    }

    /// Creates an empty file and returns the absolute identifier.
    pub async fn create_file(
        &self,
        file_name: &str,
        parent_folder_identifier: &str,
    ) -> Result<String> {
        let identifier = naming::normalize_file_name(&format!(
            "{}{file_name}",
            naming::normalize_folder_name(parent_folder_identifier)
        ));
        self.ops.create_empty_file(&identifier).await?;
        Ok(rooted(&identifier))
    }

    /// The default upload target, created on first use.
    pub async fn get_default_folder(&self) -> Result<String> {
        let identifier = format!("{DELIMITER}{USER_UPLOAD_FOLDER}{DELIMITER}");
        if !self.catalog.folder_exists(&identifier).await? {
            self.create_folder(&identifier, "", false).await?;
        }
        Ok(identifier)
    }

    // --- transfer -------------------------------------------------------

    /// Uploads a local file into a folder and returns the new absolute
    /// identifier. Non-empty files go through a resumable session with one
    /// resume attempt after an interrupted transfer; zero-byte files use a
    /// plain upload. The local original is removed on success when
    /// requested.
    pub async fn add_file(
        &self,
        local_file_path: &Path,
        target_folder_identifier: &str,
        new_file_name: &str,
        remove_original: bool,
    ) -> Result<String> {
        let file_name = if new_file_name.is_empty() {
            local_file_path
                .file_name()
                .map(|name| name.to_string_lossy().to_string())
                .unwrap_or_default()
        } else {
            new_file_name.to_string()
        };

        let identifier = format!(
            "{}{file_name}",
            naming::normalize_folder_name(target_folder_identifier)
        );
        let options = UploadOptions {
            name: identifier.clone(),
            content_type: Some(self.content_type_for(&file_name)),
        };

        let size = tokio::fs::metadata(local_file_path).await?.len();
        if size == 0 {
            // Zero-byte files cannot go through the resumable protocol.
            self.client.upload(Vec::new(), &options).await?;
        } else {
            let mut session = self
                .client
                .start_resumable_upload(local_file_path, &options)
                .await?;
            if let Err(interrupted) = session.upload().await {
                log_warn!(
                    "upload of {key} interrupted, resuming: {reason}",
                    key: identifier.as_str(),
                    reason: interrupted.to_string(),
                );
                session.resume().await?;
            }
        }
        self.cache.clear().await;

        if remove_original {
            if let Err(error) = tokio::fs::remove_file(local_file_path).await {
                log_warn!(
                    "could not remove local original {path}: {reason}",
                    path: local_file_path.display().to_string(),
                    reason: error.to_string(),
                );
            }
        }

        Ok(rooted(&identifier))
    }

    /// Replaces a file's content with a local file, keeping the identifier.
    pub async fn replace_file(
        &self,
        file_identifier: &str,
        local_file_path: &Path,
    ) -> Result<bool> {
        self.ops.delete(file_identifier, false).await?;
        let target_folder = naming::parent_folder_name(file_identifier);
        let new_name = naming::basename(file_identifier);
        self.add_file(local_file_path, &target_folder, &new_name, true)
            .await?;
        Ok(true)
    }

    pub async fn get_file_contents(&self, file_identifier: &str) -> Result<Vec<u8>> {
        let normalized = naming::normalize_file_name(file_identifier);
        self.client.download(&normalized).await
    }

    /// Writes file content directly and returns the byte count.
    pub async fn set_file_contents(
        &self,
        file_identifier: &str,
        contents: &[u8],
    ) -> Result<usize> {
        let normalized = naming::normalize_file_name(file_identifier);
        self.client
            .upload(
                contents.to_vec(),
                &UploadOptions {
                    name: normalized,
                    content_type: None,
                },
            )
            .await?;
        self.cache.clear().await;
        Ok(contents.len())
    }

    /// Downloads a file into a fresh temporary path for local processing.
    /// A missing object yields `None`.
    pub async fn get_file_for_local_processing(
        &self,
        file_identifier: &str,
    ) -> Result<Option<PathBuf>> {
        let normalized = naming::normalize_file_name(file_identifier);
        if !self.client.object_exists(&normalized).await? {
            return Ok(None);
        }

        let temporary = self.temporary_path_for(&normalized)?;
        self.client.download_to_file(&normalized, &temporary).await?;
        log_debug!(
            "downloaded {key} for local processing",
            key: normalized.as_str(),
        );
        Ok(Some(temporary))
    }

    /// Streams file content into the writer and returns the byte count.
    /// A missing object writes nothing.
    pub async fn dump_file_contents<W>(&self, identifier: &str, output: &mut W) -> Result<u64>
    where
        W: tokio::io::AsyncWrite + Unpin + Send,
    {
        let normalized = naming::normalize_file_name(identifier);
        if !self.client.object_exists(&normalized).await? {
            return Ok(0);
        }
        let mut stream = self.client.download_stream(&normalized).await?;
        Ok(tokio::io::copy(&mut stream, output).await?)
    }

    // --- delete ----------------------------------------------------------

    /// Deletes a file outright. Files are never recycled; only folder
    /// deletion consults the recycle policy.
    pub async fn delete_file(&self, file_identifier: &str) -> Result<bool> {
        let normalized = naming::normalize_file_name(file_identifier);
        self.ops.delete(&normalized, false).await?;
        Ok(true)
    }

    /// Deletes a folder, observing the recycle-bin policy.
    ///
    /// When a recycler folder exists along the ancestor chain (and neither
    /// contains the other), the folder is relocated into it instead of
    /// deleted. Otherwise the folder is removed for real, which requires
    /// `delete_recursively` unless it is empty; a non-empty folder without
    /// the flag reports `false` and deletes nothing.
    pub async fn delete_folder(
        &self,
        folder_identifier: &str,
        delete_recursively: bool,
    ) -> Result<bool> {
        let source = naming::normalize_folder_name(folder_identifier);

        match self.resolve_deletion_policy(&source).await? {
            DeletionPolicy::Recycle { recycler } => {
                log_info!(
                    "recycling folder {source} into {bin}",
                    source: source.as_str(),
                    bin: recycler.as_str(),
                );
                self.recycle_file_or_folder(&source, &recycler).await
            }
            DeletionPolicy::HardDelete => {
                if delete_recursively || self.is_folder_empty(&source).await? {
                    let entries = self
                        .catalog
                        .objects(&source, delete_recursively, true, true, true)
                        .await?;
                    log_info!(
                        "deleting folder {source} with {count} entries",
                        source: source.as_str(),
                        count: entries.len(),
                    );
                    for (key, object) in entries.iter() {
                        self.ops.delete(key, object.is_folder()).await?;
                    }
                    return Ok(true);
                }
                Ok(false)
            }
        }
    }

    /// Picks between relocation into a recycler and a hard delete. The
    /// nearest existing recycler wins; targets that are themselves a
    /// recycler, sit inside one, or contain the one found are removed for
    /// real.
    async fn resolve_deletion_policy(&self, source: &str) -> Result<DeletionPolicy> {
        if recycle::role_of(source) == FolderRole::Recycler {
            return Ok(DeletionPolicy::HardDelete);
        }

        for candidate in recycle::recycler_candidates(source) {
            if self.catalog.folder_exists(&candidate).await? {
                if self.is_within(&candidate, source) || self.is_within(source, &candidate) {
                    return Ok(DeletionPolicy::HardDelete);
                }
                return Ok(DeletionPolicy::Recycle { recycler: candidate });
            }
        }

        Ok(DeletionPolicy::HardDelete)
    }

    /// Relocates a file or folder into the recycler, prefixing the basename
    /// with a timestamp when the slot is already taken. Reports whether
    /// anything moved.
    async fn recycle_file_or_folder(
        &self,
        path: &str,
        recycle_directory: &str,
    ) -> Result<bool> {
        let basename = naming::basename(path);
        let destination = format!("{recycle_directory}{basename}");
        let occupied = self.catalog.file_exists(&destination).await?
            || self.catalog.folder_exists(&destination).await?;
        let destination_basename = if occupied {
            format!("{}_{basename}", Utc::now().format("%Y%m%d%H%M%S%6f"))
        } else {
            basename
        };

        if self.catalog.folder_exists(path).await? {
            let moved = self
                .move_folder_within_storage(path, recycle_directory, &destination_basename)
                .await?;
            return Ok(!moved.is_empty());
        }
        if self.catalog.file_exists(path).await? {
            self.move_file_within_storage(path, recycle_directory, &destination_basename)
                .await?;
            return Ok(true);
        }
        Ok(false)
    }

    // --- move, copy, rename ----------------------------------------------

    /// Moves a file and returns its new absolute identifier.
    pub async fn move_file_within_storage(
        &self,
        file_identifier: &str,
        target_folder_identifier: &str,
        new_file_name: &str,
    ) -> Result<String> {
        let source = naming::normalize_file_name(file_identifier);
        let target = format!(
            "{}{new_file_name}",
            naming::normalize_folder_name(target_folder_identifier)
        );
        self.ops.rename(&source, &target).await?;
        Ok(rooted(&target))
    }

    /// Moves a folder by renaming every entry under it, including entries
    /// that exist only implicitly. Returns the mapping from old to new
    /// absolute identifiers.
    pub async fn move_folder_within_storage(
        &self,
        source_folder_identifier: &str,
        target_folder_identifier: &str,
        new_folder_name: &str,
    ) -> Result<BTreeMap<String, String>> {
        let source = naming::normalize_folder_name(source_folder_identifier);
        let destination = naming::normalize_folder_name(&format!(
            "{}{}",
            naming::normalize_folder_name(target_folder_identifier),
            naming::normalize_folder_name(new_folder_name)
        ));

        let entries = self.catalog.objects(&source, true, true, true, true).await?;
        let mut identifier_map = BTreeMap::new();
        for key in entries.keys() {
            let new_key = format!("{destination}{}", &key[source.len()..]);
            self.ops.rename(key, &new_key).await?;
            identifier_map.insert(rooted(key), rooted(&new_key));
        }

        Ok(identifier_map)
    }

    /// Renames a folder in place; a move to its own parent.
    pub async fn rename_folder(
        &self,
        folder_identifier: &str,
        new_name: &str,
    ) -> Result<BTreeMap<String, String>> {
        let source = naming::normalize_folder_name(folder_identifier);
        let parent = naming::parent_folder_name(&source);
        let new_name = naming::normalize_folder_name(new_name);
        self.move_folder_within_storage(&source, &parent, &new_name)
            .await
    }

    /// Renames a file within its folder and returns the new absolute
    /// identifier.
    pub async fn rename_file(&self, file_identifier: &str, new_name: &str) -> Result<String> {
        let source = naming::normalize_file_name(file_identifier);
        let target = format!(
            "{}{}",
            naming::parent_folder_name(&source),
            naming::normalize_file_name(new_name)
        );
        self.ops.rename(&source, &target).await?;
        Ok(rooted(&target))
    }

    /// Copies a file and returns the new absolute identifier.
    pub async fn copy_file_within_storage(
        &self,
        file_identifier: &str,
        target_folder_identifier: &str,
        file_name: &str,
    ) -> Result<String> {
        let target = naming::normalize_file_name(&format!(
            "{}{file_name}",
            naming::normalize_folder_name(target_folder_identifier)
        ));
        self.ops.copy_from_to(file_identifier, &target).await?;
        Ok(rooted(&target))
    }

    /// Copies a folder recursively. File entries are copied server-side;
    /// folder entries, real or implicit, are re-minted as fresh markers.
    pub async fn copy_folder_within_storage(
        &self,
        source_folder_identifier: &str,
        target_folder_identifier: &str,
        new_folder_name: &str,
    ) -> Result<bool> {
        let source = naming::normalize_folder_name(source_folder_identifier);
        let destination = naming::normalize_folder_name(&format!(
            "{}{}",
            naming::normalize_folder_name(target_folder_identifier),
            naming::normalize_folder_name(new_folder_name)
        ));

        let entries = self.catalog.objects(&source, true, true, true, true).await?;
        for (key, object) in entries.iter() {
            let new_key = format!("{destination}{}", &key[source.len()..]);
            if object.is_folder() {
                self.ops.make_folder(&new_key).await?;
            } else {
                self.ops.copy_from_to(key, &new_key).await?;
            }
        }

        Ok(true)
    }

    // --- info ------------------------------------------------------------

    /// Property bag for a file. Folders and missing files yield an empty
    /// bag; an unrecognized property name is an error. An empty property
    /// list requests all known properties.
    pub async fn file_info(
        &self,
        file_identifier: &str,
        properties: &[&str],
    ) -> Result<BTreeMap<String, Value>> {
        if self.catalog.folder_exists(file_identifier).await?
            || !self.catalog.file_exists(file_identifier).await?
        {
            return Ok(BTreeMap::new());
        }

        let normalized = naming::normalize_file_name(file_identifier);
        let object = self
            .catalog
            .object(&normalized)
            .await?
            .ok_or_else(|| Error::ObjectNotFound(normalized.clone()))?;

        let requested: &[&str] = if properties.is_empty() {
            &DEFAULT_FILE_PROPERTIES
        } else {
            properties
        };

        let mut info = BTreeMap::new();
        for property in requested {
            info.insert(
                (*property).to_string(),
                self.file_property(&normalized, &object, property)?,
            );
        }
        Ok(info)
    }

    fn file_property(
        &self,
        identifier: &str,
        object: &FlatObject,
        property: &str,
    ) -> Result<Value> {
        match property {
            "size" => Ok(Value::from(object.size)),
            "mtime" | "atime" => Ok(Value::from(object.updated_at)),
            "ctime" => Ok(Value::from(object.created_at)),
            "name" => Ok(Value::from(naming::basename(identifier))),
            "extension" => Ok(Value::from(naming::extension(identifier))),
            "mimetype" => Ok(Value::from(object.content_type.clone())),
            "identifier" => Ok(Value::from(rooted(identifier))),
            "storage" => Ok(Value::from(self.config.storage_uid)),
            "identifier_hash" => Ok(Value::from(self.hash_identifier(identifier))),
            "folder_hash" => Ok(Value::from(
                self.hash_identifier(&naming::parent_folder_name(identifier)),
            )),
            unknown => Err(Error::UnknownProperty(unknown.to_string())),
        }
    }

    /// Property bag for a folder. The root is always reported, with
    /// observation-time timestamps; any other missing folder is an error.
    pub async fn folder_info(&self, folder_identifier: &str) -> Result<BTreeMap<String, Value>> {
        let normalized = naming::normalize_folder_name(folder_identifier);
        let now = Utc::now().timestamp();

        let mut info = BTreeMap::new();
        if normalized.is_empty() {
            info.insert("identifier".to_string(), Value::from("/"));
            info.insert("name".to_string(), Value::from(""));
            info.insert("mtime".to_string(), Value::from(now));
            info.insert("ctime".to_string(), Value::from(now));
            info.insert("storage".to_string(), Value::from(self.config.storage_uid));
            return Ok(info);
        }

        if self.catalog.folder_object(&normalized).await?.is_none() {
            return Err(Error::FolderDoesNotExist(normalized));
        }

        // Folder objects carry no usable timestamps; report observation
        // time.
        info.insert("identifier".to_string(), Value::from(rooted(&normalized)));
        info.insert(
            "name".to_string(),
            Value::from(naming::basename(&normalized)),
        );
        info.insert("mtime".to_string(), Value::from(now));
        info.insert("ctime".to_string(), Value::from(now));
        info.insert("storage".to_string(), Value::from(self.config.storage_uid));
        Ok(info)
    }

    // --- listing -----------------------------------------------------------

    /// Computed absolute identifier of a file inside a folder. No
    /// existence check.
    pub fn get_file_in_folder(&self, file_name: &str, folder_identifier: &str) -> String {
        rooted(&naming::normalize_file_name(&format!(
            "{}{file_name}",
            naming::normalize_folder_name(folder_identifier)
        )))
    }

    /// Computed absolute identifier of a folder inside a folder. No
    /// existence check.
    pub fn get_folder_in_folder(&self, folder_name: &str, folder_identifier: &str) -> String {
        rooted(&naming::normalize_folder_name(&format!(
            "{}{folder_name}",
            naming::normalize_folder_name(folder_identifier)
        )))
    }

    /// Absolute identifiers of the files in a folder, as one sorted and
    /// filtered page. `number_of_items` of zero means unlimited.
    pub async fn get_files_in_folder(
        &self,
        folder_identifier: &str,
        start: usize,
        number_of_items: usize,
        recursive: bool,
        filters: &[Box<dyn DirectoryFilter>],
        sort: &str,
        sort_reverse: bool,
    ) -> Result<Vec<String>> {
        self.directory_item_list(
            folder_identifier,
            start,
            number_of_items,
            filters,
            true,
            false,
            recursive,
            sort,
            sort_reverse,
        )
        .await
    }

    /// Absolute identifiers of the folders in a folder, as one sorted and
    /// filtered page.
    pub async fn get_folders_in_folder(
        &self,
        folder_identifier: &str,
        start: usize,
        number_of_items: usize,
        recursive: bool,
        filters: &[Box<dyn DirectoryFilter>],
        sort: &str,
        sort_reverse: bool,
    ) -> Result<Vec<String>> {
        self.directory_item_list(
            folder_identifier,
            start,
            number_of_items,
            filters,
            false,
            true,
            recursive,
            sort,
            sort_reverse,
        )
        .await
    }

    pub async fn count_files_in_folder(
        &self,
        folder_identifier: &str,
        recursive: bool,
        filters: &[Box<dyn DirectoryFilter>],
    ) -> Result<usize> {
        Ok(self
            .get_files_in_folder(folder_identifier, 0, 0, recursive, filters, "", false)
            .await?
            .len())
    }

    pub async fn count_folders_in_folder(
        &self,
        folder_identifier: &str,
        recursive: bool,
        filters: &[Box<dyn DirectoryFilter>],
    ) -> Result<usize> {
        Ok(self
            .get_folders_in_folder(folder_identifier, 0, 0, recursive, filters, "", false)
            .await?
            .len())
    }

    /// Shared listing pipeline: sorted entries go through the filter chain
    /// before the start offset is consumed, so skipped items are filtered
    /// items.
    async fn directory_item_list(
        &self,
        folder_identifier: &str,
        start: usize,
        number_of_items: usize,
        filters: &[Box<dyn DirectoryFilter>],
        include_files: bool,
        include_folders: bool,
        recursive: bool,
        sort: &str,
        sort_reverse: bool,
    ) -> Result<Vec<String>> {
        let folder = naming::normalize_folder_name(folder_identifier);
        let entries = self
            .catalog
            .objects_sorted(
                &folder,
                recursive,
                include_files,
                include_folders,
                sort,
                sort_reverse,
            )
            .await?;

        let mut identifiers = Vec::new();
        let mut to_skip = start;
        for object in &entries {
            let parent = naming::parent_folder_name(&object.name);
            if !evaluate_filters(
                filters,
                &object.basename(),
                &rooted(&object.name),
                &rooted(&parent),
            )? {
                continue;
            }
            if to_skip > 0 {
                to_skip -= 1;
                continue;
            }
            identifiers.push(rooted(&object.name));
            if number_of_items != 0 && identifiers.len() == number_of_items {
                break;
            }
        }
        Ok(identifiers)
    }

    // --- helpers -----------------------------------------------------------

    /// MIME type for an upload, from the configured extension overrides.
    fn content_type_for(&self, file_name: &str) -> String {
        let extension = naming::extension(file_name).to_ascii_lowercase();
        self.config
            .mime_overrides
            .get(&extension)
            .cloned()
            .unwrap_or_else(|| "application/octet-stream".to_string())
    }

    /// Fresh download target in the configured temp directory, keeping the
    /// source extension so downstream tools can sniff the type.
    fn temporary_path_for(&self, key: &str) -> Result<PathBuf> {
        let extension = naming::extension(key);
        let suffix = if extension.is_empty() {
            String::new()
        } else {
            format!(".{extension}")
        };

        let mut builder = tempfile::Builder::new();
        builder.prefix("bucketfs-").suffix(&suffix);
        let file = match &self.config.temp_dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        let (_, path) = file.keep().map_err(|persist| Error::Io(persist.error))?;
        Ok(path)
    }
}

/// Absolute identifier for a flat key. The facade hands out absolute
/// identifiers; bare keys stay internal.
fn rooted(key: &str) -> String {
    format!("{DELIMITER}{key}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryBucket;

    fn driver() -> BucketDriver {
        BucketDriver::new(Arc::new(MemoryBucket::new()), DriverConfig::default())
    }

    #[test]
    fn rooted_identifiers() {
        assert_eq!(rooted(""), "/");
        assert_eq!(rooted("a/b/"), "/a/b/");
        assert_eq!(rooted("a/b.txt"), "/a/b.txt");
    }

    #[test]
    fn containment_is_prefix_based() {
        let driver = driver();
        assert!(driver.is_within("/", "/anything/at/all.txt"));
        assert!(driver.is_within("a/b/", "a/b/c.txt"));
        assert!(driver.is_within("/a/b/", "/a/b/"));
        assert!(driver.is_within("a/b/", "a/b/c/d/"));
        assert!(!driver.is_within("a/b/", "a/bc.txt"));
        assert!(!driver.is_within("a/b/", "a/"));
        assert!(!driver.is_within("a/b/", "other/"));
    }

    #[test]
    fn identifier_hashes_are_storage_scoped() {
        let first = BucketDriver::new(
            Arc::new(MemoryBucket::new()),
            DriverConfig {
                storage_uid: 7,
                ..DriverConfig::default()
            },
        );
        let second = BucketDriver::new(
            Arc::new(MemoryBucket::new()),
            DriverConfig {
                storage_uid: 8,
                ..DriverConfig::default()
            },
        );

        let from_bare = first.hash_identifier("a/b.txt");
        let from_rooted = first.hash_identifier("/a/b.txt");
        assert_eq!(from_bare, from_rooted);
        assert_eq!(from_bare.len(), 64);
        assert_ne!(from_bare, second.hash_identifier("a/b.txt"));
    }

    #[test]
    fn parent_identifiers_are_rooted_folders() {
        let driver = driver();
        assert_eq!(driver.parent_folder_identifier("a/b/c.txt"), "/a/b/");
        assert_eq!(driver.parent_folder_identifier("a/b/"), "/a/");
        assert_eq!(driver.parent_folder_identifier("c.txt"), "/");
        assert_eq!(driver.root_level_folder(), "/");
    }
}
