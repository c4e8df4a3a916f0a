use std::cmp::Ordering;
use std::sync::Arc;

use diagnostics::log_debug;

use crate::cache::{Listing, ListingCache, Signature};
use crate::client::{BucketClient, ListOptions};
use crate::error::Result;
use crate::naming::{self, DELIMITER};
use crate::object::FlatObject;

/// Field projection requested from listings. Everything the catalog needs,
/// nothing more.
const LISTING_FIELDS: &str =
    "items/name,items/contentType,items/size,items/timeCreated,items/updated,nextPageToken";

/// Read-side view of the bucket.
///
/// Builds the full key catalog with synthesized parent folders and serves
/// filtered and sorted views of it. Every listing is memoized in the shared
/// cache under its call signature.
#[derive(Clone)]
pub struct ObjectCatalog {
    client: Arc<dyn BucketClient>,
    cache: Arc<ListingCache>,
}

impl ObjectCatalog {
    pub fn new(client: Arc<dyn BucketClient>, cache: Arc<ListingCache>) -> Self {
        ObjectCatalog { client, cache }
    }

    /// The complete catalog under a prefix: one entry per real object plus
    /// one per folder implied by the key structure.
    ///
    /// Pages through the store until the listing is exhausted. Real entries
    /// always win over implied folders, whatever order the pages arrive in;
    /// among implied folders the first discovering object donates the
    /// timestamps.
    pub async fn all_objects(&self, prefix: &str) -> Result<Arc<Listing>> {
        let signature = Signature::Full {
            prefix: prefix.to_string(),
        };
        if let Some(hit) = self.cache.get(&signature).await {
            return Ok(hit);
        }

        let mut listing = Listing::new();
        let mut phantoms: Vec<FlatObject> = Vec::new();
        let mut page_token: Option<String> = None;
        let mut pages = 0usize;
        loop {
            let page = self
                .client
                .list_objects(&ListOptions {
                    prefix: prefix.to_string(),
                    fields: Some(LISTING_FIELDS.to_string()),
                    page_token: page_token.take(),
                })
                .await?;
            pages += 1;

            for record in &page.objects {
                let object = FlatObject::from_record(record);
                collect_phantom_parents(&object, &mut phantoms);
                listing.insert(object.name.clone(), object);
            }

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        for phantom in phantoms {
            listing.entry(phantom.name.clone()).or_insert(phantom);
        }

        log_debug!(
            "catalog built from {pages} pages with {entries} entries",
            pages: pages,
            entries: listing.len(),
        );

        let listing = Arc::new(listing);
        self.cache.put(signature, Arc::clone(&listing)).await;
        Ok(listing)
    }

    /// Client-side filtered view of the full catalog.
    ///
    /// Keeps keys under `prefix`, honoring the file/folder inclusion flags.
    /// The prefix key itself is dropped unless `include_self`. When not
    /// recursive, only direct children survive: folders may carry one
    /// delimiter beyond the prefix, files none.
    pub async fn objects(
        &self,
        prefix: &str,
        recursive: bool,
        include_files: bool,
        include_folders: bool,
        include_self: bool,
    ) -> Result<Arc<Listing>> {
        let signature = Signature::Filtered {
            prefix: prefix.to_string(),
            recursive,
            include_files,
            include_folders,
            include_self,
        };
        if let Some(hit) = self.cache.get(&signature).await {
            return Ok(hit);
        }

        let all = self.all_objects("").await?;
        let mut filtered = Listing::new();
        for (key, object) in all.iter() {
            if !include_self && key.as_str() == prefix {
                continue;
            }
            if !key.starts_with(prefix) {
                continue;
            }
            if object.is_folder() && !include_folders {
                continue;
            }
            if object.is_file() && !include_files {
                continue;
            }
            if !recursive && key.as_str() != prefix {
                let depth = key[prefix.len()..].matches(DELIMITER).count();
                let limit = if object.is_file() { 0 } else { 1 };
                if depth > limit {
                    continue;
                }
            }
            filtered.insert(key.clone(), object.clone());
        }

        let listing = Arc::new(filtered);
        self.cache.put(signature, Arc::clone(&listing)).await;
        Ok(listing)
    }

    /// Entries under a path, sorted for display. `reverse` flips the final
    /// sequence after the stable sort, so ties flip too.
    pub async fn objects_sorted(
        &self,
        path: &str,
        recursive: bool,
        include_files: bool,
        include_folders: bool,
        sort: &str,
        reverse: bool,
    ) -> Result<Vec<FlatObject>> {
        let listing = self
            .objects(path, recursive, include_files, include_folders, false)
            .await?;
        let mut entries: Vec<FlatObject> = listing.values().cloned().collect();
        sort_objects(&mut entries, SortKey::parse(sort));
        if reverse {
            entries.reverse();
        }
        Ok(entries)
    }

    /// The bucket root always exists; any other folder exists when its
    /// direct-children view (including its own marker) is non-empty.
    pub async fn folder_exists(&self, folder_name: &str) -> Result<bool> {
        let normalized = naming::normalize_folder_name(folder_name);
        if normalized.is_empty() {
            return Ok(true);
        }
        let children = self.objects(&normalized, false, true, true, true).await?;
        Ok(!children.is_empty())
    }

    /// Folder entry for a path, without metadata. The root has no object
    /// representation, so it yields `None`, as does a folder with no trace
    /// in the catalog.
    pub async fn folder_object(&self, folder_name: &str) -> Result<Option<FlatObject>> {
        let normalized = naming::normalize_folder_name(folder_name);
        if normalized.is_empty() {
            return Ok(None);
        }
        if !self.folder_exists(&normalized).await? {
            return Ok(None);
        }
        Ok(Some(FlatObject::synthetic_folder(&normalized)))
    }

    /// True when a file object sits at exactly this key.
    pub async fn file_exists(&self, file_name: &str) -> Result<bool> {
        let normalized = naming::normalize_file_name(file_name);
        let all = self.all_objects("").await?;
        Ok(all.get(&normalized).is_some_and(FlatObject::is_file))
    }

    /// Exact-key lookup in the full catalog.
    pub async fn object(&self, name: &str) -> Result<Option<FlatObject>> {
        let all = self.all_objects("").await?;
        Ok(all.get(name).cloned())
    }

    pub fn is_root(&self, folder_name: &str) -> bool {
        naming::is_root(folder_name)
    }
}

/// Records the folder entries implied by an object's path segments: the key
/// `a/b/c.txt` implies `a/` and `a/b/`. For a folder key the final empty
/// segment drops out, so the key itself is implied along with its parents.
fn collect_phantom_parents(object: &FlatObject, phantoms: &mut Vec<FlatObject>) {
    let mut segments: Vec<&str> = object.name.split(DELIMITER).collect();
    segments.pop();
    let mut path = String::new();
    for segment in segments {
        path.push_str(segment);
        path.push(DELIMITER);
        phantoms.push(FlatObject::phantom_folder(
            path.clone(),
            object.created_at,
            object.updated_at,
        ));
    }
}

/// Recognized sort fields. Unrecognized names fall back to name order,
/// which also serves `"file"` and `"rw"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Name,
    Size,
    Extension,
    Updated,
}

impl SortKey {
    pub fn parse(field: &str) -> Self {
        match field {
            "size" => SortKey::Size,
            "fileext" => SortKey::Extension,
            "tstamp" => SortKey::Updated,
            _ => SortKey::Name,
        }
    }
}

fn sort_objects(entries: &mut [FlatObject], key: SortKey) {
    match key {
        SortKey::Size => entries.sort_by_key(|object| object.size),
        SortKey::Updated => entries.sort_by_key(|object| object.updated_at),
        SortKey::Extension => {
            entries.sort_by(|a, b| natural_casecmp(&a.extension(), &b.extension()));
        }
        SortKey::Name => entries.sort_by(|a, b| natural_casecmp(&a.name, &b.name)),
    }
}

/// Case-insensitive natural-order comparison: digit runs compare by numeric
/// value, everything else byte-wise after ASCII lowercasing.
fn natural_casecmp(a: &str, b: &str) -> Ordering {
    let left = a.as_bytes();
    let right = b.as_bytes();
    let mut i = 0;
    let mut j = 0;
    while i < left.len() && j < right.len() {
        if left[i].is_ascii_digit() && right[j].is_ascii_digit() {
            let (value_a, next_i) = take_number(left, i);
            let (value_b, next_j) = take_number(right, j);
            match value_a.cmp(&value_b) {
                Ordering::Equal => {
                    i = next_i;
                    j = next_j;
                }
                unequal => return unequal,
            }
        } else {
            match left[i]
                .to_ascii_lowercase()
                .cmp(&right[j].to_ascii_lowercase())
            {
                Ordering::Equal => {
                    i += 1;
                    j += 1;
                }
                unequal => return unequal,
            }
        }
    }
    (left.len() - i).cmp(&(right.len() - j))
}

fn take_number(bytes: &[u8], mut index: usize) -> (u128, usize) {
    let mut value: u128 = 0;
    while index < bytes.len() && bytes[index].is_ascii_digit() {
        value = value
            .saturating_mul(10)
            .saturating_add(u128::from(bytes[index] - b'0'));
        index += 1;
    }
    (value, index)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digit_runs_compare_numerically() {
        assert_eq!(natural_casecmp("img2.png", "img10.png"), Ordering::Less);
        assert_eq!(natural_casecmp("img10.png", "img2.png"), Ordering::Greater);
        assert_eq!(natural_casecmp("a100", "a100"), Ordering::Equal);
    }

    #[test]
    fn letters_compare_case_insensitively() {
        assert_eq!(natural_casecmp("Alpha", "alpha"), Ordering::Equal);
        assert_eq!(natural_casecmp("ALPHA", "beta"), Ordering::Less);
    }

    #[test]
    fn shorter_prefix_sorts_first() {
        assert_eq!(natural_casecmp("file", "file2"), Ordering::Less);
        assert_eq!(natural_casecmp("file2", "file"), Ordering::Greater);
    }

    #[test]
    fn sort_key_parsing_falls_back_to_name() {
        assert_eq!(SortKey::parse("size"), SortKey::Size);
        assert_eq!(SortKey::parse("fileext"), SortKey::Extension);
        assert_eq!(SortKey::parse("tstamp"), SortKey::Updated);
        assert_eq!(SortKey::parse("name"), SortKey::Name);
        assert_eq!(SortKey::parse("file"), SortKey::Name);
        assert_eq!(SortKey::parse("rw"), SortKey::Name);
        assert_eq!(SortKey::parse(""), SortKey::Name);
        assert_eq!(SortKey::parse("whatever"), SortKey::Name);
    }

    #[test]
    fn phantom_parents_cover_every_level() {
        let object = FlatObject::phantom_folder("a/b/c/".to_string(), 5, 6);
        let mut phantoms = Vec::new();
        collect_phantom_parents(&object, &mut phantoms);
        let names: Vec<&str> = phantoms.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["a/", "a/b/", "a/b/c/"]);
        assert!(phantoms.iter().all(|p| p.created_at == 5 && p.updated_at == 6));

        let file = FlatObject {
            name: "top.txt".to_string(),
            kind: crate::object::ObjectKind::File,
            content_type: String::new(),
            size: 0,
            created_at: 0,
            updated_at: 0,
        };
        let mut none = Vec::new();
        collect_phantom_parents(&file, &mut none);
        assert!(none.is_empty());
    }
}
