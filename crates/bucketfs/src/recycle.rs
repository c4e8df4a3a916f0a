//! Recycle-bin policy for folder deletion.
//!
//! Deleting a folder does not necessarily destroy it: when a `_recycler_`
//! folder exists somewhere along the target's ancestor chain, the target is
//! relocated into the nearest one instead. The pure parts of that policy
//! live here; the driver wires them to the store.

use crate::naming::{self, DELIMITER};

/// Name of the folder that receives recycled entries.
pub const RECYCLER_FOLDER: &str = "_recycler_";
/// Name of the folder for transient processing artifacts.
pub const TEMPORARY_FOLDER: &str = "_temp_";
/// Name of the default upload target.
pub const USER_UPLOAD_FOLDER: &str = "user_upload";

/// Special purpose a folder carries, judged by its basename.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FolderRole {
    Default,
    Recycler,
    Temporary,
    UserUpload,
}

/// Role of a folder identifier.
pub fn role_of(folder_identifier: &str) -> FolderRole {
    match naming::basename(folder_identifier).as_str() {
        RECYCLER_FOLDER => FolderRole::Recycler,
        TEMPORARY_FOLDER => FolderRole::Temporary,
        USER_UPLOAD_FOLDER => FolderRole::UserUpload,
        _ => FolderRole::Default,
    }
}

/// How a folder deletion is carried out once the recycler lookup resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeletionPolicy {
    /// Relocate the target into this recycler folder.
    Recycle { recycler: String },
    /// Remove the objects for real.
    HardDelete,
}

/// Candidate recycler locations for a target, nearest first.
///
/// A folder `dir/subdir/` yields `dir/subdir/_recycler_/`,
/// `dir/_recycler_/` and `_recycler_/`; a file `dir/file.txt` yields
/// `dir/_recycler_/` and `_recycler_/`. The caller probes them in order and
/// uses the first that exists.
pub fn recycler_candidates(identifier: &str) -> Vec<String> {
    let mut prefixes = vec![String::new()];
    let mut cumulative = String::new();
    let trimmed = identifier.trim_matches(DELIMITER);
    if !trimmed.is_empty() {
        let segments: Vec<&str> = trimmed.split(DELIMITER).collect();
        let levels = if identifier.ends_with(DELIMITER) {
            segments.len()
        } else {
            segments.len() - 1
        };
        for segment in &segments[..levels] {
            cumulative.push_str(segment);
            cumulative.push(DELIMITER);
            prefixes.push(cumulative.clone());
        }
    }

    prefixes
        .into_iter()
        .rev()
        .map(|prefix| format!("{prefix}{RECYCLER_FOLDER}{DELIMITER}"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_follow_basenames() {
        assert_eq!(role_of("a/_recycler_/"), FolderRole::Recycler);
        assert_eq!(role_of("_recycler_"), FolderRole::Recycler);
        assert_eq!(role_of("a/_temp_/"), FolderRole::Temporary);
        assert_eq!(role_of("user_upload/"), FolderRole::UserUpload);
        assert_eq!(role_of("a/pictures/"), FolderRole::Default);
        assert_eq!(role_of(""), FolderRole::Default);
    }

    #[test]
    fn folder_candidates_start_inside_the_target() {
        assert_eq!(
            recycler_candidates("dir/subdir/"),
            vec![
                "dir/subdir/_recycler_/".to_string(),
                "dir/_recycler_/".to_string(),
                "_recycler_/".to_string(),
            ]
        );
    }

    #[test]
    fn file_candidates_start_at_the_sibling_level() {
        assert_eq!(
            recycler_candidates("dir/subdir/testfile.txt"),
            vec![
                "dir/subdir/_recycler_/".to_string(),
                "dir/_recycler_/".to_string(),
                "_recycler_/".to_string(),
            ]
        );
    }

    #[test]
    fn top_level_targets_fall_back_to_the_root_recycler() {
        assert_eq!(
            recycler_candidates("file.txt"),
            vec!["_recycler_/".to_string()]
        );
        assert_eq!(
            recycler_candidates("folder/"),
            vec![
                "folder/_recycler_/".to_string(),
                "_recycler_/".to_string()
            ]
        );
        assert_eq!(recycler_candidates(""), vec!["_recycler_/".to_string()]);
    }
}
