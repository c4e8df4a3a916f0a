//! Flat key normalization.
//!
//! The bucket has no real directories. By convention a folder is a key with
//! a single trailing delimiter and a file is a key without one. Callers hand
//! in identifiers in all kinds of shapes (`/abc/def/`, `abc/def`, `/`, `.`);
//! these helpers map them onto that convention.

/// Separator between path segments in flat object keys.
pub const DELIMITER: char = '/';

/// Normalizes a folder identifier to its flat key form.
///
/// Delimiters are trimmed from both ends and a single trailing delimiter is
/// appended. The root folder (`""`, `"/"` or `"."`) normalizes to the empty
/// string. Idempotent.
pub fn normalize_folder_name(folder_name: &str) -> String {
    let trimmed = folder_name.trim_matches(DELIMITER);
    if trimmed.is_empty() || trimmed == "." {
        String::new()
    } else {
        format!("{trimmed}{DELIMITER}")
    }
}

/// Normalizes a file identifier to its flat key form.
///
/// Only trims delimiters from both ends; files never carry a trailing
/// delimiter. Idempotent.
pub fn normalize_file_name(file_name: &str) -> String {
    file_name.trim_matches(DELIMITER).to_string()
}

/// True when the identifier denotes the bucket root.
pub fn is_root(folder_name: &str) -> bool {
    normalize_folder_name(folder_name).is_empty()
}

/// Final path segment of an identifier, ignoring a trailing delimiter.
/// The root yields an empty string.
pub fn basename(identifier: &str) -> String {
    let trimmed = identifier.trim_end_matches(DELIMITER);
    match trimmed.rfind(DELIMITER) {
        Some(pos) => trimmed[pos + 1..].to_string(),
        None => trimmed.to_string(),
    }
}

/// Normalized folder name of the identifier's parent. Top-level entries and
/// the root itself yield the empty string.
pub fn parent_folder_name(identifier: &str) -> String {
    let trimmed = identifier.trim_end_matches(DELIMITER);
    match trimmed.rfind(DELIMITER) {
        Some(pos) => normalize_folder_name(&trimmed[..pos]),
        None => String::new(),
    }
}

/// Extension of the identifier's basename, without the dot. Empty when the
/// basename has none or ends with the dot.
pub fn extension(identifier: &str) -> String {
    let name = basename(identifier);
    match name.rfind('.') {
        Some(pos) if pos + 1 < name.len() => name[pos + 1..].to_string(),
        _ => String::new(),
    }
}
