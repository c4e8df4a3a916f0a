use serde::Serialize;

use crate::client::ObjectRecord;
use crate::naming;

/// Classification of a flat key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ObjectKind {
    File,
    Folder,
}

impl ObjectKind {
    /// Keys with a trailing delimiter are folders, everything else is a file.
    pub fn of_key(key: &str) -> Self {
        if key.ends_with(naming::DELIMITER) {
            ObjectKind::Folder
        } else {
            ObjectKind::File
        }
    }
}

/// One entry of the bucket catalog.
///
/// Built transiently from listing records plus synthesized parent folders,
/// never mutated afterwards. `name` is the full flat key; a folder name ends
/// with exactly one trailing delimiter, a file name never does. Timestamps
/// are unix seconds, zero when unknown.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlatObject {
    pub name: String,
    pub kind: ObjectKind,
    pub content_type: String,
    pub size: u64,
    pub created_at: i64,
    pub updated_at: i64,
}

impl FlatObject {
    /// Builds an entry from a raw listing record, classifying by key shape.
    /// Missing or malformed timestamps read as zero.
    pub fn from_record(record: &ObjectRecord) -> Self {
        FlatObject {
            name: record.name.clone(),
            kind: ObjectKind::of_key(&record.name),
            content_type: record.content_type.clone().unwrap_or_default(),
            size: record.size,
            created_at: parse_epoch(record.time_created.as_deref()),
            updated_at: parse_epoch(record.updated.as_deref()),
        }
    }

    /// A folder inferred from another key's path segments, carrying the
    /// timestamps of the object that implied it.
    pub fn phantom_folder(name: String, created_at: i64, updated_at: i64) -> Self {
        FlatObject {
            name,
            kind: ObjectKind::Folder,
            content_type: String::new(),
            size: 0,
            created_at,
            updated_at,
        }
    }

    /// A folder object carrying no metadata, used when only existence is
    /// known.
    pub fn synthetic_folder(name: &str) -> Self {
        FlatObject::phantom_folder(name.to_string(), 0, 0)
    }

    pub fn is_file(&self) -> bool {
        self.kind == ObjectKind::File
    }

    pub fn is_folder(&self) -> bool {
        self.kind == ObjectKind::Folder
    }

    /// Final path segment, without the folder delimiter.
    pub fn basename(&self) -> String {
        naming::basename(&self.name)
    }

    /// Extension of the basename, empty when there is none.
    pub fn extension(&self) -> String {
        naming::extension(&self.name)
    }
}

fn parse_epoch(raw: Option<&str>) -> i64 {
    raw.and_then(|value| chrono::DateTime::parse_from_rfc3339(value).ok())
        .map(|stamp| stamp.timestamp())
        .unwrap_or(0)
}
