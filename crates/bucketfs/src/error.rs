// Error types for bucketfs operations

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Folder does not exist: {0}")]
    FolderDoesNotExist(String),

    #[error("The information \"{0}\" is not available")]
    UnknownProperty(String),

    #[error("Could not apply directory entry filter: {0}")]
    FilterFailed(String),

    #[error("Object not found: {0}")]
    ObjectNotFound(String),

    #[error("Storage error: {message}")]
    Store { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Shorthand for transport and backend failures.
    pub fn store(message: impl Into<String>) -> Self {
        Error::Store {
            message: message.into(),
        }
    }
}
