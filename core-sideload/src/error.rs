use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SideloadError {
    /// A paginated catalog retrieval could not complete. Fatal: the run
    /// aborts without touching the transfer log.
    #[error("catalog retrieval failed: {0}")]
    Catalog(String),

    /// A download or upload failed for a single item. Isolated at the
    /// item-pipeline boundary; never aborts sibling transfers.
    #[error("asset transfer failed: {0}")]
    Asset(String),

    #[error("transfer log at {path}: {message}")]
    LogStore { path: PathBuf, message: String },

    #[error("invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, SideloadError>;
