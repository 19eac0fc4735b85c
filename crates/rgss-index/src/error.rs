//! Error types for rgss-index

use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Fs(#[from] rgss_fs::Error),

    #[error("Index file not found: {path}. Unpack the scripts first")]
    IndexFileMissing { path: PathBuf },

    #[error(
        "Index file {path} line {line} ('{content}') has no order key. Migrate the scripts to the ordered naming scheme"
    )]
    IndexFileUnrecognizedFormat {
        path: PathBuf,
        line: usize,
        content: String,
    },

    #[error("No free order key after {after} ({attempts} attempts)")]
    OrderKeyExhausted { after: String, attempts: usize },

    #[error("Index backup not found: {path}")]
    BackupMissing { path: PathBuf },
}
