//! Error types for rgss-core

use std::path::PathBuf;

/// Result type for rgss-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in rgss-core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Project configuration file not found
    #[error("Project configuration not found at {path}. Run `rgss init` first")]
    ConfigNotFound { path: PathBuf },

    /// No script container in the game folder
    #[error("Script container not found at {path}")]
    ContainerNotFound { path: PathBuf },

    /// No container found and no version configured
    #[error("Cannot determine the RGSS version of {game_folder}: no Scripts.rxdata, Scripts.rvdata or Scripts.rvdata2 in Data/")]
    VersionUnknown { game_folder: PathBuf },

    /// A script name was rejected by the name policy
    #[error("Invalid script name '{name}': {reason}")]
    InvalidScriptName { name: String, reason: String },

    /// No script matches the requested target
    #[error("Script not found: {target}")]
    NodeNotFound { target: String },

    /// A script with the resulting file name already exists
    #[error("A script named '{file_name}' already exists")]
    NameConflict { file_name: String },

    /// File watcher failure
    #[error("File watcher error: {0}")]
    Watch(#[from] notify::Error),

    // Transparent wrappers for underlying crate errors
    /// Filesystem error from rgss-fs
    #[error(transparent)]
    Fs(#[from] rgss_fs::Error),

    /// Container error from rgss-bundle
    #[error(transparent)]
    Bundle(#[from] rgss_bundle::Error),

    /// Index error from rgss-index
    #[error(transparent)]
    Index(#[from] rgss_index::Error),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
