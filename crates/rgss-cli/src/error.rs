//! CLI error type

pub type Result<T> = std::result::Result<T, CliError>;

/// Everything a command can fail with. Library errors pass through unchanged.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] rgss_core::Error),

    #[error(transparent)]
    Fs(#[from] rgss_fs::Error),

    #[error(transparent)]
    Index(#[from] rgss_index::Error),

    #[error(transparent)]
    Bundle(#[from] rgss_bundle::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// `list --json` serialization
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// A usage problem, reported as-is
    #[error("{message}")]
    User { message: String },
}

impl CliError {
    pub fn user(message: impl Into<String>) -> Self {
        Self::User {
            message: message.into(),
        }
    }
}
