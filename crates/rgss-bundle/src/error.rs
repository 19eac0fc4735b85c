//! Error types for rgss-bundle

/// Result type for rgss-bundle operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while decoding or encoding a script container
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Corrupt container at offset {offset:#x}: {message}")]
    CorruptContainer { offset: usize, message: String },

    #[error("Corrupt record (section {section_id}): {message}")]
    CorruptRecord { section_id: i32, message: String },

    #[error("Section id allocator exhausted after {attempts} attempts")]
    AllocatorExhausted { attempts: usize },

    #[error("Duplicate section id {section_id} in container")]
    DuplicateSectionId { section_id: i32 },

    #[error("Failed to compress script '{title}': {source}")]
    Compression {
        title: String,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub(crate) fn corrupt(offset: usize, message: impl Into<String>) -> Self {
        Self::CorruptContainer {
            offset,
            message: message.into(),
        }
    }
}
