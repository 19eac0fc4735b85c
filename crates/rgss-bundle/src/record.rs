//! Script records as stored in the container

use crate::compression;
use crate::error::{Error, Result};

/// Prefix given to records whose title is empty.
pub const UNTITLED_PREFIX: &str = "Untitled";

/// One `(section_id, title, zlib payload)` entry of a container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptRecord {
    pub section_id: i32,
    pub title: Vec<u8>,
    pub payload: Vec<u8>,
}

impl ScriptRecord {
    pub fn new(section_id: i32, title: impl Into<Vec<u8>>, payload: Vec<u8>) -> Self {
        Self {
            section_id,
            title: title.into(),
            payload,
        }
    }

    /// Build a record by compressing `text`.
    pub fn from_text(section_id: i32, title: impl Into<Vec<u8>>, text: &[u8]) -> Result<Self> {
        let title = title.into();
        let payload = compression::deflate(text).map_err(|source| Error::Compression {
            title: String::from_utf8_lossy(&title).into_owned(),
            source,
        })?;
        Ok(Self {
            section_id,
            title,
            payload,
        })
    }

    /// Decompress the payload.
    pub fn inflate(&self) -> Result<Vec<u8>> {
        compression::inflate(&self.payload).map_err(|e| Error::CorruptRecord {
            section_id: self.section_id,
            message: e.to_string(),
        })
    }

    /// Decompress the payload and decode it as UTF-8.
    pub fn text(&self) -> Result<String> {
        let bytes = self.inflate()?;
        String::from_utf8(bytes).map_err(|e| Error::CorruptRecord {
            section_id: self.section_id,
            message: format!("script is not valid UTF-8: {}", e),
        })
    }

    /// Title as text, replacing invalid UTF-8 sequences.
    pub fn title_lossy(&self) -> String {
        String::from_utf8_lossy(&self.title).into_owned()
    }

    /// Name shown for this record at `index`. Empty titles become
    /// `Untitled_<index>` so the name depends only on position.
    pub fn display_title(&self, index: usize) -> String {
        if self.title.is_empty() {
            format!("{}_{}", UNTITLED_PREFIX, index)
        } else {
            self.title_lossy()
        }
    }
}

/// The record layouts found in containers written by different tools.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordShape {
    /// `[section_id, title, payload]`
    Tagged {
        section_id: i32,
        title: Vec<u8>,
        payload: Vec<u8>,
    },
    /// `[title, payload]` with no section id
    Legacy { title: Vec<u8>, payload: Vec<u8> },
    /// `[[section_id, title, payload]]`; the inner id is not trusted
    Nested { title: Vec<u8>, payload: Vec<u8> },
}

impl RecordShape {
    /// Section id carried by the record, if it is trusted.
    pub fn section_id(&self) -> Option<i32> {
        match self {
            Self::Tagged { section_id, .. } => Some(*section_id),
            Self::Legacy { .. } | Self::Nested { .. } => None,
        }
    }

    /// Finish the record, using `fresh_id` when it carries no trusted id.
    pub fn into_record(self, fresh_id: impl FnOnce() -> Result<i32>) -> Result<ScriptRecord> {
        match self {
            Self::Tagged {
                section_id,
                title,
                payload,
            } => Ok(ScriptRecord::new(section_id, title, payload)),
            Self::Legacy { title, payload } | Self::Nested { title, payload } => {
                Ok(ScriptRecord::new(fresh_id()?, title, payload))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_title_uses_position() {
        let record = ScriptRecord::new(1, "", Vec::new());
        assert_eq!(record.display_title(7), "Untitled_7");
    }

    #[test]
    fn named_title_ignores_position() {
        let record = ScriptRecord::new(1, "Main", Vec::new());
        assert_eq!(record.display_title(7), "Main");
    }

    #[test]
    fn text_roundtrips_through_payload() {
        let record = ScriptRecord::from_text(5, "Main", "p 'héllo'".as_bytes()).unwrap();
        assert_eq!(record.text().unwrap(), "p 'héllo'");
    }

    #[test]
    fn bad_payload_names_section() {
        let record = ScriptRecord::new(42, "Broken", b"garbage".to_vec());
        match record.inflate() {
            Err(Error::CorruptRecord { section_id, .. }) => assert_eq!(section_id, 42),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
