//! Hand-built script containers.
//!
//! [`ContainerBuilder`] writes Marshal bytes directly so tests can produce
//! layouts the encoder never emits: two-element records, records nested in
//! a one-element array, nil titles and payloads that are not zlib streams.

use rgss_bundle::compression;
use rgss_bundle::marshal::Writer;

enum Entry {
    Tagged { id: i64, title: Vec<u8>, payload: Vec<u8> },
    Legacy { title: Vec<u8>, payload: Vec<u8> },
    Nested { id: i64, title: Vec<u8>, payload: Vec<u8> },
    NilTitle { id: i64, payload: Vec<u8> },
}

/// Builds container bytes record by record.
///
/// # Example
///
/// ```rust
/// use rgss_test_utils::ContainerBuilder;
///
/// let bytes = ContainerBuilder::new()
///     .script(11, "Game_System", "class Game_System; end")
///     .legacy("Main", "rgss_main { }")
///     .build();
/// assert_eq!(&bytes[..2], &[4, 8]);
/// ```
#[derive(Default)]
pub struct ContainerBuilder {
    entries: Vec<Entry>,
}

fn deflate(text: &str) -> Vec<u8> {
    compression::deflate(text.as_bytes()).expect("ContainerBuilder: deflate failed")
}

impl ContainerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// `[id, title, zlib(text)]`
    pub fn script(mut self, id: i64, title: &str, text: &str) -> Self {
        self.entries.push(Entry::Tagged {
            id,
            title: title.as_bytes().to_vec(),
            payload: deflate(text),
        });
        self
    }

    /// `[title, zlib(text)]` without a section id.
    pub fn legacy(mut self, title: &str, text: &str) -> Self {
        self.entries.push(Entry::Legacy {
            title: title.as_bytes().to_vec(),
            payload: deflate(text),
        });
        self
    }

    /// `[[id, title, zlib(text)]]`
    pub fn nested(mut self, id: i64, title: &str, text: &str) -> Self {
        self.entries.push(Entry::Nested {
            id,
            title: title.as_bytes().to_vec(),
            payload: deflate(text),
        });
        self
    }

    /// `[id, nil, zlib(text)]`
    pub fn untitled(mut self, id: i64, text: &str) -> Self {
        self.entries.push(Entry::NilTitle {
            id,
            payload: deflate(text),
        });
        self
    }

    /// A tagged record whose payload is not a zlib stream.
    pub fn corrupt(mut self, id: i64, title: &str) -> Self {
        self.entries.push(Entry::Tagged {
            id,
            title: title.as_bytes().to_vec(),
            payload: b"definitely not zlib".to_vec(),
        });
        self
    }

    pub fn build(self) -> Vec<u8> {
        let mut writer = Writer::new();
        writer.write_array_header(self.entries.len());
        for entry in &self.entries {
            match entry {
                Entry::Tagged { id, title, payload } => {
                    writer.write_array_header(3);
                    writer.write_integer(*id);
                    writer.write_utf8(title);
                    writer.write_bytes(payload);
                }
                Entry::Legacy { title, payload } => {
                    writer.write_array_header(2);
                    writer.write_utf8(title);
                    writer.write_bytes(payload);
                }
                Entry::Nested { id, title, payload } => {
                    writer.write_array_header(1);
                    writer.write_array_header(3);
                    writer.write_integer(*id);
                    writer.write_utf8(title);
                    writer.write_bytes(payload);
                }
                Entry::NilTitle { id, payload } => {
                    writer.write_array_header(3);
                    writer.write_integer(*id);
                    writer.write_nil();
                    writer.write_bytes(payload);
                }
            }
        }
        writer.into_bytes()
    }
}
