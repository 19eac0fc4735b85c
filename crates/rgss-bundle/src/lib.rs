//! Container codec for RGSS script bundles
//!
//! An RGSS game ships every script inside one Marshal-serialized file
//! (`Scripts.rxdata`, `Scripts.rvdata` or `Scripts.rvdata2`). Each entry
//! is a `[section_id, title, zlib(text)]` triple. This crate decodes and
//! encodes that container, compresses payloads, and hands out
//! collision-free section ids.
//!
//! # Example
//!
//! ```
//! use rgss_bundle::{ScriptRecord, decode, encode};
//!
//! let records = vec![ScriptRecord::from_text(11, "Main", b"rgss_main { }").unwrap()];
//! let bytes = encode(&records).unwrap();
//! assert_eq!(decode(&bytes).unwrap(), records);
//! ```

pub mod allocator;
pub mod codec;
pub mod compression;
pub mod error;
pub mod marshal;
pub mod record;
pub mod version;

pub use allocator::SectionIdAllocator;
pub use codec::{decode, decode_with, encode};
pub use error::{Error, Result};
pub use record::{RecordShape, ScriptRecord};
pub use version::RgssVersion;
