//! Script index file and ordering keys
//!
//! The index file (`info.txt`) lists the extracted script files in the
//! order they appear in the container. This crate reads, patches and
//! backs it up, and synthesizes order keys for names inserted between
//! existing lines.

pub mod error;
pub mod index_file;
pub mod order_key;

pub use error::{Error, Result};
pub use index_file::{IndexEntry, IndexFile, is_placeholder, script_file_name, script_stem};
pub use order_key::{KeyGenerator, OrderKey};
