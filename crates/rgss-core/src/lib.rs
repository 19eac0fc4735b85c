//! Core orchestration layer for RGSS script projects
//!
//! This crate ties the Layer 0 crates together:
//!
//! - **Project configuration**: `rgss.toml`, version detection and paths
//! - **Unpack / repack**: container bytes to script files and back
//! - **Script tree**: ordered in-memory view rebuilt from the index file
//! - **SyncEngine**: add, duplicate, delete and rename with the files,
//!   the index and the tree kept consistent, plus watcher echo suppression
//!
//! # Architecture
//!
//! ```text
//!                      CLI
//!                       |
//!                   rgss-core
//!                       |
//!        +--------------+--------------+
//!        |              |              |
//!     rgss-fs      rgss-bundle     rgss-index
//! ```
//!
//! # Example
//!
//! ```no_run
//! use rgss_core::{NamingScheme, SyncEngine};
//! use rgss_fs::NormalizedPath;
//!
//! # fn main() -> rgss_core::Result<()> {
//! let mut engine = SyncEngine::load(NormalizedPath::new("Scripts"), NamingScheme::Plain)?;
//! engine.add_node(Some("Game_System"), "Game_Party")?;
//! # Ok(())
//! # }
//! ```

pub mod bundle_io;
pub mod config;
pub mod engine;
pub mod error;
pub mod policy;
pub mod suppression;
pub mod tree;
pub mod watcher;

pub use bundle_io::{CorruptScript, UnpackOutcome, repack, repack_with, title_for, unpack};
pub use config::{NamingScheme, ProjectConfig, ProjectLayout, container_path, detect_version};
pub use engine::{EventOutcome, SyncEngine};
pub use error::{Error, Result};
pub use policy::{AutoConfirm, ConfirmPolicy, DefaultNamePolicy, NamePolicy, StrictNamePolicy};
pub use suppression::{EchoSuppressor, EventKind, SuppressionGuard};
pub use tree::{ScriptNode, ScriptTree};
pub use watcher::{FsEvent, ScriptWatcher, coalesce, map_notify_event};
