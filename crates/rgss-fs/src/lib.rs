//! Filesystem abstraction for the RGSS script workspace
//!
//! Provides normalized path handling, atomic locked I/O and a
//! format-agnostic configuration store shared by the upper layers.

pub mod config;
pub mod constants;
pub mod error;
pub mod io;
pub mod path;

pub use config::ConfigStore;
pub use constants::ProjectPath;
pub use error::{Error, Result};
pub use io::RobustnessConfig;
pub use path::{NormalizedPath, validate_path_identifier};
