//! Shared test utilities for the RGSS script workspace.
//!
//! A dev-dependency only, never published.
//!
//! # Modules
//!
//! - [`container`]: byte-level container fixtures, including the legacy
//!   record layouts and corrupt payloads
//! - [`project`]: [`TestProject`] builder for a game folder plus scripts
//!   directory in a temp dir

pub mod container;
pub mod project;

pub use container::ContainerBuilder;
pub use project::TestProject;
