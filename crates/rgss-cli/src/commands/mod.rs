//! Command implementations for rgss-cli

pub mod bundle;
pub mod index;
pub mod init;
pub mod scripts;
pub mod watch;

pub use bundle::{run_pack, run_unpack};
pub use index::{run_check, run_restore_index};
pub use init::{InitOptions, run_init};
pub use scripts::{run_add, run_delete, run_duplicate, run_list, run_rename};
pub use watch::run_watch;
