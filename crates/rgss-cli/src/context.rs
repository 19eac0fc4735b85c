//! Project root detection
//!
//! Commands work from anywhere below a project: the nearest ancestor that
//! holds `rgss.toml` is the root, the way git finds `.git`.

use std::path::{Path, PathBuf};

use rgss_core::{ProjectConfig, ProjectLayout};
use rgss_fs::NormalizedPath;

use crate::error::{CliError, Result};

/// Walk up from `start` to the first directory containing `rgss.toml`.
pub fn find_project_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| ProjectConfig::path(&NormalizedPath::new(dir)).is_file())
        .map(Path::to_path_buf)
}

/// Resolve the project layout for a command.
///
/// An explicit `--project` is used as-is; otherwise the root is searched
/// upwards from `cwd`.
pub fn load_layout(explicit: Option<&Path>, cwd: &Path) -> Result<ProjectLayout> {
    let root = match explicit {
        Some(root) => root.to_path_buf(),
        None => find_project_root(cwd).ok_or_else(|| {
            CliError::user(format!(
                "No rgss.toml found in {} or any parent directory. Run `rgss init <game-folder>` first",
                cwd.display()
            ))
        })?,
    };
    tracing::debug!(root = %root.display(), "using project root");
    Ok(ProjectLayout::load(NormalizedPath::new(&root))?)
}
