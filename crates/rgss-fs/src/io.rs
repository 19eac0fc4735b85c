//! File reads and lock-protected atomic writes

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use backoff::ExponentialBackoffBuilder;
use fs2::FileExt;

use crate::{Error, NormalizedPath, Result};

/// How hard [`write_atomic`] tries before giving up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RobustnessConfig {
    /// Delay before the first retry.
    pub initial_interval: Duration,
    /// Total time spent retrying before giving up with `LockFailed`.
    pub max_elapsed: Duration,
    /// Whether to fsync the temp file before the rename.
    pub fsync: bool,
}

impl Default for RobustnessConfig {
    fn default() -> Self {
        Self {
            initial_interval: Duration::from_millis(10),
            max_elapsed: Duration::from_secs(2),
            fsync: true,
        }
    }
}

/// Replace `path` with `content` so readers never see a partial file.
///
/// The bytes go to a locked sibling temp file which is then renamed over
/// the target. Lock contention is retried with exponential backoff for
/// up to `robustness.max_elapsed` before failing with `LockFailed`.
pub fn write_atomic(
    path: &NormalizedPath,
    content: &[u8],
    robustness: RobustnessConfig,
) -> Result<()> {
    let target = path.to_native();
    ensure_parent(&target)?;

    let temp_path = sibling_temp_path(&target);
    let outcome = write_locked(&temp_path, content, robustness).and_then(|()| {
        fs::rename(&temp_path, &target).map_err(|e| Error::io(&target, e))
    });
    if outcome.is_err() {
        let _ = fs::remove_file(&temp_path);
    }
    outcome?;

    tracing::trace!(path = %path, bytes = content.len(), "replaced file");
    Ok(())
}

fn ensure_parent(target: &Path) -> Result<()> {
    match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))
        }
        _ => Ok(()),
    }
}

// Same directory as the target, so the rename never crosses filesystems
fn sibling_temp_path(target: &Path) -> PathBuf {
    let file_name = target
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    target.with_file_name(format!(".{file_name}.{}.tmp", std::process::id()))
}

fn write_locked(temp_path: &Path, content: &[u8], robustness: RobustnessConfig) -> Result<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(temp_path)
        .map_err(|e| Error::io(temp_path, e))?;

    let policy = ExponentialBackoffBuilder::new()
        .with_initial_interval(robustness.initial_interval)
        .with_max_elapsed_time(Some(robustness.max_elapsed))
        .build();
    backoff::retry(policy, || {
        file.try_lock_exclusive().map_err(backoff::Error::transient)
    })
    .map_err(|_| Error::LockFailed {
        path: temp_path.to_path_buf(),
    })?;

    file.write_all(content).map_err(|e| Error::io(temp_path, e))?;
    if robustness.fsync {
        file.sync_all().map_err(|e| Error::io(temp_path, e))?;
    }
    file.unlock().map_err(|_| Error::LockFailed {
        path: temp_path.to_path_buf(),
    })
}

pub fn read_text(path: &NormalizedPath) -> Result<String> {
    let native = path.to_native();
    fs::read_to_string(&native).map_err(|e| Error::io(&native, e))
}

pub fn read_bytes(path: &NormalizedPath) -> Result<Vec<u8>> {
    let native = path.to_native();
    fs::read(&native).map_err(|e| Error::io(&native, e))
}

/// [`write_atomic`] with default retry settings.
pub fn write_text(path: &NormalizedPath, content: &str) -> Result<()> {
    write_atomic(path, content.as_bytes(), RobustnessConfig::default())
}

/// Copy `from` over `to` atomically.
pub fn copy_file(from: &NormalizedPath, to: &NormalizedPath) -> Result<()> {
    let bytes = read_bytes(from)?;
    write_atomic(to, &bytes, RobustnessConfig::default())
}

/// Remove a file. Returns `Ok(false)` when it was already gone.
pub fn remove_file(path: &NormalizedPath) -> Result<bool> {
    let native_path = path.to_native();
    match fs::remove_file(&native_path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(Error::io(&native_path, e)),
    }
}
