//! Slash-normalized paths
//!
//! Script names travel through the index file and the watcher as strings,
//! so every path in the workspace is kept as a `/`-separated string and
//! only turned into a [`PathBuf`] when it reaches the filesystem.

use std::path::{Path, PathBuf};

/// A path stored with forward slashes and no repeated separators.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NormalizedPath {
    inner: String,
}

impl NormalizedPath {
    /// Normalize `path`: backslashes become `/` and runs of `/` collapse,
    /// except for a leading `//` share prefix.
    pub fn new(path: impl AsRef<Path>) -> Self {
        let raw = path.as_ref().to_string_lossy().replace('\\', "/");
        Self {
            inner: collapse_separators(&raw),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.inner
    }

    /// Native form for handing to `std::fs`.
    pub fn to_native(&self) -> PathBuf {
        PathBuf::from(&self.inner)
    }

    /// Append `segment`. Empty and `.` segments return `self` unchanged.
    pub fn join(&self, segment: &str) -> Self {
        let segment = segment.replace('\\', "/");
        if segment.is_empty() || segment == "." {
            return self.clone();
        }
        let mut combined = self.inner.clone();
        if !combined.ends_with('/') {
            combined.push('/');
        }
        combined.push_str(&segment);
        Self {
            inner: collapse_separators(&combined),
        }
    }

    pub fn parent(&self) -> Option<Self> {
        let trimmed = self.inner.trim_end_matches('/');
        let cut = trimmed.rfind('/')?;
        let inner = if cut == 0 {
            "/".to_string()
        } else {
            trimmed[..cut].to_string()
        };
        Some(Self { inner })
    }

    /// Last component, ignoring a trailing slash.
    pub fn file_name(&self) -> Option<&str> {
        self.inner
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .filter(|name| !name.is_empty())
    }

    /// File name up to its last dot. Dotfiles keep their full name.
    pub fn file_stem(&self) -> Option<&str> {
        let name = self.file_name()?;
        Some(match split_extension(name) {
            Some((stem, _)) => stem,
            None => name,
        })
    }

    pub fn extension(&self) -> Option<&str> {
        split_extension(self.file_name()?).map(|(_, ext)| ext)
    }

    /// Sibling path with `name` as its last component.
    pub fn with_file_name(&self, name: &str) -> Self {
        self.parent()
            .map_or_else(|| Self::new(name), |parent| parent.join(name))
    }

    pub fn exists(&self) -> bool {
        self.to_native().exists()
    }

    pub fn is_dir(&self) -> bool {
        self.to_native().is_dir()
    }

    pub fn is_file(&self) -> bool {
        self.to_native().is_file()
    }

    /// Resolve symlinks and `..` on disk; a path that does not exist yet
    /// comes back unchanged.
    pub fn canonicalize(&self) -> Self {
        dunce::canonicalize(self.to_native())
            .map(Self::new)
            .unwrap_or_else(|_| self.clone())
    }
}

fn split_extension(name: &str) -> Option<(&str, &str)> {
    match name.rfind('.') {
        Some(0) | None => None,
        Some(dot) => Some((&name[..dot], &name[dot + 1..])),
    }
}

fn collapse_separators(path: &str) -> String {
    let share = path.starts_with("//") && !path.starts_with("///");
    let body = if share { &path[2..] } else { path };

    let mut out = String::with_capacity(path.len());
    if share {
        out.push_str("//");
    }
    for ch in body.chars() {
        if ch == '/' && out.ends_with('/') && out.len() > usize::from(share) * 2 {
            continue;
        }
        out.push(ch);
    }
    out
}

/// Check that `value` is usable as one path component.
///
/// `label` names the value in the error message.
pub fn validate_path_identifier(value: &str, label: &str) -> Result<(), String> {
    if value.is_empty() {
        return Err(format!("{label} must not be empty"));
    }
    if matches!(value, "." | "..") {
        return Err(format!("{label} must not be '{value}'"));
    }
    if value.contains(['/', '\\']) {
        return Err(format!("{label} must not contain path separators: {value}"));
    }
    if value.contains('\0') {
        return Err(format!("{label} must not contain NUL bytes"));
    }
    Ok(())
}

impl AsRef<Path> for NormalizedPath {
    fn as_ref(&self) -> &Path {
        Path::new(&self.inner)
    }
}

impl std::fmt::Display for NormalizedPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.inner)
    }
}
