//! The plain-text script index (`info.txt`).
//!
//! One line per script file, in container order:
//!
//! ```text
//! Game_System.rb
//! Untitled_1.rb
//! Main.rb
//! ```
//!
//! `Untitled_<n>` lines stand for records without a title. They keep their
//! position for repacking but are hidden from the script tree. Single-line
//! edits leave every other line byte-identical, and every rewrite first
//! copies the current file to `info.txt.bak`.

use std::sync::LazyLock;

use regex::Regex;
use rgss_fs::constants::{BACKUP_SUFFIX, RAW_PAYLOAD_SUFFIX, SCRIPT_EXTENSION};
use rgss_fs::{NormalizedPath, ProjectPath, io};

use crate::error::{Error, Result};
use crate::order_key::OrderKey;

static PLACEHOLDER_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^Untitled_(\d+)$").expect("Invalid placeholder regex")
});

/// Lines written by the ordered naming scheme start with a key.
static ORDERED_LINE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{3,}(\.\d+)?-").expect("Invalid ordered line regex"));

/// Append the script extension to a stem.
pub fn script_file_name(stem: &str) -> String {
    format!("{}.{}", stem, SCRIPT_EXTENSION)
}

/// File name without the script extension.
pub fn script_stem(file_name: &str) -> &str {
    file_name
        .strip_suffix(SCRIPT_EXTENSION)
        .and_then(|rest| rest.strip_suffix('.'))
        .unwrap_or(file_name)
}

/// Whether an index line names an untitled record.
pub fn is_placeholder(line: &str) -> bool {
    placeholder_number(line).is_some()
}

fn placeholder_number(line: &str) -> Option<usize> {
    let name = OrderKey::strip(script_stem(line.trim()));
    PLACEHOLDER_REGEX
        .captures(name)
        .and_then(|caps| caps.get(1))
        .and_then(|n| n.as_str().parse().ok())
}

/// A classified index line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexEntry {
    /// A visible script file.
    Script {
        /// 1-based line number
        line: usize,
        file_name: String,
        /// Display name: the stem without its order key
        label: String,
        key: Option<OrderKey>,
        path: NormalizedPath,
    },
    /// An `Untitled_<n>` line kept for position only.
    Placeholder {
        line: usize,
        n: usize,
        file_name: String,
        path: NormalizedPath,
    },
    Blank { line: usize },
}

impl IndexEntry {
    pub fn line(&self) -> usize {
        match self {
            Self::Script { line, .. } | Self::Placeholder { line, .. } | Self::Blank { line } => {
                *line
            }
        }
    }

    pub fn file_name(&self) -> Option<&str> {
        match self {
            Self::Script { file_name, .. } | Self::Placeholder { file_name, .. } => Some(file_name),
            Self::Blank { .. } => None,
        }
    }

    pub fn path(&self) -> Option<&NormalizedPath> {
        match self {
            Self::Script { path, .. } | Self::Placeholder { path, .. } => Some(path),
            Self::Blank { .. } => None,
        }
    }
}

/// Handle on the index file of one scripts directory.
#[derive(Debug, Clone)]
pub struct IndexFile {
    scripts_dir: NormalizedPath,
    path: NormalizedPath,
}

impl IndexFile {
    /// Index for `scripts_dir/info.txt`.
    pub fn new(scripts_dir: NormalizedPath) -> Self {
        let path = scripts_dir.join(ProjectPath::IndexFile.as_str());
        Self { scripts_dir, path }
    }

    pub fn path(&self) -> &NormalizedPath {
        &self.path
    }

    pub fn scripts_dir(&self) -> &NormalizedPath {
        &self.scripts_dir
    }

    /// Sibling backup path, `info.txt.bak`.
    pub fn backup_path(&self) -> NormalizedPath {
        let name = self.path.file_name().unwrap_or(ProjectPath::IndexFile.as_str());
        self.path.with_file_name(&format!("{}{}", name, BACKUP_SUFFIX))
    }

    /// Disk path of a script listed in the index.
    pub fn resolve(&self, file_name: &str) -> NormalizedPath {
        self.scripts_dir.join(file_name)
    }

    /// Sidecar holding the still-compressed payload of a record that could
    /// not be extracted, `Main.rb.raw` for `Main.rb`.
    pub fn raw_payload_path(&self, file_name: &str) -> NormalizedPath {
        self.resolve(&format!("{}{}", file_name, RAW_PAYLOAD_SUFFIX))
    }

    /// Whether `file_name` is only kept as a raw payload sidecar.
    pub fn is_preserved(&self, file_name: &str) -> bool {
        !self.resolve(file_name).is_file() && self.raw_payload_path(file_name).is_file()
    }

    /// Whether the index file exists.
    pub fn is_valid(&self) -> bool {
        self.path.is_file()
    }

    /// Visible script file names in order. Placeholders and blank lines
    /// are skipped.
    pub fn read(&self) -> Result<Vec<String>> {
        Ok(self
            .entries()?
            .into_iter()
            .filter_map(|entry| match entry {
                IndexEntry::Script { file_name, .. } => Some(file_name),
                _ => None,
            })
            .collect())
    }

    /// Every line, trimmed, including placeholders and blanks.
    pub fn read_all(&self) -> Result<Vec<String>> {
        let content = self.load()?;
        Ok(content.lines().map(|line| line.trim().to_string()).collect())
    }

    /// Classify every line and map it to its disk path.
    pub fn entries(&self) -> Result<Vec<IndexEntry>> {
        let lines = self.read_all()?;
        Ok(lines
            .into_iter()
            .enumerate()
            .map(|(i, file_name)| self.classify(i + 1, file_name))
            .collect())
    }

    fn classify(&self, line: usize, file_name: String) -> IndexEntry {
        if file_name.is_empty() {
            return IndexEntry::Blank { line };
        }
        let path = self.resolve(&file_name);
        if let Some(n) = placeholder_number(&file_name) {
            return IndexEntry::Placeholder {
                line,
                n,
                file_name,
                path,
            };
        }
        let stem = script_stem(&file_name);
        let (key, label) = match OrderKey::split(stem) {
            Some((key, name)) => (Some(key), name.to_string()),
            None => (None, stem.to_string()),
        };
        IndexEntry::Script {
            line,
            file_name,
            label,
            key,
            path,
        }
    }

    /// Replace the whole file with `names`, one per line.
    pub fn write<S: AsRef<str>>(&self, names: &[S]) -> Result<()> {
        self.backup()?;
        let mut content = String::new();
        for name in names {
            content.push_str(name.as_ref());
            content.push('\n');
        }
        io::write_text(&self.path, &content)?;
        tracing::debug!(path = %self.path, lines = names.len(), "wrote index file");
        Ok(())
    }

    /// Replace the first line matching `predicate` with `value`.
    ///
    /// Returns `false` (and writes nothing) when no line matches.
    pub fn patch_line(&self, predicate: impl Fn(&str) -> bool, value: &str) -> Result<bool> {
        self.edit(|lines, _| {
            let Some(i) = lines.iter().position(|raw| predicate(raw.trim())) else {
                return false;
            };
            let terminator = line_terminator(&lines[i]).to_string();
            lines[i] = format!("{}{}", value, terminator);
            true
        })
    }

    /// Insert `value` right after the first line matching `predicate`.
    pub fn insert_after(&self, predicate: impl Fn(&str) -> bool, value: &str) -> Result<bool> {
        self.edit(|lines, newline| {
            let Some(i) = lines.iter().position(|raw| predicate(raw.trim())) else {
                return false;
            };
            if line_terminator(&lines[i]).is_empty() {
                lines[i].push_str(newline);
            }
            lines.insert(i + 1, format!("{}{}", value, newline));
            true
        })
    }

    /// Add `value` as the last line.
    pub fn append(&self, value: &str) -> Result<()> {
        self.edit(|lines, newline| {
            if let Some(last) = lines.last_mut()
                && line_terminator(last).is_empty()
            {
                last.push_str(newline);
            }
            lines.push(format!("{}{}", value, newline));
            true
        })?;
        Ok(())
    }

    /// Remove the first line matching `predicate`.
    pub fn remove_line(&self, predicate: impl Fn(&str) -> bool) -> Result<bool> {
        self.edit(|lines, _| {
            let Some(i) = lines.iter().position(|raw| predicate(raw.trim())) else {
                return false;
            };
            lines.remove(i);
            true
        })
    }

    /// Copy the index to its `.bak` sibling, overwriting any previous
    /// backup. Returns `false` when there is no index to back up.
    pub fn backup(&self) -> Result<bool> {
        if !self.is_valid() {
            return Ok(false);
        }
        let backup = self.backup_path();
        io::copy_file(&self.path, &backup)?;
        tracing::trace!(backup = %backup, "backed up index file");
        Ok(true)
    }

    /// Replace the index with its backup.
    pub fn restore_backup(&self) -> Result<()> {
        let backup = self.backup_path();
        if !backup.is_file() {
            return Err(Error::BackupMissing {
                path: backup.to_native(),
            });
        }
        io::copy_file(&backup, &self.path)?;
        tracing::info!(path = %self.path, "restored index file from backup");
        Ok(())
    }

    /// Ensure every script line carries an order key.
    ///
    /// Indexes written before the ordered naming scheme was enabled fail
    /// with `IndexFileUnrecognizedFormat` and must be migrated.
    pub fn check_format(&self) -> Result<()> {
        for entry in self.entries()? {
            if let IndexEntry::Script {
                line, file_name, ..
            } = entry
                && !ORDERED_LINE_REGEX.is_match(&file_name)
            {
                return Err(Error::IndexFileUnrecognizedFormat {
                    path: self.path.to_native(),
                    line,
                    content: file_name,
                });
            }
        }
        Ok(())
    }

    fn load(&self) -> Result<String> {
        if !self.is_valid() {
            return Err(Error::IndexFileMissing {
                path: self.path.to_native(),
            });
        }
        Ok(io::read_text(&self.path)?)
    }

    /// Apply a line-level edit. The closure gets the raw lines (with their
    /// terminators) and the file's newline style; it returns whether it
    /// changed anything.
    fn edit(&self, apply: impl FnOnce(&mut Vec<String>, &str) -> bool) -> Result<bool> {
        let content = self.load()?;
        let newline = if content.contains("\r\n") { "\r\n" } else { "\n" };
        let mut lines: Vec<String> = content.split_inclusive('\n').map(str::to_string).collect();

        if !apply(&mut lines, newline) {
            return Ok(false);
        }

        self.backup()?;
        io::write_text(&self.path, &lines.concat())?;
        Ok(true)
    }
}

fn line_terminator(raw: &str) -> &str {
    if raw.ends_with("\r\n") {
        "\r\n"
    } else if raw.ends_with('\n') {
        "\n"
    } else {
        ""
    }
}
