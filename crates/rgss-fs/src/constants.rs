//! Constants for the well-known paths of a script project.

use std::path::Path;

/// Standard project filesystem markers and paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectPath {
    /// The `Data` directory inside a game folder (holds the container)
    DataDir,
    /// The default directory scripts are extracted into
    ScriptsDir,
    /// The plain-text index listing script files in display order
    IndexFile,
    /// The project configuration file
    ConfigFile,
}

impl ProjectPath {
    /// Get the string representation of the path.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DataDir => "Data",
            Self::ScriptsDir => "Scripts",
            Self::IndexFile => "info.txt",
            Self::ConfigFile => "rgss.toml",
        }
    }
}

/// File extension of extracted scripts, without the dot.
pub const SCRIPT_EXTENSION: &str = "rb";

/// Suffix appended to a file name to form its backup sibling.
pub const BACKUP_SUFFIX: &str = ".bak";

/// Suffix of the sidecar holding a corrupt record's payload as stored.
pub const RAW_PAYLOAD_SUFFIX: &str = ".raw";

impl AsRef<Path> for ProjectPath {
    fn as_ref(&self) -> &Path {
        Path::new(self.as_str())
    }
}

impl AsRef<str> for ProjectPath {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl std::fmt::Display for ProjectPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
