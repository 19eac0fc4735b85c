//! Project configuration (`rgss.toml`) and resolved project layout

use std::path::{Path, PathBuf};

use rgss_bundle::RgssVersion;
use rgss_fs::{ConfigStore, NormalizedPath, ProjectPath};
use rgss_index::IndexFile;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// How script files are named on disk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NamingScheme {
    /// `Title.rb`
    #[default]
    Plain,
    /// `NNN[.MMM]-Title.rb`, keeping file-explorer order in sync with the index
    Ordered,
}

impl std::str::FromStr for NamingScheme {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "plain" => Ok(Self::Plain),
            "ordered" => Ok(Self::Ordered),
            other => Err(format!("unknown naming scheme: {}", other)),
        }
    }
}

impl std::fmt::Display for NamingScheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Plain => write!(f, "plain"),
            Self::Ordered => write!(f, "ordered"),
        }
    }
}

fn default_scripts_dir() -> PathBuf {
    PathBuf::from(ProjectPath::ScriptsDir.as_str())
}

/// Contents of `rgss.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Game folder holding `Data/Scripts.*`; relative paths resolve
    /// against the project root.
    pub game_folder: PathBuf,

    /// RGSS generation; detected from the game folder when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<RgssVersion>,

    /// Directory the scripts are extracted into.
    #[serde(default = "default_scripts_dir")]
    pub scripts_dir: PathBuf,

    #[serde(default)]
    pub naming: NamingScheme,
}

impl ProjectConfig {
    pub fn new(game_folder: impl Into<PathBuf>) -> Self {
        Self {
            game_folder: game_folder.into(),
            version: None,
            scripts_dir: default_scripts_dir(),
            naming: NamingScheme::default(),
        }
    }

    /// Location of the configuration file for a project root.
    pub fn path(root: &NormalizedPath) -> NormalizedPath {
        root.join(ProjectPath::ConfigFile.as_str())
    }

    pub fn load(root: &NormalizedPath) -> Result<Self> {
        let path = Self::path(root);
        if !path.is_file() {
            return Err(Error::ConfigNotFound {
                path: path.to_native(),
            });
        }
        Ok(ConfigStore::new().load(&path)?)
    }

    pub fn save(&self, root: &NormalizedPath) -> Result<()> {
        ConfigStore::new().save(&Self::path(root), self)?;
        Ok(())
    }
}

/// Absolute locations derived from a project root and its configuration.
#[derive(Debug, Clone)]
pub struct ProjectLayout {
    pub root: NormalizedPath,
    pub game_folder: NormalizedPath,
    pub scripts_dir: NormalizedPath,
    pub version: Option<RgssVersion>,
    pub naming: NamingScheme,
}

impl ProjectLayout {
    pub fn new(root: NormalizedPath, config: &ProjectConfig) -> Self {
        let game_folder = resolve(&root, &config.game_folder);
        let scripts_dir = resolve(&root, &config.scripts_dir);
        Self {
            root,
            game_folder,
            scripts_dir,
            version: config.version,
            naming: config.naming,
        }
    }

    /// Load `rgss.toml` from `root` and resolve it.
    pub fn load(root: NormalizedPath) -> Result<Self> {
        let config = ProjectConfig::load(&root)?;
        Ok(Self::new(root, &config))
    }

    pub fn index(&self) -> IndexFile {
        IndexFile::new(self.scripts_dir.clone())
    }

    /// The RGSS version to use: configured, otherwise detected.
    pub fn version(&self) -> Result<RgssVersion> {
        self.version
            .or_else(|| detect_version(&self.game_folder))
            .ok_or_else(|| Error::VersionUnknown {
                game_folder: self.game_folder.to_native(),
            })
    }

    /// Path of the script container for the active version.
    pub fn container_path(&self) -> Result<NormalizedPath> {
        let version = self.version()?;
        Ok(container_path(&self.game_folder, version))
    }
}

fn resolve(root: &NormalizedPath, path: &Path) -> NormalizedPath {
    if path.is_absolute() {
        NormalizedPath::new(path)
    } else {
        root.join(&path.to_string_lossy())
    }
}

/// `<game>/Data/<container>` for a version.
pub fn container_path(game_folder: &NormalizedPath, version: RgssVersion) -> NormalizedPath {
    game_folder
        .join(ProjectPath::DataDir.as_str())
        .join(version.container_file_name())
}

/// Newest RGSS version whose container exists in `game_folder`.
pub fn detect_version(game_folder: &NormalizedPath) -> Option<RgssVersion> {
    RgssVersion::PROBE_ORDER
        .into_iter()
        .find(|version| container_path(game_folder, *version).is_file())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn detection_prefers_newest_container() {
        let temp = TempDir::new().unwrap();
        let data = temp.path().join("Data");
        std::fs::create_dir_all(&data).unwrap();
        std::fs::write(data.join("Scripts.rxdata"), b"").unwrap();
        std::fs::write(data.join("Scripts.rvdata2"), b"").unwrap();

        let game = NormalizedPath::new(temp.path());
        assert_eq!(detect_version(&game), Some(RgssVersion::Rgss3));
    }

    #[test]
    fn detection_without_container_is_none() {
        let temp = TempDir::new().unwrap();
        assert_eq!(detect_version(&NormalizedPath::new(temp.path())), None);
    }

    #[test]
    fn relative_paths_resolve_against_root() {
        let root = NormalizedPath::new("/projects/demo");
        let layout = ProjectLayout::new(root, &ProjectConfig::new("Game"));
        assert_eq!(layout.game_folder.as_str(), "/projects/demo/Game");
        assert_eq!(layout.scripts_dir.as_str(), "/projects/demo/Scripts");
    }

    #[test]
    fn config_defaults_fill_missing_fields() {
        let config: ProjectConfig = toml::from_str("game_folder = \"Game\"").unwrap();
        assert_eq!(config.naming, NamingScheme::Plain);
        assert_eq!(config.scripts_dir, PathBuf::from("Scripts"));
        assert!(config.version.is_none());
    }
}
