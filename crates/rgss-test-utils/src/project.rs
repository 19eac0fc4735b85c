//! [`TestProject`] builder for script project scenarios.

use std::fs;
use std::path::{Path, PathBuf};

use rgss_bundle::RgssVersion;
use rgss_fs::NormalizedPath;
use tempfile::TempDir;

/// A temporary project root with a `Game/` folder and a `Scripts/`
/// directory.
///
/// # Example
///
/// ```rust,no_run
/// use rgss_test_utils::TestProject;
///
/// let project = TestProject::new();
/// project.write_scripts(&[("Game_System.rb", "class Game_System; end"), ("Main.rb", "")]);
/// project.assert_index_lines(&["Game_System.rb", "Main.rb"]);
/// ```
pub struct TestProject {
    temp_dir: TempDir,
}

impl Default for TestProject {
    fn default() -> Self {
        Self::new()
    }
}

impl TestProject {
    /// Create an empty project with `Scripts/` present.
    pub fn new() -> Self {
        let project = Self {
            temp_dir: TempDir::new().unwrap(),
        };
        fs::create_dir_all(project.scripts_path()).unwrap();
        project
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn root_dir(&self) -> NormalizedPath {
        NormalizedPath::new(self.root())
    }

    pub fn scripts_path(&self) -> PathBuf {
        self.root().join("Scripts")
    }

    pub fn scripts_dir(&self) -> NormalizedPath {
        NormalizedPath::new(self.scripts_path())
    }

    pub fn game_path(&self) -> PathBuf {
        self.root().join("Game")
    }

    /// Write `rgss.toml` pointing at `Game/` with the given naming scheme.
    pub fn init_config(&self, naming: &str) {
        let config = format!("game_folder = \"Game\"\nnaming = \"{}\"\n", naming);
        fs::write(self.root().join("rgss.toml"), config).unwrap();
    }

    /// Place container bytes at `Game/Data/<container>` and return its path.
    pub fn write_container(&self, version: RgssVersion, bytes: &[u8]) -> PathBuf {
        let data = self.game_path().join("Data");
        fs::create_dir_all(&data).unwrap();
        let path = data.join(version.container_file_name());
        fs::write(&path, bytes).unwrap();
        path
    }

    pub fn write_script(&self, file_name: &str, content: &str) {
        fs::write(self.scripts_path().join(file_name), content).unwrap();
    }

    /// Write each script and an index listing them in order.
    pub fn write_scripts(&self, scripts: &[(&str, &str)]) {
        for (file_name, content) in scripts {
            self.write_script(file_name, content);
        }
        let names: Vec<&str> = scripts.iter().map(|(name, _)| *name).collect();
        self.write_index(&names);
    }

    /// Write `info.txt` verbatim, one line per entry.
    pub fn write_index(&self, lines: &[&str]) {
        let mut content = String::new();
        for line in lines {
            content.push_str(line);
            content.push('\n');
        }
        fs::write(self.scripts_path().join("info.txt"), content).unwrap();
    }

    pub fn read_index(&self) -> String {
        self.read("Scripts/info.txt")
    }

    pub fn index_lines(&self) -> Vec<String> {
        self.read_index().lines().map(str::to_string).collect()
    }

    /// Read a file relative to the project root.
    pub fn read(&self, path: &str) -> String {
        let full_path = self.root().join(path);
        fs::read_to_string(&full_path)
            .unwrap_or_else(|_| panic!("Could not read file: {}", full_path.display()))
    }

    /// Assert that `path` (relative to the project root) exists.
    pub fn assert_file_exists(&self, path: &str) {
        let full_path = self.root().join(path);
        assert!(
            full_path.exists(),
            "Expected file to exist: {}",
            full_path.display()
        );
    }

    /// Assert that `path` (relative to the project root) does **not** exist.
    pub fn assert_file_not_exists(&self, path: &str) {
        let full_path = self.root().join(path);
        assert!(
            !full_path.exists(),
            "Expected file NOT to exist: {}",
            full_path.display()
        );
    }

    /// Assert that the index lists exactly `expected`, in order.
    pub fn assert_index_lines(&self, expected: &[&str]) {
        let actual = self.index_lines();
        assert_eq!(
            actual, expected,
            "Index mismatch in {}",
            self.scripts_path().display()
        );
    }
}
