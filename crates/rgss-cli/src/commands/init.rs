//! Init command implementation

use std::path::Path;

use colored::Colorize;
use rgss_bundle::RgssVersion;
use rgss_core::{NamingScheme, ProjectConfig, ProjectLayout};
use rgss_fs::NormalizedPath;

use crate::error::{CliError, Result};

/// Options gathered from the command line.
#[derive(Debug, Clone)]
pub struct InitOptions<'a> {
    pub game_folder: &'a Path,
    pub naming: NamingScheme,
    pub version: Option<RgssVersion>,
    pub scripts_dir: &'a Path,
    pub force: bool,
}

/// Write `rgss.toml` into `root`.
pub fn run_init(root: &Path, options: InitOptions<'_>) -> Result<()> {
    let root = NormalizedPath::new(root);
    let config_path = ProjectConfig::path(&root);
    if config_path.exists() && !options.force {
        return Err(CliError::user(format!(
            "{} already exists. Use --force to overwrite it",
            config_path
        )));
    }

    let mut config = ProjectConfig::new(options.game_folder);
    config.naming = options.naming;
    config.version = options.version;
    config.scripts_dir = options.scripts_dir.to_path_buf();

    let layout = ProjectLayout::new(root.clone(), &config);
    if !layout.game_folder.is_dir() {
        return Err(CliError::user(format!(
            "Game folder not found: {}",
            layout.game_folder
        )));
    }

    config.save(&root)?;
    tracing::info!(path = %config_path, "wrote project configuration");

    println!(
        "{} Project initialized at {}",
        "OK".green().bold(),
        root.as_str().cyan()
    );
    match layout.version() {
        Ok(version) => println!("   RGSS version: {}", version.to_string().cyan()),
        Err(_) => println!(
            "   {} no script container found in {}",
            "warning:".yellow().bold(),
            layout.game_folder
        ),
    }
    println!("   Naming scheme: {}", config.naming.to_string().cyan());
    println!();
    println!("Run {} to extract the scripts.", "rgss unpack".cyan());
    Ok(())
}
