//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use rgss_bundle::RgssVersion;
use rgss_core::NamingScheme;

/// RGSS script workspace - extract, edit and repack RPG Maker scripts
#[derive(Parser, Debug)]
#[command(name = "rgss")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Project root (defaults to the nearest directory with rgss.toml)
    #[arg(long, global = true, env = "RGSS_PROJECT")]
    pub project: Option<PathBuf>,

    /// The command to run
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Create rgss.toml for a game folder
    ///
    /// Examples:
    ///   rgss init ../MyGame
    ///   rgss init ../MyGame --naming ordered --rgss-version rgss3
    Init {
        /// Folder containing Data/Scripts.*
        game_folder: PathBuf,

        /// File naming scheme (plain or ordered)
        #[arg(short, long, default_value = "plain")]
        naming: NamingScheme,

        /// RGSS version; detected from the game folder when omitted
        #[arg(long = "rgss-version")]
        rgss_version: Option<RgssVersion>,

        /// Directory to extract scripts into
        #[arg(long, default_value = "Scripts")]
        scripts_dir: PathBuf,

        /// Overwrite an existing rgss.toml
        #[arg(short, long)]
        force: bool,
    },

    /// Extract the script container into the scripts directory
    Unpack,

    /// Build the script container from the scripts directory
    Pack {
        /// Write here instead of the game's container
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List scripts in container order
    List {
        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Create an empty script
    ///
    /// Examples:
    ///   rgss add Game_Party --after Game_System
    ///   rgss add Extras           # appended at the end
    Add {
        /// Name of the new script
        name: String,

        /// Script to insert after
        #[arg(short, long)]
        after: Option<String>,
    },

    /// Copy a script right after itself
    Duplicate {
        /// Script to copy
        target: String,
    },

    /// Rename a script
    Rename {
        /// Script to rename
        target: String,

        /// New script name
        new_name: String,
    },

    /// Delete a script
    Delete {
        /// Script to delete
        target: String,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Check that the index exists and matches the naming scheme
    Check,

    /// Restore info.txt from info.txt.bak
    RestoreIndex,

    /// Watch the scripts directory and keep the index in sync
    Watch,
}
