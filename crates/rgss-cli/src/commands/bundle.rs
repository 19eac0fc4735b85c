//! Unpack and pack commands

use std::path::Path;

use colored::Colorize;
use rgss_core::{ProjectLayout, repack, unpack};
use rgss_fs::constants::BACKUP_SUFFIX;
use rgss_fs::{NormalizedPath, RobustnessConfig, io};

use crate::error::Result;

/// Extract the container into the scripts directory.
pub fn run_unpack(layout: &ProjectLayout) -> Result<()> {
    let container = layout.container_path()?;
    if !container.is_file() {
        return Err(rgss_core::Error::ContainerNotFound {
            path: container.to_native(),
        }
        .into());
    }
    println!(
        "{} Unpacking {}...",
        "=>".blue().bold(),
        container.as_str().cyan()
    );

    let bytes = io::read_bytes(&container)?;
    let outcome = unpack(&bytes, &layout.scripts_dir, layout.naming)?;

    for corrupt in &outcome.corrupt {
        println!(
            "   {} #{} '{}' (section {}): {}",
            "raw".yellow().bold(),
            corrupt.position,
            corrupt.title,
            corrupt.section_id,
            corrupt.message
        );
    }
    println!(
        "{} Extracted {} scripts into {}",
        "OK".green().bold(),
        outcome.written.len(),
        layout.scripts_dir.as_str().cyan()
    );
    if !outcome.corrupt.is_empty() {
        println!(
            "{} {} corrupt records were kept as .raw payloads; pack writes them back unchanged.",
            "warning:".yellow().bold(),
            outcome.corrupt.len()
        );
    }
    Ok(())
}

/// Build the container from the scripts directory.
///
/// Writes to `output` when given, otherwise replaces the game's container
/// after copying it to a `.bak` sibling.
pub fn run_pack(layout: &ProjectLayout, output: Option<&Path>) -> Result<()> {
    let target = match output {
        Some(path) => NormalizedPath::new(path),
        None => layout.container_path()?,
    };
    println!(
        "{} Packing {}...",
        "=>".blue().bold(),
        layout.scripts_dir.as_str().cyan()
    );

    let bytes = repack(&layout.index(), layout.naming)?;

    if output.is_none() && target.is_file() {
        let backup = NormalizedPath::new(format!("{}{}", target.as_str(), BACKUP_SUFFIX));
        io::copy_file(&target, &backup)?;
        tracing::info!(backup = %backup, "backed up script container");
    }
    io::write_atomic(&target, &bytes, RobustnessConfig::default())?;

    println!(
        "{} Wrote {} ({} bytes)",
        "OK".green().bold(),
        target.as_str().cyan(),
        bytes.len()
    );
    Ok(())
}
