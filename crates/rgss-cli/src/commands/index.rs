//! Index maintenance: check and restore-index

use colored::Colorize;
use rgss_core::{NamingScheme, ProjectLayout};
use rgss_index::Error as IndexError;

use crate::error::{CliError, Result};

/// Check that the index exists and suits the naming scheme.
pub fn run_check(layout: &ProjectLayout) -> Result<()> {
    println!("{} Checking script index...", "=>".blue().bold());
    let index = layout.index();

    if !index.is_valid() {
        println!(
            "{} {} is missing.",
            "MISSING".yellow().bold(),
            index.path().as_str().cyan()
        );
        println!("Run {} to extract the scripts.", "rgss unpack".cyan());
        return Err(CliError::user("Index check failed"));
    }

    if layout.naming == NamingScheme::Ordered {
        match index.check_format() {
            Ok(()) => {}
            Err(IndexError::IndexFileUnrecognizedFormat { line, content, .. }) => {
                println!(
                    "{} line {} ({}) has no order key.",
                    "MIGRATE".yellow().bold(),
                    line,
                    content.cyan()
                );
                println!(
                    "Run {} again to rename the scripts with order keys.",
                    "rgss unpack".cyan()
                );
                return Err(CliError::user("Index check failed"));
            }
            Err(other) => return Err(other.into()),
        }
    }

    let entries = index.entries()?;
    let mut missing = 0;
    for entry in &entries {
        let (Some(file_name), Some(path)) = (entry.file_name(), entry.path()) else {
            continue;
        };
        if index.is_preserved(file_name) {
            println!(
                "{} {} is kept as a raw payload",
                "RAW".yellow().bold(),
                file_name.cyan()
            );
        } else if !path.is_file() {
            missing += 1;
            println!(
                "{} {} is listed but missing",
                "MISSING".yellow().bold(),
                path.as_str().cyan()
            );
        }
    }
    if missing > 0 {
        return Err(CliError::user(format!(
            "{} indexed scripts are missing",
            missing
        )));
    }

    println!(
        "{} Index is healthy ({} lines).",
        "OK".green().bold(),
        entries.len()
    );
    Ok(())
}

/// Replace the index with its backup.
pub fn run_restore_index(layout: &ProjectLayout) -> Result<()> {
    let index = layout.index();
    index.restore_backup()?;
    println!(
        "{} Restored {} from {}",
        "OK".green().bold(),
        index.path().as_str().cyan(),
        index.backup_path().as_str().dimmed()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rgss_test_utils::TestProject;

    fn layout(project: &TestProject, naming: &str) -> ProjectLayout {
        project.init_config(naming);
        std::fs::create_dir_all(project.game_path()).unwrap();
        ProjectLayout::load(project.root_dir()).unwrap()
    }

    #[test]
    fn healthy_index_passes() {
        let project = TestProject::new();
        project.write_scripts(&[("000-Main.rb", "")]);
        run_check(&layout(&project, "ordered")).unwrap();
    }

    #[test]
    fn plain_index_under_ordered_scheme_fails() {
        let project = TestProject::new();
        project.write_scripts(&[("Main.rb", "")]);
        assert!(run_check(&layout(&project, "ordered")).is_err());
        run_check(&layout(&project, "plain")).unwrap();
    }

    #[test]
    fn missing_file_fails() {
        let project = TestProject::new();
        project.write_index(&["Ghost.rb"]);
        assert!(run_check(&layout(&project, "plain")).is_err());
    }

    #[test]
    fn raw_payload_is_not_missing() {
        let project = TestProject::new();
        project.write_index(&["Broken.rb"]);
        project.write_script("Broken.rb.raw", "not zlib");
        run_check(&layout(&project, "plain")).unwrap();
    }

    #[test]
    fn restore_without_backup_fails() {
        let project = TestProject::new();
        project.write_index(&["Main.rb"]);
        let result = run_restore_index(&layout(&project, "plain"));
        assert!(matches!(
            result,
            Err(CliError::Index(IndexError::BackupMissing { .. }))
        ));
    }
}
