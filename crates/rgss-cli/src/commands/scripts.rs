//! Script tree commands: list, add, duplicate, rename and delete

use colored::Colorize;
use dialoguer::Confirm;
use rgss_core::{ProjectLayout, ScriptNode, SyncEngine};

use crate::error::Result;

/// Print the scripts in container order.
pub fn run_list(layout: &ProjectLayout, json: bool) -> Result<()> {
    let engine = SyncEngine::for_project(layout)?;
    let tree = engine.tree();

    if json {
        let scripts: Vec<serde_json::Value> = tree
            .iter()
            .map(|node| {
                serde_json::json!({
                    "name": node.name,
                    "label": node.label,
                    "file": node.file_name,
                    "key": node.order_key.as_ref().map(ToString::to_string),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&scripts)?);
        return Ok(());
    }

    for (position, node) in tree.iter().enumerate() {
        let label = if node.label.is_empty() {
            "(empty)".dimmed().to_string()
        } else {
            node.label.clone()
        };
        println!(
            "{:>4}  {:<32} {}",
            position.to_string().dimmed(),
            label,
            node.file_name.cyan()
        );
    }
    println!();
    println!("{} {} scripts", "Total:".dimmed(), tree.len());
    Ok(())
}

pub fn run_add(layout: &ProjectLayout, after: Option<&str>, name: &str) -> Result<()> {
    let mut engine = SyncEngine::for_project(layout)?;
    let node = engine.add_node(after, name)?;
    println!("{} Added {}", "OK".green().bold(), node.file_name.cyan());
    Ok(())
}

pub fn run_duplicate(layout: &ProjectLayout, target: &str) -> Result<()> {
    let mut engine = SyncEngine::for_project(layout)?;
    let node = engine.duplicate_node(target)?;
    println!(
        "{} Duplicated {} as {}",
        "OK".green().bold(),
        target,
        node.file_name.cyan()
    );
    Ok(())
}

pub fn run_rename(layout: &ProjectLayout, target: &str, new_name: &str) -> Result<()> {
    let mut engine = SyncEngine::for_project(layout)?;
    let node = engine.rename_node(target, new_name)?;
    println!(
        "{} Renamed {} to {}",
        "OK".green().bold(),
        target,
        node.file_name.cyan()
    );
    Ok(())
}

/// Delete a script, prompting unless `yes` is set.
pub fn run_delete(layout: &ProjectLayout, target: &str, yes: bool) -> Result<()> {
    let engine = SyncEngine::for_project(layout)?;
    let mut engine = if yes {
        engine
    } else {
        engine.with_confirm_policy(prompt_delete)
    };

    match engine.delete_node(target)? {
        Some(node) => println!("{} Deleted {}", "OK".green().bold(), node.file_name.cyan()),
        None => println!("{} Nothing deleted.", "=>".blue().bold()),
    }
    Ok(())
}

fn prompt_delete(node: &ScriptNode) -> bool {
    Confirm::new()
        .with_prompt(format!("Delete {}?", node.file_name))
        .default(false)
        .interact()
        .unwrap_or_else(|error| {
            tracing::warn!(%error, "confirmation prompt failed, keeping the script");
            false
        })
}
