//! Watch command: feed filesystem events to the engine until interrupted

use std::time::Duration;

use colored::Colorize;
use rgss_core::{EventOutcome, ProjectLayout, ScriptWatcher, SyncEngine};

use crate::error::Result;

const POLL_INTERVAL: Duration = Duration::from_millis(500);
// Editors often save as delete + create; wait long enough to see both
const SETTLE: Duration = Duration::from_millis(150);

pub fn run_watch(layout: &ProjectLayout) -> Result<()> {
    let mut engine = SyncEngine::for_project(layout)?;
    let watcher = ScriptWatcher::watch(&layout.scripts_dir)?.with_settle(SETTLE);

    println!(
        "{} Watching {} ({} scripts). Press Ctrl+C to stop.",
        "=>".blue().bold(),
        layout.scripts_dir.as_str().cyan(),
        engine.tree().len()
    );

    while let Some(batch) = watcher.next_batch(POLL_INTERVAL) {
        for event in batch {
            match engine.on_external_event(&event) {
                Ok(EventOutcome::Applied(action)) => {
                    println!("{} {}", "sync".green().bold(), action)
                }
                Ok(_) => {}
                // Keep watching; the next event may succeed
                Err(error) => eprintln!("{}: {}", "error".red().bold(), error),
            }
        }
    }

    tracing::info!("file watcher stopped");
    Ok(())
}
