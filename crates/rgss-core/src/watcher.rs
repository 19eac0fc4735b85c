//! Filesystem watching for the scripts directory.
//!
//! The notify backend delivers events on its own thread into a channel;
//! callers drain batches on their own thread and feed them to the engine.

use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::Duration;

use notify::event::{ModifyKind, RenameMode};
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use rgss_fs::NormalizedPath;

use crate::Result;
use crate::suppression::EventKind;

/// A change observed in the scripts directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FsEvent {
    Created(PathBuf),
    Changed(PathBuf),
    Deleted(PathBuf),
    Renamed { from: PathBuf, to: PathBuf },
    /// Source half of a rename whose pair has not been seen
    RenamedFrom(PathBuf),
    /// Destination half of a rename whose pair has not been seen
    RenamedTo(PathBuf),
}

impl FsEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Created(_) => EventKind::Create,
            Self::Changed(_) => EventKind::Change,
            Self::Deleted(_) => EventKind::Delete,
            Self::Renamed { .. } | Self::RenamedFrom(_) | Self::RenamedTo(_) => EventKind::Rename,
        }
    }
}

/// Translate one notify event.
pub fn map_notify_event(event: Event) -> Vec<FsEvent> {
    let Event { kind, paths, .. } = event;
    match kind {
        notify::EventKind::Modify(ModifyKind::Name(mode)) => map_rename(paths, mode),
        notify::EventKind::Create(_) => paths.into_iter().map(FsEvent::Created).collect(),
        notify::EventKind::Modify(_) => paths.into_iter().map(FsEvent::Changed).collect(),
        notify::EventKind::Remove(_) => paths.into_iter().map(FsEvent::Deleted).collect(),
        _ => Vec::new(),
    }
}

fn map_rename(paths: Vec<PathBuf>, mode: RenameMode) -> Vec<FsEvent> {
    match mode {
        RenameMode::Both => {
            let mut paths = paths.into_iter();
            match (paths.next(), paths.next()) {
                (Some(from), Some(to)) => vec![FsEvent::Renamed { from, to }],
                (Some(from), None) => vec![FsEvent::RenamedFrom(from)],
                _ => Vec::new(),
            }
        }
        RenameMode::From => paths.into_iter().map(FsEvent::RenamedFrom).collect(),
        RenameMode::To => paths.into_iter().map(FsEvent::RenamedTo).collect(),
        // Backends that cannot tell which side they saw
        _ => paths
            .into_iter()
            .map(|path| {
                if path.exists() {
                    FsEvent::RenamedTo(path)
                } else {
                    FsEvent::RenamedFrom(path)
                }
            })
            .collect(),
    }
}

/// Merge rename halves within a batch.
///
/// Halves covered by a paired rename are dropped. A `RenamedFrom` followed
/// by a `RenamedTo` is paired. Leftover halves become deletes and creates.
pub fn coalesce(events: Vec<FsEvent>) -> Vec<FsEvent> {
    let paired: Vec<(PathBuf, PathBuf)> = events
        .iter()
        .filter_map(|event| match event {
            FsEvent::Renamed { from, to } => Some((from.clone(), to.clone())),
            _ => None,
        })
        .collect();

    let mut out = Vec::with_capacity(events.len());
    let mut pending_from: Option<PathBuf> = None;
    for event in events {
        match event {
            FsEvent::RenamedFrom(path) if paired.iter().any(|(from, _)| *from == path) => {}
            FsEvent::RenamedTo(path) if paired.iter().any(|(_, to)| *to == path) => {}
            FsEvent::RenamedFrom(path) => {
                if let Some(previous) = pending_from.replace(path) {
                    out.push(FsEvent::Deleted(previous));
                }
            }
            FsEvent::RenamedTo(path) => match pending_from.take() {
                Some(from) => out.push(FsEvent::Renamed { from, to: path }),
                None => out.push(FsEvent::Created(path)),
            },
            other => {
                if let Some(previous) = pending_from.take() {
                    out.push(FsEvent::Deleted(previous));
                }
                out.push(other);
            }
        }
    }
    if let Some(previous) = pending_from {
        out.push(FsEvent::Deleted(previous));
    }
    out
}

/// Watches one directory and hands out coalesced batches.
pub struct ScriptWatcher {
    // Dropping the watcher stops the backend thread
    _watcher: RecommendedWatcher,
    events: Receiver<notify::Result<Event>>,
    settle: Duration,
}

impl ScriptWatcher {
    /// Default quiet time collected after the first event of a batch.
    pub const DEFAULT_SETTLE: Duration = Duration::from_millis(50);

    pub fn watch(dir: &NormalizedPath) -> Result<Self> {
        let (tx, rx) = mpsc::channel::<notify::Result<Event>>();
        let mut watcher = notify::recommended_watcher(move |event| {
            if tx.send(event).is_err() {
                tracing::debug!("watch event dropped because receiver is closed");
            }
        })?;
        watcher.watch(&dir.to_native(), RecursiveMode::NonRecursive)?;
        tracing::info!(dir = %dir, "watching scripts directory");
        Ok(Self {
            _watcher: watcher,
            events: rx,
            settle: Self::DEFAULT_SETTLE,
        })
    }

    pub fn with_settle(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }

    /// Wait up to `timeout` for activity and return the batch.
    ///
    /// Returns `None` once the backend has shut down.
    pub fn next_batch(&self, timeout: Duration) -> Option<Vec<FsEvent>> {
        let mut raw = Vec::new();
        match self.events.recv_timeout(timeout) {
            Ok(event) => raw.push(event),
            Err(RecvTimeoutError::Timeout) => return Some(Vec::new()),
            Err(RecvTimeoutError::Disconnected) => return None,
        }
        while let Ok(event) = self.events.recv_timeout(self.settle) {
            raw.push(event);
        }

        let mut mapped = Vec::new();
        for event in raw {
            match event {
                Ok(event) => mapped.extend(map_notify_event(event)),
                Err(error) => tracing::warn!(%error, "file watcher reported an error"),
            }
        }
        Some(coalesce(mapped))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, DataChange, RemoveKind};

    fn event(kind: notify::EventKind, paths: &[&str]) -> Event {
        let mut event = Event::new(kind);
        for path in paths {
            event = event.add_path(PathBuf::from(path));
        }
        event
    }

    #[test]
    fn maps_basic_kinds() {
        assert_eq!(
            map_notify_event(event(notify::EventKind::Create(CreateKind::File), &["/s/A.rb"])),
            vec![FsEvent::Created("/s/A.rb".into())]
        );
        assert_eq!(
            map_notify_event(event(
                notify::EventKind::Modify(ModifyKind::Data(DataChange::Content)),
                &["/s/A.rb"]
            )),
            vec![FsEvent::Changed("/s/A.rb".into())]
        );
        assert_eq!(
            map_notify_event(event(notify::EventKind::Remove(RemoveKind::File), &["/s/A.rb"])),
            vec![FsEvent::Deleted("/s/A.rb".into())]
        );
    }

    #[test]
    fn maps_paired_rename() {
        let mapped = map_notify_event(event(
            notify::EventKind::Modify(ModifyKind::Name(RenameMode::Both)),
            &["/s/A.rb", "/s/B.rb"],
        ));
        assert_eq!(
            mapped,
            vec![FsEvent::Renamed {
                from: "/s/A.rb".into(),
                to: "/s/B.rb".into()
            }]
        );
    }

    #[test]
    fn coalesce_drops_halves_of_paired_renames() {
        let batch = vec![
            FsEvent::RenamedFrom("/s/A.rb".into()),
            FsEvent::RenamedTo("/s/B.rb".into()),
            FsEvent::Renamed {
                from: "/s/A.rb".into(),
                to: "/s/B.rb".into(),
            },
        ];
        assert_eq!(
            coalesce(batch),
            vec![FsEvent::Renamed {
                from: "/s/A.rb".into(),
                to: "/s/B.rb".into()
            }]
        );
    }

    #[test]
    fn coalesce_pairs_adjacent_halves_and_splits_orphans() {
        let batch = vec![
            FsEvent::RenamedFrom("/s/A.rb".into()),
            FsEvent::RenamedTo("/s/B.rb".into()),
            FsEvent::RenamedFrom("/s/Gone.rb".into()),
            FsEvent::Changed("/s/C.rb".into()),
            FsEvent::RenamedTo("/s/New.rb".into()),
        ];
        assert_eq!(
            coalesce(batch),
            vec![
                FsEvent::Renamed {
                    from: "/s/A.rb".into(),
                    to: "/s/B.rb".into()
                },
                FsEvent::Deleted("/s/Gone.rb".into()),
                FsEvent::Changed("/s/C.rb".into()),
                FsEvent::Created("/s/New.rb".into()),
            ]
        );
    }
}
