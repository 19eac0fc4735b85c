//! Watcher echo suppression.
//!
//! The engine's own writes come back through the file watcher. While an
//! operation runs it holds a [`SuppressionGuard`] for the event kinds it is
//! about to cause; events of those kinds are dropped until every guard for
//! the kind is released.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// Kind of filesystem change reported by the watcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Create,
    Change,
    Delete,
    Rename,
}

/// Shared, counted suppression state.
///
/// Cloning yields another handle on the same counters.
#[derive(Debug, Clone, Default)]
pub struct EchoSuppressor {
    counts: Arc<Mutex<HashMap<EventKind, usize>>>,
}

impl EchoSuppressor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Suppress `kinds` until the returned guard is dropped.
    pub fn suppress(&self, kinds: &[EventKind]) -> SuppressionGuard {
        let mut counts = lock(&self.counts);
        for kind in kinds {
            *counts.entry(*kind).or_insert(0) += 1;
        }
        tracing::trace!(?kinds, "suppressing watcher events");
        SuppressionGuard {
            counts: Arc::clone(&self.counts),
            kinds: kinds.to_vec(),
        }
    }

    pub fn is_suppressed(&self, kind: EventKind) -> bool {
        self.active(kind) > 0
    }

    /// Number of live guards for `kind`.
    pub fn active(&self, kind: EventKind) -> usize {
        lock(&self.counts).get(&kind).copied().unwrap_or(0)
    }
}

/// Releases its suppression when dropped, on every exit path.
#[derive(Debug)]
#[must_use = "suppression ends as soon as the guard is dropped"]
pub struct SuppressionGuard {
    counts: Arc<Mutex<HashMap<EventKind, usize>>>,
    kinds: Vec<EventKind>,
}

impl Drop for SuppressionGuard {
    fn drop(&mut self) {
        let mut counts = lock(&self.counts);
        for kind in &self.kinds {
            if let Some(count) = counts.get_mut(kind) {
                *count = count.saturating_sub(1);
                if *count == 0 {
                    counts.remove(kind);
                }
            }
        }
    }
}

// A poisoned lock still holds valid counters
fn lock(counts: &Mutex<HashMap<EventKind, usize>>) -> MutexGuard<'_, HashMap<EventKind, usize>> {
    counts.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
