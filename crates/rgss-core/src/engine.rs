//! SyncEngine implementation
//!
//! The SyncEngine is the only component that mutates the script tree, the
//! script files and the index file together. Programmatic operations hold
//! suppression guards for the watcher events they cause; external events
//! are applied idempotently so late echoes of the engine's own writes
//! cannot damage the tree.

use std::path::Path;

use rgss_fs::constants::SCRIPT_EXTENSION;
use rgss_fs::{NormalizedPath, RobustnessConfig, io};
use rgss_index::{IndexFile, KeyGenerator, OrderKey, is_placeholder, script_file_name, script_stem};

use crate::config::{NamingScheme, ProjectLayout};
use crate::policy::{AutoConfirm, ConfirmPolicy, DefaultNamePolicy, NamePolicy};
use crate::suppression::{EchoSuppressor, EventKind};
use crate::tree::{ScriptNode, ScriptTree};
use crate::watcher::FsEvent;
use crate::{Error, Result};

/// What the engine did with an external event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOutcome {
    /// The tree and index were updated
    Applied(String),
    /// Dropped while a programmatic operation of the same kind was running
    Suppressed,
    /// Nothing to do
    Ignored(String),
}

impl EventOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied(_))
    }
}

type RefreshListener = Box<dyn FnMut(&ScriptTree)>;

/// Keeps the script tree, script files and index file consistent.
pub struct SyncEngine {
    index: IndexFile,
    tree: ScriptTree,
    naming: NamingScheme,
    keys: KeyGenerator,
    suppressor: EchoSuppressor,
    name_policy: Box<dyn NamePolicy>,
    confirm: Box<dyn ConfirmPolicy>,
    listeners: Vec<RefreshListener>,
}

impl SyncEngine {
    /// Load the engine for a scripts directory.
    ///
    /// # Errors
    ///
    /// `IndexFileMissing` when the directory has no index, and
    /// `IndexFileUnrecognizedFormat` when the ordered naming scheme is
    /// active but the index still uses plain names.
    pub fn load(scripts_dir: NormalizedPath, naming: NamingScheme) -> Result<Self> {
        let index = IndexFile::new(scripts_dir);
        if !index.is_valid() {
            return Err(rgss_index::Error::IndexFileMissing {
                path: index.path().to_native(),
            }
            .into());
        }
        if naming == NamingScheme::Ordered {
            index.check_format()?;
        }
        let tree = ScriptTree::from_index(&index)?;

        Ok(Self {
            index,
            tree,
            naming,
            keys: KeyGenerator::new(),
            suppressor: EchoSuppressor::new(),
            name_policy: Box::new(DefaultNamePolicy),
            confirm: Box::new(AutoConfirm),
            listeners: Vec::new(),
        })
    }

    /// Load the engine for a resolved project layout.
    pub fn for_project(layout: &ProjectLayout) -> Result<Self> {
        Self::load(layout.scripts_dir.clone(), layout.naming)
    }

    pub fn with_name_policy(mut self, policy: impl NamePolicy + 'static) -> Self {
        self.name_policy = Box::new(policy);
        self
    }

    pub fn with_confirm_policy(mut self, policy: impl ConfirmPolicy + 'static) -> Self {
        self.confirm = Box::new(policy);
        self
    }

    pub fn with_key_generator(mut self, keys: KeyGenerator) -> Self {
        self.keys = keys;
        self
    }

    /// Register a callback run after every change to the tree.
    pub fn on_refresh(&mut self, listener: impl FnMut(&ScriptTree) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    pub fn tree(&self) -> &ScriptTree {
        &self.tree
    }

    pub fn index(&self) -> &IndexFile {
        &self.index
    }

    pub fn naming(&self) -> NamingScheme {
        self.naming
    }

    /// Handle on the suppression state shared with the watcher loop.
    pub fn suppressor(&self) -> EchoSuppressor {
        self.suppressor.clone()
    }

    /// Rebuild the tree from the index file.
    pub fn reload(&mut self) -> Result<()> {
        self.tree = ScriptTree::from_index(&self.index)?;
        self.refresh();
        Ok(())
    }

    /// Create an empty script after `after` (or at the end when `None`).
    pub fn add_node(&mut self, after: Option<&str>, name: &str) -> Result<ScriptNode> {
        let position = self.resolve_optional(after)?;
        let _guard = self.suppressor.suppress(&[EventKind::Create]);
        let node = self.insert_script(position, name, b"")?;
        self.refresh();
        tracing::info!(file = %node.file_name, "added script");
        Ok(node)
    }

    /// Copy `target` into a new script placed right after it.
    pub fn duplicate_node(&mut self, target: &str) -> Result<ScriptNode> {
        let position = self.resolve(target)?;
        let source = self.tree.nodes()[position].clone();
        let content = io::read_bytes(&source.path)?;
        let name = self.copy_name(&source.name);

        let _guard = self.suppressor.suppress(&[EventKind::Create]);
        let node = self.insert_script(Some(position), &name, &content)?;
        self.refresh();
        tracing::info!(from = %source.file_name, to = %node.file_name, "duplicated script");
        Ok(node)
    }

    /// Delete `target` after the confirm policy agrees.
    ///
    /// Returns `None` when the delete was declined.
    pub fn delete_node(&mut self, target: &str) -> Result<Option<ScriptNode>> {
        let position = self.resolve(target)?;
        if !self.confirm.confirm_delete(&self.tree.nodes()[position]) {
            tracing::debug!(script = target, "delete declined");
            return Ok(None);
        }

        let _guard = self.suppressor.suppress(&[EventKind::Delete]);
        let removed = self.remove_script(position)?;
        self.refresh();
        tracing::info!(file = %removed.file_name, "deleted script");
        Ok(Some(removed))
    }

    /// Rename `target`: a copy under the new name is added right after it,
    /// then the old script is deleted. The node keeps its id.
    pub fn rename_node(&mut self, target: &str, new_name: &str) -> Result<ScriptNode> {
        let position = self.resolve(target)?;
        let old = self.tree.nodes()[position].clone();
        let new_name = new_name.strip_suffix(".rb").unwrap_or(new_name);
        if new_name == old.name {
            return Ok(old);
        }
        let content = io::read_bytes(&old.path)?;

        let _guard = self.suppressor.suppress(&[
            EventKind::Create,
            EventKind::Delete,
            EventKind::Rename,
        ]);
        let mut node = self.insert_script(Some(position), new_name, &content)?;
        self.remove_script(position)?;

        node.id = old.id;
        if let Some(at) = self.tree.position(|n| n.file_name == node.file_name) {
            self.tree.replace(at, node.clone());
        }
        self.refresh();
        tracing::info!(from = %old.file_name, to = %node.file_name, "renamed script");
        Ok(node)
    }

    /// Apply a change reported by the file watcher.
    pub fn on_external_event(&mut self, event: &FsEvent) -> Result<EventOutcome> {
        if self.suppressor.is_suppressed(event.kind()) {
            tracing::debug!(?event, "suppressed watcher echo");
            return Ok(EventOutcome::Suppressed);
        }

        let outcome = match event {
            FsEvent::Renamed { from, to } => self.external_rename(from, to)?,
            FsEvent::Deleted(path) | FsEvent::RenamedFrom(path) => self.external_delete(path)?,
            FsEvent::Created(path) | FsEvent::RenamedTo(path) => self.external_create(path)?,
            FsEvent::Changed(path) => {
                tracing::debug!(path = %path.display(), "script changed on disk");
                EventOutcome::Ignored("content change".to_string())
            }
        };

        match &outcome {
            EventOutcome::Applied(action) => {
                tracing::info!(action = %action, "applied external change");
                self.refresh();
            }
            EventOutcome::Ignored(reason) => {
                tracing::debug!(?event, reason = %reason, "ignored watcher event");
            }
            EventOutcome::Suppressed => {}
        }
        Ok(outcome)
    }

    fn external_rename(&mut self, from: &Path, to: &Path) -> Result<EventOutcome> {
        let old_name = self.script_file_name_of(from);
        let new_name = self.script_file_name_of(to);

        let position = old_name
            .as_deref()
            .and_then(|name| self.tree.position(|node| node.file_name == name));

        match (position, new_name) {
            (Some(position), Some(new_name)) => {
                let new_name = if self.needs_key(&new_name) {
                    self.key_renamed_file(position, &new_name)?
                } else {
                    new_name
                };
                if self.tree.contains_file(&new_name) {
                    // Overwrote another tracked script
                    return self.external_delete(from);
                }
                let old = self.tree.nodes()[position].clone();
                if !self.index_lists(&new_name)? {
                    self.index
                        .patch_line(|line| line == old.file_name, &new_name)?;
                }
                let mut node =
                    ScriptNode::new(self.index.scripts_dir(), &new_name).with_label_from_disk();
                node.id = old.id;
                self.tree.replace(position, node);
                Ok(EventOutcome::Applied(format!(
                    "renamed {} to {}",
                    old.file_name, new_name
                )))
            }
            (Some(_), None) => self.external_delete(from),
            (None, Some(_)) => self.external_create(to),
            (None, None) => {
                tracing::warn!(from = %from.display(), to = %to.display(), "rename of untracked file");
                Ok(EventOutcome::Ignored("untracked rename".to_string()))
            }
        }
    }

    fn external_delete(&mut self, path: &Path) -> Result<EventOutcome> {
        let Some(file_name) = self.script_file_name_of(path) else {
            return Ok(EventOutcome::Ignored("not a script".to_string()));
        };
        let Some(position) = self.tree.position(|node| node.file_name == file_name) else {
            return Ok(EventOutcome::Ignored(format!("{} is not tracked", file_name)));
        };
        if path.exists() {
            return Ok(EventOutcome::Ignored(format!("{} still exists", file_name)));
        }

        self.index.remove_line(|line| line == file_name)?;
        self.tree.remove(position);
        Ok(EventOutcome::Applied(format!("removed {}", file_name)))
    }

    fn external_create(&mut self, path: &Path) -> Result<EventOutcome> {
        let Some(file_name) = self.script_file_name_of(path) else {
            return Ok(EventOutcome::Ignored("not a script".to_string()));
        };
        if self.tree.contains_file(&file_name) {
            return Ok(EventOutcome::Ignored(format!("{} is already tracked", file_name)));
        }
        if is_placeholder(&file_name) {
            return Ok(EventOutcome::Ignored(format!("{} is a placeholder", file_name)));
        }
        if !path.is_file() {
            return Ok(EventOutcome::Ignored(format!("{} no longer exists", file_name)));
        }
        if self.needs_key(&file_name) {
            tracing::warn!(
                file = %file_name,
                "script without an order key left out of the index; add it with `rgss add`"
            );
            return Ok(EventOutcome::Ignored(format!("{} has no order key", file_name)));
        }

        if self.index_lists(&file_name)? {
            // Another writer already indexed it
            self.tree = ScriptTree::from_index(&self.index)?;
            return Ok(EventOutcome::Applied(format!("reloaded index for {}", file_name)));
        }

        self.index.append(&file_name)?;
        self.tree
            .push(ScriptNode::new(self.index.scripts_dir(), &file_name).with_label_from_disk());
        Ok(EventOutcome::Applied(format!("added {}", file_name)))
    }

    /// Write the file, patch the index, then commit the node to the tree.
    fn insert_script(
        &mut self,
        position: Option<usize>,
        name: &str,
        content: &[u8],
    ) -> Result<ScriptNode> {
        let name = name.strip_suffix(".rb").unwrap_or(name);
        self.name_policy
            .validate(name)
            .map_err(|reason| Error::InvalidScriptName {
                name: name.to_string(),
                reason,
            })?;

        let stem = match self.naming {
            NamingScheme::Plain => name.to_string(),
            NamingScheme::Ordered => self.next_key(position)?.apply(name),
        };
        let file_name = script_file_name(&stem);
        let path = self.index.resolve(&file_name);
        if self.tree.contains_file(&file_name) || path.exists() {
            return Err(Error::NameConflict { file_name });
        }

        io::write_atomic(&path, content, RobustnessConfig::default())?;

        let anchor = position.map(|p| self.tree.nodes()[p].file_name.clone());
        let indexed = match anchor {
            Some(anchor) if self.index_lists(&anchor)? => {
                self.index.insert_after(|line| line == anchor, &file_name)
            }
            _ => self.index.append(&file_name).map(|_| true),
        };
        if let Err(error) = indexed {
            // Leave no orphan file behind when the index could not be patched
            if let Err(cleanup) = io::remove_file(&path) {
                tracing::warn!(path = %path, error = %cleanup, "failed to remove new script after index error");
            }
            return Err(error.into());
        }

        let node = ScriptNode::new(self.index.scripts_dir(), &file_name).with_label_from_disk();
        self.tree.insert_after(position, node.clone());
        tracing::debug!(file = %file_name, "inserted script");
        Ok(node)
    }

    /// Delete the file, patch the index, then drop the node from the tree.
    fn remove_script(&mut self, position: usize) -> Result<ScriptNode> {
        let node = self.tree.nodes()[position].clone();
        if !io::remove_file(&node.path)? {
            tracing::warn!(path = %node.path, "script file was already gone");
        }
        self.index.remove_line(|line| line == node.file_name)?;
        Ok(self.tree.remove(position))
    }

    fn next_key(&mut self, position: Option<usize>) -> Result<OrderKey> {
        let prev = position.and_then(|p| self.tree.get(p));
        let next_position = position.map(|p| p + 1).unwrap_or(0);
        let next = self.tree.get(next_position).and_then(|n| n.order_key.as_ref());

        let key = match prev {
            Some(prev) => self.keys.after(prev.order_key.as_ref(), next, |candidate| {
                self.tree.keys().any(|key| key == candidate)
            })?,
            // Appending to an empty tree or inserting at the front
            None => match next {
                Some(next) if next.major() > 0 => OrderKey::new(next.major() - 1),
                Some(_) => self
                    .keys
                    .legacy(|candidate| self.tree.keys().any(|key| key == candidate))?,
                None => OrderKey::new(0),
            },
        };
        Ok(key)
    }

    fn copy_name(&self, name: &str) -> String {
        let base = if name.is_empty() { "Script" } else { name };
        let mut candidate = format!("{}_copy", base);
        let mut n = 2;
        while self
            .tree
            .iter()
            .any(|node| node.name == candidate || script_stem(&node.file_name) == candidate)
            || self.index.resolve(&script_file_name(&candidate)).exists()
        {
            candidate = format!("{}_copy{}", base, n);
            n += 1;
        }
        candidate
    }

    fn resolve(&self, target: &str) -> Result<usize> {
        self.tree.resolve(target).ok_or_else(|| Error::NodeNotFound {
            target: target.to_string(),
        })
    }

    fn resolve_optional(&self, target: Option<&str>) -> Result<Option<usize>> {
        match target {
            Some(target) => self.resolve(target).map(Some),
            None => Ok(self.tree.len().checked_sub(1)),
        }
    }

    /// Whether `file_name` would break an ordered index.
    fn needs_key(&self, file_name: &str) -> bool {
        self.naming == NamingScheme::Ordered && OrderKey::split(script_stem(file_name)).is_none()
    }

    /// Move an externally renamed script to a keyed name, reusing the key
    /// of the node at `position`. Returns the new file name.
    fn key_renamed_file(&mut self, position: usize, file_name: &str) -> Result<String> {
        let key = match self.tree.nodes()[position].order_key.clone() {
            Some(key) => key,
            None => self.next_key(Some(position))?,
        };
        let keyed = script_file_name(&key.apply(script_stem(file_name)));
        let from = self.index.resolve(file_name);
        let to = self.index.resolve(&keyed);
        if to.exists() {
            return Err(Error::NameConflict { file_name: keyed });
        }

        let _guard = self.suppressor.suppress(&[
            EventKind::Create,
            EventKind::Delete,
            EventKind::Rename,
        ]);
        let content = io::read_bytes(&from)?;
        io::write_atomic(&to, &content, RobustnessConfig::default())?;
        io::remove_file(&from)?;
        tracing::warn!(from = file_name, to = %keyed, "gave renamed script an order key");
        Ok(keyed)
    }

    fn index_lists(&self, file_name: &str) -> Result<bool> {
        Ok(self.index.read_all()?.iter().any(|line| line == file_name))
    }

    /// File name of `path` when it is a script directly inside the
    /// scripts directory.
    fn script_file_name_of(&self, path: &Path) -> Option<String> {
        let path = NormalizedPath::new(path);
        if path.extension() != Some(SCRIPT_EXTENSION) {
            return None;
        }
        let parent = path.parent()?;
        let scripts_dir = self.index.scripts_dir();
        if parent != *scripts_dir && parent.canonicalize() != scripts_dir.canonicalize() {
            return None;
        }
        path.file_name().map(str::to_string)
    }

    fn refresh(&mut self) {
        for listener in &mut self.listeners {
            listener(&self.tree);
        }
    }
}
