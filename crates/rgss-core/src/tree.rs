//! In-memory ordered view of the script files.

use rgss_fs::NormalizedPath;
use rgss_index::{IndexEntry, IndexFile, OrderKey, script_stem};
use uuid::Uuid;

use crate::Result;

/// One visible script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptNode {
    /// Synthetic identity, unrelated to container section ids
    pub id: Uuid,
    /// Display label; empty when the file is empty
    pub label: String,
    /// Name without order key or extension
    pub name: String,
    /// File name as listed in the index
    pub file_name: String,
    pub path: NormalizedPath,
    pub order_key: Option<OrderKey>,
}

impl ScriptNode {
    /// Build a node for `file_name` inside `scripts_dir`.
    pub fn new(scripts_dir: &NormalizedPath, file_name: &str) -> Self {
        let stem = script_stem(file_name);
        let (order_key, name) = match OrderKey::split(stem) {
            Some((key, name)) => (Some(key), name.to_string()),
            None => (None, stem.to_string()),
        };
        Self {
            id: Uuid::new_v4(),
            label: name.clone(),
            name,
            file_name: file_name.to_string(),
            path: scripts_dir.join(file_name),
            order_key,
        }
    }

    /// Clear the label when the file on disk is empty.
    pub fn with_label_from_disk(mut self) -> Self {
        if file_is_empty(&self.path) {
            self.label.clear();
        }
        self
    }

    /// Whether `target` names this node by file name, stem or name.
    pub fn matches(&self, target: &str) -> bool {
        self.file_name == target || script_stem(&self.file_name) == target || self.name == target
    }
}

fn file_is_empty(path: &NormalizedPath) -> bool {
    std::fs::metadata(path.to_native())
        .map(|meta| meta.len() == 0)
        .unwrap_or(false)
}

/// Ordered collection of script nodes.
///
/// Never persisted: it is always rebuilt from the index file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScriptTree {
    nodes: Vec<ScriptNode>,
}

impl ScriptTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_nodes(nodes: Vec<ScriptNode>) -> Self {
        Self { nodes }
    }

    /// Rebuild from the visible lines of an index file.
    pub fn from_index(index: &IndexFile) -> Result<Self> {
        let mut nodes = Vec::new();
        for entry in index.entries()? {
            if let IndexEntry::Script { file_name, path, .. } = entry {
                if index.is_preserved(&file_name) {
                    tracing::debug!(file = %file_name, "hiding script kept as raw payload");
                    continue;
                }
                if !path.is_file() {
                    tracing::warn!(path = %path, "indexed script file is missing");
                }
                nodes.push(ScriptNode::new(index.scripts_dir(), &file_name).with_label_from_disk());
            }
        }
        tracing::debug!(nodes = nodes.len(), "built script tree");
        Ok(Self { nodes })
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ScriptNode> {
        self.nodes.iter()
    }

    pub fn nodes(&self) -> &[ScriptNode] {
        &self.nodes
    }

    pub fn get(&self, position: usize) -> Option<&ScriptNode> {
        self.nodes.get(position)
    }

    /// Nodes satisfying `predicate`, in order.
    pub fn filter(&self, predicate: impl Fn(&ScriptNode) -> bool) -> Vec<&ScriptNode> {
        self.nodes.iter().filter(|node| predicate(node)).collect()
    }

    pub fn find(&self, predicate: impl Fn(&ScriptNode) -> bool) -> Option<&ScriptNode> {
        self.nodes.iter().find(|node| predicate(node))
    }

    pub fn position(&self, predicate: impl Fn(&ScriptNode) -> bool) -> Option<usize> {
        self.nodes.iter().position(predicate)
    }

    /// Position of the first node named by `target`. Exact file names win
    /// over stems and names.
    pub fn resolve(&self, target: &str) -> Option<usize> {
        self.position(|node| node.file_name == target)
            .or_else(|| self.position(|node| node.matches(target)))
    }

    pub fn find_by_file_name(&self, file_name: &str) -> Option<&ScriptNode> {
        self.find(|node| node.file_name == file_name)
    }

    pub fn contains_file(&self, file_name: &str) -> bool {
        self.find_by_file_name(file_name).is_some()
    }

    /// Order keys in use, for collision checks.
    pub fn keys(&self) -> impl Iterator<Item = &OrderKey> {
        self.nodes.iter().filter_map(|node| node.order_key.as_ref())
    }

    /// Insert `node` right after `position`, or at the front when `None`.
    pub fn insert_after(&mut self, position: Option<usize>, node: ScriptNode) -> usize {
        let at = position.map(|p| (p + 1).min(self.nodes.len())).unwrap_or(0);
        self.nodes.insert(at, node);
        at
    }

    pub fn push(&mut self, node: ScriptNode) {
        self.nodes.push(node);
    }

    /// Replace the node at `position`, returning the old one.
    pub fn replace(&mut self, position: usize, node: ScriptNode) -> ScriptNode {
        std::mem::replace(&mut self.nodes[position], node)
    }

    pub fn remove(&mut self, position: usize) -> ScriptNode {
        self.nodes.remove(position)
    }

    /// Replace `range` with `replacement`, returning the removed nodes.
    pub fn splice(
        &mut self,
        range: std::ops::Range<usize>,
        replacement: Vec<ScriptNode>,
    ) -> Vec<ScriptNode> {
        self.nodes.splice(range, replacement).collect()
    }
}
