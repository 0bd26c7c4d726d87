use crate::node::{AssetKind, AssetNode};
use crate::store::AssetRecord;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Upper bound for ancestor walks. Guarantees termination even if the
/// canonical list somehow contains a parent cycle.
pub const MAX_ANCESTOR_DEPTH: usize = 50;

/// Canonical flat list of asset nodes with parent references.
///
/// All tree structure is derived from `parent_id` equality; there is no
/// nested representation to keep in sync.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssetTree {
    nodes: Vec<AssetNode>,
}

impl AssetTree {
    /// Create a new empty tree.
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    pub fn from_nodes(nodes: Vec<AssetNode>) -> Self {
        Self { nodes }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[AssetNode] {
        &self.nodes
    }

    /// Find a node by id.
    pub fn get(&self, id: &str) -> Option<&AssetNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Find a node by id (mutable).
    pub fn get_mut(&mut self, id: &str) -> Option<&mut AssetNode> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Insert a node into the canonical list.
    pub fn insert(&mut self, node: AssetNode) {
        debug_assert!(!self.contains(&node.id), "duplicate asset id");
        self.nodes.push(node);
    }

    /// Direct children of a folder (`None` = root level), folders ordered
    /// before files. An optional filter restricts the result to folders plus
    /// one other kind.
    pub fn children_of(&self, folder: Option<&str>, filter: Option<AssetKind>) -> Vec<&AssetNode> {
        let mut children: Vec<&AssetNode> = self
            .nodes
            .iter()
            .filter(|n| n.parent_id.as_deref() == folder)
            .filter(|n| match filter {
                Some(kind) => n.is_folder() || n.kind == kind,
                None => true,
            })
            .collect();
        children.sort_by(|a, b| match (a.is_folder(), b.is_folder()) {
            (true, false) => std::cmp::Ordering::Less,
            (false, true) => std::cmp::Ordering::Greater,
            _ => std::cmp::Ordering::Equal,
        });
        children
    }

    /// Walk the parent chain upward from a node, nearest ancestor first.
    ///
    /// The walk stops at `MAX_ANCESTOR_DEPTH` so that malformed data with a
    /// parent cycle can never loop forever.
    pub fn ancestors_of(&self, id: &str) -> Vec<&AssetNode> {
        let mut ancestors = Vec::new();
        let mut current = self.get(id).and_then(|n| n.parent_id.as_deref());
        while let Some(parent_id) = current {
            if ancestors.len() >= MAX_ANCESTOR_DEPTH {
                log::warn!("ancestor walk for {} hit the depth bound", id);
                break;
            }
            match self.get(parent_id) {
                Some(parent) => {
                    ancestors.push(parent);
                    current = parent.parent_id.as_deref();
                }
                None => break,
            }
        }
        ancestors
    }

    /// Collect a node and all of its descendants, for recursive delete.
    pub fn subtree_ids(&self, id: &str) -> Vec<String> {
        let mut collected = Vec::new();
        self.collect_subtree(id, &mut collected);
        collected
    }

    fn collect_subtree(&self, id: &str, out: &mut Vec<String>) {
        if !self.contains(id) {
            return;
        }
        out.push(id.to_string());
        let child_ids: Vec<String> = self
            .nodes
            .iter()
            .filter(|n| n.parent_id.as_deref() == Some(id))
            .map(|n| n.id.clone())
            .collect();
        for child in child_ids {
            self.collect_subtree(&child, out);
        }
    }

    /// Whether `candidate` is `id` itself or lies anywhere inside its subtree.
    pub fn is_within_subtree(&self, id: &str, candidate: &str) -> bool {
        if id == candidate {
            return true;
        }
        self.ancestors_of(candidate).iter().any(|a| a.id == id)
    }

    /// Remove a set of nodes, returning them in removal order.
    pub fn remove_many(&mut self, ids: &HashSet<String>) -> Vec<AssetNode> {
        let mut removed = Vec::new();
        self.nodes.retain_mut(|n| {
            if ids.contains(&n.id) {
                removed.push(n.clone());
                false
            } else {
                true
            }
        });
        removed
    }

    /// Reparent a node. The target must not lie inside the node's own
    /// subtree; such a move would break acyclicity and is rejected.
    pub fn set_parent(&mut self, id: &str, parent: Option<&str>) -> bool {
        if let Some(target) = parent {
            if self.is_within_subtree(id, target) {
                return false;
            }
        }
        match self.get_mut(id) {
            Some(node) => {
                node.parent_id = parent.map(|p| p.to_string());
                true
            }
            None => false,
        }
    }

    /// Rename a node.
    pub fn rename(&mut self, id: &str, name: &str) -> bool {
        match self.get_mut(id) {
            Some(node) => {
                node.name = name.to_string();
                true
            }
            None => false,
        }
    }

    /// Replace a text node's content, updating its size label.
    pub fn set_content(&mut self, id: &str, content: &str) -> bool {
        match self.get_mut(id) {
            Some(node) if node.kind == AssetKind::Text => {
                node.size_label = format!("{} B", content.len());
                node.content = Some(content.to_string());
                true
            }
            _ => false,
        }
    }

    /// Swap a transient local id for the durable id assigned by the store.
    pub fn replace_id(&mut self, local: &str, durable: &str) -> bool {
        if self.contains(durable) {
            return false;
        }
        let mut found = false;
        for node in &mut self.nodes {
            if node.id == local {
                node.id = durable.to_string();
                found = true;
            }
            if node.parent_id.as_deref() == Some(local) {
                node.parent_id = Some(durable.to_string());
            }
        }
        found
    }

    /// Rebuild the tree from a fresh store listing. Local folder nodes that
    /// the store does not know about yet are preserved; file nodes are
    /// replaced wholesale by the records.
    pub fn hydrate(&mut self, records: &[AssetRecord]) {
        let mut next: Vec<AssetNode> = self
            .nodes
            .iter()
            .filter(|n| n.is_folder() && n.is_transient())
            .cloned()
            .collect();
        for record in records {
            next.push(record.to_node());
        }
        log::debug!(
            "hydrate: {} records, {} local folders kept",
            records.len(),
            next.len() - records.len()
        );
        self.nodes = next;
    }
}
