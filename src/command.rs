use crate::node::AssetNode;
use crate::tree::AssetTree;
use std::collections::HashSet;

/// An optimistic tree mutation that can be undone.
///
/// Commands capture enough state on `apply` to restore the tree exactly on
/// `revert`, so local edits can be rolled back independently of whatever the
/// remote store ends up doing.
#[derive(Debug, Clone)]
pub enum TreeCommand {
    Move {
        id: String,
        from: Option<String>,
        to: Option<String>,
    },
    Remove {
        /// Snapshot of the removed nodes, in removal order.
        nodes: Vec<AssetNode>,
    },
    Rename {
        id: String,
        from: String,
        to: String,
    },
}

impl TreeCommand {
    /// Build a move command from the node's current parent.
    pub fn move_node(tree: &AssetTree, id: &str, to: Option<&str>) -> Option<Self> {
        let node = tree.get(id)?;
        Some(TreeCommand::Move {
            id: id.to_string(),
            from: node.parent_id.clone(),
            to: to.map(|t| t.to_string()),
        })
    }

    /// Build a remove command covering `ids`.
    pub fn remove_nodes(tree: &AssetTree, ids: &HashSet<String>) -> Self {
        let nodes = tree
            .nodes()
            .iter()
            .filter(|n| ids.contains(&n.id))
            .cloned()
            .collect();
        TreeCommand::Remove { nodes }
    }

    pub fn rename_node(tree: &AssetTree, id: &str, to: &str) -> Option<Self> {
        let node = tree.get(id)?;
        Some(TreeCommand::Rename {
            id: id.to_string(),
            from: node.name.clone(),
            to: to.to_string(),
        })
    }

    /// Apply the mutation. Returns false when the tree rejected it (missing
    /// node, or a move that would create a cycle).
    pub fn apply(&self, tree: &mut AssetTree) -> bool {
        match self {
            TreeCommand::Move { id, to, .. } => tree.set_parent(id, to.as_deref()),
            TreeCommand::Remove { nodes } => {
                let ids: HashSet<String> = nodes.iter().map(|n| n.id.clone()).collect();
                !tree.remove_many(&ids).is_empty()
            }
            TreeCommand::Rename { id, to, .. } => tree.rename(id, to),
        }
    }

    /// Undo the mutation.
    pub fn revert(&self, tree: &mut AssetTree) {
        match self {
            TreeCommand::Move { id, from, .. } => {
                tree.set_parent(id, from.as_deref());
            }
            TreeCommand::Remove { nodes } => {
                for node in nodes {
                    if !tree.contains(&node.id) {
                        tree.insert(node.clone());
                    }
                }
            }
            TreeCommand::Rename { id, from, .. } => {
                tree.rename(id, from);
            }
        }
    }
}
