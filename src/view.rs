use crate::node::{AssetKind, AssetNode};
use crate::tree::AssetTree;
use serde::{Deserialize, Serialize};

/// How the current folder's contents are laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    Grid,
    List,
    Column,
}

/// Where the user currently is in the folder hierarchy.
///
/// `path` is the chain of folder ids from the root to `current_folder`;
/// in column view it may extend one element past the current folder to a
/// selected file whose preview is shown.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NavigationState {
    pub current_folder: Option<String>,
    pub path: Vec<String>,
}

impl NavigationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_root(&self) -> bool {
        self.current_folder.is_none()
    }

    /// Enter a folder, rebuilding the path from its ancestor chain so the
    /// breadcrumb stays consistent however the folder was reached.
    pub fn enter(&mut self, tree: &AssetTree, folder_id: &str) {
        let mut path: Vec<String> = tree
            .ancestors_of(folder_id)
            .iter()
            .rev()
            .map(|n| n.id.clone())
            .collect();
        path.push(folder_id.to_string());
        self.current_folder = Some(folder_id.to_string());
        self.path = path;
    }

    /// Step up one level toward the root.
    pub fn navigate_up(&mut self) {
        self.path.pop();
        self.current_folder = self.path.last().cloned();
    }

    /// Replace the path selection at `depth` in column view. Everything
    /// deeper than `depth` is discarded; the current folder becomes the
    /// deepest folder on the new path.
    pub fn select_column(&mut self, tree: &AssetTree, depth: usize, id: &str) {
        self.path.truncate(depth);
        self.path.push(id.to_string());
        self.current_folder = self
            .path
            .iter()
            .rev()
            .find(|p| tree.get(p).is_some_and(|n| n.is_folder()))
            .cloned();
    }

    /// Drop path segments that no longer exist in the tree, e.g. after a
    /// delete removed a folder the user was inside.
    pub fn prune_removed(&mut self, tree: &AssetTree) {
        if let Some(missing) = self.path.iter().position(|p| !tree.contains(p)) {
            self.path.truncate(missing);
            self.current_folder = self
                .path
                .iter()
                .rev()
                .find(|p| tree.get(p).is_some_and(|n| n.is_folder()))
                .cloned();
        }
    }
}

/// One tile in grid or list view.
#[derive(Debug, Clone, PartialEq)]
pub enum GridEntry {
    /// Synthetic "go to parent" tile shown below the root level.
    Up,
    Node(AssetNode),
}

/// Project the current folder into grid/list entries: an Up tile when not at
/// the root, then folders, then files.
pub fn grid_entries(
    tree: &AssetTree,
    nav: &NavigationState,
    filter: Option<AssetKind>,
) -> Vec<GridEntry> {
    let mut entries = Vec::new();
    if !nav.is_root() {
        entries.push(GridEntry::Up);
    }
    for node in tree.children_of(nav.current_folder.as_deref(), filter) {
        entries.push(GridEntry::Node(node.clone()));
    }
    entries
}

/// One pane of the column (Miller) view.
#[derive(Debug, Clone)]
pub struct Pane {
    /// Which path selection this pane descends from (`None` for the root pane).
    pub parent: Option<String>,
    pub items: Vec<AssetNode>,
    /// The path segment selected inside this pane, if any.
    pub selected: Option<String>,
}

/// Project the navigation path into column panes.
///
/// The first pane lists the root; each selected folder on the path opens one
/// more pane with its children. A selected file ends the cascade.
pub fn column_panes(tree: &AssetTree, nav: &NavigationState) -> Vec<Pane> {
    let mut panes = vec![Pane {
        parent: None,
        items: tree.children_of(None, None).into_iter().cloned().collect(),
        selected: nav.path.first().cloned(),
    }];
    for (depth, id) in nav.path.iter().enumerate() {
        let Some(node) = tree.get(id) else { break };
        if !node.is_folder() {
            break;
        }
        panes.push(Pane {
            parent: Some(id.clone()),
            items: tree.children_of(Some(id), None).into_iter().cloned().collect(),
            selected: nav.path.get(depth + 1).cloned(),
        });
    }
    panes
}

/// The file whose preview panel is shown in column view: the deepest path
/// segment, when it is a non-folder node.
pub fn preview_of<'a>(tree: &'a AssetTree, nav: &NavigationState) -> Option<&'a AssetNode> {
    let last = nav.path.last()?;
    tree.get(last).filter(|n| !n.is_folder())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::AssetNode;

    fn sample_tree() -> AssetTree {
        let mut tree = AssetTree::new();
        tree.insert(AssetNode::new_folder(None, "drums"));
        let drums = tree.nodes()[0].id.clone();
        tree.insert(AssetNode::new_folder(Some(drums.clone()), "kicks"));
        let kicks = tree.nodes()[1].id.clone();
        let mut kick = AssetNode::new_text_file(Some(kicks), "kick.txt");
        kick.kind = AssetKind::Text;
        tree.insert(kick);
        tree
    }

    fn ids(tree: &AssetTree) -> (String, String, String) {
        (
            tree.nodes()[0].id.clone(),
            tree.nodes()[1].id.clone(),
            tree.nodes()[2].id.clone(),
        )
    }

    #[test]
    fn test_enter_rebuilds_path() {
        let tree = sample_tree();
        let (drums, kicks, _) = ids(&tree);
        let mut nav = NavigationState::new();
        nav.enter(&tree, &kicks);
        assert_eq!(nav.path, vec![drums, kicks.clone()]);
        assert_eq!(nav.current_folder.as_deref(), Some(kicks.as_str()));
    }

    #[test]
    fn test_navigate_up_to_root() {
        let tree = sample_tree();
        let (drums, _, _) = ids(&tree);
        let mut nav = NavigationState::new();
        nav.enter(&tree, &drums);
        nav.navigate_up();
        assert!(nav.is_root());
        assert!(nav.path.is_empty());
        // Up at the root is a no-op.
        nav.navigate_up();
        assert!(nav.is_root());
    }

    #[test]
    fn test_grid_entries_up_tile() {
        let tree = sample_tree();
        let (drums, _, _) = ids(&tree);
        let mut nav = NavigationState::new();
        assert!(!matches!(
            grid_entries(&tree, &nav, None).first(),
            Some(GridEntry::Up)
        ));
        nav.enter(&tree, &drums);
        assert!(matches!(
            grid_entries(&tree, &nav, None).first(),
            Some(GridEntry::Up)
        ));
    }

    #[test]
    fn test_select_column_truncates_deeper_panes() {
        let tree = sample_tree();
        let (drums, kicks, file) = ids(&tree);
        let mut nav = NavigationState::new();
        nav.select_column(&tree, 0, &drums);
        nav.select_column(&tree, 1, &kicks);
        nav.select_column(&tree, 2, &file);
        assert_eq!(nav.path, vec![drums.clone(), kicks.clone(), file]);
        // File on the path does not become the current folder.
        assert_eq!(nav.current_folder.as_deref(), Some(kicks.as_str()));
        // Re-selecting at depth 0 drops everything deeper.
        nav.select_column(&tree, 0, &drums);
        assert_eq!(nav.path, vec![drums.clone()]);
        assert_eq!(nav.current_folder.as_deref(), Some(drums.as_str()));
    }

    #[test]
    fn test_column_panes_stop_at_file() {
        let tree = sample_tree();
        let (drums, kicks, file) = ids(&tree);
        let mut nav = NavigationState::new();
        nav.select_column(&tree, 0, &drums);
        nav.select_column(&tree, 1, &kicks);
        nav.select_column(&tree, 2, &file);
        let panes = column_panes(&tree, &nav);
        assert_eq!(panes.len(), 3);
        assert_eq!(panes[2].parent.as_deref(), Some(kicks.as_str()));
        assert_eq!(panes[2].selected.as_deref(), Some(file.as_str()));
        assert_eq!(preview_of(&tree, &nav).map(|n| n.id.as_str()), Some(file.as_str()));
    }

    #[test]
    fn test_prune_removed_path_segment() {
        let mut tree = sample_tree();
        let (drums, kicks, _) = ids(&tree);
        let mut nav = NavigationState::new();
        nav.enter(&tree, &kicks);
        let removed: std::collections::HashSet<String> =
            tree.subtree_ids(&kicks).into_iter().collect();
        tree.remove_many(&removed);
        nav.prune_removed(&tree);
        assert_eq!(nav.path, vec![drums.clone()]);
        assert_eq!(nav.current_folder.as_deref(), Some(drums.as_str()));
    }
}
