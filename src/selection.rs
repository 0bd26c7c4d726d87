use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Multi-select state over the currently visible items.
///
/// Range selection is resolved against an explicit `scope`: the ordered ids
/// visible in the pane where the click happened. Ranges never reach across
/// panes or into collapsed folders.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SelectionState {
    selected: HashSet<String>,
    anchor: Option<String>,
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selected.contains(id)
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn ids(&self) -> &HashSet<String> {
        &self.selected
    }

    pub fn anchor(&self) -> Option<&str> {
        self.anchor.as_deref()
    }

    /// Plain click: toggle the item. Selecting re-anchors; deselecting keeps
    /// the old anchor so a later shift-click still has a range start.
    pub fn click(&mut self, id: &str) {
        if self.selected.remove(id) {
            return;
        }
        self.selected.insert(id.to_string());
        self.anchor = Some(id.to_string());
    }

    /// Shift-click: select the inclusive range between the anchor and the
    /// clicked item within `scope`, keeping what was already selected.
    /// Without a usable anchor this degrades to a plain click.
    pub fn shift_click(&mut self, scope: &[String], id: &str) {
        let anchor_pos = self
            .anchor
            .as_ref()
            .and_then(|a| scope.iter().position(|s| s == a));
        let click_pos = scope.iter().position(|s| s == id);
        match (anchor_pos, click_pos) {
            (Some(a), Some(c)) => {
                let (lo, hi) = if a <= c { (a, c) } else { (c, a) };
                for item in &scope[lo..=hi] {
                    self.selected.insert(item.clone());
                }
            }
            _ => self.click(id),
        }
    }

    pub fn clear(&mut self) {
        self.selected.clear();
        self.anchor = None;
    }

    /// Drop ids that no longer exist, e.g. after a hydration or delete.
    pub fn retain_existing<F: Fn(&str) -> bool>(&mut self, exists: F) {
        self.selected.retain(|id| exists(id));
        if let Some(anchor) = &self.anchor {
            if !exists(anchor) {
                self.anchor = None;
            }
        }
    }

    /// Targets of a destructive action invoked on `explicit`.
    ///
    /// Acting on a selected item applies to the whole selection; acting on an
    /// unselected item applies to that item alone, leaving the selection be.
    pub fn resolve_targets(&self, explicit: &str) -> Vec<String> {
        if self.is_selected(explicit) {
            let mut targets: Vec<String> = self.selected.iter().cloned().collect();
            targets.sort();
            targets
        } else {
            vec![explicit.to_string()]
        }
    }
}
