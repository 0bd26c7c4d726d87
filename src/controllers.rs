use crate::node::{AssetKind, AssetNode};
use serde::{Deserialize, Serialize};

/// Inline rename editing state.
///
/// Only one rename can be active at a time; beginning a new one abandons the
/// previous edit without committing it.
#[derive(Debug, Clone, Default)]
pub struct RenameController {
    editing: Option<RenameEdit>,
}

#[derive(Debug, Clone)]
struct RenameEdit {
    id: String,
    original: String,
    buffer: String,
}

/// A committed rename the session should apply.
#[derive(Debug, Clone, PartialEq)]
pub struct RenameCommit {
    pub id: String,
    pub name: String,
    /// Whether the new name should also be written to the remote store.
    /// Transient nodes only exist locally, so there is nothing to persist.
    pub persist: bool,
}

impl RenameController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_editing(&self, id: &str) -> bool {
        self.editing.as_ref().is_some_and(|e| e.id == id)
    }

    pub fn buffer(&self) -> Option<&str> {
        self.editing.as_ref().map(|e| e.buffer.as_str())
    }

    /// Start editing a node's name, seeding the buffer with the current one.
    pub fn begin(&mut self, node: &AssetNode) {
        self.editing = Some(RenameEdit {
            id: node.id.clone(),
            original: node.name.clone(),
            buffer: node.name.clone(),
        });
    }

    pub fn set_buffer(&mut self, text: &str) {
        if let Some(edit) = &mut self.editing {
            edit.buffer = text.to_string();
        }
    }

    /// Commit on Enter or blur. A blank buffer reverts to the original name
    /// rather than producing a nameless node.
    pub fn commit(&mut self, persist: bool) -> Option<RenameCommit> {
        let edit = self.editing.take()?;
        let trimmed = edit.buffer.trim();
        let name = if trimmed.is_empty() {
            edit.original
        } else {
            trimmed.to_string()
        };
        Some(RenameCommit {
            id: edit.id,
            name,
            persist,
        })
    }

    /// Abandon the edit (Escape).
    pub fn cancel(&mut self) {
        self.editing = None;
    }
}

/// What a context menu was opened on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MenuTarget {
    Node(String),
    Background,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MenuAction {
    Open,
    Play,
    EditText,
    CopyLink,
    Rename,
    GetInfo,
    Delete,
    NewFolder,
    NewTextFile,
    UploadFiles,
    NavigateUp,
}

/// An open context menu, positioned and populated for its target.
#[derive(Debug, Clone, PartialEq)]
pub struct ContextMenu {
    pub x: f32,
    pub y: f32,
    pub target: MenuTarget,
    pub entries: Vec<MenuAction>,
}

/// Approximate rendered menu size used to keep it on screen.
const MENU_WIDTH: f32 = 180.0;
const MENU_HEIGHT: f32 = 200.0;

/// Build the context menu for a click at (`x`, `y`).
///
/// `node` is the asset under the cursor (`None` for background clicks);
/// `at_root` suppresses the navigate-up entry.
pub fn open_menu(
    x: f32,
    y: f32,
    viewport: (f32, f32),
    node: Option<&AssetNode>,
    at_root: bool,
) -> ContextMenu {
    let entries = match node {
        Some(node) if node.is_folder() => vec![
            MenuAction::Open,
            MenuAction::Rename,
            MenuAction::GetInfo,
            MenuAction::Delete,
        ],
        Some(node) => {
            let mut entries = vec![match node.kind {
                AssetKind::Audio => MenuAction::Play,
                AssetKind::Text => MenuAction::EditText,
                _ => MenuAction::GetInfo,
            }];
            if node.source_url.is_some() {
                entries.push(MenuAction::CopyLink);
            }
            entries.extend([MenuAction::Rename, MenuAction::GetInfo, MenuAction::Delete]);
            entries
        }
        None => {
            let mut entries = vec![
                MenuAction::NewFolder,
                MenuAction::NewTextFile,
                MenuAction::UploadFiles,
            ];
            if !at_root {
                entries.push(MenuAction::NavigateUp);
            }
            entries
        }
    };
    let (vw, vh) = viewport;
    ContextMenu {
        x: x.min((vw - MENU_WIDTH).max(0.0)),
        y: y.min((vh - MENU_HEIGHT).max(0.0)),
        target: match node {
            Some(node) => MenuTarget::Node(node.id.clone()),
            None => MenuTarget::Background,
        },
        entries,
    }
}

/// External notes collaborator. Export is one-way; nothing flows back.
pub trait NotesSink {
    fn append_note(&mut self, title: &str, body: &str);
}

/// Plain-text editor state for text assets.
#[derive(Debug, Clone, Default)]
pub struct TextEditorController {
    open: Option<TextEdit>,
}

#[derive(Debug, Clone)]
struct TextEdit {
    id: String,
    buffer: String,
}

impl TextEditorController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open_id(&self) -> Option<&str> {
        self.open.as_ref().map(|e| e.id.as_str())
    }

    pub fn buffer(&self) -> Option<&str> {
        self.open.as_ref().map(|e| e.buffer.as_str())
    }

    pub fn open(&mut self, node: &AssetNode) {
        self.open = Some(TextEdit {
            id: node.id.clone(),
            buffer: node.content.clone().unwrap_or_default(),
        });
    }

    pub fn set_buffer(&mut self, text: &str) {
        if let Some(edit) = &mut self.open {
            edit.buffer = text.to_string();
        }
    }

    /// Save and close, handing back the content to write into the tree.
    pub fn save(&mut self) -> Option<(String, String)> {
        self.open.take().map(|e| (e.id, e.buffer))
    }

    pub fn close(&mut self) {
        self.open = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::AssetNode;

    fn audio(id: &str) -> AssetNode {
        AssetNode {
            id: id.to_string(),
            parent_id: None,
            name: format!("{}.wav", id),
            kind: AssetKind::Audio,
            size_label: "1 KB".to_string(),
            created_label: "2026-01-01".to_string(),
            format: Some("WAV".to_string()),
            duration_seconds: Some(2),
            source_url: Some("mem://a".to_string()),
            content: None,
        }
    }

    #[test]
    fn test_rename_commit_trims() {
        let mut rename = RenameController::new();
        let node = audio("kick");
        rename.begin(&node);
        rename.set_buffer("  kick 2.wav ");
        let commit = rename.commit(true).unwrap();
        assert_eq!(commit.name, "kick 2.wav");
        assert!(commit.persist);
        assert!(rename.commit(true).is_none());
    }

    #[test]
    fn test_rename_blank_reverts_to_original() {
        let mut rename = RenameController::new();
        rename.begin(&audio("kick"));
        rename.set_buffer("   ");
        let commit = rename.commit(false).unwrap();
        assert_eq!(commit.name, "kick.wav");
    }

    #[test]
    fn test_rename_cancel_discards_edit() {
        let mut rename = RenameController::new();
        rename.begin(&audio("kick"));
        rename.set_buffer("other");
        rename.cancel();
        assert!(rename.commit(true).is_none());
    }

    #[test]
    fn test_menu_for_audio_file() {
        let node = audio("kick");
        let menu = open_menu(10.0, 10.0, (800.0, 600.0), Some(&node), false);
        assert_eq!(menu.entries[0], MenuAction::Play);
        assert!(menu.entries.contains(&MenuAction::CopyLink));
        assert!(menu.entries.contains(&MenuAction::Delete));
        assert_eq!(menu.target, MenuTarget::Node("kick".to_string()));
    }

    #[test]
    fn test_menu_for_folder() {
        let folder = AssetNode::new_folder(None, "drums");
        let menu = open_menu(10.0, 10.0, (800.0, 600.0), Some(&folder), false);
        assert_eq!(menu.entries[0], MenuAction::Open);
        assert!(!menu.entries.contains(&MenuAction::CopyLink));
    }

    #[test]
    fn test_background_menu_omits_up_at_root() {
        let at_root = open_menu(10.0, 10.0, (800.0, 600.0), None, true);
        assert!(!at_root.entries.contains(&MenuAction::NavigateUp));
        let nested = open_menu(10.0, 10.0, (800.0, 600.0), None, false);
        assert!(nested.entries.contains(&MenuAction::NavigateUp));
        assert_eq!(nested.target, MenuTarget::Background);
    }

    #[test]
    fn test_menu_clamped_to_viewport() {
        let menu = open_menu(790.0, 590.0, (800.0, 600.0), None, true);
        assert!(menu.x + 180.0 <= 800.0);
        assert!(menu.y + 200.0 <= 600.0);
    }

    #[test]
    fn test_text_editor_roundtrip() {
        let mut node = AssetNode::new_text_file(None, "notes.txt");
        node.content = Some("hello".to_string());
        let mut editor = TextEditorController::new();
        editor.open(&node);
        assert_eq!(editor.buffer(), Some("hello"));
        editor.set_buffer("hello world");
        let (id, content) = editor.save().unwrap();
        assert_eq!(id, node.id);
        assert_eq!(content, "hello world");
        assert!(editor.open_id().is_none());
    }
}
