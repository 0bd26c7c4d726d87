use crate::command::TreeCommand;
use crate::config::Config;
use crate::controllers::{
    open_menu, ContextMenu, NotesSink, RenameController, TextEditorController,
};
use crate::dragdrop::{resolve_move_set, DragController, DropIntent};
use crate::error::Result;
use crate::node::{AssetKind, AssetNode};
use crate::ops::{BatchItemSpec, BatchState, EngineSignal, OperationEngine};
use crate::playback::{sibling_audio_queue, PlaybackQueue};
use crate::selection::SelectionState;
use crate::store::{AssetPatch, AssetStore, UploadSource};
use crate::tree::AssetTree;
use crate::view::{self, GridEntry, NavigationState, Pane, ViewMode};
use std::collections::HashSet;
use tokio::sync::{mpsc, watch};

/// The whole client-side file manager: tree, navigation, selection, drag,
/// inline editors and the batch engine, behind one facade.
///
/// All state lives on the caller's task; the only concurrency is inside the
/// engine (progress tickers and auto-dismiss timers).
pub struct FileManagerSession<S> {
    pub tree: AssetTree,
    pub nav: NavigationState,
    pub selection: SelectionState,
    pub drag: DragController,
    pub rename: RenameController,
    pub editor: TextEditorController,
    pub menu: Option<ContextMenu>,
    pub view_mode: ViewMode,
    engine: OperationEngine<S>,
    signals: mpsc::UnboundedReceiver<EngineSignal>,
    undo_stack: Vec<TreeCommand>,
}

impl<S: AssetStore> FileManagerSession<S> {
    pub fn new(store: S, config: Config) -> Self {
        let drag = DragController::new(config.drag.long_press(), config.drag.move_threshold_px);
        let (engine, signals) = OperationEngine::new(store, config.batch.clone());
        Self {
            tree: AssetTree::new(),
            nav: NavigationState::new(),
            selection: SelectionState::new(),
            drag,
            rename: RenameController::new(),
            editor: TextEditorController::new(),
            menu: None,
            view_mode: ViewMode::Grid,
            engine,
            signals,
            undo_stack: Vec::new(),
        }
    }

    pub fn store(&self) -> &S {
        self.engine.store()
    }

    pub fn subscribe_batches(&self) -> watch::Receiver<BatchState> {
        self.engine.subscribe()
    }

    pub fn batch_snapshot(&self) -> BatchState {
        self.engine.snapshot()
    }

    pub fn cancel_batch(&self) {
        self.engine.cancel();
    }

    pub fn toggle_batch_minimize(&self) {
        self.engine.toggle_minimize();
    }

    /// Refetch the canonical listing and rebuild local state around it.
    pub async fn hydrate(&mut self) -> Result<()> {
        let records = self.engine.store().get_user_files().await?;
        self.tree.hydrate(&records);
        let tree = &self.tree;
        self.selection.retain_existing(|id| tree.contains(id));
        self.nav.prune_removed(tree);
        Ok(())
    }

    /// Drain engine signals; a store invalidation triggers one rehydration.
    pub async fn pump(&mut self) -> Result<()> {
        let mut invalidated = false;
        while let Ok(signal) = self.signals.try_recv() {
            match signal {
                EngineSignal::StoreInvalidated => invalidated = true,
            }
        }
        if invalidated {
            self.hydrate().await?;
        }
        Ok(())
    }

    // --- Navigation -------------------------------------------------------

    pub fn open_folder(&mut self, id: &str) {
        if self.tree.get(id).is_some_and(|n| n.is_folder()) {
            self.nav.enter(&self.tree, id);
            self.selection.clear();
        }
    }

    pub fn navigate_up(&mut self) {
        self.nav.navigate_up();
        self.selection.clear();
    }

    pub fn select_in_column(&mut self, depth: usize, id: &str) {
        if self.tree.contains(id) {
            self.nav.select_column(&self.tree, depth, id);
        }
    }

    pub fn set_view_mode(&mut self, mode: ViewMode) {
        self.view_mode = mode;
    }

    // --- Projections ------------------------------------------------------

    pub fn grid_entries(&self, filter: Option<AssetKind>) -> Vec<GridEntry> {
        view::grid_entries(&self.tree, &self.nav, filter)
    }

    pub fn column_panes(&self) -> Vec<Pane> {
        view::column_panes(&self.tree, &self.nav)
    }

    pub fn preview(&self) -> Option<&AssetNode> {
        view::preview_of(&self.tree, &self.nav)
    }

    /// Ordered ids visible in the current grid/list pane; the scope for
    /// range selection there.
    fn grid_scope(&self) -> Vec<String> {
        self.tree
            .children_of(self.nav.current_folder.as_deref(), None)
            .iter()
            .map(|n| n.id.clone())
            .collect()
    }

    /// Ordered ids in one column pane.
    fn pane_scope(&self, pane_parent: Option<&str>) -> Vec<String> {
        self.tree
            .children_of(pane_parent, None)
            .iter()
            .map(|n| n.id.clone())
            .collect()
    }

    // --- Selection --------------------------------------------------------

    pub fn grid_click(&mut self, id: &str, shift: bool) {
        let scope = self.grid_scope();
        self.item_click(&scope, id, shift);
    }

    pub fn column_click(&mut self, pane_parent: Option<&str>, id: &str, shift: bool) {
        let scope = self.pane_scope(pane_parent);
        self.item_click(&scope, id, shift);
    }

    fn item_click(&mut self, scope: &[String], id: &str, shift: bool) {
        if shift {
            self.selection.shift_click(scope, id);
        } else {
            self.selection.click(id);
        }
    }

    /// Click on empty canvas: clear the selection and close any open menu.
    pub fn background_click(&mut self) {
        self.selection.clear();
        self.menu = None;
    }

    // --- Context menu -----------------------------------------------------

    pub fn open_context_menu(&mut self, x: f32, y: f32, viewport: (f32, f32), node_id: Option<&str>) {
        let node = node_id.and_then(|id| self.tree.get(id));
        self.menu = Some(open_menu(x, y, viewport, node, self.nav.is_root()));
    }

    pub fn close_context_menu(&mut self) {
        self.menu = None;
    }

    // --- Creation ---------------------------------------------------------

    /// Create a folder in the current location. The node appears immediately
    /// under a transient id, enters rename mode, and swaps to the durable id
    /// once the store confirms.
    pub async fn create_folder(&mut self, name: &str) -> Result<String> {
        let parent = self.nav.current_folder.clone();
        let node = AssetNode::new_folder(parent.clone(), name);
        let local = node.id.clone();
        self.tree.insert(node);
        let id = match self
            .engine
            .store()
            .create_folder(name, parent.as_deref())
            .await
        {
            Ok(durable) => {
                self.tree.replace_id(&local, &durable);
                durable
            }
            Err(err) => {
                log::warn!("folder {} stays local: {}", name, err);
                local
            }
        };
        if let Some(node) = self.tree.get(&id) {
            self.rename.begin(node);
        }
        Ok(id)
    }

    /// Create an empty text file. Text files live locally until saved
    /// content gives them something worth uploading.
    pub fn create_text_file(&mut self, name: &str) -> String {
        let node = AssetNode::new_text_file(self.nav.current_folder.clone(), name);
        let id = node.id.clone();
        self.rename.begin(&node);
        self.tree.insert(node);
        id
    }

    // --- Upload -----------------------------------------------------------

    /// Upload files into the current folder, then rehydrate on the
    /// invalidation the engine raises for any success.
    pub async fn upload(&mut self, sources: Vec<UploadSource>) -> Result<()> {
        let target = self.nav.current_folder.clone();
        self.engine.upload(sources, target.as_deref()).await;
        self.pump().await
    }

    // --- Delete -----------------------------------------------------------

    /// Delete `target` honoring selection semantics: deleting a selected
    /// node deletes the whole selection, and folders take their subtrees
    /// with them. The tree updates optimistically; durable ids then go to
    /// the store as a batch.
    pub async fn delete(&mut self, target: &str) -> Result<()> {
        let roots = self.selection.resolve_targets(target);
        let mut doomed: HashSet<String> = HashSet::new();
        for root in &roots {
            doomed.extend(self.tree.subtree_ids(root));
        }
        if doomed.is_empty() {
            return Ok(());
        }
        let specs: Vec<BatchItemSpec> = doomed
            .iter()
            .filter_map(|id| self.tree.get(id))
            .filter(|n| !n.is_transient())
            .map(|n| BatchItemSpec {
                asset_id: n.id.clone(),
                name: n.name.clone(),
            })
            .collect();

        let command = TreeCommand::remove_nodes(&self.tree, &doomed);
        command.apply(&mut self.tree);
        self.undo_stack.push(command);
        let tree = &self.tree;
        self.selection.retain_existing(|id| tree.contains(id));
        self.nav.prune_removed(tree);
        self.menu = None;

        if !specs.is_empty() {
            self.engine.delete(specs).await;
        }
        self.pump().await
    }

    // --- Move -------------------------------------------------------------

    /// Turn a finished drag into an optimistic move plus a store batch.
    /// Returns the ids that actually moved.
    pub async fn handle_drop(&mut self, intent: DropIntent) -> Result<Vec<String>> {
        let Some(set) = resolve_move_set(&self.selection, &intent.source, intent.target.as_deref())
        else {
            return Ok(Vec::new());
        };
        let mut moved = Vec::new();
        for id in &set {
            // set_parent rejects moves into a node's own subtree.
            let Some(command) = TreeCommand::move_node(&self.tree, id, intent.target.as_deref())
            else {
                continue;
            };
            if command.apply(&mut self.tree) {
                self.undo_stack.push(command);
                moved.push(id.clone());
            }
        }
        if moved.is_empty() {
            return Ok(Vec::new());
        }
        self.selection.clear();
        let specs: Vec<BatchItemSpec> = moved
            .iter()
            .filter_map(|id| self.tree.get(id))
            .filter(|n| !n.is_transient())
            .map(|n| BatchItemSpec {
                asset_id: n.id.clone(),
                name: n.name.clone(),
            })
            .collect();
        if !specs.is_empty() {
            self.engine
                .move_items(specs, intent.target.as_deref())
                .await;
        }
        self.pump().await?;
        Ok(moved)
    }

    /// Undo the most recent optimistic tree mutation, locally only.
    pub fn undo(&mut self) -> bool {
        match self.undo_stack.pop() {
            Some(command) => {
                command.revert(&mut self.tree);
                true
            }
            None => false,
        }
    }

    // --- Rename -----------------------------------------------------------

    pub fn rename_begin(&mut self, id: &str) {
        if let Some(node) = self.tree.get(id) {
            self.rename.begin(node);
        }
        self.menu = None;
    }

    pub fn rename_input(&mut self, text: &str) {
        self.rename.set_buffer(text);
    }

    /// Commit the rename (Enter or blur), persisting to the store when the
    /// node has a durable id.
    pub async fn rename_commit(&mut self) -> Result<()> {
        let editing_id = match self.rename.buffer() {
            Some(_) => self
                .tree
                .nodes()
                .iter()
                .find(|n| self.rename.is_editing(&n.id))
                .map(|n| (n.id.clone(), !n.is_transient())),
            None => None,
        };
        let Some((id, durable)) = editing_id else {
            self.rename.cancel();
            return Ok(());
        };
        let Some(commit) = self.rename.commit(durable) else {
            return Ok(());
        };
        if let Some(command) = TreeCommand::rename_node(&self.tree, &id, &commit.name) {
            if command.apply(&mut self.tree) {
                self.undo_stack.push(command);
            }
        }
        if commit.persist {
            self.engine
                .store()
                .update_asset(
                    &commit.id,
                    AssetPatch {
                        name: Some(commit.name),
                        parent_id: None,
                    },
                )
                .await?;
        }
        Ok(())
    }

    pub fn rename_cancel(&mut self) {
        self.rename.cancel();
    }

    // --- Text editing -----------------------------------------------------

    pub fn open_text_editor(&mut self, id: &str) {
        if let Some(node) = self.tree.get(id) {
            if node.kind == AssetKind::Text {
                self.editor.open(node);
            }
        }
        self.menu = None;
    }

    pub fn editor_input(&mut self, text: &str) {
        self.editor.set_buffer(text);
    }

    /// Save the open text file back into the tree.
    pub fn save_text(&mut self) -> bool {
        match self.editor.save() {
            Some((id, content)) => self.tree.set_content(&id, &content),
            None => false,
        }
    }

    /// Hand a text node's content to the external notes collaborator.
    pub fn export_note<N: NotesSink>(&self, id: &str, sink: &mut N) -> bool {
        match self.tree.get(id) {
            Some(node) if node.kind == AssetKind::Text => {
                sink.append_note(&node.name, node.content.as_deref().unwrap_or(""));
                true
            }
            _ => false,
        }
    }

    // --- Playback ---------------------------------------------------------

    pub fn play(&self, id: &str) -> Option<PlaybackQueue> {
        sibling_audio_queue(&self.tree, id)
    }
}
