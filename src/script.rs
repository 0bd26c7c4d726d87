use crate::config::Config;
use crate::dragdrop::DropIntent;
use crate::error::Result;
use crate::node::AssetKind;
use crate::session::FileManagerSession;
use crate::store::{AssetRecord, InMemoryStore, StoreError, UploadSource};
use crate::view::ViewMode;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::Path;

/// One step of a headless driver script.
///
/// Scripts are JSON arrays of tagged commands, e.g.
/// `[{"cmd":"hydrate"},{"cmd":"open_folder","id":"fld-0"}]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum ScriptCommand {
    Seed { records: Vec<AssetRecord> },
    FailNext { key: String, error: String },
    Hydrate,
    OpenFolder { id: String },
    NavigateUp,
    SelectColumn { depth: usize, id: String },
    SetViewMode { mode: ViewMode },
    GridClick { id: String, #[serde(default)] shift: bool },
    ColumnClick {
        pane: Option<String>,
        id: String,
        #[serde(default)]
        shift: bool,
    },
    BackgroundClick,
    CreateFolder { name: String },
    CreateTextFile { name: String },
    Upload { files: Vec<ScriptUpload> },
    Delete { target: String },
    Drop { source: String, target: Option<String> },
    RenameBegin { id: String },
    RenameInput { text: String },
    RenameCommit,
    OpenEditor { id: String },
    EditorInput { text: String },
    SaveText,
    Play { id: String },
    Undo,
    Snapshot { what: SnapshotKind },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptUpload {
    pub name: String,
    pub mime: String,
    pub size_bytes: u64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotKind {
    Tree,
    Nav,
    Selection,
    Batch,
    Grid,
}

/// Load a script from a JSON file.
pub fn load_script<P: AsRef<Path>>(path: P) -> Result<Vec<ScriptCommand>> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Execute a script against a fresh in-memory session, returning the JSON
/// snapshots it requested.
pub async fn run_script(
    commands: Vec<ScriptCommand>,
    config: Config,
) -> Result<Vec<serde_json::Value>> {
    let mut session = FileManagerSession::new(InMemoryStore::new(), config);
    let mut snapshots = Vec::new();
    for command in commands {
        log::debug!("script: {:?}", command);
        match command {
            ScriptCommand::Seed { records } => {
                for record in records {
                    seed_record(session.store(), record).await;
                }
            }
            ScriptCommand::FailNext { key, error } => {
                session.store().fail_for(&key, StoreError::classify(&error));
            }
            ScriptCommand::Hydrate => session.hydrate().await?,
            ScriptCommand::OpenFolder { id } => session.open_folder(&id),
            ScriptCommand::NavigateUp => session.navigate_up(),
            ScriptCommand::SelectColumn { depth, id } => session.select_in_column(depth, &id),
            ScriptCommand::SetViewMode { mode } => session.set_view_mode(mode),
            ScriptCommand::GridClick { id, shift } => session.grid_click(&id, shift),
            ScriptCommand::ColumnClick { pane, id, shift } => {
                session.column_click(pane.as_deref(), &id, shift)
            }
            ScriptCommand::BackgroundClick => session.background_click(),
            ScriptCommand::CreateFolder { name } => {
                session.create_folder(&name).await?;
            }
            ScriptCommand::CreateTextFile { name } => {
                session.create_text_file(&name);
            }
            ScriptCommand::Upload { files } => {
                let sources = files
                    .into_iter()
                    .map(|f| UploadSource {
                        name: f.name,
                        mime: f.mime,
                        size_bytes: f.size_bytes,
                    })
                    .collect();
                session.upload(sources).await?;
            }
            ScriptCommand::Delete { target } => session.delete(&target).await?,
            ScriptCommand::Drop { source, target } => {
                session.handle_drop(DropIntent { source, target }).await?;
            }
            ScriptCommand::RenameBegin { id } => session.rename_begin(&id),
            ScriptCommand::RenameInput { text } => session.rename_input(&text),
            ScriptCommand::RenameCommit => session.rename_commit().await?,
            ScriptCommand::OpenEditor { id } => session.open_text_editor(&id),
            ScriptCommand::EditorInput { text } => session.editor_input(&text),
            ScriptCommand::SaveText => {
                session.save_text();
            }
            ScriptCommand::Play { id } => {
                snapshots.push(json!({ "queue": session.play(&id) }));
            }
            ScriptCommand::Undo => {
                session.undo();
            }
            ScriptCommand::Snapshot { what } => snapshots.push(snapshot(&session, what)),
        }
    }
    Ok(snapshots)
}

async fn seed_record(store: &InMemoryStore, record: AssetRecord) {
    use crate::store::AssetStore;
    // Seeding goes through the public store surface so ids stay durable.
    match record.kind {
        AssetKind::Folder => {
            let _ = store
                .create_folder(&record.name, record.parent_id.as_deref())
                .await;
        }
        _ => {
            let source = UploadSource {
                name: record.name.clone(),
                mime: match record.kind {
                    AssetKind::Audio => "audio/wav".to_string(),
                    AssetKind::Image => "image/png".to_string(),
                    _ => "text/plain".to_string(),
                },
                size_bytes: record.size_bytes,
            };
            let Ok(receipt) = store.upload_file(&source).await else {
                return;
            };
            if record.parent_id.is_some() {
                let _ = store
                    .update_asset(
                        &receipt.asset_id,
                        crate::store::AssetPatch {
                            name: None,
                            parent_id: Some(record.parent_id.clone()),
                        },
                    )
                    .await;
            }
        }
    }
}

fn snapshot(
    session: &FileManagerSession<InMemoryStore>,
    what: SnapshotKind,
) -> serde_json::Value {
    match what {
        SnapshotKind::Tree => json!({ "tree": session.tree }),
        SnapshotKind::Nav => json!({ "nav": session.nav }),
        SnapshotKind::Selection => json!({ "selection": session.selection }),
        SnapshotKind::Batch => json!({ "batch": session.batch_snapshot() }),
        SnapshotKind::Grid => {
            let entries: Vec<serde_json::Value> = session
                .grid_entries(None)
                .into_iter()
                .map(|entry| match entry {
                    crate::view::GridEntry::Up => json!({ "up": true }),
                    crate::view::GridEntry::Node(node) => json!({ "id": node.id, "name": node.name }),
                })
                .collect();
            json!({ "grid": entries })
        }
    }
}
