use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// What a node in the asset tree represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    Folder,
    Audio,
    Image,
    Text,
}

impl AssetKind {
    /// Classify an asset from its MIME type. Anything that is not audio or
    /// image is treated as text, matching how uploads are bucketed.
    pub fn from_mime(mime: &str) -> Self {
        if mime.starts_with("audio") {
            AssetKind::Audio
        } else if mime.starts_with("image") {
            AssetKind::Image
        } else {
            AssetKind::Text
        }
    }

    pub fn is_folder(self) -> bool {
        matches!(self, AssetKind::Folder)
    }
}

/// One file or folder entry in the asset tree.
///
/// Nodes created locally (new folder, new text file, in-flight upload) carry
/// a generated id until the remote store assigns a durable one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetNode {
    pub id: String,
    pub parent_id: Option<String>,
    pub name: String,
    pub kind: AssetKind,
    pub size_label: String,
    pub created_label: String,
    pub format: Option<String>,
    pub duration_seconds: Option<u32>,
    pub source_url: Option<String>,
    pub content: Option<String>,
}

impl AssetNode {
    /// Create a transient folder node under the given parent.
    pub fn new_folder(parent_id: Option<String>, name: &str) -> Self {
        Self {
            id: local_id("folder"),
            parent_id,
            name: name.to_string(),
            kind: AssetKind::Folder,
            size_label: "-".to_string(),
            created_label: created_label_now(),
            format: None,
            duration_seconds: None,
            source_url: None,
            content: None,
        }
    }

    /// Create a transient, empty text file node under the given parent.
    pub fn new_text_file(parent_id: Option<String>, name: &str) -> Self {
        Self {
            id: local_id("file"),
            parent_id,
            name: name.to_string(),
            kind: AssetKind::Text,
            size_label: "0 KB".to_string(),
            created_label: created_label_now(),
            format: format_from_name(name),
            duration_seconds: None,
            source_url: None,
            content: Some(String::new()),
        }
    }

    pub fn is_folder(&self) -> bool {
        self.kind.is_folder()
    }

    /// A node is transient while it still carries a locally generated id,
    /// i.e. before the remote store has confirmed it.
    pub fn is_transient(&self) -> bool {
        is_local_id(&self.id)
    }
}

static LOCAL_ID_SEQ: AtomicU64 = AtomicU64::new(0);

/// Generate a locally unique id for a node that does not exist remotely yet.
pub fn local_id(prefix: &str) -> String {
    let seq = LOCAL_ID_SEQ.fetch_add(1, Ordering::Relaxed);
    format!("{}-{}", prefix, seq)
}

pub fn is_local_id(id: &str) -> bool {
    id.starts_with("folder-") || id.starts_with("file-")
}

/// Human-readable size label for a byte count, e.g. "1.5 MB".
pub fn format_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 B".to_string();
    }
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let exp = ((bytes as f64).ln() / 1024f64.ln()).floor() as usize;
    let exp = exp.min(UNITS.len() - 1);
    let value = bytes as f64 / 1024f64.powi(exp as i32);
    if value.fract() == 0.0 {
        format!("{} {}", value, UNITS[exp])
    } else {
        format!("{:.1} {}", value, UNITS[exp])
    }
}

/// Date label for nodes created right now.
pub fn created_label_now() -> String {
    chrono::Local::now().format("%Y-%m-%d").to_string()
}

/// Uppercased file extension, if the name has one.
pub fn format_from_name(name: &str) -> Option<String> {
    let ext = name.rsplit_once('.').map(|(_, ext)| ext)?;
    if ext.is_empty() {
        None
    } else {
        Some(ext.to_uppercase())
    }
}
