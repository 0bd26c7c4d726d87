use crate::node::{format_from_name, format_size, AssetKind, AssetNode};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use thiserror::Error;

/// Failure classes surfaced by the remote asset store.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum StoreError {
    #[error("new row violates row-level security policy")]
    PermissionDenied,

    #[error("Bucket not found")]
    BucketMissing,

    #[error("{0}")]
    Other(String),
}

impl StoreError {
    /// Short label shown next to a failed batch item.
    pub fn label(&self) -> &'static str {
        match self {
            StoreError::PermissionDenied => "Permissions Error",
            StoreError::BucketMissing => "Bucket Missing",
            StoreError::Other(_) => "Failed",
        }
    }

    /// Classify a raw error message from the backend into a failure class.
    pub fn classify(message: &str) -> Self {
        if message.contains("row-level security policy") {
            StoreError::PermissionDenied
        } else if message.contains("Bucket not found") {
            StoreError::BucketMissing
        } else {
            StoreError::Other(message.to_string())
        }
    }
}

/// One asset row as the store returns it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetRecord {
    pub id: String,
    pub parent_id: Option<String>,
    pub name: String,
    pub kind: AssetKind,
    pub size_bytes: u64,
    pub created_label: String,
    pub url: Option<String>,
}

impl AssetRecord {
    pub fn to_node(&self) -> AssetNode {
        AssetNode {
            id: self.id.clone(),
            parent_id: self.parent_id.clone(),
            name: self.name.clone(),
            kind: self.kind,
            size_label: if self.kind.is_folder() {
                "-".to_string()
            } else {
                format_size(self.size_bytes)
            },
            created_label: self.created_label.clone(),
            format: format_from_name(&self.name),
            duration_seconds: None,
            source_url: self.url.clone(),
            content: None,
        }
    }
}

/// A pending local file handed to `upload_file`.
#[derive(Debug, Clone)]
pub struct UploadSource {
    pub name: String,
    pub mime: String,
    pub size_bytes: u64,
}

/// What the store hands back for a successful upload.
#[derive(Debug, Clone)]
pub struct UploadReceipt {
    pub asset_id: String,
    pub url: String,
}

/// Partial update for an asset row. `parent_id` uses a double Option so a
/// move to the root level (`Some(None)`) is distinct from no change (`None`).
#[derive(Debug, Clone, Default)]
pub struct AssetPatch {
    pub name: Option<String>,
    pub parent_id: Option<Option<String>>,
}

/// Remote persistence boundary for assets.
///
/// Implementations are expected to be cheap to call from a single-threaded
/// session loop; the engine awaits them inline rather than spawning them.
#[allow(async_fn_in_trait)]
pub trait AssetStore {
    /// Upload a file at the root level. Placing it into a folder is a
    /// follow-up `update_asset` call once the upload has succeeded.
    async fn upload_file(&self, source: &UploadSource) -> Result<UploadReceipt, StoreError>;

    async fn delete_file(&self, asset_id: &str) -> Result<(), StoreError>;

    async fn update_asset(&self, asset_id: &str, patch: AssetPatch) -> Result<(), StoreError>;

    async fn create_folder(
        &self,
        name: &str,
        parent_id: Option<&str>,
    ) -> Result<String, StoreError>;

    async fn get_user_files(&self) -> Result<Vec<AssetRecord>, StoreError>;
}

#[derive(Debug, Default)]
struct MemoryStoreInner {
    records: HashMap<String, AssetRecord>,
    /// Error queued for the next matching call, keyed by asset or file name.
    fail_next: HashMap<String, StoreError>,
    calls: u64,
}

/// In-memory store used by the script runner and the test suite.
///
/// Failure injection is keyed by name or id: `fail_for` arms an error that
/// the next call touching that asset will return.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    inner: Mutex<MemoryStoreInner>,
    id_seq: AtomicU64,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<AssetRecord>) -> Self {
        let store = Self::new();
        {
            let mut inner = store.inner.lock().unwrap();
            for record in records {
                inner.records.insert(record.id.clone(), record);
            }
        }
        store
    }

    /// Arm an error for the next call that touches `key` (asset id or name).
    pub fn fail_for(&self, key: &str, error: StoreError) {
        self.inner
            .lock()
            .unwrap()
            .fail_next
            .insert(key.to_string(), error);
    }

    /// Number of store calls made so far; no-op paths can assert on it.
    pub fn call_count(&self) -> u64 {
        self.inner.lock().unwrap().calls
    }

    pub fn records(&self) -> Vec<AssetRecord> {
        let mut records: Vec<AssetRecord> =
            self.inner.lock().unwrap().records.values().cloned().collect();
        records.sort_by(|a, b| a.id.cmp(&b.id));
        records
    }

    fn next_id(&self, prefix: &str) -> String {
        format!("{}-{}", prefix, self.id_seq.fetch_add(1, Ordering::Relaxed))
    }

    fn take_failure(inner: &mut MemoryStoreInner, key: &str) -> Option<StoreError> {
        inner.fail_next.remove(key)
    }
}

impl AssetStore for InMemoryStore {
    async fn upload_file(&self, source: &UploadSource) -> Result<UploadReceipt, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls += 1;
        if let Some(err) = Self::take_failure(&mut inner, &source.name) {
            return Err(err);
        }
        drop(inner);
        let id = self.next_id("asset");
        let url = format!("mem://assets/{}", id);
        let record = AssetRecord {
            id: id.clone(),
            parent_id: None,
            name: source.name.clone(),
            kind: AssetKind::from_mime(&source.mime),
            size_bytes: source.size_bytes,
            created_label: crate::node::created_label_now(),
            url: Some(url.clone()),
        };
        self.inner.lock().unwrap().records.insert(id.clone(), record);
        Ok(UploadReceipt { asset_id: id, url })
    }

    async fn delete_file(&self, asset_id: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls += 1;
        if let Some(err) = Self::take_failure(&mut inner, asset_id) {
            return Err(err);
        }
        inner.records.remove(asset_id);
        Ok(())
    }

    async fn update_asset(&self, asset_id: &str, patch: AssetPatch) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls += 1;
        if let Some(err) = Self::take_failure(&mut inner, asset_id) {
            return Err(err);
        }
        let record = inner
            .records
            .get_mut(asset_id)
            .ok_or_else(|| StoreError::Other(format!("no such asset: {}", asset_id)))?;
        if let Some(name) = patch.name {
            record.name = name;
        }
        if let Some(parent_id) = patch.parent_id {
            record.parent_id = parent_id;
        }
        Ok(())
    }

    async fn create_folder(
        &self,
        name: &str,
        parent_id: Option<&str>,
    ) -> Result<String, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls += 1;
        if let Some(err) = Self::take_failure(&mut inner, name) {
            return Err(err);
        }
        drop(inner);
        let id = self.next_id("fld");
        let record = AssetRecord {
            id: id.clone(),
            parent_id: parent_id.map(|p| p.to_string()),
            name: name.to_string(),
            kind: AssetKind::Folder,
            size_bytes: 0,
            created_label: crate::node::created_label_now(),
            url: None,
        };
        self.inner.lock().unwrap().records.insert(id.clone(), record);
        Ok(id)
    }

    async fn get_user_files(&self) -> Result<Vec<AssetRecord>, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls += 1;
        let mut records: Vec<AssetRecord> = inner.records.values().cloned().collect();
        records.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(records)
    }
}
