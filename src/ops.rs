use crate::config::BatchConfig;
use crate::store::{AssetPatch, AssetStore, StoreError, UploadReceipt, UploadSource};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

/// Items sit at 0 while pending. An upload entering processing seeds here
/// and creeps upward until the real result lands.
const UPLOAD_SEED_PROGRESS: u8 = 10;
const PROGRESS_CEILING: u8 = 90;
const PROGRESS_STEP: u8 = 10;
/// Deletes and moves have no meaningful transfer phase; processing sits at
/// the halfway mark until their store call returns.
const HALFWAY_PROGRESS: u8 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchKind {
    Upload,
    Delete,
    Move,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    Pending,
    Processing,
    Completed,
    Error,
}

/// One row in the progress panel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationItem {
    pub id: String,
    pub name: String,
    pub status: ItemStatus,
    pub progress: u8,
    pub error: Option<String>,
}

/// Snapshot of the batch panel. Subscribers receive whole snapshots through
/// a watch channel, so a render can never observe a half-updated batch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchState {
    pub kind: Option<BatchKind>,
    pub items: Vec<OperationItem>,
    pub completed: usize,
    pub errored: usize,
    pub is_active: bool,
    pub is_minimized: bool,
}

impl BatchState {
    pub fn total(&self) -> usize {
        self.items.len()
    }

    fn item_mut(&mut self, id: &str) -> Option<&mut OperationItem> {
        self.items.iter_mut().find(|i| i.id == id)
    }
}

/// Out-of-band notifications from the engine to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineSignal {
    /// At least one item of the finished batch changed remote state; the
    /// canonical listing should be refetched.
    StoreInvalidated,
}

/// The durable identity of one asset inside a delete or move batch.
#[derive(Debug, Clone)]
pub struct BatchItemSpec {
    pub asset_id: String,
    pub name: String,
}

/// Executes upload, delete and move batches against the store, publishing
/// progress snapshots as they evolve.
///
/// Items run sequentially and failures are isolated per item: one failed
/// upload never aborts its siblings. Store futures are awaited inline on the
/// caller's task; only the cosmetic progress tickers and the auto-dismiss
/// delay are spawned.
pub struct OperationEngine<S> {
    store: S,
    cfg: BatchConfig,
    state: watch::Sender<BatchState>,
    signals: mpsc::UnboundedSender<EngineSignal>,
    /// Monotonic batch counter; a stale auto-dismiss task from a previous
    /// batch must not clear the panel of a newer one.
    batch_seq: Arc<AtomicU64>,
}

impl<S: AssetStore> OperationEngine<S> {
    pub fn new(store: S, cfg: BatchConfig) -> (Self, mpsc::UnboundedReceiver<EngineSignal>) {
        let (state, _) = watch::channel(BatchState::default());
        let (signals, signal_rx) = mpsc::unbounded_channel();
        (
            Self {
                store,
                cfg,
                state,
                signals,
                batch_seq: Arc::new(AtomicU64::new(0)),
            },
            signal_rx,
        )
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Subscribe to batch snapshots. Any number of panels can watch.
    pub fn subscribe(&self) -> watch::Receiver<BatchState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> BatchState {
        self.state.borrow().clone()
    }

    /// Upload a batch of pending files into `target`.
    pub async fn upload(
        &self,
        sources: Vec<UploadSource>,
        target: Option<&str>,
    ) -> Vec<Result<UploadReceipt, StoreError>> {
        let seq = self.begin_batch();
        let items: Vec<OperationItem> = sources
            .iter()
            .enumerate()
            .map(|(idx, s)| OperationItem {
                id: format!("upload-{}-{}", seq, idx),
                name: s.name.clone(),
                status: ItemStatus::Pending,
                progress: 0,
                error: None,
            })
            .collect();
        self.publish_batch(BatchKind::Upload, items.clone());

        let mut results = Vec::with_capacity(sources.len());
        for (item, source) in items.iter().zip(&sources) {
            self.mark_processing(&item.id, UPLOAD_SEED_PROGRESS);
            let ticker = self.spawn_ticker(item.id.clone());
            let result = self.upload_one(source, target).await;
            ticker.cancel();
            self.finish_item(&item.id, result.as_ref().err());
            results.push(result);
        }
        self.end_batch(seq, self.cfg.upload_dismiss());
        results
    }

    /// Uploads land at the root; placing into a folder is a follow-up
    /// metadata patch once the transfer has succeeded.
    async fn upload_one(
        &self,
        source: &UploadSource,
        target: Option<&str>,
    ) -> Result<UploadReceipt, StoreError> {
        let receipt = self.store.upload_file(source).await?;
        if let Some(target) = target {
            let patch = AssetPatch {
                name: None,
                parent_id: Some(Some(target.to_string())),
            };
            self.store.update_asset(&receipt.asset_id, patch).await?;
        }
        Ok(receipt)
    }

    /// Delete a batch of assets.
    pub async fn delete(&self, specs: Vec<BatchItemSpec>) -> Vec<Result<(), StoreError>> {
        let seq = self.begin_batch();
        let items: Vec<OperationItem> = specs
            .iter()
            .map(|s| OperationItem {
                id: s.asset_id.clone(),
                name: s.name.clone(),
                status: ItemStatus::Pending,
                progress: 0,
                error: None,
            })
            .collect();
        self.publish_batch(BatchKind::Delete, items);

        let mut results = Vec::with_capacity(specs.len());
        for spec in &specs {
            self.mark_processing(&spec.asset_id, HALFWAY_PROGRESS);
            let result = self.store.delete_file(&spec.asset_id).await;
            self.finish_item(&spec.asset_id, result.as_ref().err());
            results.push(result);
        }
        self.end_batch(seq, self.cfg.upload_dismiss());
        results
    }

    /// Move a batch of assets into `target` (`None` = root level).
    pub async fn move_items(
        &self,
        specs: Vec<BatchItemSpec>,
        target: Option<&str>,
    ) -> Vec<Result<(), StoreError>> {
        let seq = self.begin_batch();
        let items: Vec<OperationItem> = specs
            .iter()
            .map(|s| OperationItem {
                id: s.asset_id.clone(),
                name: s.name.clone(),
                status: ItemStatus::Pending,
                progress: 0,
                error: None,
            })
            .collect();
        self.publish_batch(BatchKind::Move, items);

        let mut results = Vec::with_capacity(specs.len());
        for spec in &specs {
            self.mark_processing(&spec.asset_id, HALFWAY_PROGRESS);
            let patch = AssetPatch {
                name: None,
                parent_id: Some(target.map(|t| t.to_string())),
            };
            let result = self.store.update_asset(&spec.asset_id, patch).await;
            self.finish_item(&spec.asset_id, result.as_ref().err());
            results.push(result);
        }
        self.end_batch(seq, self.cfg.move_dismiss());
        results
    }

    /// Hide the panel. Store calls already in flight are not aborted; the
    /// user is dismissing the UI, not the work.
    pub fn cancel(&self) {
        self.state.send_replace(BatchState::default());
    }

    pub fn dismiss(&self) {
        self.cancel();
    }

    pub fn toggle_minimize(&self) {
        self.state.send_modify(|s| s.is_minimized = !s.is_minimized);
    }

    fn begin_batch(&self) -> u64 {
        self.batch_seq.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn publish_batch(&self, kind: BatchKind, items: Vec<OperationItem>) {
        log::info!("starting {:?} batch of {}", kind, items.len());
        self.state.send_replace(BatchState {
            kind: Some(kind),
            items,
            completed: 0,
            errored: 0,
            is_active: true,
            is_minimized: false,
        });
    }

    /// Transition an item to processing, seeding its visible progress.
    fn mark_processing(&self, item_id: &str, seed: u8) {
        self.state.send_modify(|s| {
            if let Some(item) = s.item_mut(item_id) {
                item.status = ItemStatus::Processing;
                item.progress = seed;
            }
        });
    }

    /// Spawn the cosmetic progress ticker for one in-flight upload item. The
    /// returned token stops it; it also stops itself at the ceiling.
    fn spawn_ticker(&self, item_id: String) -> CancellationToken {
        let token = CancellationToken::new();
        let tick = self.cfg.progress_tick();
        let state = self.state.clone();
        let task_token = token.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = task_token.cancelled() => break,
                    _ = tokio::time::sleep(tick) => {
                        state.send_modify(|s| {
                            if let Some(item) = s.item_mut(&item_id) {
                                if item.status == ItemStatus::Processing
                                    && item.progress < PROGRESS_CEILING
                                {
                                    item.progress += PROGRESS_STEP;
                                }
                            }
                        });
                    }
                }
            }
        });
        token
    }

    fn finish_item(&self, item_id: &str, error: Option<&StoreError>) {
        self.state.send_modify(|s| {
            let Some(item) = s.item_mut(item_id) else { return };
            match error {
                None => {
                    item.status = ItemStatus::Completed;
                    item.progress = 100;
                    s.completed += 1;
                }
                Some(err) => {
                    log::warn!("batch item {} failed: {}", item_id, err);
                    item.status = ItemStatus::Error;
                    item.error = Some(err.label().to_string());
                    s.errored += 1;
                }
            }
        });
    }

    /// Close out a finished batch: signal invalidation when anything
    /// succeeded, and schedule auto-dismiss when nothing failed. A batch
    /// with errors stays on screen until the user dismisses it.
    fn end_batch(&self, seq: u64, dismiss_after: Duration) {
        let (completed, errored) = {
            let state = self.state.borrow();
            (state.completed, state.errored)
        };
        if completed > 0 {
            let _ = self.signals.send(EngineSignal::StoreInvalidated);
        }
        if errored == 0 {
            let state = self.state.clone();
            let batch_seq = self.batch_seq.clone();
            tokio::spawn(async move {
                tokio::time::sleep(dismiss_after).await;
                if batch_seq.load(Ordering::SeqCst) == seq {
                    state.send_replace(BatchState::default());
                }
            });
        }
    }
}
