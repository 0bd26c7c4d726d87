use crate::node::{AssetKind, AssetNode};
use crate::tree::AssetTree;
use serde::{Deserialize, Serialize};

/// One playable entry handed to the audio layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueTrack {
    pub id: String,
    pub title: String,
    pub url: Option<String>,
    pub duration_seconds: Option<u32>,
}

impl QueueTrack {
    fn from_node(node: &AssetNode) -> Self {
        Self {
            id: node.id.clone(),
            title: node.name.clone(),
            url: node.source_url.clone(),
            duration_seconds: node.duration_seconds,
        }
    }
}

/// A play queue positioned on the track the user started from.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlaybackQueue {
    pub tracks: Vec<QueueTrack>,
    pub current: usize,
}

impl PlaybackQueue {
    pub fn current_track(&self) -> Option<&QueueTrack> {
        self.tracks.get(self.current)
    }

    pub fn next(&mut self) -> Option<&QueueTrack> {
        if self.current + 1 < self.tracks.len() {
            self.current += 1;
            self.tracks.get(self.current)
        } else {
            None
        }
    }

    pub fn previous(&mut self) -> Option<&QueueTrack> {
        if self.current > 0 {
            self.current -= 1;
            self.tracks.get(self.current)
        } else {
            None
        }
    }
}

/// Build a queue from the audio siblings of `node_id` in display order,
/// positioned on that node. Returns `None` when it is not an audio asset.
pub fn sibling_audio_queue(tree: &AssetTree, node_id: &str) -> Option<PlaybackQueue> {
    let node = tree.get(node_id)?;
    if node.kind != AssetKind::Audio {
        return None;
    }
    let tracks: Vec<QueueTrack> = tree
        .children_of(node.parent_id.as_deref(), Some(AssetKind::Audio))
        .into_iter()
        .filter(|n| n.kind == AssetKind::Audio)
        .map(QueueTrack::from_node)
        .collect();
    let current = tracks.iter().position(|t| t.id == node_id)?;
    Some(PlaybackQueue { tracks, current })
}
