use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::job::{JobPhase, SourceId};

/// Whether a raw item is a single image or an animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Static,
    Animated,
}

impl ItemKind {
    pub fn from_ext(ext: &str) -> Self {
        if ext.eq_ignore_ascii_case("gif") {
            Self::Animated
        } else {
            Self::Static
        }
    }
}

/// One downloaded, validated and normalized gallery file.
#[derive(Debug, Clone)]
pub struct RawItem {
    /// 1-based position in the gallery listing.
    pub index: usize,
    pub path: PathBuf,
    pub ext: String,
    pub kind: ItemKind,
}

/// Everything fetched for one source id.
#[derive(Debug, Clone)]
pub struct SourceAsset {
    pub source_id: SourceId,
    pub title: String,
    pub items: Vec<RawItem>,
}

impl SourceAsset {
    pub fn item(&self, index: usize) -> Option<&RawItem> {
        self.items.iter().find(|i| i.index == index)
    }
}

/// Type of a produced sticker file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    /// PNG still.
    Static,
    /// WebM video.
    Animated,
}

/// A finished sticker file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncodedArtifact {
    /// Index of the first raw item it was made from.
    pub index: usize,
    pub path: PathBuf,
    pub kind: ArtifactKind,
    /// Size measured after encoding.
    pub size_bytes: u64,
}

/// Output of a successful run, ready to publish.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletedJob {
    pub source_id: SourceId,
    pub title: String,
    /// Ordered by index.
    pub artifacts: Vec<EncodedArtifact>,
}

/// Receives phase transitions of a running job.
pub type PhaseCallback = Arc<dyn Fn(JobPhase) + Send + Sync>;
