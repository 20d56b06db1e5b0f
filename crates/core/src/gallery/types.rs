use serde::{Deserialize, Serialize};

/// Reference to one downloadable frame file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameRef {
    /// Opaque gallery path used to fetch the file.
    pub path: String,
    /// Declared file extension (may not match the real format).
    pub ext: String,
}

impl FrameRef {
    pub fn new(path: impl Into<String>, ext: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ext: ext.into(),
        }
    }
}

/// Title and ordered frame references of a source asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetMetadata {
    pub title: String,
    pub frames: Vec<FrameRef>,
}
