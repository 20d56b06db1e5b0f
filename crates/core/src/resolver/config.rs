use serde::{Deserialize, Serialize};

/// Thresholds for choosing between renderings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// A pixel counts as changed when any channel differs by more than this.
    #[serde(default = "default_pixel_threshold")]
    pub pixel_threshold: u8,

    /// Fraction of changed pixels above which the renderings disagree.
    #[serde(default = "default_changed_ratio_threshold")]
    pub changed_ratio_threshold: f64,

    /// How many leading frames to compare.
    #[serde(default = "default_sample_limit")]
    pub sample_limit: usize,
}

fn default_pixel_threshold() -> u8 {
    5
}

fn default_changed_ratio_threshold() -> f64 {
    0.05
}

fn default_sample_limit() -> usize {
    5
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            pixel_threshold: default_pixel_threshold(),
            changed_ratio_threshold: default_changed_ratio_threshold(),
            sample_limit: default_sample_limit(),
        }
    }
}
