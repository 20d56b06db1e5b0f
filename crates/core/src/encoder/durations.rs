//! Frame duration normalization.

/// Normalizes per-frame durations before encoding.
///
/// Zero durations are replaced by `default_ms`. If the total then exceeds
/// `ceiling_ms`, every duration is scaled by `ceiling_ms / total` and
/// truncated to whole milliseconds. No frame ends up shorter than 1 ms, and
/// the result never sums above the ceiling unless there are more frames than
/// milliseconds in it.
pub fn normalize_durations(durations: &[u32], default_ms: u32, ceiling_ms: u32) -> Vec<u32> {
    let default_ms = default_ms.max(1);
    let mut out: Vec<u32> = durations
        .iter()
        .map(|d| if *d == 0 { default_ms } else { *d })
        .collect();

    let ceiling = u64::from(ceiling_ms);
    let total: u64 = out.iter().map(|d| u64::from(*d)).sum();
    if total <= ceiling {
        return out;
    }

    for d in out.iter_mut() {
        *d = ((u64::from(*d) * ceiling / total) as u32).max(1);
    }

    // Frames raised back to 1 ms can push the sum over again; take the
    // difference from the longest frames.
    let mut excess = out
        .iter()
        .map(|d| u64::from(*d))
        .sum::<u64>()
        .saturating_sub(ceiling);
    while excess > 0 {
        let Some(longest) = out.iter_mut().filter(|d| **d > 1).max_by_key(|d| **d) else {
            break;
        };
        *longest -= 1;
        excess -= 1;
    }
    out
}
