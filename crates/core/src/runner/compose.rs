//! Output item planning and canvas composition.

use image::imageops::{self, FilterType};
use image::RgbaImage;

/// Which raw items feed one output sticker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemPlan {
    Single(usize),
    /// Two adjacent items shown side by side.
    Merged(usize, usize),
}

impl ItemPlan {
    /// Index used to name the output.
    pub fn output_index(&self) -> usize {
        match self {
            Self::Single(i) | Self::Merged(i, _) => *i,
        }
    }
}

/// Groups items `1..=count` into outputs.
///
/// Item `i` is merged with `i + 1` when `i` is listed in `merge_indices`
/// and `i + 1` exists. A merged pair is consumed as a whole, so listing
/// both `i` and `i + 1` does not chain three items.
pub fn plan_items(count: usize, merge_indices: &[u32]) -> Vec<ItemPlan> {
    let mut plans = Vec::with_capacity(count);
    let mut i = 1;
    while i <= count {
        let merge = merge_indices.iter().any(|&m| m as usize == i) && i < count;
        if merge {
            plans.push(ItemPlan::Merged(i, i + 1));
            i += 2;
        } else {
            plans.push(ItemPlan::Single(i));
            i += 1;
        }
    }
    plans
}

/// Stretches `image` to a `size` x `size` square.
pub fn fit_canvas(image: &RgbaImage, size: u32) -> RgbaImage {
    if image.dimensions() == (size, size) {
        return image.clone();
    }
    imageops::resize(image, size, size, FilterType::Lanczos3)
}

/// Places `left` and `right` side by side in the vertical middle of a
/// transparent `canvas` x `canvas` square, each scaled to a quarter of it.
pub fn merge_pair(left: &RgbaImage, right: &RgbaImage, canvas: u32) -> RgbaImage {
    let half = canvas / 2;
    let top = (canvas / 4) as i64;
    let mut out = RgbaImage::new(canvas, canvas);
    imageops::overlay(&mut out, &fit_canvas(left, half), 0, top);
    imageops::overlay(&mut out, &fit_canvas(right, half), half as i64, top);
    out
}

/// Pairwise mean of two duration lists, truncated to the shorter one.
pub fn average_durations(a: &[u32], b: &[u32]) -> Vec<u32> {
    a.iter()
        .zip(b)
        .map(|(x, y)| ((*x as u64 + *y as u64) / 2) as u32)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_plan_without_merge() {
        assert_eq!(
            plan_items(3, &[]),
            vec![ItemPlan::Single(1), ItemPlan::Single(2), ItemPlan::Single(3)]
        );
    }

    #[test]
    fn test_plan_with_merge() {
        assert_eq!(
            plan_items(5, &[2, 5]),
            vec![
                ItemPlan::Single(1),
                ItemPlan::Merged(2, 3),
                ItemPlan::Single(4),
                ItemPlan::Single(5),
            ]
        );
    }

    #[test]
    fn test_plan_consumed_pair_does_not_chain() {
        assert_eq!(
            plan_items(4, &[1, 2]),
            vec![ItemPlan::Merged(1, 2), ItemPlan::Single(3), ItemPlan::Single(4)]
        );
        assert_eq!(plan_items(3, &[1, 2])[1].output_index(), 3);
    }

    #[test]
    fn test_merge_pair_layout() {
        let red = RgbaImage::from_pixel(10, 10, Rgba([255, 0, 0, 255]));
        let blue = RgbaImage::from_pixel(10, 10, Rgba([0, 0, 255, 255]));

        let merged = merge_pair(&red, &blue, 64);
        assert_eq!(merged.dimensions(), (64, 64));
        // Transparent bands above and below the strip.
        assert_eq!(merged.get_pixel(10, 5)[3], 0);
        assert_eq!(merged.get_pixel(40, 60)[3], 0);
        assert_eq!(*merged.get_pixel(10, 32), Rgba([255, 0, 0, 255]));
        assert_eq!(*merged.get_pixel(48, 32), Rgba([0, 0, 255, 255]));
    }

    #[test]
    fn test_average_durations_uses_shorter_sequence() {
        assert_eq!(average_durations(&[100, 50, 70], &[60, 51]), vec![80, 50]);
    }
}
