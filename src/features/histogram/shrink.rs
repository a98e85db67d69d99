//! Histogram truncation around an anchor bin
//!
//! Cuts a histogram down to `left + right + 1` bins around an anchor. Mass
//! outside the kept range is folded into the boundary bins, so the total
//! mass is preserved.

use serde::{Deserialize, Serialize};

/// Where the kept range is centred
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShrinkAnchor {
    /// Rounded mass-weighted mean bin (ATB)
    WeightedMean,
    /// Middle bin, `(len - 1) / 2` (RTB/FTB zero interval)
    Center,
}

/// Bins kept on each side of the anchor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShrinkBounds {
    /// Bins kept below the anchor
    pub left: usize,
    /// Bins kept above the anchor
    pub right: usize,
}

impl ShrinkBounds {
    /// Symmetric bounds
    pub fn symmetric(radius: usize) -> Self {
        Self {
            left: radius,
            right: radius,
        }
    }

    /// Output length `left + right + 1`
    pub fn target_len(&self) -> usize {
        self.left + self.right + 1
    }
}

/// Per-histogram shrink bounds
///
/// A histogram whose length already equals the bounds' target length is
/// passed through as is, without re-anchoring. Bounds such as
/// `left + right + 1 == 128` for ATB therefore leave the full histogram
/// unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShrinkConfig {
    /// ATB bounds around the weighted-mean pitch (default: +/- 24)
    pub atb: ShrinkBounds,
    /// RTB bounds around the zero interval (default: +/- 12)
    pub rtb: ShrinkBounds,
    /// FTB bounds around the zero interval (default: +/- 24)
    pub ftb: ShrinkBounds,
}

impl Default for ShrinkConfig {
    fn default() -> Self {
        Self {
            atb: ShrinkBounds::symmetric(24),
            rtb: ShrinkBounds::symmetric(12),
            ftb: ShrinkBounds::symmetric(24),
        }
    }
}

/// Truncate a histogram to `bounds.target_len()` bins around an anchor
///
/// A histogram that already has the target length is treated as shrunk and
/// returned unchanged, which makes the operation idempotent. This also
/// holds on the first call, so a full-length histogram is never re-anchored. An all-zero
/// (or empty) histogram yields all zeros of the target length without
/// computing a mean.
pub fn shrink(histogram: &[f32], anchor: ShrinkAnchor, bounds: ShrinkBounds) -> Vec<f32> {
    let target = bounds.target_len();
    if histogram.len() == target {
        return histogram.to_vec();
    }

    let total: f32 = histogram.iter().sum();
    if histogram.is_empty() || total <= 0.0 {
        return vec![0.0; target];
    }

    let anchor_index = match anchor {
        ShrinkAnchor::Center => (histogram.len() - 1) / 2,
        ShrinkAnchor::WeightedMean => {
            let weighted: f32 = histogram
                .iter()
                .enumerate()
                .map(|(i, &h)| i as f32 * h)
                .sum();
            ((weighted / total).round() as usize).min(histogram.len() - 1)
        }
    };

    let start = anchor_index as isize - bounds.left as isize;
    let last = target as isize - 1;
    let mut out = vec![0.0f32; target];
    for (i, &mass) in histogram.iter().enumerate() {
        let pos = (i as isize - start).clamp(0, last);
        out[pos as usize] += mass;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shrink_center_keeps_mass() {
        let mut hist = vec![0.0f32; 255];
        hist[127] = 2.0;
        hist[129] = 1.0;
        hist[0] = 0.5; // far left, folds into the boundary
        let out = shrink(&hist, ShrinkAnchor::Center, ShrinkBounds::symmetric(3));
        assert_eq!(out.len(), 7);
        assert_eq!(out[3], 2.0);
        assert_eq!(out[5], 1.0);
        assert_eq!(out[0], 0.5);
        assert!((out.iter().sum::<f32>() - 3.5).abs() < 1e-6);
    }

    #[test]
    fn test_shrink_weighted_mean() {
        let mut hist = vec![0.0f32; 128];
        hist[70] = 1.0;
        hist[72] = 1.0;
        // mean bin 71
        let out = shrink(&hist, ShrinkAnchor::WeightedMean, ShrinkBounds::symmetric(2));
        assert_eq!(out, vec![0.0, 1.0, 0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_shrink_asymmetric_bounds() {
        let mut hist = vec![0.0f32; 255];
        hist[127] = 1.0;
        hist[140] = 1.0;
        let bounds = ShrinkBounds { left: 1, right: 4 };
        let out = shrink(&hist, ShrinkAnchor::Center, bounds);
        assert_eq!(out, vec![0.0, 1.0, 0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_shrink_all_zero() {
        let out = shrink(&[0.0; 255], ShrinkAnchor::WeightedMean, ShrinkBounds::symmetric(5));
        assert_eq!(out, vec![0.0; 11]);
        assert_eq!(shrink(&[], ShrinkAnchor::Center, ShrinkBounds::symmetric(1)), vec![0.0; 3]);
    }

    #[test]
    fn test_shrink_idempotent() {
        let hist: Vec<f32> = (0..128).map(|i| ((i * 37) % 11) as f32).collect();
        let bounds = ShrinkBounds { left: 6, right: 9 };
        for anchor in [ShrinkAnchor::WeightedMean, ShrinkAnchor::Center] {
            let once = shrink(&hist, anchor, bounds);
            let twice = shrink(&once, anchor, bounds);
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn test_full_length_bounds_pass_through() {
        // Mass sits far from the centre; full-length bounds still keep it in place
        let mut hist = vec![0.0f32; 128];
        hist[10] = 1.0;
        hist[12] = 3.0;
        let bounds = ShrinkBounds { left: 63, right: 64 };
        assert_eq!(bounds.target_len(), 128);
        assert_eq!(shrink(&hist, ShrinkAnchor::WeightedMean, bounds), hist);
    }
}
