//! Fuzzy pitch and interval histograms
//!
//! Three encodings of one pitch window:
//! - ATB (absolute tone bins): 128 bins over MIDI pitch
//! - RTB (relative tone bins): 255 bins over consecutive-note intervals
//! - FTB (first tone bins): 255 bins over the interval from the first note
//!
//! Interval bins are offset by 127 so that bin 127 is the zero interval.
//! After counting, every bin's mass is spread to the bins within
//! `+/- n_semitones` with weight `1 - |offset| * fuzziness / n_semitones`.
//! Spreading is additive and not renormalized here; the histogram mass can
//! exceed the raw count.

use super::HistogramConfig;

/// Number of absolute pitch bins
pub const ATB_BINS: usize = 128;

/// Number of interval bins (-127..=127)
pub const INTERVAL_BINS: usize = 255;

/// Bin index of the zero interval
pub const INTERVAL_CENTER: usize = 127;

/// Histogram encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistogramKind {
    /// Absolute tone bins
    Atb,
    /// Relative (consecutive) tone bins
    Rtb,
    /// First-tone bins
    Ftb,
}

/// Fuzzy absolute-pitch histogram (128 bins)
pub fn atb_histogram(window: &[u8], n_semitones: usize, fuzziness: f32) -> Vec<f32> {
    let mut raw = vec![0.0f32; ATB_BINS];
    for &pitch in window {
        if let Some(bin) = raw.get_mut(pitch as usize) {
            *bin += 1.0;
        }
    }
    spread(&raw, n_semitones, fuzziness)
}

/// Fuzzy consecutive-interval histogram (255 bins, zero interval at 127)
///
/// A window of fewer than two notes has no intervals and yields all zeros.
pub fn rtb_histogram(window: &[u8], n_semitones: usize, fuzziness: f32) -> Vec<f32> {
    let mut raw = vec![0.0f32; INTERVAL_BINS];
    for pair in window.windows(2) {
        add_interval(&mut raw, pair[1] as i32 - pair[0] as i32);
    }
    spread(&raw, n_semitones, fuzziness)
}

/// Fuzzy interval-from-first-note histogram (255 bins, zero at 127)
///
/// The first note itself counts as a zero interval. An empty window yields
/// all zeros.
pub fn ftb_histogram(window: &[u8], n_semitones: usize, fuzziness: f32) -> Vec<f32> {
    let mut raw = vec![0.0f32; INTERVAL_BINS];
    if let Some(&first) = window.first() {
        for &pitch in window {
            add_interval(&mut raw, pitch as i32 - first as i32);
        }
    }
    spread(&raw, n_semitones, fuzziness)
}

/// Build a histogram of the given kind from a configuration
pub fn histogram(kind: HistogramKind, window: &[u8], config: &HistogramConfig) -> Vec<f32> {
    match kind {
        HistogramKind::Atb => atb_histogram(window, config.n_semitones, config.fuzziness),
        HistogramKind::Rtb => rtb_histogram(window, config.n_semitones, config.fuzziness),
        HistogramKind::Ftb => ftb_histogram(window, config.n_semitones, config.fuzziness),
    }
}

fn add_interval(raw: &mut [f32], interval: i32) {
    let index = interval + INTERVAL_CENTER as i32;
    if (0..INTERVAL_BINS as i32).contains(&index) {
        raw[index as usize] += 1.0;
    }
}

/// Spread each bin's mass to its neighbours with linearly decaying weight
///
/// `n_semitones == 0` returns the raw counts unchanged. Negative weights
/// (fuzziness above 1) are clamped to zero.
pub fn spread(raw: &[f32], n_semitones: usize, fuzziness: f32) -> Vec<f32> {
    if n_semitones == 0 {
        return raw.to_vec();
    }

    // Offsets past the histogram length never land on a bin
    let weights: Vec<f32> = (0..=n_semitones.min(raw.len()))
        .map(|offset| (1.0 - offset as f32 * fuzziness / n_semitones as f32).max(0.0))
        .collect();

    let len = raw.len();
    let mut out = vec![0.0f32; len];
    for (i, &mass) in raw.iter().enumerate() {
        if mass == 0.0 {
            continue;
        }
        out[i] += mass * weights[0];
        for (offset, &w) in weights.iter().enumerate().skip(1) {
            if w == 0.0 {
                continue;
            }
            if i >= offset {
                out[i - offset] += mass * w;
            }
            if i + offset < len {
                out[i + offset] += mass * w;
            }
        }
    }
    out
}
