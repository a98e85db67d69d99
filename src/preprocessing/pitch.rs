//! Pitch sequence preparation
//!
//! Turns transcription output into per-quantum pitch sequences and maps
//! window pitches into a canonical range before histogramming:
//! - Raw value sanitizing (rest sentinel)
//! - Note-event quantization (skyline melody)
//! - Window normalization (mean-centered or z-score)

use serde::{Deserialize, Serialize};

use crate::error::RetrievalError;

/// Highest valid MIDI pitch
pub const MAX_MIDI_PITCH: u8 = 127;

/// Pitch that a window's mean maps to under normalization (ATB centre bin)
pub const CANONICAL_CENTER_PITCH: u8 = 64;

/// Upper bound on the length of a quantized sequence
pub const MAX_QUANTIZED_SLOTS: usize = 1 << 24;

/// One entry per time quantum; `None` marks "no note"
pub type PitchSequence = Vec<Option<u8>>;

/// Window pitch normalization method
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PitchNormalization {
    /// Keep absolute MIDI pitches
    None,
    /// Transpose so the rounded window mean lands on pitch 64
    MeanCentered,
    /// `64 + round(spread * (p - mean) / std)`; removes interval scale as
    /// well as key
    ZScore {
        /// Semitones per standard deviation
        spread: f32,
    },
}

/// A transcribed note: MIDI pitch with start and end times in seconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NoteEvent {
    /// MIDI pitch (0-127)
    pub pitch: u8,
    /// Onset time in seconds
    pub start: f64,
    /// Release time in seconds
    pub end: f64,
}

/// Convert raw integer pitch values into a pitch sequence
///
/// Values outside `1..=127` become `None`. Zero is treated as a rest
/// because pitch trackers emit 0 for unvoiced frames.
pub fn pitch_sequence_from_raw(values: &[i32]) -> PitchSequence {
    values
        .iter()
        .map(|&v| {
            if (1..=MAX_MIDI_PITCH as i32).contains(&v) {
                Some(v as u8)
            } else {
                None
            }
        })
        .collect()
}

/// Drop "no note" entries, keeping the order of the remaining pitches
pub fn filter_rests(sequence: &[Option<u8>]) -> Vec<u8> {
    sequence.iter().flatten().copied().collect()
}

/// Quantize note events into one pitch per time quantum
///
/// Slot `i` covers the instant `(i + 0.5) * quantum`. When several notes
/// sound at that instant the highest one wins; slots with no sounding note
/// are `None`. Notes with `end <= start` or pitch above 127 are ignored.
///
/// # Arguments
///
/// * `notes` - Transcribed note events, in any order
/// * `quantum` - Slot duration in seconds (e.g. an eighth of a beat)
///
/// # Errors
///
/// Returns `InvalidInput` if `quantum` is not strictly positive, a note has
/// a non-finite start or end, or the notes span more than
/// [`MAX_QUANTIZED_SLOTS`] slots
pub fn quantize_notes(notes: &[NoteEvent], quantum: f64) -> Result<PitchSequence, RetrievalError> {
    if !(quantum > 0.0) || !quantum.is_finite() {
        return Err(RetrievalError::InvalidInput(format!(
            "Quantum must be positive, got {}",
            quantum
        )));
    }

    if let Some(bad) = notes.iter().find(|n| !n.start.is_finite() || !n.end.is_finite()) {
        return Err(RetrievalError::InvalidInput(format!(
            "Note times must be finite, got {}..{}",
            bad.start, bad.end
        )));
    }

    let valid = notes
        .iter()
        .filter(|n| n.pitch <= MAX_MIDI_PITCH && n.end > n.start && n.end > 0.0);

    let total = valid.clone().map(|n| n.end).fold(0.0f64, f64::max);
    let slots = slot_index(total, quantum);
    if slots > MAX_QUANTIZED_SLOTS {
        return Err(RetrievalError::InvalidInput(format!(
            "Notes span {} slots, limit is {}",
            slots, MAX_QUANTIZED_SLOTS
        )));
    }
    log::debug!(
        "Quantizing {} notes into {} slots of {:.4}s",
        notes.len(),
        slots,
        quantum
    );

    let mut sequence: PitchSequence = vec![None; slots];
    for note in valid {
        let first = slot_index(note.start.max(0.0), quantum);
        let last = slot_index(note.end, quantum).min(slots);
        for slot in &mut sequence[first.min(last)..last] {
            *slot = Some((*slot).map_or(note.pitch, |p| p.max(note.pitch)));
        }
    }

    Ok(sequence)
}

/// First slot whose centre is at or after `time`
fn slot_index(time: f64, quantum: f64) -> usize {
    (time / quantum - 0.5).ceil().max(0.0) as usize
}

/// Map a window's pitches into the canonical range
///
/// An empty window returns an empty vector. A zero-variance window under
/// `ZScore` maps every pitch to the centre pitch.
pub fn normalize_window(window: &[u8], mode: PitchNormalization) -> Vec<u8> {
    if window.is_empty() {
        return Vec::new();
    }

    let n = window.len() as f64;
    let mean = window.iter().map(|&p| p as f64).sum::<f64>() / n;

    match mode {
        PitchNormalization::None => window.to_vec(),
        PitchNormalization::MeanCentered => {
            let offset = CANONICAL_CENTER_PITCH as i32 - mean.round() as i32;
            window
                .iter()
                .map(|&p| clamp_pitch(p as i32 + offset))
                .collect()
        }
        PitchNormalization::ZScore { spread } => {
            let variance = window
                .iter()
                .map(|&p| (p as f64 - mean).powi(2))
                .sum::<f64>()
                / n;
            let std = variance.sqrt();
            if std < 1e-9 {
                return vec![CANONICAL_CENTER_PITCH; window.len()];
            }
            window
                .iter()
                .map(|&p| {
                    let z = (p as f64 - mean) / std;
                    clamp_pitch(CANONICAL_CENTER_PITCH as i32 + (spread as f64 * z).round() as i32)
                })
                .collect()
        }
    }
}

fn clamp_pitch(p: i32) -> u8 {
    p.clamp(0, MAX_MIDI_PITCH as i32) as u8
}
