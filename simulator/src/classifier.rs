//! Stand-in rhythm classifier.
//!
//! Accumulates a fixed window of samples, locates the R peaks and classifies
//! by how much consecutive R-R intervals differ. Intervals are measured in
//! samples, so the verdict does not depend on the feed rate.

use ecg_common::{Classifier, Diagnosis};
use log::debug;

/// Samples accumulated before a verdict is attempted.
pub const DEFAULT_WINDOW: usize = 2048;

/// Fraction of the window swing an R peak must rise through.
const PEAK_LEVEL: f32 = 0.6;

/// Samples after a detected peak during which no new peak is accepted.
const REFRACTORY: usize = 20;

/// Fewest R-R intervals needed for a verdict.
const MIN_INTERVALS: usize = 3;

/// Mean successive R-R difference, relative to the mean interval, above
/// which the rhythm counts as fibrillation.
const IRREGULARITY_LIMIT: f32 = 0.1;

pub struct RhythmClassifier {
    window: usize,
    samples: Vec<i16>,
}

impl RhythmClassifier {
    pub fn new(window: usize) -> Self {
        Self {
            window: window.max(2),
            samples: Vec::with_capacity(window),
        }
    }

    /// Samples held in the current window.
    #[cfg(test)]
    pub fn pending(&self) -> usize { self.samples.len() }

    fn classify(&self) -> Option<Diagnosis> {
        let rr = rr_intervals(&self.samples);
        if rr.len() < MIN_INTERVALS {
            debug!("classifier: {} R-R intervals, need {}", rr.len(), MIN_INTERVALS);
            return None;
        }
        let score = irregularity(&rr);
        debug!("classifier: {} intervals, irregularity {:.3}", rr.len(), score);
        Some(if score > IRREGULARITY_LIMIT { Diagnosis::AFib } else { Diagnosis::Normal })
    }
}

impl Default for RhythmClassifier {
    fn default() -> Self { Self::new(DEFAULT_WINDOW) }
}

impl Classifier for RhythmClassifier {
    fn reset_and_seed(
        &mut self,
        sample: i16,
    ) {
        self.samples.clear();
        self.samples.push(sample);
    }

    fn accumulate(
        &mut self,
        sample: i16,
    ) -> Option<Diagnosis> {
        self.samples.push(sample);
        if self.samples.len() < self.window {
            return None;
        }
        let verdict = self.classify();
        // Inconclusive windows start over
        self.samples.clear();
        verdict
    }
}

/// Distances between rising crossings of the peak level.
fn rr_intervals(samples: &[i16]) -> Vec<usize> {
    let (Some(&min), Some(&max)) = (samples.iter().min(), samples.iter().max()) else {
        return Vec::new();
    };
    let level = f32::from(min) + PEAK_LEVEL * (f32::from(max) - f32::from(min));

    let mut peaks: Vec<usize> = Vec::new();
    for (i, w) in samples.windows(2).enumerate() {
        let rising = f32::from(w[0]) < level && f32::from(w[1]) >= level;
        let clear = peaks.last().is_none_or(|&last| i + 1 - last > REFRACTORY);
        if rising && clear {
            peaks.push(i + 1);
        }
    }
    peaks.windows(2).map(|p| p[1] - p[0]).collect()
}

/// Mean absolute successive difference divided by the mean interval.
fn irregularity(rr: &[usize]) -> f32 {
    let mean = rr.iter().sum::<usize>() as f32 / rr.len() as f32;
    let diffs: f32 = rr.windows(2).map(|w| w[1].abs_diff(w[0]) as f32).sum();
    diffs / (rr.len() - 1) as f32 / mean
}

// =============================================================================
// Tests
// =============================================================================
