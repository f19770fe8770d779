//! Conditioned sample ring and heartbeat detection.
//!
//! Every conditioned sample is written at the write index, which then advances
//! modulo [`SAMPLE_RING_CAPACITY`]. After each write the ring recomputes:
//!
//! - global extrema over all slots (display scaling)
//! - window extrema over the [`PULSE_WINDOW`] most recent samples, with the
//!   slots they were found at
//!
//! [`PulseDetector`] flags a heartbeat when the window maximum lies closer to
//! the write index (walking forward) than the window minimum and the swing
//! exceeds the threshold.

use crate::config::{PULSE_WINDOW, SAMPLE_RING_CAPACITY, WAVE_UPDATE_RATE};

// =============================================================================
// Extrema
// =============================================================================

/// Minimum and maximum of the pulse window and the slots holding them.
///
/// Ties resolve to the oldest slot in the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct WindowExtrema {
    pub min: i16,
    pub max: i16,
    pub min_slot: usize,
    pub max_slot: usize,
}

impl WindowExtrema {
    /// Peak-to-peak swing.
    #[inline]
    pub const fn swing(&self) -> i32 { self.max as i32 - self.min as i32 }
}

/// Waveform refresh payload for the display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct WaveExtrema {
    /// Smallest value in the whole sample ring.
    pub min: i16,
    /// Largest value in the whole sample ring.
    pub max: i16,
    /// Most recently written sample.
    pub latest: i16,
}

impl WaveExtrema {
    /// Map the latest sample onto `0..=height` pixels.
    pub fn scale(
        &self,
        height: u16,
    ) -> u16 {
        let span = i64::from(self.max) - i64::from(self.min) + 1;
        let offset = i64::from(self.latest) - i64::from(self.min);
        (offset * i64::from(height) / span).clamp(0, i64::from(height)) as u16
    }
}

// =============================================================================
// Sample Ring
// =============================================================================

/// Fixed-capacity ring of conditioned ECG samples.
pub struct SampleRing {
    samples: [i16; SAMPLE_RING_CAPACITY],
    write: usize,
    min: i16,
    max: i16,
    window: WindowExtrema,
}

impl SampleRing {
    pub const fn new() -> Self {
        Self {
            samples: [0; SAMPLE_RING_CAPACITY],
            write: 0,
            min: 0,
            max: 0,
            window: WindowExtrema {
                min: 0,
                max: 0,
                min_slot: 0,
                max_slot: 0,
            },
        }
    }

    /// Slot the next sample will be written to.
    #[inline]
    pub const fn write_index(&self) -> usize { self.write }

    /// Sample stored at `slot` (taken modulo the capacity).
    #[inline]
    pub const fn get(
        &self,
        slot: usize,
    ) -> i16 {
        self.samples[slot % SAMPLE_RING_CAPACITY]
    }

    /// Global `(min, max)` over every slot as of the last write.
    #[inline]
    pub const fn extrema(&self) -> (i16, i16) { (self.min, self.max) }

    /// Pulse window extrema as of the last write.
    #[inline]
    pub const fn window(&self) -> WindowExtrema { self.window }

    /// Write a sample, advance the write index and refresh the extrema.
    ///
    /// Returns the slot that was written.
    pub fn push(
        &mut self,
        sample: i16,
    ) -> usize {
        let slot = self.write;
        self.samples[slot] = sample;
        self.write = (slot + 1) % SAMPLE_RING_CAPACITY;

        self.min = i16::MAX;
        self.max = i16::MIN;
        for &s in &self.samples {
            self.min = self.min.min(s);
            self.max = self.max.max(s);
        }

        self.window = self.scan_window();
        slot
    }

    /// Circular distance walking forward from the write index to `slot`.
    #[inline]
    pub const fn distance_from_write(
        &self,
        slot: usize,
    ) -> usize {
        (slot + SAMPLE_RING_CAPACITY - self.write) % SAMPLE_RING_CAPACITY
    }

    fn scan_window(&self) -> WindowExtrema {
        let first = (self.write + SAMPLE_RING_CAPACITY - PULSE_WINDOW) % SAMPLE_RING_CAPACITY;
        let mut extrema = WindowExtrema {
            min: self.samples[first],
            max: self.samples[first],
            min_slot: first,
            max_slot: first,
        };

        for k in 1..PULSE_WINDOW {
            let slot = (first + k) % SAMPLE_RING_CAPACITY;
            let value = self.samples[slot];
            if value < extrema.min {
                extrema.min = value;
                extrema.min_slot = slot;
            }
            if value > extrema.max {
                extrema.max = value;
                extrema.max_slot = slot;
            }
        }
        extrema
    }

    /// Display refresh for the slot just written, if it is on the update grid.
    pub fn wave_update(
        &self,
        written_slot: usize,
    ) -> Option<WaveExtrema> {
        if written_slot % WAVE_UPDATE_RATE != 0 {
            return None;
        }
        Some(WaveExtrema {
            min: self.min,
            max: self.max,
            latest: self.samples[written_slot],
        })
    }
}

impl Default for SampleRing {
    fn default() -> Self { Self::new() }
}

// =============================================================================
// Pulse Detector
// =============================================================================

/// Result of one pulse evaluation step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PulseVerdict {
    /// Fewer than a full window observed since start or the last beat.
    Filling,
    /// Heartbeat detected; indicator on.
    Beat,
    /// Window evaluated without a beat; indicator off.
    NoBeat,
}

/// Saturating window-fill counter plus the beat rule.
pub struct PulseDetector {
    fill: u8,
    threshold: i32,
}

impl PulseDetector {
    pub const fn new(threshold: i32) -> Self { Self { fill: 0, threshold } }

    /// Samples observed towards the next full window (0 to [`PULSE_WINDOW`]).
    #[inline]
    pub const fn fill(&self) -> u8 { self.fill }

    /// Evaluate the ring after a write.
    pub fn update(
        &mut self,
        ring: &SampleRing,
    ) -> PulseVerdict {
        if usize::from(self.fill) < PULSE_WINDOW {
            self.fill += 1;
        }
        if usize::from(self.fill) < PULSE_WINDOW {
            return PulseVerdict::Filling;
        }

        let window = ring.window();
        let max_first = ring.distance_from_write(window.max_slot) < ring.distance_from_write(window.min_slot);
        if max_first && window.swing() > self.threshold {
            self.fill = 0;
            PulseVerdict::Beat
        } else {
            PulseVerdict::NoBeat
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
