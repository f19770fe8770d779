//! Selectable signal conditioning.
//!
//! - Pass-through: sample emitted unchanged
//! - IIR: single-pole low-pass, `y = α·x + (1 − α)·y'` with α = 0.1, rounded
//! - Moving average: integer-truncated mean of the last 16 samples
//!
//! Each algorithm keeps its own memory. Switching modes leaves the memory of
//! the others untouched, so returning to a mode resumes from stale history
//! deterministically.

use crate::config::{FILTER_MOVING_AVG_MIN, FILTER_PASS_THROUGH_MAX, IIR_ALPHA_DEN, IIR_ALPHA_NUM, MOVING_AVG_WINDOW};

/// Active conditioning algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FilterMode {
    PassThrough,
    Iir,
    MovingAverage,
}

impl FilterMode {
    /// Map an external selector value (e.g. a potentiometer position) to a mode.
    pub const fn from_selector(selector: u8) -> Self {
        if selector <= FILTER_PASS_THROUGH_MAX {
            Self::PassThrough
        } else if selector >= FILTER_MOVING_AVG_MIN {
            Self::MovingAverage
        } else {
            Self::Iir
        }
    }

    /// Human readable label shown on the display.
    pub const fn label(self) -> &'static str {
        match self {
            Self::PassThrough => "No Filter",
            Self::Iir => "IIR Filter",
            Self::MovingAverage => "Moving Avg",
        }
    }
}

// =============================================================================
// Moving Average
// =============================================================================

/// 16-slot circular window with a running sum.
struct MovingAverage {
    window: [i16; MOVING_AVG_WINDOW],
    next: usize,
    sum: i32,
}

impl MovingAverage {
    const fn new() -> Self {
        Self {
            window: [0; MOVING_AVG_WINDOW],
            next: 0,
            sum: 0,
        }
    }

    fn apply(
        &mut self,
        sample: i16,
    ) -> i16 {
        self.sum += i32::from(sample) - i32::from(self.window[self.next]);
        self.window[self.next] = sample;
        self.next = (self.next + 1) % MOVING_AVG_WINDOW;
        // Mean of i16 values always fits back into i16
        (self.sum / MOVING_AVG_WINDOW as i32) as i16
    }
}

// =============================================================================
// IIR
// =============================================================================

/// Single-pole IIR evaluated in exact integer arithmetic.
struct Iir {
    prev: i16,
}

impl Iir {
    const fn new() -> Self { Self { prev: 0 } }

    fn apply(
        &mut self,
        sample: i16,
    ) -> i16 {
        let num = IIR_ALPHA_NUM * i32::from(sample) + (IIR_ALPHA_DEN - IIR_ALPHA_NUM) * i32::from(self.prev);
        self.prev = div_round(num, IIR_ALPHA_DEN) as i16;
        self.prev
    }
}

/// Integer division rounding half away from zero.
const fn div_round(
    num: i32,
    den: i32,
) -> i32 {
    if num >= 0 {
        (num + den / 2) / den
    } else {
        (num - den / 2) / den
    }
}

// =============================================================================
// Filter Bank
// =============================================================================

/// All conditioning algorithms and their memory.
pub struct FilterBank {
    moving_average: MovingAverage,
    iir: Iir,
}

impl FilterBank {
    pub const fn new() -> Self {
        Self {
            moving_average: MovingAverage::new(),
            iir: Iir::new(),
        }
    }

    /// Condition one sample with the given mode.
    pub fn apply(
        &mut self,
        mode: FilterMode,
        sample: i16,
    ) -> i16 {
        match mode {
            FilterMode::PassThrough => sample,
            FilterMode::Iir => self.iir.apply(sample),
            FilterMode::MovingAverage => self.moving_average.apply(sample),
        }
    }
}

impl Default for FilterBank {
    fn default() -> Self { Self::new() }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selector_mapping() {
        assert_eq!(FilterMode::from_selector(0), FilterMode::PassThrough);
        assert_eq!(FilterMode::from_selector(1), FilterMode::PassThrough);
        assert_eq!(FilterMode::from_selector(2), FilterMode::Iir);
        assert_eq!(FilterMode::from_selector(3), FilterMode::Iir);
        assert_eq!(FilterMode::from_selector(4), FilterMode::MovingAverage);
        assert_eq!(FilterMode::from_selector(255), FilterMode::MovingAverage);
    }

    #[test]
    fn test_labels() {
        assert_eq!(FilterMode::PassThrough.label(), "No Filter");
        assert_eq!(FilterMode::Iir.label(), "IIR Filter");
        assert_eq!(FilterMode::MovingAverage.label(), "Moving Avg");
    }

    #[test]
    fn test_pass_through() {
        let mut bank = FilterBank::new();
        for sample in [0, -1, i16::MAX, i16::MIN, 1234] {
            assert_eq!(bank.apply(FilterMode::PassThrough, sample), sample);
        }
    }

    #[test]
    fn test_moving_average_exact_truncated_mean() {
        let mut bank = FilterBank::new();
        let samples: [i16; 16] = [
            100, -50, 3000, 7, 8, 9, -1000, 250, 1, 2, 3, 4, 5, 6, 7, 13,
        ];
        let mut last = 0;
        for &s in &samples {
            last = bank.apply(FilterMode::MovingAverage, s);
        }
        let sum: i32 = samples.iter().map(|&s| i32::from(s)).sum();
        assert_eq!(i32::from(last), sum / 16);
    }

    #[test]
    fn test_moving_average_warmup_includes_zero_slots() {
        let mut bank = FilterBank::new();
        assert_eq!(bank.apply(FilterMode::MovingAverage, 1600), 100);
        assert_eq!(bank.apply(FilterMode::MovingAverage, 1600), 200);
    }

    #[test]
    fn test_moving_average_truncates_toward_zero() {
        let mut bank = FilterBank::new();
        // -17 / 16 truncates to -1
        assert_eq!(bank.apply(FilterMode::MovingAverage, -17), -1);
    }

    #[test]
    fn test_moving_average_extremes_do_not_overflow() {
        let mut bank = FilterBank::new();
        let mut last = 0;
        for _ in 0..40 {
            last = bank.apply(FilterMode::MovingAverage, i16::MIN);
        }
        assert_eq!(last, i16::MIN);
    }

    #[test]
    fn test_iir_matches_recurrence() {
        let mut bank = FilterBank::new();
        let inputs = [1000i16, 1000, 1000, -500, 2000, 0, 0, 37];
        let mut expected = 0.0f64;
        for &x in &inputs {
            let got = bank.apply(FilterMode::Iir, x);
            expected = ((f64::from(x) + 9.0 * expected) / 10.0).round();
            assert_eq!(f64::from(got), expected);
        }
    }

    #[test]
    fn test_iir_rounds_half_away_from_zero() {
        let mut bank = FilterBank::new();
        // 0.1 * 5 = 0.5 -> 1
        assert_eq!(bank.apply(FilterMode::Iir, 5), 1);

        let mut bank = FilterBank::new();
        // 0.1 * -5 = -0.5 -> -1
        assert_eq!(bank.apply(FilterMode::Iir, -5), -1);
    }

    #[test]
    fn test_iir_converges_on_constant_input() {
        let mut bank = FilterBank::new();
        let mut last = 0;
        for _ in 0..200 {
            last = bank.apply(FilterMode::Iir, 2000);
        }
        // Rounding stalls the tail a few units short of the input
        assert!((1995..=2000).contains(&last));
    }

    #[test]
    fn test_mode_switch_keeps_memory() {
        let mut bank = FilterBank::new();
        assert_eq!(bank.apply(FilterMode::Iir, 1000), 100);
        assert_eq!(bank.apply(FilterMode::PassThrough, 5), 5);
        assert_eq!(bank.apply(FilterMode::MovingAverage, 160), 10);
        // IIR resumes from its previous output of 100
        assert_eq!(bank.apply(FilterMode::Iir, 1000), 190);
    }
}
