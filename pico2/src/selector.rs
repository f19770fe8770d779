//! Filter selector driven by a push button.
//!
//! The Display Pack has no potentiometer, so each press of the X button
//! steps the selector through `0..=FILTER_SELECTOR_MAX` and wraps.

use ecg_common::FilterMode;
use ecg_common::config::FILTER_SELECTOR_MAX;

/// Cyclic selector position.
pub struct FilterSelector {
    position: u8,
}

impl FilterSelector {
    pub const fn new(position: u8) -> Self {
        Self {
            position: if position > FILTER_SELECTOR_MAX { FILTER_SELECTOR_MAX } else { position },
        }
    }

    #[inline]
    pub const fn position(&self) -> u8 { self.position }

    #[inline]
    pub const fn mode(&self) -> FilterMode { FilterMode::from_selector(self.position) }

    /// Step to the next position and return it.
    pub fn advance(&mut self) -> u8 {
        self.position = if self.position >= FILTER_SELECTOR_MAX { 0 } else { self.position + 1 };
        self.position
    }
}

impl Default for FilterSelector {
    fn default() -> Self { Self::new(0) }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycles_through_all_modes() {
        let mut selector = FilterSelector::default();
        let modes: Vec<FilterMode> = (0..=FILTER_SELECTOR_MAX)
            .map(|_| {
                selector.advance();
                selector.mode()
            })
            .collect();
        assert_eq!(
            modes,
            vec![
                FilterMode::PassThrough,
                FilterMode::Iir,
                FilterMode::Iir,
                FilterMode::MovingAverage,
                FilterMode::MovingAverage,
                FilterMode::PassThrough,
            ]
        );
        assert_eq!(selector.position(), 0);
    }

    #[test]
    fn test_initial_position_clamped() {
        assert_eq!(FilterSelector::new(200).position(), FILTER_SELECTOR_MAX);
    }
}
