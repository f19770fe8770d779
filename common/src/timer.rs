//! Cooperative millisecond deadlines.
//!
//! A [`Deadline`] records a start time and period. Completion is checked by
//! polling with the current time; nothing fires on its own. The millisecond
//! clock is a free-running `u32` and comparisons use wrapping arithmetic, so a
//! deadline stays correct across counter rollover.

/// One-shot deadline polled against a millisecond clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Deadline {
    armed: Option<(u32, u32)>,
}

impl Deadline {
    /// A stopped deadline.
    pub const fn new() -> Self { Self { armed: None } }

    /// Start (or restart) the deadline `period_ms` after `now_ms`.
    pub fn start(
        &mut self,
        now_ms: u32,
        period_ms: u32,
    ) {
        self.armed = Some((now_ms, period_ms));
    }

    /// Stop the deadline; it never completes until started again.
    pub fn stop(&mut self) { self.armed = None; }

    #[inline]
    pub const fn is_running(&self) -> bool { self.armed.is_some() }

    /// Whether the period has elapsed. Non-blocking and non-consuming.
    pub fn is_complete(
        &self,
        now_ms: u32,
    ) -> bool {
        self.armed
            .is_some_and(|(start, period)| now_ms.wrapping_sub(start) >= period)
    }
}

impl Default for Deadline {
    fn default() -> Self { Self::new() }
}

// =============================================================================
// Tests
// =============================================================================
