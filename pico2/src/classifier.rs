//! Classifier back-ends for the firmware.
//!
//! With the `sml-knowledgepack` feature the exported recognition library is
//! linked and called one sample at a time. Without it a placeholder is used
//! that accepts samples and never reaches a verdict, so the rest of the
//! session logic (timers, count reports) still runs on a bare board.

use ecg_common::{Classifier, Diagnosis};

/// Stand-in used when no model library is linked.
pub struct NoModel {
    accepted: u32,
}

impl NoModel {
    pub const fn new() -> Self { Self { accepted: 0 } }

    /// Samples accepted since the last reset.
    #[inline]
    pub const fn accepted(&self) -> u32 { self.accepted }
}

impl Default for NoModel {
    fn default() -> Self { Self::new() }
}

impl Classifier for NoModel {
    fn reset_and_seed(
        &mut self,
        _sample: i16,
    ) {
        self.accepted = 0;
    }

    fn accumulate(
        &mut self,
        _sample: i16,
    ) -> Option<Diagnosis> {
        self.accepted = self.accepted.saturating_add(1);
        None
    }
}

#[cfg(feature = "sml-knowledgepack")]
mod knowledgepack {
    use ecg_common::{Classifier, Diagnosis};

    unsafe extern "C" {
        /// Feeds `len` samples; `reset` clears the model's input window first.
        /// Returns the class id once the window is full, a negative value before.
        fn sml_recognition_run(
            data: *mut i16,
            len: i32,
            reset: bool,
        ) -> i32;
    }

    /// Recognition library exported from the model training tool.
    pub struct Knowledgepack;

    impl Knowledgepack {
        fn run(
            mut sample: i16,
            reset: bool,
        ) -> i32 {
            // SAFETY: the library reads exactly `len` samples from the pointer
            // and keeps no reference to it after returning.
            unsafe { sml_recognition_run(&mut sample, 1, reset) }
        }
    }

    impl Classifier for Knowledgepack {
        fn reset_and_seed(
            &mut self,
            sample: i16,
        ) {
            Self::run(sample, true);
        }

        fn accumulate(
            &mut self,
            sample: i16,
        ) -> Option<Diagnosis> {
            Diagnosis::from_code(Self::run(sample, false))
        }
    }
}

#[cfg(feature = "sml-knowledgepack")]
pub use knowledgepack::Knowledgepack;

/// Classifier selected by the enabled features.
#[cfg(feature = "sml-knowledgepack")]
pub type BoardClassifier = Knowledgepack;

/// Classifier selected by the enabled features.
#[cfg(not(feature = "sml-knowledgepack"))]
pub type BoardClassifier = NoModel;

/// Construct the classifier selected by the enabled features.
#[cfg(feature = "sml-knowledgepack")]
pub const fn board_classifier() -> BoardClassifier { Knowledgepack }

/// Construct the classifier selected by the enabled features.
#[cfg(not(feature = "sml-knowledgepack"))]
pub const fn board_classifier() -> BoardClassifier { NoModel::new() }

// =============================================================================
// Tests
// =============================================================================
