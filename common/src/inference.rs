//! Classifier contract and inference session scheduling.
//!
//! A session moves `Idle -> Armed -> Accumulating -> Idle`:
//!
//! - an arm request (trigger byte or board control) moves `Idle` to `Armed`;
//!   requests in any other state are ignored
//! - the first conditioned sample after arming seeds the classifier and starts
//!   the inference and reporting deadlines
//! - while accumulating, each elapsed inference deadline feeds one sample; each
//!   elapsed reporting deadline emits the number of samples fed since the last
//!   report
//! - a definitive [`Diagnosis`] ends the session

use crate::timer::Deadline;

// =============================================================================
// Classifier
// =============================================================================

/// Definitive classifier outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Diagnosis {
    /// Atrial fibrillation.
    AFib,
    /// Normal sinus rhythm.
    Normal,
}

impl Diagnosis {
    /// Map a classifier class id. Anything other than 1 or 2 means the model
    /// has not accumulated enough data yet.
    pub const fn from_code(code: i32) -> Option<Self> {
        match code {
            1 => Some(Self::AFib),
            2 => Some(Self::Normal),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::AFib => "AFib",
            Self::Normal => "Normal",
        }
    }
}

/// External ML classifier fed one sample at a time.
pub trait Classifier {
    /// Discard accumulated input and start a new window with `sample`.
    fn reset_and_seed(
        &mut self,
        sample: i16,
    );

    /// Add one sample. Returns a diagnosis once enough input is accumulated.
    fn accumulate(
        &mut self,
        sample: i16,
    ) -> Option<Diagnosis>;
}

// =============================================================================
// Scheduler
// =============================================================================

/// Inference session progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SessionState {
    Idle,
    Armed,
    Accumulating,
}

/// What a scheduler step produced for the outside world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StepReport {
    /// Samples fed since the previous report, when the reporting deadline elapsed.
    pub report: Option<u32>,
    /// Classifier outcome that ended the session.
    pub diagnosis: Option<Diagnosis>,
}

/// Throttles classifier calls for one session at a time.
pub struct InferenceScheduler {
    state: SessionState,
    inference: Deadline,
    report: Deadline,
    inference_interval_ms: u32,
    report_interval_ms: u32,
    fed: u32,
}

impl InferenceScheduler {
    pub const fn new(
        inference_interval_ms: u32,
        report_interval_ms: u32,
    ) -> Self {
        Self {
            state: SessionState::Idle,
            inference: Deadline::new(),
            report: Deadline::new(),
            inference_interval_ms,
            report_interval_ms,
            fed: 0,
        }
    }

    #[inline]
    pub const fn state(&self) -> SessionState { self.state }

    /// Samples fed to the classifier since the last report.
    #[inline]
    pub const fn fed(&self) -> u32 { self.fed }

    /// Request a session. Returns `false` when one is already pending or running.
    pub fn arm(&mut self) -> bool {
        match self.state {
            SessionState::Idle => {
                self.state = SessionState::Armed;
                true
            }
            SessionState::Armed | SessionState::Accumulating => false,
        }
    }

    /// Advance the session with the latest conditioned sample.
    pub fn step<C: Classifier + ?Sized>(
        &mut self,
        sample: i16,
        now_ms: u32,
        classifier: &mut C,
    ) -> StepReport {
        let mut out = StepReport::default();
        self.state = match self.state {
            SessionState::Idle => SessionState::Idle,
            SessionState::Armed => {
                classifier.reset_and_seed(sample);
                self.inference.start(now_ms, self.inference_interval_ms);
                self.report.start(now_ms, self.report_interval_ms);
                self.fed = 0;
                SessionState::Accumulating
            }
            SessionState::Accumulating => self.accumulate(sample, now_ms, classifier, &mut out),
        };
        out
    }

    fn accumulate<C: Classifier + ?Sized>(
        &mut self,
        sample: i16,
        now_ms: u32,
        classifier: &mut C,
        out: &mut StepReport,
    ) -> SessionState {
        if self.report.is_complete(now_ms) {
            out.report = Some(self.fed);
            self.fed = 0;
            self.report.start(now_ms, self.report_interval_ms);
        }

        if !self.inference.is_complete(now_ms) {
            return SessionState::Accumulating;
        }

        self.fed = self.fed.saturating_add(1);
        let diagnosis = classifier.accumulate(sample);
        self.inference.start(now_ms, self.inference_interval_ms);

        match diagnosis {
            Some(diagnosis) => {
                out.diagnosis = Some(diagnosis);
                self.inference.stop();
                self.report.stop();
                SessionState::Idle
            }
            None => SessionState::Accumulating,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedClassifier;

    #[test]
    fn test_diagnosis_codes() {
        assert_eq!(Diagnosis::from_code(1), Some(Diagnosis::AFib));
        assert_eq!(Diagnosis::from_code(2), Some(Diagnosis::Normal));
        assert_eq!(Diagnosis::from_code(0), None);
        assert_eq!(Diagnosis::from_code(-1), None);
        assert_eq!(Diagnosis::AFib.label(), "AFib");
        assert_eq!(Diagnosis::Normal.label(), "Normal");
    }

    #[test]
    fn test_idle_does_nothing() {
        let mut scheduler = InferenceScheduler::new(3, 5000);
        let mut classifier = ScriptedClassifier::never();
        for t in 0..100 {
            assert_eq!(scheduler.step(1, t, &mut classifier), StepReport::default());
        }
        assert!(classifier.seeds.is_empty());
        assert!(classifier.fed.is_empty());
    }

    #[test]
    fn test_arm_seeds_then_accumulates() {
        let mut scheduler = InferenceScheduler::new(3, 5000);
        let mut classifier = ScriptedClassifier::never();

        assert!(scheduler.arm());
        assert_eq!(scheduler.state(), SessionState::Armed);

        scheduler.step(10, 0, &mut classifier);
        assert_eq!(scheduler.state(), SessionState::Accumulating);
        assert_eq!(classifier.seeds, vec![10]);

        // Deadline not yet elapsed
        scheduler.step(11, 2, &mut classifier);
        assert!(classifier.fed.is_empty());

        scheduler.step(12, 3, &mut classifier);
        assert_eq!(classifier.fed, vec![12]);

        // Restarted at t=3, next feed at t=6
        scheduler.step(13, 5, &mut classifier);
        scheduler.step(14, 6, &mut classifier);
        assert_eq!(classifier.fed, vec![12, 14]);
    }

    #[test]
    fn test_second_arm_is_ignored() {
        let mut scheduler = InferenceScheduler::new(3, 5000);
        let mut classifier = ScriptedClassifier::never();

        assert!(scheduler.arm());
        assert!(!scheduler.arm());
        scheduler.step(0, 0, &mut classifier);
        assert!(!scheduler.arm());
        scheduler.step(0, 1, &mut classifier);

        assert_eq!(classifier.seeds.len(), 1);
        assert_eq!(scheduler.state(), SessionState::Accumulating);
    }

    #[test]
    fn test_report_counts_samples_fed_since_arming() {
        let mut scheduler = InferenceScheduler::new(3, 5000);
        let mut classifier = ScriptedClassifier::never();

        scheduler.arm();
        scheduler.step(0, 0, &mut classifier);
        scheduler.arm();

        let mut reports = Vec::new();
        for t in 1..=5000 {
            let out = scheduler.step(0, t, &mut classifier);
            if let Some(count) = out.report {
                reports.push((t, count));
            }
        }

        assert_eq!(reports.len(), 1);
        let (t, count) = reports[0];
        assert_eq!(t, 5000);
        assert_eq!(count as usize, classifier.fed.len());
        assert_eq!(count, 1666);
        assert_eq!(scheduler.fed(), 0);
    }

    #[test]
    fn test_report_resets_count() {
        let mut scheduler = InferenceScheduler::new(1, 10);
        let mut classifier = ScriptedClassifier::never();

        scheduler.arm();
        scheduler.step(0, 0, &mut classifier);

        let reports: Vec<u32> = (1..=30)
            .filter_map(|t| scheduler.step(0, t, &mut classifier).report)
            .collect();
        // Fed at t=1..9 before the first report, then 10 per period
        assert_eq!(reports, vec![9, 10, 10]);
    }

    #[test]
    fn test_diagnosis_returns_to_idle() {
        let mut scheduler = InferenceScheduler::new(3, 5000);
        let mut classifier = ScriptedClassifier::after(2, Diagnosis::AFib);

        scheduler.arm();
        scheduler.step(0, 0, &mut classifier);
        assert_eq!(scheduler.step(0, 3, &mut classifier).diagnosis, None);
        let out = scheduler.step(0, 6, &mut classifier);
        assert_eq!(out.diagnosis, Some(Diagnosis::AFib));
        assert_eq!(scheduler.state(), SessionState::Idle);

        // Nothing more is fed once idle
        scheduler.step(0, 9, &mut classifier);
        scheduler.step(0, 6000, &mut classifier);
        assert_eq!(classifier.fed.len(), 2);

        // A new session can start
        assert!(scheduler.arm());
        scheduler.step(5, 7000, &mut classifier);
        assert_eq!(classifier.seeds, vec![0, 5]);
    }
}
