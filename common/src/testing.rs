//! Recording test doubles for the board collaborators.

use std::collections::VecDeque;
use std::vec::Vec;

use crate::filter::FilterMode;
use crate::inference::{Classifier, Diagnosis};
use crate::io::{AuxPort, EcgView, HeartbeatLed};
use crate::payload::SignalQuality;
use crate::samples::WaveExtrema;

/// Display notification as seen by the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewEvent {
    SensorContact(SignalQuality),
    HeartRate(u8),
    FilterMode(FilterMode),
    Waveform(WaveExtrema),
    Diagnosis(Diagnosis),
}

/// Classifier that answers after a fixed number of accumulated samples.
pub struct ScriptedClassifier {
    answer_after: Option<(usize, Diagnosis)>,
    pub seeds: Vec<i16>,
    pub fed: Vec<i16>,
}

impl ScriptedClassifier {
    /// Never reaches a verdict.
    pub fn never() -> Self {
        Self {
            answer_after: None,
            seeds: Vec::new(),
            fed: Vec::new(),
        }
    }

    /// Answers `diagnosis` on the `n`th accumulate call of a session.
    pub fn after(
        n: usize,
        diagnosis: Diagnosis,
    ) -> Self {
        Self {
            answer_after: Some((n, diagnosis)),
            ..Self::never()
        }
    }
}

impl Classifier for ScriptedClassifier {
    fn reset_and_seed(
        &mut self,
        sample: i16,
    ) {
        self.seeds.push(sample);
        self.fed.clear();
    }

    fn accumulate(
        &mut self,
        sample: i16,
    ) -> Option<Diagnosis> {
        self.fed.push(sample);
        match self.answer_after {
            Some((n, diagnosis)) if self.fed.len() == n => Some(diagnosis),
            _ => None,
        }
    }
}

/// Board double recording every collaborator call.
pub struct FakeBoard {
    pub view: Vec<ViewEvent>,
    pub led: Vec<bool>,
    pub rx: VecDeque<u8>,
    pub tx: Vec<u8>,
    /// When set, the transmitter never becomes ready.
    pub tx_stuck: bool,
    pub classifier: ScriptedClassifier,
}

impl FakeBoard {
    pub fn new() -> Self { Self::with_classifier(ScriptedClassifier::never()) }

    pub fn with_classifier(classifier: ScriptedClassifier) -> Self {
        Self {
            view: Vec::new(),
            led: Vec::new(),
            rx: VecDeque::new(),
            tx: Vec::new(),
            tx_stuck: false,
            classifier,
        }
    }

    /// Queue bytes on the auxiliary receive side.
    pub fn type_in(
        &mut self,
        bytes: &[u8],
    ) {
        self.rx.extend(bytes.iter().copied());
    }

    pub fn waveforms(&self) -> Vec<WaveExtrema> {
        self.view
            .iter()
            .filter_map(|e| match e {
                ViewEvent::Waveform(w) => Some(*w),
                _ => None,
            })
            .collect()
    }

    pub fn tx_text(&self) -> &str { core::str::from_utf8(&self.tx).unwrap_or("<binary>") }
}

impl EcgView for FakeBoard {
    fn sensor_contact(
        &mut self,
        quality: SignalQuality,
    ) {
        self.view.push(ViewEvent::SensorContact(quality));
    }

    fn heart_rate(
        &mut self,
        bpm: u8,
    ) {
        self.view.push(ViewEvent::HeartRate(bpm));
    }

    fn filter_mode(
        &mut self,
        mode: FilterMode,
    ) {
        self.view.push(ViewEvent::FilterMode(mode));
    }

    fn waveform(
        &mut self,
        wave: WaveExtrema,
    ) {
        self.view.push(ViewEvent::Waveform(wave));
    }

    fn diagnosis(
        &mut self,
        diagnosis: Diagnosis,
    ) {
        self.view.push(ViewEvent::Diagnosis(diagnosis));
    }
}

impl HeartbeatLed for FakeBoard {
    fn set(
        &mut self,
        on: bool,
    ) {
        self.led.push(on);
    }
}

impl AuxPort for FakeBoard {
    fn try_read(&mut self) -> Option<u8> { self.rx.pop_front() }

    fn try_write(
        &mut self,
        byte: u8,
    ) -> bool {
        if self.tx_stuck {
            return false;
        }
        self.tx.push(byte);
        true
    }
}

impl Classifier for FakeBoard {
    fn reset_and_seed(
        &mut self,
        sample: i16,
    ) {
        self.classifier.reset_and_seed(sample);
    }

    fn accumulate(
        &mut self,
        sample: i16,
    ) -> Option<Diagnosis> {
        self.classifier.accumulate(sample)
    }
}
