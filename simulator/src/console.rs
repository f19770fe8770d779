//! Console board.
//!
//! Implements the pipeline collaborators on a desktop: view events go to the
//! `log` facade, the auxiliary transmit channel is written to an output
//! stream (stdout in the binary) and auxiliary input is typed in by the
//! driver loop.

use std::collections::VecDeque;
use std::io::Write;

use ecg_common::{AuxPort, Classifier, Diagnosis, EcgView, FilterMode, HeartbeatLed, SignalQuality, WaveExtrema};
use log::{debug, info, trace};

/// Width of the waveform trace printed at trace level.
pub const TRACE_WIDTH: u16 = 60;

pub struct ConsoleBoard<C, W> {
    classifier: C,
    out: W,
    rx: VecDeque<u8>,
    contact: Option<bool>,
    mode: Option<FilterMode>,
    heart_rate: u8,
    led: bool,
    beats: u32,
    diagnoses: Vec<Diagnosis>,
}

impl<C: Classifier, W: Write> ConsoleBoard<C, W> {
    pub fn new(
        classifier: C,
        out: W,
    ) -> Self {
        Self {
            classifier,
            out,
            rx: VecDeque::new(),
            contact: None,
            mode: None,
            heart_rate: 0,
            led: false,
            beats: 0,
            diagnoses: Vec::new(),
        }
    }

    /// Queue bytes as if typed on the auxiliary console.
    pub fn type_in(
        &mut self,
        bytes: &[u8],
    ) {
        self.rx.extend(bytes);
    }

    /// Heartbeat LED rising edges seen so far.
    #[inline]
    pub const fn beats(&self) -> u32 { self.beats }

    /// Last heart rate shown.
    #[inline]
    pub const fn heart_rate(&self) -> u8 { self.heart_rate }

    /// Every diagnosis shown, oldest first.
    #[inline]
    pub fn diagnoses(&self) -> &[Diagnosis] { &self.diagnoses }

    #[cfg(test)]
    pub fn into_output(self) -> W { self.out }
}

impl<C, W> EcgView for ConsoleBoard<C, W> {
    fn sensor_contact(
        &mut self,
        quality: SignalQuality,
    ) {
        let on = quality.is_sensor_on();
        if self.contact != Some(on) {
            info!("Sensor {}", if on { "ON" } else { "OFF" });
            self.contact = Some(on);
        }
    }

    fn heart_rate(
        &mut self,
        bpm: u8,
    ) {
        if bpm != self.heart_rate {
            debug!("HR {} bpm", bpm);
        }
        self.heart_rate = bpm;
    }

    fn filter_mode(
        &mut self,
        mode: FilterMode,
    ) {
        if self.mode != Some(mode) {
            info!("Filter: {}", mode.label());
            self.mode = Some(mode);
        }
    }

    fn waveform(
        &mut self,
        wave: WaveExtrema,
    ) {
        if log::log_enabled!(log::Level::Trace) {
            let col = usize::from(wave.scale(TRACE_WIDTH));
            trace!("{:>6} |{:>col$}*", wave.latest, "", col = col);
        }
    }

    fn diagnosis(
        &mut self,
        diagnosis: Diagnosis,
    ) {
        info!("Diagnosis: {}", diagnosis.label());
        self.diagnoses.push(diagnosis);
    }
}

impl<C, W> HeartbeatLed for ConsoleBoard<C, W> {
    fn set(
        &mut self,
        on: bool,
    ) {
        if on && !self.led {
            self.beats = self.beats.wrapping_add(1);
            trace!("beat {}", self.beats);
        }
        self.led = on;
    }
}

impl<C, W: Write> AuxPort for ConsoleBoard<C, W> {
    fn try_read(&mut self) -> Option<u8> { self.rx.pop_front() }

    fn try_write(
        &mut self,
        byte: u8,
    ) -> bool {
        if self.out.write_all(&[byte]).is_err() {
            return false;
        }
        byte != b'\n' || self.out.flush().is_ok()
    }
}

impl<C: Classifier, W> Classifier for ConsoleBoard<C, W> {
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

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use ecg_common::protocol::{CODE_HEART_RATE, CODE_SIGNAL_QUALITY, SENSOR_ON, encode_frame, raw_ecg_payload};
    use ecg_common::{Pipeline, PipelineConfig, SessionState};

    use super::*;

    /// Classifier that decides after a fixed number of samples.
    struct Countdown(u32);

    impl Classifier for Countdown {
        fn reset_and_seed(
            &mut self,
            _sample: i16,
        ) {
        }

        fn accumulate(
            &mut self,
            _sample: i16,
        ) -> Option<Diagnosis> {
            self.0 = self.0.saturating_sub(1);
            (self.0 == 0).then_some(Diagnosis::Normal)
        }
    }

    fn frame(payload: &[u8]) -> Vec<u8> { encode_frame(payload).map(|f| f.to_vec()).unwrap_or_default() }

    #[test]
    fn test_tx_bytes_reach_output() {
        let mut board = ConsoleBoard::new(Countdown(1), Vec::new());
        assert!(board.try_write(b'4'));
        assert!(board.try_write(b'\r'));
        assert!(board.try_write(b'\n'));
        assert_eq!(board.into_output(), b"4\r\n");
    }

    #[test]
    fn test_typed_bytes_read_in_order() {
        let mut board = ConsoleBoard::new(Countdown(1), Vec::new());
        board.type_in(b"kx");
        assert_eq!(board.try_read(), Some(b'k'));
        assert_eq!(board.try_read(), Some(b'x'));
        assert_eq!(board.try_read(), None);
    }

    #[test]
    fn test_beats_count_rising_edges() {
        let mut board = ConsoleBoard::new(Countdown(1), Vec::new());
        for on in [true, true, false, true, false, false, true] {
            board.set(on);
        }
        assert_eq!(board.beats(), 3);
    }

    #[test]
    fn test_session_through_pipeline() {
        let mut pipeline = Pipeline::new(PipelineConfig::new()).unwrap();
        let mut board = ConsoleBoard::new(Countdown(2), Vec::new());

        let mut burst = frame(&[CODE_SIGNAL_QUALITY, SENSOR_ON, CODE_HEART_RATE, 70]);
        pipeline.poll(&burst, 0, &mut board);
        assert_eq!(board.heart_rate(), 70);

        board.type_in(b"k");
        burst = frame(&raw_ecg_payload(10));
        // Arm and seed
        pipeline.poll(&burst, 0, &mut board);
        pipeline.poll(&burst, 1, &mut board);
        assert_eq!(pipeline.session_state(), SessionState::Accumulating);
        // Two inference ticks
        pipeline.poll(&burst, 4, &mut board);
        pipeline.poll(&burst, 8, &mut board);

        assert_eq!(pipeline.session_state(), SessionState::Idle);
        assert_eq!(board.diagnoses(), &[Diagnosis::Normal]);
        assert_eq!(board.into_output(), b"kNormal\r\n");
    }
}
