//! Pico 2 board collaborators for the pipeline.
//!
//! - View notifications go to the debug probe via defmt
//! - Heartbeat drives the blue LED of the PIM715 RGB LED (active low)
//! - Aux port is backed by the channels of the aux console tasks

use defmt::{debug, info, trace};
use embassy_rp::gpio::Output;

use ecg_common::{AuxPort, Classifier, Diagnosis, EcgView, FilterMode, HeartbeatLed, SignalQuality, WaveExtrema};
use ecg_pico2::classifier::BoardClassifier;
use ecg_pico2::config::WAVE_HEIGHT_PX;

use crate::tasks::{AUX_RX, AUX_TX};

/// Everything the pipeline talks to on this board.
pub struct PicoBoard<'d> {
    led: Output<'d>,
    classifier: BoardClassifier,
    contact: Option<bool>,
}

impl<'d> PicoBoard<'d> {
    /// `led` must be configured high (off).
    pub fn new(
        led: Output<'d>,
        classifier: BoardClassifier,
    ) -> Self {
        Self {
            led,
            classifier,
            contact: None,
        }
    }
}

impl EcgView for PicoBoard<'_> {
    fn sensor_contact(
        &mut self,
        quality: SignalQuality,
    ) {
        // The sensor re-reports quality every second; only log changes
        let on = quality.is_sensor_on();
        if self.contact != Some(on) {
            info!("Sensor {}", if on { "on" } else { "off" });
            self.contact = Some(on);
        }
    }

    fn heart_rate(
        &mut self,
        bpm: u8,
    ) {
        debug!("HR {} bpm", bpm);
    }

    fn filter_mode(
        &mut self,
        mode: FilterMode,
    ) {
        trace!("Filter {}", mode.label());
    }

    fn waveform(
        &mut self,
        wave: WaveExtrema,
    ) {
        trace!("Wave {} [{}..{}] -> {}px", wave.latest, wave.min, wave.max, wave.scale(WAVE_HEIGHT_PX));
    }

    fn diagnosis(
        &mut self,
        diagnosis: Diagnosis,
    ) {
        info!("Diagnosis: {}", diagnosis.label());
    }
}

impl HeartbeatLed for PicoBoard<'_> {
    fn set(
        &mut self,
        on: bool,
    ) {
        if on {
            self.led.set_low();
        } else {
            self.led.set_high();
        }
    }
}

impl AuxPort for PicoBoard<'_> {
    fn try_read(&mut self) -> Option<u8> { AUX_RX.try_receive().ok() }

    fn try_write(
        &mut self,
        byte: u8,
    ) -> bool {
        AUX_TX.try_send(byte).is_ok()
    }
}

impl Classifier for PicoBoard<'_> {
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
