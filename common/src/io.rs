//! Collaborators the pipeline talks to.
//!
//! The board (firmware or simulator) implements these traits; the pipeline
//! never touches hardware directly.
//!
//! - [`EcgView`]: display notifications
//! - [`HeartbeatLed`]: pulse indicator
//! - [`AuxPort`]: non-blocking auxiliary serial channel (trigger input, echo,
//!   diagnostics)
//! - [`Classifier`]: external ML model
//!
//! [`Board`] bundles all four and is implemented automatically.

use heapless::String;

use crate::filter::FilterMode;
use crate::inference::{Classifier, Diagnosis};
use crate::payload::SignalQuality;
use crate::samples::WaveExtrema;

// =============================================================================
// Traits
// =============================================================================

/// Display notifications.
pub trait EcgView {
    /// Sensor contact changed or was re-reported.
    fn sensor_contact(
        &mut self,
        quality: SignalQuality,
    );

    /// Heart rate in beats per minute (only while the sensor is on).
    fn heart_rate(
        &mut self,
        bpm: u8,
    );

    /// Active conditioning mode, shown next to the heart rate.
    fn filter_mode(
        &mut self,
        mode: FilterMode,
    );

    /// Waveform extrema and the latest sample for rendering.
    fn waveform(
        &mut self,
        wave: WaveExtrema,
    );

    /// Classifier outcome.
    fn diagnosis(
        &mut self,
        diagnosis: Diagnosis,
    );
}

/// Heartbeat indicator.
pub trait HeartbeatLed {
    fn set(
        &mut self,
        on: bool,
    );
}

/// Auxiliary byte channel. Both operations return immediately.
pub trait AuxPort {
    /// Next received byte, if any.
    fn try_read(&mut self) -> Option<u8>;

    /// Queue one byte for transmission. Returns `false` when the transmitter
    /// is not ready.
    fn try_write(
        &mut self,
        byte: u8,
    ) -> bool;
}

/// Everything the pipeline needs from a board.
pub trait Board: EcgView + HeartbeatLed + AuxPort + Classifier {}

impl<T: EcgView + HeartbeatLed + AuxPort + Classifier> Board for T {}

// =============================================================================
// Transmission
// =============================================================================

/// The transmitter stayed busy for every readiness poll of one byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[error("aux transmitter busy after {sent} bytes")]
pub struct TxTimeout {
    /// Bytes accepted before giving up.
    pub sent: usize,
}

/// Write `bytes`, polling readiness at most `spins` times per byte.
pub fn transmit<P: AuxPort + ?Sized>(
    port: &mut P,
    bytes: &[u8],
    spins: u32,
) -> Result<(), TxTimeout> {
    for (sent, &byte) in bytes.iter().enumerate() {
        if !(0..spins).any(|_| port.try_write(byte)) {
            return Err(TxTimeout { sent });
        }
    }
    Ok(())
}

// =============================================================================
// Formatting
// =============================================================================

/// Longest report line: ten digits plus CR LF.
pub const REPORT_LINE_LEN: usize = 12;

/// Append the decimal representation of `val` without pulling in `core::fmt`.
pub fn push_u32<const N: usize>(
    s: &mut String<N>,
    mut val: u32,
) {
    if val == 0 {
        s.push('0').ok();
        return;
    }

    let mut digits = [0u8; 10];
    let mut i = 0;
    while val > 0 {
        digits[i] = (val % 10) as u8;
        val /= 10;
        i += 1;
    }

    while i > 0 {
        i -= 1;
        s.push((b'0' + digits[i]) as char).ok();
    }
}

/// `"<count>\r\n"` as written to the auxiliary channel on each report.
pub fn report_line(count: u32) -> String<REPORT_LINE_LEN> {
    let mut line = String::new();
    push_u32(&mut line, count);
    line.push_str("\r\n").ok();
    line
}

// =============================================================================
// Tests
// =============================================================================
