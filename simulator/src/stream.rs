//! BMD101 byte stream sources.
//!
//! - [`SyntheticEcg`]: P-QRS-T template generator at the sensor's 512 Hz rate
//! - [`SyntheticStream`]: wraps the generator in BMD101 frames, with a
//!   signal-quality and heart-rate frame once per second
//! - [`ReplayStream`]: plays back a raw byte capture at the sensor baud rate

use std::f32::consts::TAU;

use ecg_common::protocol::{
    CODE_HEART_RATE,
    CODE_SIGNAL_QUALITY,
    SENSOR_OFF,
    SENSOR_ON,
    encode_frame,
    raw_ecg_payload,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

// =============================================================================
// Constants
// =============================================================================

/// Raw ECG output rate of the BMD101.
pub const SAMPLE_RATE_HZ: u32 = 512;

/// Sensor UART rate; each byte costs ten bit times on the wire.
pub const SENSOR_BYTES_PER_SEC: u64 = 57_600 / 10;

/// Bytes of one raw ECG frame (sync, sync, length, 4-byte payload, checksum).
pub const RAW_FRAME_LEN: usize = 8;

/// Peak of the R wave in raw sensor units.
const R_AMPLITUDE: f32 = 2500.0;

/// Uniform noise added to every sample, in raw units.
const NOISE: i32 = 20;

/// Position of the R peak inside a beat.
const R_OFFSET_S: f32 = 0.25;

/// Shortest R-R interval the generator produces.
const MIN_RR_S: f32 = 0.35;

/// Relative beat-to-beat spread of the R-R interval.
const REGULAR_RR_SPREAD: f32 = 0.02;
const IRREGULAR_RR_SPREAD: f32 = 0.35;

/// Fibrillatory baseline replacing the P wave in irregular mode.
const FIBRILLATION_HZ: f32 = 6.0;
const FIBRILLATION_LEVEL: f32 = 0.04;

// =============================================================================
// Template
// =============================================================================

/// One Gaussian component of the beat template, relative to the R peak.
struct Wave {
    level: f32,
    center_s: f32,
    width_s: f32,
}

impl Wave {
    fn at(
        &self,
        t: f32,
    ) -> f32 {
        let x = (t - self.center_s) / self.width_s;
        self.level * (-0.5 * x * x).exp()
    }
}

const P_WAVE: usize = 0;

const WAVES: [Wave; 5] = [
    Wave { level: 0.12, center_s: -0.20, width_s: 0.025 },
    Wave { level: -0.15, center_s: -0.035, width_s: 0.010 },
    Wave { level: 1.00, center_s: 0.0, width_s: 0.012 },
    Wave { level: -0.25, center_s: 0.035, width_s: 0.012 },
    Wave { level: 0.30, center_s: 0.26, width_s: 0.045 },
];

// =============================================================================
// Generator
// =============================================================================

/// Rhythm of the synthetic heart.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rhythm {
    /// Nominal rate in beats per minute.
    pub bpm: u8,
    /// Fibrillation-like rhythm: no P wave and strongly varying R-R intervals.
    pub irregular: bool,
}

/// Sample-by-sample ECG generator.
pub struct SyntheticEcg {
    rng: ChaCha8Rng,
    rhythm: Rhythm,
    /// Sample position inside the current beat.
    pos: u32,
    beat_len: u32,
    prev_len: u32,
    elapsed: u32,
}

impl SyntheticEcg {
    pub fn new(
        rhythm: Rhythm,
        seed: u64,
    ) -> Self {
        let mut ecg = Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            rhythm,
            pos: 0,
            beat_len: 0,
            prev_len: 0,
            elapsed: 0,
        };
        ecg.beat_len = ecg.next_beat_len();
        ecg.prev_len = ecg.beat_len;
        ecg
    }

    fn next_beat_len(&mut self) -> u32 {
        let nominal = 60.0 / f32::from(self.rhythm.bpm.max(1));
        let spread = if self.rhythm.irregular { IRREGULAR_RR_SPREAD } else { REGULAR_RR_SPREAD };
        let rr = nominal * (1.0 + self.rng.gen_range(-spread..=spread));
        (rr.max(MIN_RR_S) * SAMPLE_RATE_HZ as f32) as u32
    }

    /// Template level at `t` seconds from an R peak.
    fn beat(
        &self,
        t: f32,
    ) -> f32 {
        WAVES
            .iter()
            .enumerate()
            .filter(|&(i, _)| !(self.rhythm.irregular && i == P_WAVE))
            .map(|(_, wave)| wave.at(t))
            .sum()
    }

    pub fn next_sample(&mut self) -> i16 {
        if self.pos >= self.beat_len {
            self.pos = 0;
            self.prev_len = self.beat_len;
            self.beat_len = self.next_beat_len();
        }

        let rate = SAMPLE_RATE_HZ as f32;
        // The previous beat's T wave can still be decaying
        let t = self.pos as f32 / rate - R_OFFSET_S;
        let t_prev = (self.pos + self.prev_len) as f32 / rate - R_OFFSET_S;
        let mut level = self.beat(t) + self.beat(t_prev);
        if self.rhythm.irregular {
            level += FIBRILLATION_LEVEL * (TAU * FIBRILLATION_HZ * self.elapsed as f32 / rate).sin();
        }

        self.pos += 1;
        self.elapsed = self.elapsed.wrapping_add(1);

        let noise = self.rng.gen_range(-NOISE..=NOISE);
        ((level * R_AMPLITUDE) as i32 + noise).clamp(i16::MIN.into(), i16::MAX.into()) as i16
    }
}

// =============================================================================
// Framed Stream
// =============================================================================

/// Parameters of a synthetic sensor session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StreamConfig {
    pub rhythm: Rhythm,
    pub seed: u64,
    /// Seconds before the electrodes report good contact.
    pub contact_after_s: u32,
}

/// Synthetic BMD101 output.
pub struct SyntheticStream {
    ecg: SyntheticEcg,
    bpm: u8,
    contact_after: u64,
    produced: u64,
}

impl SyntheticStream {
    pub fn new(config: &StreamConfig) -> Self {
        Self {
            ecg: SyntheticEcg::new(config.rhythm, config.seed),
            bpm: config.rhythm.bpm,
            contact_after: u64::from(config.contact_after_s) * u64::from(SAMPLE_RATE_HZ),
            produced: 0,
        }
    }

    /// Raw samples emitted so far.
    #[inline]
    pub const fn produced(&self) -> u64 { self.produced }

    /// Signal time covered so far.
    #[inline]
    pub const fn elapsed_ms(&self) -> u64 { self.produced * 1000 / SAMPLE_RATE_HZ as u64 }

    /// Append the frames for the next `samples` raw samples to `out`.
    pub fn fill(
        &mut self,
        samples: usize,
        out: &mut Vec<u8>,
    ) {
        for _ in 0..samples {
            if self.produced % u64::from(SAMPLE_RATE_HZ) == 0 {
                push_frame(out, &self.status_payload());
            }
            push_frame(out, &raw_ecg_payload(self.ecg.next_sample()));
            self.produced += 1;
        }
    }

    fn status_payload(&self) -> [u8; 4] {
        let on = self.produced >= self.contact_after;
        [
            CODE_SIGNAL_QUALITY,
            if on { SENSOR_ON } else { SENSOR_OFF },
            CODE_HEART_RATE,
            if on { self.bpm } else { 0 },
        ]
    }
}

fn push_frame(
    out: &mut Vec<u8>,
    payload: &[u8],
) {
    if let Some(frame) = encode_frame(payload) {
        out.extend_from_slice(&frame);
    }
}

// =============================================================================
// Replay
// =============================================================================

/// Recorded sensor bytes played back in fixed-size bursts.
pub struct ReplayStream {
    bytes: Vec<u8>,
    offset: usize,
    chunk: usize,
}

impl ReplayStream {
    pub fn new(
        bytes: Vec<u8>,
        chunk: usize,
    ) -> Self {
        Self { bytes, offset: 0, chunk: chunk.max(1) }
    }

    /// Append the next burst to `out` and return the wire time at its end,
    /// or `None` once the capture is exhausted.
    pub fn next_burst(
        &mut self,
        out: &mut Vec<u8>,
    ) -> Option<u32> {
        if self.offset >= self.bytes.len() {
            return None;
        }
        let end = (self.offset + self.chunk).min(self.bytes.len());
        out.extend_from_slice(&self.bytes[self.offset..end]);
        self.offset = end;
        Some((end as u64 * 1000 / SENSOR_BYTES_PER_SEC) as u32)
    }
}

// =============================================================================
// Tests
// =============================================================================
