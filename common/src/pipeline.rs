//! The owning ECG pipeline.
//!
//! [`Pipeline`] holds every piece of mutable state (byte ring, parser, filter
//! memory, sample ring, pulse detector, inference session) and exposes one
//! polling entry point. Each [`Pipeline::poll`] call does a bounded amount of
//! work over the bytes it is handed and returns.
//!
//! Per raw ECG sample, while the sensor reports contact:
//!
//! 1. read at most one auxiliary byte, echo it, arm a session on `k`/`K`
//! 2. condition the sample with the selected filter
//! 3. step the inference session with the conditioned sample
//! 4. push it into the sample ring, run pulse detection, refresh the waveform

use crate::config::{PipelineConfig, TRIGGER_BYTES, UART_RING_CAPACITY};
use crate::filter::{FilterBank, FilterMode};
use crate::inference::{Diagnosis, InferenceScheduler, SessionState};
use crate::io::{Board, report_line, transmit};
use crate::parser::{FrameParser, ParseEvent};
use crate::payload::{Codes, DataRow, SignalQuality};
use crate::ring::ByteRing;
use crate::samples::{PulseDetector, PulseVerdict, SampleRing, WaveExtrema};
use crate::ConfigError;

/// Running counters. Advisory only; nothing reads them back into control flow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PipelineStats {
    /// Bytes handed to [`Pipeline::poll`].
    pub bytes: u32,
    /// Frames with a matching checksum.
    pub frames: u32,
    /// Frames discarded for a checksum mismatch.
    pub checksum_errors: u32,
    /// Payload rows that ran past the payload end.
    pub truncated_rows: u32,
    /// Conditioned samples written to the sample ring.
    pub samples: u32,
    /// Heartbeats flagged by the pulse detector.
    pub beats: u32,
    /// Auxiliary writes abandoned because the transmitter stayed busy.
    pub tx_timeouts: u32,
    /// Bytes rejected by the byte ring.
    pub dropped_bytes: u32,
}

/// BMD101 ingestion and signal pipeline.
pub struct Pipeline {
    config: PipelineConfig,
    ring: ByteRing<UART_RING_CAPACITY>,
    parser: FrameParser,
    filters: FilterBank,
    samples: SampleRing,
    pulse: PulseDetector,
    scheduler: InferenceScheduler,
    signal_quality: SignalQuality,
    heart_rate: u8,
    filter_selector: u8,
    last_wave: Option<WaveExtrema>,
    stats: PipelineStats,
}

impl Pipeline {
    /// Build a pipeline after checking `config` against the buffer capacities.
    pub fn new(config: PipelineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        info!(
            "pipeline: burst {} inference {}ms report {}ms",
            config.max_burst,
            config.inference_interval_ms,
            config.report_interval_ms
        );
        Ok(Self {
            config,
            ring: ByteRing::new(),
            parser: FrameParser::new(),
            filters: FilterBank::new(),
            samples: SampleRing::new(),
            pulse: PulseDetector::new(config.pulse_threshold),
            scheduler: InferenceScheduler::new(config.inference_interval_ms, config.report_interval_ms),
            signal_quality: SignalQuality::default(),
            heart_rate: 0,
            filter_selector: config.filter_selector,
            last_wave: None,
            stats: PipelineStats::default(),
        })
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    #[inline]
    pub const fn config(&self) -> &PipelineConfig { &self.config }

    #[inline]
    pub const fn stats(&self) -> &PipelineStats { &self.stats }

    #[inline]
    pub const fn signal_quality(&self) -> SignalQuality { self.signal_quality }

    /// Last reported heart rate (beats per minute).
    #[inline]
    pub const fn heart_rate(&self) -> u8 { self.heart_rate }

    #[inline]
    pub const fn filter_selector(&self) -> u8 { self.filter_selector }

    #[inline]
    pub const fn filter_mode(&self) -> FilterMode { FilterMode::from_selector(self.filter_selector) }

    #[inline]
    pub const fn session_state(&self) -> SessionState { self.scheduler.state() }

    /// Most recent waveform refresh sent to the view.
    #[inline]
    pub const fn last_wave(&self) -> Option<WaveExtrema> { self.last_wave }

    #[inline]
    pub const fn samples(&self) -> &SampleRing { &self.samples }

    // =========================================================================
    // Controls
    // =========================================================================

    /// Change the filter selector (e.g. from a potentiometer or button).
    pub fn set_filter_selector(
        &mut self,
        selector: u8,
    ) {
        if selector != self.filter_selector {
            debug!("filter selector {} -> {}", self.filter_selector, selector);
        }
        self.filter_selector = selector;
    }

    /// Arm an inference session from a board control. Ignored (returns
    /// `false`) without sensor contact or while a session is pending or
    /// running.
    pub fn request_inference(&mut self) -> bool {
        if !self.signal_quality.is_sensor_on() {
            debug!("inference request ignored, sensor off");
            return false;
        }
        let armed = self.scheduler.arm();
        if armed {
            info!("inference armed");
        }
        armed
    }

    // =========================================================================
    // Polling
    // =========================================================================

    /// Ingest one read burst and process every frame it completes.
    ///
    /// Bursts longer than the configured maximum are processed in chunks.
    /// Returns the number of checksum-valid frames dispatched.
    pub fn poll<B: Board>(
        &mut self,
        burst: &[u8],
        now_ms: u32,
        board: &mut B,
    ) -> usize {
        self.stats.bytes = self.stats.bytes.wrapping_add(burst.len() as u32);

        let mut frames = 0;
        for chunk in burst.chunks(self.config.max_burst) {
            let start = match self.ring.append(chunk) {
                Ok(start) => start,
                Err(_) => {
                    warn!("uart ring rejected {} bytes", chunk.len());
                    self.stats.dropped_bytes = self.stats.dropped_bytes.wrapping_add(chunk.len() as u32);
                    continue;
                }
            };

            for offset in 0..chunk.len() {
                let byte = self.ring.get(start + offset);
                match self.parser.push(byte) {
                    ParseEvent::Pending => {}
                    ParseEvent::Frame(frame) => {
                        frames += 1;
                        self.stats.frames = self.stats.frames.wrapping_add(1);
                        self.dispatch(frame.payload(), now_ms, board);
                    }
                    ParseEvent::ChecksumMismatch { computed, received } => {
                        self.stats.checksum_errors = self.stats.checksum_errors.wrapping_add(1);
                        debug!("checksum mismatch: computed {} received {}", computed, received);
                    }
                }
            }
        }
        frames
    }

    fn dispatch<B: Board>(
        &mut self,
        payload: &[u8],
        now_ms: u32,
        board: &mut B,
    ) {
        for row in Codes::new(payload) {
            match row {
                DataRow::SignalQuality(quality) => {
                    if quality != self.signal_quality {
                        info!("signal quality {}", quality.value());
                    }
                    self.signal_quality = quality;
                    board.sensor_contact(quality);
                }
                DataRow::HeartRate(bpm) => {
                    self.heart_rate = bpm;
                    if self.signal_quality.is_sensor_on() {
                        board.heart_rate(bpm);
                        board.filter_mode(self.filter_mode());
                    }
                }
                DataRow::RawEcg(raw) => {
                    if self.signal_quality.is_sensor_on() {
                        self.process_sample(raw, now_ms, board);
                    }
                }
                DataRow::Ignored { code } => trace!("ignored code {}", code),
                DataRow::Truncated { code } => {
                    self.stats.truncated_rows = self.stats.truncated_rows.wrapping_add(1);
                    debug!("truncated payload at code {}", code);
                }
            }
        }
    }

    fn process_sample<B: Board>(
        &mut self,
        raw: i16,
        now_ms: u32,
        board: &mut B,
    ) {
        if let Some(byte) = board.try_read() {
            self.send(board, &[byte]);
            if TRIGGER_BYTES.contains(&byte) {
                self.request_inference();
            }
        }

        let conditioned = self.filters.apply(self.filter_mode(), raw);

        let step = self.scheduler.step(conditioned, now_ms, board);
        if let Some(count) = step.report {
            debug!("inference fed {} samples", count);
            self.send(board, report_line(count).as_bytes());
        }
        if let Some(diagnosis) = step.diagnosis {
            self.announce(board, diagnosis);
        }

        let slot = self.samples.push(conditioned);
        self.stats.samples = self.stats.samples.wrapping_add(1);

        match self.pulse.update(&self.samples) {
            PulseVerdict::Filling => {}
            PulseVerdict::Beat => {
                self.stats.beats = self.stats.beats.wrapping_add(1);
                board.set(true);
            }
            PulseVerdict::NoBeat => board.set(false),
        }

        if let Some(wave) = self.samples.wave_update(slot) {
            self.last_wave = Some(wave);
            board.waveform(wave);
        }
    }

    fn announce<B: Board>(
        &mut self,
        board: &mut B,
        diagnosis: Diagnosis,
    ) {
        info!("diagnosis: {}", diagnosis.label());
        board.diagnosis(diagnosis);
        self.send(board, diagnosis.label().as_bytes());
        self.send(board, b"\r\n");
    }

    fn send<B: Board>(
        &mut self,
        board: &mut B,
        bytes: &[u8],
    ) {
        if let Err(err) = transmit(board, bytes, self.config.tx_ready_spins) {
            self.stats.tx_timeouts = self.stats.tx_timeouts.wrapping_add(1);
            warn!("aux tx timeout after {} bytes", err.sent);
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
