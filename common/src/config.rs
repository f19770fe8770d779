//! Pipeline configuration.
//!
//! Buffer capacities are compile-time constants with validation assertions.
//! Values a board may want to tune (timer periods, burst size, pulse
//! threshold) live in [`PipelineConfig`] and are checked once when the
//! pipeline is built.

// =============================================================================
// Buffer Capacities
// =============================================================================

/// Capacity of the inbound UART byte ring.
pub const UART_RING_CAPACITY: usize = 2048;

/// Largest single UART read handed to the pipeline by default.
pub const DEFAULT_MAX_BURST: usize = 1024;

/// Number of conditioned samples kept for display scaling.
pub const SAMPLE_RING_CAPACITY: usize = 2000;

/// Number of most recent samples inspected for a heartbeat.
pub const PULSE_WINDOW: usize = 20;

/// The waveform view is refreshed whenever the written slot is a multiple of this.
pub const WAVE_UPDATE_RATE: usize = 20;

/// Moving average window length.
pub const MOVING_AVG_WINDOW: usize = 16;

const _: () = assert!(DEFAULT_MAX_BURST <= UART_RING_CAPACITY);
const _: () = assert!(PULSE_WINDOW <= SAMPLE_RING_CAPACITY);
const _: () = assert!(PULSE_WINDOW <= u8::MAX as usize);
const _: () = assert!(WAVE_UPDATE_RATE > 0);

// =============================================================================
// Signal Processing
// =============================================================================

/// Minimum window peak-to-peak swing (raw units) that counts as a heartbeat.
pub const DEFAULT_PULSE_THRESHOLD: i32 = 1500;

/// IIR smoothing factor α expressed as a ratio (α = 0.1).
pub const IIR_ALPHA_NUM: i32 = 1;
pub const IIR_ALPHA_DEN: i32 = 10;

const _: () = assert!(IIR_ALPHA_NUM > 0 && IIR_ALPHA_NUM < IIR_ALPHA_DEN);

/// Filter selector values at or below this are pass-through.
pub const FILTER_PASS_THROUGH_MAX: u8 = 1;

/// Filter selector values at or above this use the moving average.
pub const FILTER_MOVING_AVG_MIN: u8 = 4;

/// Highest selector value a board control is expected to produce.
pub const FILTER_SELECTOR_MAX: u8 = 5;

const _: () = assert!(FILTER_PASS_THROUGH_MAX < FILTER_MOVING_AVG_MIN);
const _: () = assert!(FILTER_MOVING_AVG_MIN <= FILTER_SELECTOR_MAX);

// =============================================================================
// Inference Scheduling
// =============================================================================

/// Period between classifier feeds while accumulating (milliseconds).
pub const DEFAULT_INFERENCE_INTERVAL_MS: u32 = 3;

/// Period between sample-count reports while accumulating (milliseconds).
pub const DEFAULT_REPORT_INTERVAL_MS: u32 = 5000;

/// Auxiliary channel bytes that arm an inference session.
pub const TRIGGER_BYTES: [u8; 2] = [b'k', b'K'];

/// Readiness polls per byte before an auxiliary transmit is abandoned.
pub const DEFAULT_TX_READY_SPINS: u32 = 10_000;

// =============================================================================
// Runtime Configuration
// =============================================================================

/// Reasons a [`PipelineConfig`] is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// A read burst could overwrite bytes the parser has not consumed yet.
    #[error("max burst of {burst} bytes exceeds the {capacity}-byte UART ring")]
    BurstExceedsRing { burst: usize, capacity: usize },
    /// A zero burst size would never make progress.
    #[error("max burst must be at least one byte")]
    ZeroBurst,
    /// Timer periods must be non-zero.
    #[error("{0} interval must be non-zero")]
    ZeroInterval(&'static str),
    /// Transmit retries must allow at least one readiness check.
    #[error("tx ready spins must be non-zero")]
    ZeroTxSpins,
}

/// Tunable pipeline parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Largest burst appended to the UART ring in one step.
    pub max_burst: usize,
    /// Classifier feed period while a session is accumulating.
    pub inference_interval_ms: u32,
    /// Sample-count reporting period while a session is accumulating.
    pub report_interval_ms: u32,
    /// Window swing above which a heartbeat is flagged.
    pub pulse_threshold: i32,
    /// Bounded readiness polls per transmitted auxiliary byte.
    pub tx_ready_spins: u32,
    /// Initial filter selector (see [`crate::filter::FilterMode::from_selector`]).
    pub filter_selector: u8,
}

impl PipelineConfig {
    /// Reference configuration.
    pub const fn new() -> Self {
        Self {
            max_burst: DEFAULT_MAX_BURST,
            inference_interval_ms: DEFAULT_INFERENCE_INTERVAL_MS,
            report_interval_ms: DEFAULT_REPORT_INTERVAL_MS,
            pulse_threshold: DEFAULT_PULSE_THRESHOLD,
            tx_ready_spins: DEFAULT_TX_READY_SPINS,
            filter_selector: 0,
        }
    }

    /// Check the configuration against the fixed buffer capacities.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_burst == 0 {
            return Err(ConfigError::ZeroBurst);
        }
        if self.max_burst > UART_RING_CAPACITY {
            return Err(ConfigError::BurstExceedsRing {
                burst: self.max_burst,
                capacity: UART_RING_CAPACITY,
            });
        }
        if self.inference_interval_ms == 0 {
            return Err(ConfigError::ZeroInterval("inference"));
        }
        if self.report_interval_ms == 0 {
            return Err(ConfigError::ZeroInterval("report"));
        }
        if self.tx_ready_spins == 0 {
            return Err(ConfigError::ZeroTxSpins);
        }
        Ok(())
    }
}

impl Default for PipelineConfig {
    fn default() -> Self { Self::new() }
}

// =============================================================================
// Tests
// =============================================================================
